mod protocol;
mod state;

pub use protocol::{ProtocolConfig, run_submission};
pub use state::{Attempt, Step, SubmitEvent, SubmitState, SubmissionOutcome};
