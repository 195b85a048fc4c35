pub mod client;
pub mod error;
pub mod types;

pub use client::{BrainClient, SubmitTransport};
pub use error::BrainError;
pub use types::{CheckValue, Credentials, PollResponse, PollVerdict, SubmitResponse};
