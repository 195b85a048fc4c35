use std::fmt;
use std::time::Duration;

use crate::brain::CheckValue;

/// States of the per-identifier submission protocol.
///
/// A submission flows `Submitting → AwaitingResolution → Done`, short-
/// circuiting to `Done` on rejection or retry exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// Issuing submit requests, up to the attempt budget.
    Submitting,
    /// Accepted by the server; polling until it signals resolution.
    AwaitingResolution,
    /// A terminal outcome has been produced.
    Done,
}

impl fmt::Display for SubmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitState::Submitting => write!(f, "SUBMITTING"),
            SubmitState::AwaitingResolution => write!(f, "AWAITING_RESOLUTION"),
            SubmitState::Done => write!(f, "DONE"),
        }
    }
}

/// Observation fed into the state machine after each request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitEvent {
    /// Submit returned HTTP 201.
    Accepted,
    /// Submit returned HTTP 400 or 403.
    Rejected(u16),
    /// Submit returned any other status.
    Transient(u16),
    /// The transport itself failed (network error).
    TransportFailed,
    /// Poll carried a nonzero Retry-After: sleep that many seconds, poll again.
    StillPending(f64),
    /// Poll resolved with HTTP 200.
    Resolved,
    /// Poll resolved unfavorably; the body carried the post-review checks.
    ChecksFailed(Vec<CheckValue>),
}

/// What the protocol runner must do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Query the submission status.
    Poll,
    /// Wait the fixed retry delay, then submit again.
    Backoff(Duration),
    /// Honor the server-directed interval, then poll again.
    Wait(Duration),
    /// The identifier is resolved; no further action this run.
    Complete(SubmissionOutcome),
}

/// Terminal classification of one identifier, produced exactly once per
/// batch-driver pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Success,
    /// The server refused the submission outright; never retried.
    RejectedImmediately { status: u16 },
    /// Accepted, reviewed, and failed the post-review checks.
    RejectedAfterReview { checks: Vec<CheckValue> },
    /// No acceptance or rejection within the attempt budget (or the
    /// polling ceiling), so no definitive verdict exists.
    TransientFailure { attempts: u32 },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::Success => write!(f, "submitted successfully"),
            SubmissionOutcome::RejectedImmediately { status } => {
                write!(f, "rejected on submit (HTTP {status})")
            }
            SubmissionOutcome::RejectedAfterReview { .. } => {
                write!(f, "rejected by post-review checks")
            }
            SubmissionOutcome::TransientFailure { attempts } => {
                write!(f, "no acceptance after {attempts} attempt(s)")
            }
        }
    }
}

/// One identifier moving through the submission protocol.
#[derive(Debug, Clone)]
pub struct Attempt {
    alpha_id: String,
    state: SubmitState,
    submit_attempts: u32,
    max_submit_attempts: u32,
    submit_retry_delay: Duration,
}

impl Attempt {
    pub fn new(
        alpha_id: impl Into<String>,
        max_submit_attempts: u32,
        submit_retry_delay: Duration,
    ) -> Self {
        Self {
            alpha_id: alpha_id.into(),
            state: SubmitState::Submitting,
            submit_attempts: 0,
            max_submit_attempts,
            submit_retry_delay,
        }
    }

    pub fn alpha_id(&self) -> &str {
        &self.alpha_id
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn submit_attempts(&self) -> u32 {
        self.submit_attempts
    }

    /// Record that a submit request is about to be issued.
    pub fn begin_submit(&mut self) {
        debug_assert_eq!(self.state, SubmitState::Submitting);
        self.submit_attempts += 1;
    }

    /// Advance the machine with an observation and return the next step.
    pub fn next(&mut self, event: SubmitEvent) -> Step {
        match (self.state, event) {
            (SubmitState::Submitting, SubmitEvent::Accepted) => {
                self.state = SubmitState::AwaitingResolution;
                Step::Poll
            }
            (SubmitState::Submitting, SubmitEvent::Rejected(status)) => {
                self.state = SubmitState::Done;
                Step::Complete(SubmissionOutcome::RejectedImmediately { status })
            }
            (
                SubmitState::Submitting,
                SubmitEvent::Transient(_) | SubmitEvent::TransportFailed,
            ) => {
                if self.submit_attempts >= self.max_submit_attempts {
                    self.state = SubmitState::Done;
                    Step::Complete(SubmissionOutcome::TransientFailure {
                        attempts: self.submit_attempts,
                    })
                } else {
                    Step::Backoff(self.submit_retry_delay)
                }
            }
            (SubmitState::AwaitingResolution, SubmitEvent::StillPending(secs)) => {
                Step::Wait(Duration::from_secs_f64(secs.max(0.0)))
            }
            (SubmitState::AwaitingResolution, SubmitEvent::Resolved) => {
                self.state = SubmitState::Done;
                Step::Complete(SubmissionOutcome::Success)
            }
            (SubmitState::AwaitingResolution, SubmitEvent::ChecksFailed(checks)) => {
                self.state = SubmitState::Done;
                Step::Complete(SubmissionOutcome::RejectedAfterReview { checks })
            }
            // Events the protocol cannot produce in the current state
            // (including anything after Done) resolve to a transient
            // failure rather than a panic.
            (_, _) => {
                self.state = SubmitState::Done;
                Step::Complete(SubmissionOutcome::TransientFailure {
                    attempts: self.submit_attempts,
                })
            }
        }
    }
}
