//! Async runner for the submission protocol.
//!
//! Executes the [`Attempt`](super::state::Attempt) state machine against a
//! [`SubmitTransport`]: submit with bounded retries, then poll at the pace
//! the server dictates through its `Retry-After` header. Every suspension is
//! a plain `tokio::time::sleep` await, so the batch driver can cancel the
//! whole future between blocking delays.

use std::time::Duration;

use tokio::time::sleep;

use crate::brain::{PollResponse, PollVerdict, SubmitTransport};
use crate::ui::SubmissionProgress;

use super::state::{Attempt, Step, SubmitEvent, SubmitState, SubmissionOutcome};

/// Pacing and budget knobs for one submission.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Submit requests allowed before giving up on an identifier.
    pub max_submit_attempts: u32,
    /// Fixed delay between submit retries.
    pub submit_retry_delay: Duration,
    /// Ceiling on the cumulative server-directed wait while polling.
    /// `None` leaves pacing entirely to the server.
    pub max_poll_wait: Option<Duration>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_submit_attempts: 5,
            submit_retry_delay: Duration::from_secs(3),
            max_poll_wait: Some(Duration::from_secs(600)),
        }
    }
}

/// Drive one identifier to a terminal outcome.
///
/// Transport failures never escape: a network error during submit counts
/// against the attempt budget, and one during polling (where no verdict can
/// be recovered) classifies the identifier as a transient failure.
pub async fn run_submission(
    transport: &impl SubmitTransport,
    config: &ProtocolConfig,
    alpha_id: &str,
    progress: &SubmissionProgress,
) -> SubmissionOutcome {
    let mut attempt = Attempt::new(
        alpha_id,
        config.max_submit_attempts,
        config.submit_retry_delay,
    );
    let mut total_wait = Duration::ZERO;

    loop {
        let event = match attempt.state() {
            SubmitState::Submitting => {
                attempt.begin_submit();
                progress.attempt(attempt.submit_attempts(), config.max_submit_attempts);
                match transport.submit_alpha(attempt.alpha_id()).await {
                    Ok(response) => classify_submit(response.status),
                    Err(_) => SubmitEvent::TransportFailed,
                }
            }
            SubmitState::AwaitingResolution => match transport.poll_alpha(attempt.alpha_id()).await {
                Ok(response) => classify_poll(response),
                Err(_) => SubmitEvent::TransportFailed,
            },
            SubmitState::Done => {
                // next() always completes before re-entering the loop
                return SubmissionOutcome::TransientFailure {
                    attempts: attempt.submit_attempts(),
                };
            }
        };

        match attempt.next(event) {
            Step::Poll => {}
            Step::Backoff(delay) => {
                progress.backoff(delay);
                sleep(delay).await;
            }
            Step::Wait(delay) => {
                if let Some(ceiling) = config.max_poll_wait {
                    if total_wait + delay > ceiling {
                        progress.ceiling_reached(ceiling);
                        return SubmissionOutcome::TransientFailure {
                            attempts: attempt.submit_attempts(),
                        };
                    }
                }
                total_wait += delay;
                progress.waiting(delay);
                sleep(delay).await;
            }
            Step::Complete(outcome) => return outcome,
        }
    }
}

fn classify_submit(status: u16) -> SubmitEvent {
    match status {
        201 => SubmitEvent::Accepted,
        400 | 403 => SubmitEvent::Rejected(status),
        other => SubmitEvent::Transient(other),
    }
}

fn classify_poll(response: PollResponse) -> SubmitEvent {
    if response.retry_after > 0.0 {
        return SubmitEvent::StillPending(response.retry_after);
    }
    if response.status == 200 {
        return SubmitEvent::Resolved;
    }
    // resolved unfavorably: recover the post-review checks for diagnostics;
    // a body we cannot parse still classifies as a rejection
    let checks = serde_json::from_str::<PollVerdict>(&response.body)
        .map(|verdict| verdict.is.checks)
        .unwrap_or_default();
    SubmitEvent::ChecksFailed(checks)
}
