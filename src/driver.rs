//! Batch driver: sequences the pending queue through the submission
//! protocol.
//!
//! The driver is the per-run context object — it owns the authenticated
//! transport, the pacing and retry policies and the cancellation handle.
//! After every terminal outcome the identifier is removed from the durable
//! queue before anything else happens, so an interruption at any point
//! loses at most the in-flight identifier's classification, never queue
//! state. Interruptions are reported and then propagated, never swallowed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use uuid::Uuid;

use crate::brain::SubmitTransport;
use crate::queue::{PendingQueue, QueueError};
use crate::submission::{ProtocolConfig, run_submission};
use crate::ui;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no pending identifiers to submit")]
    NothingToSubmit,

    #[error("interrupted: {succeeded} succeeded, {failed} failed, {remaining} still pending")]
    Interrupted {
        succeeded: usize,
        failed: usize,
        remaining: usize,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Tally of one driver pass, stamped per run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub target: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub remaining: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn met_target(&self) -> bool {
        self.succeeded.len() >= self.target
    }
}

/// Per-run context driving identifiers through the submission protocol
/// one at a time.
pub struct BatchDriver<T: SubmitTransport> {
    transport: T,
    protocol: ProtocolConfig,
    pacing: Duration,
    cancel: watch::Receiver<bool>,
    verbose: bool,
}

impl<T: SubmitTransport> BatchDriver<T> {
    pub fn new(
        transport: T,
        protocol: ProtocolConfig,
        pacing: Duration,
        cancel: watch::Receiver<bool>,
        verbose: bool,
    ) -> Self {
        Self {
            transport,
            protocol,
            pacing,
            cancel,
            verbose,
        }
    }

    /// Process identifiers sequentially until `target` submissions have
    /// succeeded or the queue is exhausted.
    ///
    /// Every resolved identifier — success or failure — is removed from the
    /// persistent queue before the loop advances.
    pub async fn run(
        &mut self,
        queue: &mut PendingQueue,
        target: usize,
    ) -> Result<RunSummary, DriverError> {
        let Self {
            transport,
            protocol,
            pacing,
            cancel,
            verbose,
        } = self;

        let ids = queue.load()?;
        if ids.is_empty() {
            return Err(DriverError::NothingToSubmit);
        }
        let target = target.min(ids.len());

        let started_at = Utc::now();
        let mut succeeded: Vec<String> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        let mut idx = 0usize;

        while succeeded.len() < target && idx < ids.len() {
            // pace every submission past the first
            if idx > 0 {
                tokio::select! {
                    _ = sleep(*pacing) => {}
                    _ = cancelled(cancel) => {
                        let remaining = ids.len() - idx;
                        ui::print_interrupted(succeeded.len(), failed.len(), remaining);
                        return Err(DriverError::Interrupted {
                            succeeded: succeeded.len(),
                            failed: failed.len(),
                            remaining,
                        });
                    }
                }
            }

            let alpha_id = &ids[idx];
            let progress = ui::SubmissionProgress::start(alpha_id, *verbose);
            let outcome = tokio::select! {
                outcome = run_submission(&*transport, &*protocol, alpha_id, &progress) => outcome,
                _ = cancelled(cancel) => {
                    // the in-flight identifier never reached a terminal
                    // outcome, so it stays in the queue for the next run
                    let remaining = ids.len() - idx;
                    ui::print_interrupted(succeeded.len(), failed.len(), remaining);
                    return Err(DriverError::Interrupted {
                        succeeded: succeeded.len(),
                        failed: failed.len(),
                        remaining,
                    });
                }
            };
            progress.finish(&outcome);

            if outcome.is_success() {
                succeeded.push(alpha_id.clone());
            } else {
                failed.push(alpha_id.clone());
            }
            // persist the removal immediately, whatever the outcome
            queue.remove(alpha_id)?;
            idx += 1;
        }

        Ok(RunSummary {
            run_id: Uuid::new_v4().to_string(),
            target,
            succeeded,
            failed,
            remaining: ids.len() - idx,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Resolves once the cancellation flag flips to true. If the sender is gone
/// the run can no longer be cancelled, so the future parks forever.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
