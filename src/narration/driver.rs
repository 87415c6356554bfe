// FACTSHORTS Narration Driver
// Plays a list of utterances strictly one after another, with a fixed pause
// between them.

use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use crate::caption::{CancelFlag, CaptionSink, SessionOutcome, Synchronizer};

/// Summary of one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrationReport {
    /// Utterances whose sessions resolved as completed (engine errors
    /// included; those are skips, not failures).
    pub completed: usize,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
}

/// Drives the Synchronizer once per utterance, awaiting each session before
/// starting the next. Never overlaps narrations.
pub struct NarrationDriver {
    sync: Arc<Synchronizer>,
    cancel: CancelFlag,
}

impl NarrationDriver {
    pub fn new(sync: Arc<Synchronizer>) -> Self {
        Self {
            sync,
            cancel: CancelFlag::new(),
        }
    }

    /// Clone of the driver's cancellation flag, for stopping a run from
    /// another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Narrate every utterance in order. Cancellation stops the active
    /// session immediately and skips the remainder.
    pub async fn narrate_all(
        &self,
        utterances: &[String],
        sink: Arc<dyn CaptionSink>,
    ) -> NarrationReport {
        let gap = Duration::from_millis(self.sync.settings().inter_fact_gap_ms);
        let mut completed = 0usize;

        for (i, utterance) in utterances.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return NarrationReport {
                    completed,
                    cancelled: true,
                };
            }

            info!("[DRIVER] Utterance {}/{}", i + 1, utterances.len());
            let session = self.sync.start(utterance, sink.clone());

            // Relay driver-level cancellation into the active session while
            // we await it.
            let canceller = session.canceller();
            let flag = self.cancel.clone();
            let watcher = tokio::spawn(async move {
                flag.cancelled().await;
                canceller.cancel();
            });

            let outcome = session.wait().await;
            watcher.abort();

            match outcome {
                SessionOutcome::Completed => completed += 1,
                SessionOutcome::Cancelled => {
                    return NarrationReport {
                        completed,
                        cancelled: true,
                    };
                }
            }

            // Breathing room between facts, skipped after the last one.
            if i + 1 < utterances.len() {
                tokio::select! {
                    _ = tokio::time::sleep(gap) => {}
                    _ = self.cancel.cancelled() => {
                        return NarrationReport {
                            completed,
                            cancelled: true,
                        };
                    }
                }
            }
        }

        NarrationReport {
            completed,
            cancelled: false,
        }
    }
}
