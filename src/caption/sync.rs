// FACTSHORTS Playback Synchronizer
// Keeps displayed caption chunks tracking speech playback: real engine
// boundary events when the platform emits them, an estimated schedule when
// it does not.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

use crate::caption::chunker::{chunk, chunk_index_at, Chunk};
use crate::caption::estimator::{build_schedule, estimate_ms, ChunkSchedule};
use crate::config::NarrationSettings;

/// Progress notification from a speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechSignal {
    /// Playback reached this character offset of the utterance
    /// (single-space-joined form).
    Boundary { char_index: usize },
    /// Narration finished normally.
    Ended,
    /// Narration failed. Treated like `Ended` by the synchronizer.
    Errored(String),
}

/// Abstract speech capability. Implementations narrate the full text as one
/// continuous utterance and may emit zero or more `Boundary` signals before
/// the terminal `Ended`/`Errored`.
pub trait SpeechEngine: Send + Sync + 'static {
    /// Begin asynchronous narration; signals arrive on the returned channel.
    fn speak(&self, text: &str, rate: f32) -> mpsc::UnboundedReceiver<SpeechSignal>;
    /// Stop any in-flight narration immediately. Must be idempotent.
    fn cancel(&self);
}

/// Receives each caption chunk at its computed display time.
pub trait CaptionSink: Send + Sync + 'static {
    fn display(&self, text: &str);
}

/// Lifecycle of one narration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Speaking,
    Completed,
    Cancelled,
}

/// How a session resolved. Engine errors resolve as `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// Cooperative cancellation flag shared between a session task and its
/// owner. Replaces the timer-handle bookkeeping of callback-style sync code:
/// scheduled work checks the flag instead of being individually cleared.
#[derive(Clone)]
pub struct CancelFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Idempotent: repeated calls are no-ops.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the flag is set; never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap cloneable handle for stopping a session from another task, e.g. a
/// driver reacting to an interrupt while awaiting the session.
#[derive(Clone)]
pub struct SessionCanceller {
    cancel: CancelFlag,
    engine: Arc<dyn SpeechEngine>,
    state: watch::Receiver<SyncState>,
}

impl SessionCanceller {
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Stop the engine and the session immediately. Safe to call more than
    /// once, and a no-op after the session has already resolved.
    pub fn cancel(&self) {
        match self.state() {
            SyncState::Completed | SyncState::Cancelled => return,
            _ => {}
        }
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.engine.cancel();
    }
}

/// Handle to one in-flight narration session.
pub struct CaptionSession {
    canceller: SessionCanceller,
    handle: JoinHandle<SessionOutcome>,
}

impl CaptionSession {
    pub fn state(&self) -> SyncState {
        self.canceller.state()
    }

    pub fn canceller(&self) -> SessionCanceller {
        self.canceller.clone()
    }

    /// See [`SessionCanceller::cancel`].
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Await the session's completion signal.
    pub async fn wait(self) -> SessionOutcome {
        self.handle.await.unwrap_or(SessionOutcome::Cancelled)
    }
}

/// Orchestrates caption display for one utterance at a time against a shared
/// speech engine. The engine is a singleton resource: starting a new session
/// cancels any session still in flight.
pub struct Synchronizer {
    engine: Arc<dyn SpeechEngine>,
    settings: NarrationSettings,
    active: Mutex<Option<SessionCanceller>>,
}

impl Synchronizer {
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: NarrationSettings) -> Self {
        Self {
            engine,
            settings,
            active: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &NarrationSettings {
        &self.settings
    }

    /// Begin narrating `utterance`, displaying chunks on `sink` as playback
    /// progresses. Any prior session still in flight is cancelled first; a
    /// session that already resolved leaves the engine untouched.
    pub fn start(&self, utterance: &str, sink: Arc<dyn CaptionSink>) -> CaptionSession {
        let cancel = CancelFlag::new();
        let (state_tx, state_rx) = watch::channel(SyncState::Idle);
        let canceller = SessionCanceller {
            cancel: cancel.clone(),
            engine: self.engine.clone(),
            state: state_rx,
        };

        {
            let mut active = self.active.lock().unwrap();
            if let Some(prev) = active.take() {
                if !matches!(prev.state(), SyncState::Completed | SyncState::Cancelled) {
                    debug!("[SYNC] Preempting in-flight session");
                    prev.cancel();
                }
            }
            *active = Some(canceller.clone());
        }

        let chunks = chunk(utterance, self.settings.caption_words);
        let total_ms = estimate_ms(utterance, self.settings.tts_rate, &self.settings);
        let schedule = build_schedule(&chunks, total_ms, &self.settings);
        debug!(
            "[SYNC] Session start: {} chunks, ~{}ms estimated",
            chunks.len(),
            total_ms
        );

        let signals = self.engine.speak(utterance, self.settings.tts_rate);
        let handle = tokio::spawn(run_session(
            chunks,
            schedule,
            signals,
            sink,
            cancel,
            state_tx,
        ));

        CaptionSession { canceller, handle }
    }
}

/// One session's event loop: races engine signals, the fallback schedule and
/// cancellation on a single task.
async fn run_session(
    chunks: Vec<Chunk>,
    schedule: ChunkSchedule,
    mut signals: mpsc::UnboundedReceiver<SpeechSignal>,
    sink: Arc<dyn CaptionSink>,
    cancel: CancelFlag,
    state: watch::Sender<SyncState>,
) -> SessionOutcome {
    let _ = state.send(SyncState::Speaking);
    // The chunker never returns an empty sequence.
    let last = chunks.len() - 1;
    let started = Instant::now();

    if cancel.is_cancelled() {
        let _ = state.send(SyncState::Cancelled);
        return SessionOutcome::Cancelled;
    }

    // First chunk goes up as speech starts; a boundary at offset 0 arriving
    // later is a harmless re-display.
    sink.display(&chunks[0].text);
    let mut current = 0usize;
    let mut boundary_seen = false;
    let mut next_fallback = 1usize;

    loop {
        // Once in-range boundaries arrive the fallback schedule is disarmed;
        // the estimate never overrides observed timing.
        let deadline = if !boundary_seen && next_fallback < chunks.len() {
            Some(started + Duration::from_millis(schedule.offset_ms(next_fallback)))
        } else {
            None
        };

        tokio::select! {
            // biased: a cancellation that is ready alongside a signal or an
            // expired deadline always wins.
            biased;
            _ = cancel.cancelled() => {
                debug!("[SYNC] Cancelled at chunk {}", current);
                let _ = state.send(SyncState::Cancelled);
                return SessionOutcome::Cancelled;
            }
            sig = signals.recv() => {
                // The flag can be set between its poll above and a signal
                // becoming ready; re-check before displaying anything.
                if cancel.is_cancelled() {
                    debug!("[SYNC] Cancelled at chunk {}", current);
                    let _ = state.send(SyncState::Cancelled);
                    return SessionOutcome::Cancelled;
                }
                match sig {
                    Some(SpeechSignal::Boundary { char_index }) => {
                        match chunk_index_at(&chunks, char_index) {
                            Some(idx) if idx > current => {
                                boundary_seen = true;
                                sink.display(&chunks[idx].text);
                                current = idx;
                            }
                            // Same chunk, or an offset that regressed: never
                            // move the display backwards.
                            Some(_) => boundary_seen = true,
                            // An out-of-range offset says nothing about
                            // progress; the fallback schedule stays armed.
                            None => {
                                debug!("[SYNC] Ignoring out-of-range boundary {}", char_index);
                            }
                        }
                    }
                    Some(SpeechSignal::Errored(msg)) => {
                        // A failed utterance resolves like a finished one; the
                        // sequence moves on rather than aborting.
                        warn!("[SYNC] Engine error, resolving session: {}", msg);
                        sink.display(&chunks[last].text);
                        let _ = state.send(SyncState::Completed);
                        return SessionOutcome::Completed;
                    }
                    Some(SpeechSignal::Ended) | None => {
                        // The last line is never skipped, however imprecise the
                        // timing was.
                        sink.display(&chunks[last].text);
                        let _ = state.send(SyncState::Completed);
                        return SessionOutcome::Completed;
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if cancel.is_cancelled() {
                    debug!("[SYNC] Cancelled at chunk {}", current);
                    let _ = state.send(SyncState::Cancelled);
                    return SessionOutcome::Cancelled;
                }
                sink.display(&chunks[next_fallback].text);
                current = current.max(next_fallback);
                next_fallback += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_flag_is_idempotent() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        flag.cancel();
        flag.cancel();
        assert!(flag.is_cancelled());
        // already-set flags resolve immediately
        flag.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancel_flag_wakes_waiter() {
        let flag = CancelFlag::new();
        let waiter = flag.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        flag.cancel();
        task.await.unwrap();
    }
}
