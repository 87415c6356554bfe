// FACTSHORTS Speech Engines
// Concrete SpeechEngine implementations: an external TTS subprocess and a
// silent paced engine for dry runs.

use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::caption::{estimate_ms, CancelFlag, SpeechEngine, SpeechSignal};
use crate::config::NarrationSettings;

/// Narrates by shelling out to a TTS command (default `espeak-ng`). The
/// subprocess gives no progress feedback, so sessions using this engine run
/// entirely on the fallback schedule; `Ended` is sent when the process
/// exits, `Errored` on a non-zero status.
pub struct CommandTtsEngine {
    program: String,
    base_wpm: u32,
    active: Mutex<Option<CancelFlag>>,
}

impl CommandTtsEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_wpm: 175,
            active: Mutex::new(None),
        }
    }
}

impl Default for CommandTtsEngine {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl SpeechEngine for CommandTtsEngine {
    fn speak(&self, text: &str, rate: f32) -> mpsc::UnboundedReceiver<SpeechSignal> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Only one narration at a time: preempt whatever is still running.
        let flag = CancelFlag::new();
        {
            let mut active = self.active.lock().unwrap();
            if let Some(prev) = active.take() {
                prev.cancel();
            }
            *active = Some(flag.clone());
        }

        let wpm = (self.base_wpm as f32 * rate).round().max(1.0) as u32;
        let program = self.program.clone();
        let text = text.to_string();
        info!("[TTS] Narrating via {}: \"{}\"", program, text);

        tokio::spawn(async move {
            let mut child = match Command::new(&program)
                .arg("-s")
                .arg(wpm.to_string())
                .arg(&text)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
            {
                Ok(child) => child,
                Err(e) => {
                    warn!("[TTS] Failed to spawn {}: {}", program, e);
                    let _ = tx.send(SpeechSignal::Errored(e.to_string()));
                    return;
                }
            };

            tokio::select! {
                status = child.wait() => {
                    let signal = match status {
                        Ok(s) if s.success() => SpeechSignal::Ended,
                        Ok(s) => SpeechSignal::Errored(format!("TTS exited with {}", s)),
                        Err(e) => SpeechSignal::Errored(e.to_string()),
                    };
                    let _ = tx.send(signal);
                }
                _ = flag.cancelled() => {
                    let _ = child.start_kill();
                    // Cancelled sessions resolve without a terminal signal.
                }
            }
        });

        rx
    }

    fn cancel(&self) {
        if let Some(flag) = self.active.lock().unwrap().take() {
            flag.cancel();
        }
    }
}

/// Silent engine that paces through the utterance at the estimated speaking
/// speed, emitting a `Boundary` at each word start. Useful for previews and
/// for exercising the boundary-preemption path without audio hardware.
pub struct PacedEngine {
    settings: NarrationSettings,
    active: Mutex<Option<CancelFlag>>,
}

impl PacedEngine {
    pub fn new(settings: NarrationSettings) -> Self {
        Self {
            settings,
            active: Mutex::new(None),
        }
    }
}

impl SpeechEngine for PacedEngine {
    fn speak(&self, text: &str, rate: f32) -> mpsc::UnboundedReceiver<SpeechSignal> {
        let (tx, rx) = mpsc::unbounded_channel();

        let flag = CancelFlag::new();
        {
            let mut active = self.active.lock().unwrap();
            if let Some(prev) = active.take() {
                prev.cancel();
            }
            *active = Some(flag.clone());
        }

        // Word-start offsets within the single-space-joined text, matching
        // how the synchronizer maps offsets back to chunks.
        let mut offsets = Vec::new();
        let mut acc = 0usize;
        for word in text.split_whitespace() {
            offsets.push(acc);
            acc += word.chars().count() + 1;
        }

        let total_ms = estimate_ms(text, rate, &self.settings);
        let per_word = Duration::from_millis(total_ms / offsets.len().max(1) as u64);

        tokio::spawn(async move {
            for offset in offsets {
                if tx.send(SpeechSignal::Boundary { char_index: offset }).is_err() {
                    return;
                }
                tokio::select! {
                    _ = tokio::time::sleep(per_word) => {}
                    _ = flag.cancelled() => return,
                }
            }
            let _ = tx.send(SpeechSignal::Ended);
        });

        rx
    }

    fn cancel(&self) {
        if let Some(flag) = self.active.lock().unwrap().take() {
            flag.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_paced_engine_emits_monotonic_boundaries_then_end() {
        let settings = NarrationSettings {
            min_utterance_ms: 50,
            ..Default::default()
        };
        let engine = PacedEngine::new(settings);
        let mut rx = engine.speak("one two three", 10.0);

        let mut last_offset = None;
        loop {
            match rx.recv().await {
                Some(SpeechSignal::Boundary { char_index }) => {
                    if let Some(prev) = last_offset {
                        assert!(char_index > prev);
                    }
                    last_offset = Some(char_index);
                }
                Some(SpeechSignal::Ended) => break,
                other => panic!("unexpected signal: {:?}", other),
            }
        }
        assert_eq!(last_offset, Some(8)); // "one two |three"
    }

    #[tokio::test]
    async fn test_paced_engine_cancel_stops_signals() {
        let engine = PacedEngine::new(NarrationSettings::default());
        let mut rx = engine.speak("a long sentence with quite a few words in it", 0.1);
        // let the first boundary through, then cancel
        assert!(matches!(
            rx.recv().await,
            Some(SpeechSignal::Boundary { .. })
        ));
        engine.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        // channel closes without a terminal signal
        let mut terminal_seen = false;
        while let Ok(sig) = rx.try_recv() {
            if matches!(sig, SpeechSignal::Ended | SpeechSignal::Errored(_)) {
                terminal_seen = true;
            }
        }
        assert!(!terminal_seen);
    }
}
