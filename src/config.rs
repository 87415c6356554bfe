// FACTSHORTS Narration Settings
// Defaults mirror the tuned constants of the original caption heuristic.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Tunable knobs for chunking, timing estimation and sequencing.
///
/// All fields have defaults; a JSON settings file may override any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Words per displayed caption chunk.
    pub caption_words: usize,
    /// Speech rate multiplier passed to the engine (1.0 = normal).
    pub tts_rate: f32,
    /// Pause between utterances in a sequence, in milliseconds.
    pub inter_fact_gap_ms: u64,
    /// Baseline speaking speed at rate 1.0, in words per second.
    pub words_per_second: f32,
    /// Floor on the estimated duration of any single utterance.
    pub min_utterance_ms: u64,
    /// Floor on any single chunk's display slot.
    pub min_chunk_ms: u64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            caption_words: 6,
            tts_rate: 1.0,
            inter_fact_gap_ms: 700,
            words_per_second: 4.8,
            min_utterance_ms: 500,
            min_chunk_ms: 140,
        }
    }
}

impl NarrationSettings {
    /// Load settings from a JSON file, filling missing fields with defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        settings.validate()?;
        info!("[CONFIG] Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Reject degenerate values that would break scheduling.
    pub fn validate(&self) -> Result<()> {
        if self.caption_words == 0 {
            anyhow::bail!("caption_words must be positive");
        }
        if self.tts_rate <= 0.0 {
            anyhow::bail!("tts_rate must be positive");
        }
        if self.words_per_second <= 0.0 {
            anyhow::bail!("words_per_second must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = NarrationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.caption_words, 6);
        assert_eq!(settings.inter_fact_gap_ms, 700);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: NarrationSettings =
            serde_json::from_str(r#"{"caption_words": 3, "tts_rate": 1.3}"#).unwrap();
        assert_eq!(settings.caption_words, 3);
        assert!((settings.tts_rate - 1.3).abs() < f32::EPSILON);
        assert_eq!(settings.min_chunk_ms, 140);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let settings = NarrationSettings {
            caption_words: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
