// FACTSHORTS Duration Estimator
// Heuristic speech timing used when the engine emits no progress events.

use crate::caption::chunker::Chunk;
use crate::config::NarrationSettings;

/// One fallback display slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledChunk {
    pub chunk: Chunk,
    pub duration_ms: u64,
}

/// Precomputed fallback timing plan for one utterance.
#[derive(Debug, Clone, Default)]
pub struct ChunkSchedule {
    pub entries: Vec<ScheduledChunk>,
}

impl ChunkSchedule {
    pub fn total_ms(&self) -> u64 {
        self.entries.iter().map(|e| e.duration_ms).sum()
    }

    /// Offset (ms from utterance start) at which entry `i` should display.
    pub fn offset_ms(&self, i: usize) -> u64 {
        self.entries[..i].iter().map(|e| e.duration_ms).sum()
    }
}

/// Estimate how long the engine will take to speak `text`.
///
/// Baseline 4.8 words/sec at rate 1.0 (settings-overridable), scaled by the
/// caller's rate multiplier and floored so very short text never produces a
/// degenerate zero-length schedule. This is an approximation only; observed
/// engine boundaries always override it.
pub fn estimate_ms(text: &str, rate: f32, settings: &NarrationSettings) -> u64 {
    let words = text.split_whitespace().count();
    let wps = (settings.words_per_second * rate.max(0.01)) as f64;
    let est = ((words as f64 / wps) * 1000.0).ceil() as u64;
    est.max(settings.min_utterance_ms)
}

/// Apportion `total_ms` across chunks in proportion to word count.
///
/// A chunk with more words gets a longer slot; every slot is floored at
/// `min_chunk_ms` so no caption flashes unreadably. Rounding remainders go
/// to the final chunk, keeping the sum within `entries.len()` ms of the
/// estimate whenever the floor is not binding.
pub fn build_schedule(chunks: &[Chunk], total_ms: u64, settings: &NarrationSettings) -> ChunkSchedule {
    if chunks.is_empty() {
        return ChunkSchedule::default();
    }

    // Degenerate chunks (empty utterance) still get weight so they hold a slot.
    let weights: Vec<u64> = chunks.iter().map(|c| c.word_count.max(1) as u64).collect();
    let total_weight: u64 = weights.iter().sum();

    let mut entries = Vec::with_capacity(chunks.len());
    let mut allocated = 0u64;
    for (i, (chunk, weight)) in chunks.iter().zip(&weights).enumerate() {
        let share = if i + 1 == chunks.len() {
            total_ms.saturating_sub(allocated)
        } else {
            total_ms * weight / total_weight
        };
        let duration_ms = share.max(settings.min_chunk_ms);
        allocated += share;
        entries.push(ScheduledChunk {
            chunk: chunk.clone(),
            duration_ms,
        });
    }

    ChunkSchedule { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::chunker::chunk;

    #[test]
    fn test_estimate_matches_heuristic() {
        let settings = NarrationSettings::default();
        // 4 words / 4.8 wps = 833.3ms, ceiled
        assert_eq!(estimate_ms("The quick brown fox", 1.0, &settings), 834);
    }

    #[test]
    fn test_estimate_scales_with_rate() {
        let settings = NarrationSettings::default();
        let slow = estimate_ms("one two three four five six seven eight", 0.85, &settings);
        let fast = estimate_ms("one two three four five six seven eight", 1.3, &settings);
        assert!(slow > fast);
    }

    #[test]
    fn test_estimate_floors_short_text() {
        let settings = NarrationSettings::default();
        assert_eq!(estimate_ms("hi", 1.0, &settings), settings.min_utterance_ms);
        assert_eq!(estimate_ms("", 1.0, &settings), settings.min_utterance_ms);
    }

    #[test]
    fn test_schedule_conserves_total() {
        let settings = NarrationSettings::default();
        let chunks = chunk("one two three four five six seven", 3);
        let schedule = build_schedule(&chunks, 2100, &settings);
        let sum = schedule.total_ms();
        assert!(
            sum.abs_diff(2100) <= chunks.len() as u64,
            "sum {} drifted from total",
            sum
        );
    }

    #[test]
    fn test_schedule_weights_by_word_count() {
        let settings = NarrationSettings::default();
        // 3-word chunks then a 1-word remainder
        let chunks = chunk("one two three four five six seven", 3);
        let schedule = build_schedule(&chunks, 7000, &settings);
        assert!(schedule.entries[0].duration_ms > schedule.entries[2].duration_ms);
    }

    #[test]
    fn test_schedule_applies_floor() {
        let settings = NarrationSettings::default();
        let chunks = chunk("a b c d e f g h", 2);
        let schedule = build_schedule(&chunks, 100, &settings);
        for entry in &schedule.entries {
            assert!(entry.duration_ms >= settings.min_chunk_ms);
        }
    }

    #[test]
    fn test_schedule_offsets_are_cumulative() {
        let settings = NarrationSettings::default();
        let chunks = chunk("one two three four five six", 2);
        let schedule = build_schedule(&chunks, 3000, &settings);
        assert_eq!(schedule.offset_ms(0), 0);
        assert_eq!(
            schedule.offset_ms(2),
            schedule.entries[0].duration_ms + schedule.entries[1].duration_ms
        );
    }
}
