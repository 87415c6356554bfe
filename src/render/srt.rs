// FACTSHORTS SRT Writer
// Turns per-utterance chunk schedules into a standard SubRip cue track.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::caption::ChunkSchedule;

/// One subtitle cue, in absolute milliseconds from track start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Lay the schedules out on a single timeline: chunks within an utterance
/// are contiguous, utterances are separated by `gap_ms` of silence.
pub fn cues_from_schedules(schedules: &[ChunkSchedule], gap_ms: u64) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut cursor = 0u64;
    for (i, schedule) in schedules.iter().enumerate() {
        for entry in &schedule.entries {
            let start_ms = cursor;
            let end_ms = cursor + entry.duration_ms;
            cues.push(Cue {
                start_ms,
                end_ms,
                text: entry.chunk.text.clone(),
            });
            cursor = end_ms;
        }
        if i + 1 < schedules.len() {
            cursor += gap_ms;
        }
    }
    cues
}

/// SubRip timestamp: `HH:MM:SS,mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Serialize cues as SRT text with 1-based numbering.
pub fn to_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_ms),
            format_timestamp(cue.end_ms),
            cue.text
        ));
    }
    out
}

pub async fn write_srt(path: &Path, cues: &[Cue]) -> Result<()> {
    tokio::fs::write(path, to_srt(cues))
        .await
        .with_context(|| format!("Failed to write SRT file {:?}", path))?;
    info!("[SRT] Wrote {} cues to {:?}", cues.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::{build_schedule, chunk};
    use crate::config::NarrationSettings;

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(0), "00:00:00,000");
        assert_eq!(format_timestamp(834), "00:00:00,834");
        assert_eq!(format_timestamp(61_005), "00:01:01,005");
        assert_eq!(format_timestamp(3_600_000 + 90_250), "01:01:30,250");
    }

    #[test]
    fn test_cues_respect_gap_between_utterances() {
        let settings = NarrationSettings::default();
        let a = build_schedule(&chunk("one two three four", 2), 1000, &settings);
        let b = build_schedule(&chunk("five six", 2), 600, &settings);
        let cues = cues_from_schedules(&[a.clone(), b], 700);

        assert_eq!(cues.len(), 3);
        // contiguous within utterance
        assert_eq!(cues[0].end_ms, cues[1].start_ms);
        // gap between utterances
        assert_eq!(cues[2].start_ms, a.total_ms() + 700);
    }

    #[test]
    fn test_srt_serialization() {
        let cues = vec![
            Cue {
                start_ms: 0,
                end_ms: 900,
                text: "Honey never".to_string(),
            },
            Cue {
                start_ms: 900,
                end_ms: 1500,
                text: "spoils.".to_string(),
            },
        ];
        let srt = to_srt(&cues);
        let expected = "1\n00:00:00,000 --> 00:00:00,900\nHoney never\n\n\
                        2\n00:00:00,900 --> 00:00:01,500\nspoils.\n\n";
        assert_eq!(srt, expected);
    }
}
