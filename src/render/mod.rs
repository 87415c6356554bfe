// FACTSHORTS Render Modules
// SRT cue generation and the ffmpeg composition pipeline.

pub mod pipeline;
pub mod srt;

pub use pipeline::{probe_duration, render, RenderJob};
pub use srt::{cues_from_schedules, format_timestamp, to_srt, write_srt, Cue};
