// FACTSHORTS Render Pipeline
// Composes the final short: source video on top, black caption bar below,
// voice track mixed with optional low-volume music, optional burned-in SRT.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

/// Inputs for one ffmpeg composition.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub video: PathBuf,
    pub voice: PathBuf,
    pub music: Option<PathBuf>,
    pub subtitles: Option<PathBuf>,
    pub output: PathBuf,
}

const MUSIC_VOLUME: f32 = 0.15;
const SUBTITLE_STYLE: &str = "FontName=Arial,Fontsize=48,PrimaryColour=&H00FFFFFF,\
BackColour=&H00000000,BorderStyle=3,Outline=2,Alignment=2";

/// Get a media file's duration in seconds using ffprobe, with a timeout so
/// a wedged probe cannot hang a render.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = tokio::time::timeout(
        tokio::time::Duration::from_secs(10),
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output(),
    )
    .await
    .context("ffprobe duration check timed out")?
    .context("Failed to execute ffprobe")?;

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse ffprobe duration for {:?}", path))
}

/// Build the filter_complex string for a job.
///
/// Video: scale the source into the top 720x768 panel, stack a black
/// 720x512 bar beneath it for captions (1280 total height), then burn in
/// subtitles when present. Audio: voice as-is, music ducked to a fixed low
/// volume and mixed under it.
pub fn build_filter_graph(job: &RenderJob) -> String {
    let mut graph = String::from(
        "[0:v]scale=720:768:force_original_aspect_ratio=decrease,\
         pad=720:768:(ow-iw)/2:(oh-ih)/2,setsar=1[topv];\
         color=size=720x512:color=black[bar];\
         [topv][bar]vstack=inputs=2[stacked]",
    );

    if let Some(srt) = &job.subtitles {
        let srt_path = srt.to_string_lossy().replace('\\', "/");
        graph.push_str(&format!(
            ";[stacked]subtitles={}:force_style='{}'[vout]",
            srt_path, SUBTITLE_STYLE
        ));
    } else {
        graph.push_str(";[stacked]null[vout]");
    }

    if job.music.is_some() {
        graph.push_str(&format!(
            ";[2:a]volume={}[music_adj];\
             [1:a][music_adj]amix=inputs=2:dropout_transition=0[finalaudio]",
            MUSIC_VOLUME
        ));
    } else {
        graph.push_str(";[1:a]anull[finalaudio]");
    }

    graph
}

/// Run the composition. The output runs as long as the voice track plus a
/// short tail; the source video loops if it is shorter than that.
pub async fn render(job: &RenderJob) -> Result<PathBuf> {
    let voice_duration = probe_duration(&job.voice).await?;
    let total_duration = voice_duration + 0.7;
    info!(
        "[RENDER] Composing {:?} ({:.1}s of narration)",
        job.output, voice_duration
    );

    let filter_graph = build_filter_graph(job);

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y");
    cmd.args(["-stream_loop", "-1", "-i"]).arg(&job.video);
    cmd.arg("-i").arg(&job.voice);
    if let Some(music) = &job.music {
        cmd.args(["-stream_loop", "-1", "-i"]).arg(music);
    }
    cmd.args(["-filter_complex", &filter_graph])
        .args(["-map", "[vout]", "-map", "[finalaudio]"])
        .args(["-t", &format!("{:.3}", total_duration)])
        .args(["-r", "30"])
        .args(["-movflags", "+faststart"])
        .args(["-preset", "veryfast"])
        .args(["-crf", "23"])
        .arg(&job.output);

    let status = cmd
        .status()
        .await
        .context("Failed to execute ffmpeg")?;

    if status.success() {
        info!("[RENDER] Final output: {:?}", job.output);
        Ok(job.output.clone())
    } else {
        error!("[RENDER] ffmpeg composition failed.");
        anyhow::bail!("ffmpeg composition failed for {:?}", job.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_job() -> RenderJob {
        RenderJob {
            video: PathBuf::from("/tmp/slime.mp4"),
            voice: PathBuf::from("/tmp/voice.wav"),
            music: None,
            subtitles: None,
            output: PathBuf::from("/tmp/short.mp4"),
        }
    }

    #[test]
    fn test_filter_graph_voice_only() {
        let graph = build_filter_graph(&base_job());
        assert!(graph.contains("vstack=inputs=2[stacked]"));
        assert!(graph.contains("[1:a]anull[finalaudio]"));
        assert!(!graph.contains("amix"));
        assert!(!graph.contains("subtitles"));
    }

    #[test]
    fn test_filter_graph_with_music() {
        let mut job = base_job();
        job.music = Some(PathBuf::from("/tmp/music.mp3"));
        let graph = build_filter_graph(&job);
        assert!(graph.contains("[2:a]volume=0.15[music_adj]"));
        assert!(graph.contains("amix=inputs=2"));
    }

    #[test]
    fn test_filter_graph_with_subtitles() {
        let mut job = base_job();
        job.subtitles = Some(PathBuf::from("/tmp/captions.srt"));
        let graph = build_filter_graph(&job);
        assert!(graph.contains("subtitles=/tmp/captions.srt"));
        assert!(graph.contains("force_style"));
        // subtitles replace the passthrough video tail
        assert!(!graph.contains(";[stacked]null[vout]"));
    }
}
