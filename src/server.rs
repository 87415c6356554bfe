// FACTSHORTS Render Service
// HTTP counterpart of the CLI render path: accepts a JSON job, stitches the
// short, serves the result.

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Component, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt; // For oneshot
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::caption::{build_schedule, chunk, estimate_ms};
use crate::config::NarrationSettings;
use crate::render::{cues_from_schedules, render, write_srt, RenderJob};

pub struct ServiceState {
    pub settings: NarrationSettings,
    pub output_dir: PathBuf,
}

pub type AppState = Arc<ServiceState>;

#[derive(Deserialize)]
pub struct RenderRequest {
    pub video: String,
    pub voice: String,
    pub music: Option<String>,
    /// Utterances to chunk, schedule and burn in as subtitles.
    pub captions: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct RenderResponse {
    pub output: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
struct StreamParams {
    path: String,
}

const ALLOWED_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "mov", "avi", "webm", "mp3", "wav", "flac", "aac", "ogg", "m4a",
];

/// Reject traversal and non-media paths before touching the filesystem.
fn validate_media_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);

    for component in path.components() {
        if let Component::ParentDir = component {
            return Err("Access denied: Path traversal detected".to_string());
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext {
        Some(e) if ALLOWED_EXTENSIONS.contains(&e.as_str()) => Ok(path),
        Some(e) => Err(format!("Access denied: Invalid file extension '.{}'", e)),
        None => Err("Access denied: No file extension provided".to_string()),
    }
}

pub async fn start_server(port: u16, state: AppState) {
    let app = Router::new()
        .route("/api/health", get(get_health))
        .route("/api/render", post(handle_render))
        .route("/api/stream", get(stream_media))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(
        "[SERVER] Render service listening on http://127.0.0.1:{}",
        port
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("[SERVER] Failed to bind port {}: {}", port, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("[SERVER] Server error: {}", e);
    }
}

async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[axum::debug_handler]
async fn handle_render(
    State(state): State<AppState>,
    Json(payload): Json<RenderRequest>,
) -> impl IntoResponse {
    let video = match validate_media_path(&payload.video) {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };
    let voice = match validate_media_path(&payload.voice) {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };
    let music = match payload.music.as_deref().map(validate_media_path) {
        Some(Ok(p)) => Some(p),
        Some(Err(e)) => return bad_request(e),
        None => None,
    };

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    if let Err(e) = tokio::fs::create_dir_all(&state.output_dir).await {
        return internal_error(format!("Failed to create output dir: {}", e));
    }
    let output = state.output_dir.join(format!("short-{}.mp4", stamp));

    // Captions become a burned-in SRT laid out on the estimated schedule.
    let mut subtitles = None;
    if let Some(captions) = &payload.captions {
        let schedules: Vec<_> = captions
            .iter()
            .map(|text| {
                let chunks = chunk(text, state.settings.caption_words);
                let total = estimate_ms(text, state.settings.tts_rate, &state.settings);
                build_schedule(&chunks, total, &state.settings)
            })
            .collect();
        let cues = cues_from_schedules(&schedules, state.settings.inter_fact_gap_ms);
        let srt_path = state.output_dir.join(format!("captions-{}.srt", stamp));
        if let Err(e) = write_srt(&srt_path, &cues).await {
            return internal_error(format!("Failed to write captions: {}", e));
        }
        subtitles = Some(srt_path);
    }

    let job = RenderJob {
        video,
        voice,
        music,
        subtitles,
        output,
    };

    match render(&job).await {
        Ok(path) => (
            StatusCode::OK,
            Json(RenderResponse {
                output: path.to_string_lossy().into_owned(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("[SERVER] Render failed: {}", e);
            internal_error(e.to_string())
        }
    }
}

async fn stream_media(Query(params): Query<StreamParams>, req: Request) -> impl IntoResponse {
    let path = match validate_media_path(&params.path) {
        Ok(p) => p,
        Err(e) => {
            error!("[SERVER] Stream access denied: {}", e);
            return (StatusCode::FORBIDDEN, e).into_response();
        }
    };

    if !path.exists() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let service = tower_http::services::ServeFile::new(path);
    match service.oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(err) => {
            error!("[SERVER] ServeFile error: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn bad_request(message: String) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}

fn internal_error(message: String) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_media_path() {
        // Valid cases
        assert!(validate_media_path("video.mp4").is_ok());
        assert!(validate_media_path("voice.wav").is_ok());
        assert!(validate_media_path("/abs/path/to/music.mp3").is_ok());
        assert!(validate_media_path("nested/folder/clip.webm").is_ok());

        // Invalid cases
        assert!(validate_media_path("../secret.txt").is_err());
        assert!(validate_media_path("../../etc/passwd").is_err());
        assert!(validate_media_path("/etc/passwd").is_err()); // No extension
        assert!(validate_media_path("script.sh").is_err());
        assert!(validate_media_path("..").is_err());
        assert!(validate_media_path("").is_err());
    }
}
