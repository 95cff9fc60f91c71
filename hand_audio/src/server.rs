//! HTTP delivery for the browser variant.
//!
//! Routes:
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/` | `index.html` from the public directory |
//! | GET | `/audio` | the configured audio file, or 404 `Audio file not found` |
//! | POST | `/controls` | `{"hands":[…]}` → frame outcome JSON |
//! | GET | anything else | static file from the public directory |
//!
//! The page and its script are built into the binary and served whenever
//! the public directory has no file of that name.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hand_geometry::Pipeline;
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::source::DetectionJson;

#[derive(Clone, Debug)]
pub struct ServerState {
    pub audio:      PathBuf,
    pub public_dir: PathBuf,
    pub pipeline:   Pipeline,
}

impl ServerState {
    pub fn from_config(cfg: &AppConfig) -> Self {
        ServerState {
            audio:      cfg.audio.clone(),
            public_dir: cfg.server.public_dir.clone(),
            pipeline:   cfg.server.pipeline,
        }
    }
}

type Shared = State<Arc<ServerState>>;

/// Front-end assets shipped with the binary.
const BUILT_IN: &[(&str, &str)] = &[
    ("index.html", include_str!("../public/index.html")),
    ("app.js",     include_str!("../public/app.js")),
];

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/audio", get(audio))
        .route("/controls", post(controls))
        .fallback(static_file)
        .with_state(Arc::new(state))
}

/// Bind `127.0.0.1:<port>` and serve until the process is stopped.
pub async fn serve(cfg: AppConfig) -> Result<(), AppError> {
    let state = ServerState::from_config(&cfg);
    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.server.port));
    let listener = TcpListener::bind(addr).await.map_err(AppError::Server)?;

    info!(
        public = %state.public_dir.display(),
        audio = %state.audio.display(),
        selection = state.pipeline.selection.name(),
        mapping = state.pipeline.mapping.name(),
        "server listening on {}", addr
    );
    let url = format!("http://localhost:{}", cfg.server.port);
    println!("  Server running at {}", url);
    if cfg.server.open_browser {
        match open::that(&url) {
            Ok(()) => info!("browser opened"),
            Err(e) => warn!("failed to open browser ({}); open {} manually", e, url),
        }
    }

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(AppError::Server)
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

async fn index(State(s): Shared, ConnectInfo(peer): ConnectInfo<SocketAddr>) -> Response {
    info!(%peer, "client connected");
    serve_asset(&s.public_dir, "index.html").await
}

/// Streams the audio file from disk.
async fn audio(State(s): Shared) -> Response {
    let opened = match File::open(&s.audio).await {
        Ok(file) => file.metadata().await.map(|meta| (file, meta)),
        Err(e)   => Err(e),
    };
    match opened {
        Ok((file, meta)) if meta.is_file() => {
            let mut resp = (
                [(header::CONTENT_TYPE, content_type(&s.audio))],
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response();
            resp.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
            resp
        }
        other => {
            if let Err(e) = other {
                debug!(path = %s.audio.display(), "audio unavailable: {}", e);
            }
            (StatusCode::NOT_FOUND, "Audio file not found").into_response()
        }
    }
}

async fn controls(State(s): Shared, Json(body): Json<DetectionJson>) -> Response {
    match body.into_frame() {
        Ok(frame) => {
            let outcome = s.pipeline.evaluate(&frame.hands);
            debug!(hands = frame.hands.len(), "{}", outcome.summary());
            Json(outcome).into_response()
        }
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

async fn static_file(State(s): Shared, uri: Uri) -> Response {
    let rel = uri.path().trim_start_matches('/');
    let rel = if rel.is_empty() { "index.html" } else { rel };
    if !Path::new(rel).components().all(|c| matches!(c, Component::Normal(_))) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }
    serve_asset(&s.public_dir, rel).await
}

/// `rel` from the public directory, falling back to the built-in copy.
async fn serve_asset(public_dir: &Path, rel: &str) -> Response {
    let path = public_dir.join(rel);
    if let Ok(bytes) = tokio::fs::read(&path).await {
        return ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response();
    }
    match BUILT_IN.iter().find(|(name, _)| *name == rel) {
        Some((_, text)) => ([(header::CONTENT_TYPE, content_type(&path))], *text).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs"   => "text/javascript",
        "css"          => "text/css",
        "json"         => "application/json",
        "wasm"         => "application/wasm",
        "png"          => "image/png",
        "svg"          => "image/svg+xml",
        "ico"          => "image/x-icon",
        "wav"          => "audio/wav",
        "mp3"          => "audio/mpeg",
        "ogg"          => "audio/ogg",
        "flac"         => "audio/flac",
        _              => "application/octet-stream",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;

    fn state(dir: &Path) -> Shared {
        State(Arc::new(ServerState {
            audio:      dir.join("loop.wav"),
            public_dir: dir.join("public"),
            pipeline:   Pipeline::browser(),
        }))
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn hand_json(thumb: (f64, f64), index_tip: (f64, f64), label: &str) -> String {
        let pts: Vec<String> = (0..21)
            .map(|i| {
                let (x, y) = match i {
                    4 => thumb,
                    8 => index_tip,
                    _ => (0.5, 0.9),
                };
                format!(r#"{{"x":{},"y":{},"z":0.0}}"#, x, y)
            })
            .collect();
        format!(r#"{{"handedness":"{}","score":0.9,"landmarks":[{}]}}"#, label, pts.join(","))
    }

    #[tokio::test]
    async fn missing_audio_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = audio(state(dir.path())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(resp).await, "Audio file not found");
    }

    #[tokio::test]
    async fn audio_is_served_with_its_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loop.wav"), b"RIFFdata").unwrap();
        let resp = audio(state(dir.path())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "8");
        assert_eq!(body_text(resp).await, "RIFFdata");
    }

    #[tokio::test]
    async fn audio_larger_than_one_chunk_arrives_whole() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(dir.path().join("loop.wav"), &data).unwrap();
        let resp = audio(state(dir.path())).await;
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn audio_path_that_is_a_directory_is_404() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("loop.wav")).unwrap();
        let resp = audio(state(dir.path())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn built_in_page_is_served_without_a_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let peer = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50000)));
        let resp = index(state(dir.path()), peer).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("/app.js"));

        let resp = static_file(state(dir.path()), Uri::from_static("/app.js")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/javascript");
        assert!(body_text(resp).await.contains("/controls"));
    }

    #[tokio::test]
    async fn index_and_static_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/index.html"), "<h1>hi</h1>").unwrap();
        fs::write(dir.path().join("public/app.css"), "body{}").unwrap();

        let peer = ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50000)));
        let resp = index(state(dir.path()), peer).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "<h1>hi</h1>");

        let resp = static_file(state(dir.path()), Uri::from_static("/app.css")).await;
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css");

        let resp = static_file(state(dir.path()), Uri::from_static("/nope.js")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn parent_paths_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("secret.txt"), "x").unwrap();
        let resp = static_file(state(dir.path()), Uri::from_static("/../secret.txt")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn controls_maps_two_pinching_hands() {
        let dir = tempfile::tempdir().unwrap();
        let third = 1.0 / 3.0;
        let body = format!(
            r#"{{"hands":[{},{}]}}"#,
            hand_json((third, third), (2.0 * third, third), "Right"),
            hand_json((third, 2.0 * third), (2.0 * third, 2.0 * third), "Left"),
        );
        let body: DetectionJson = serde_json::from_str(&body).unwrap();
        let resp = controls(state(dir.path()), Json(body)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(v["outcome"], "updated");
        assert_eq!(v["controls"]["pitch_semitones"], 0);
        let rate = v["controls"]["playback_rate"].as_f64().unwrap();
        assert!((rate - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn controls_reports_a_single_hand_as_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{"hands":[{}]}}"#, hand_json((0.2, 0.2), (0.4, 0.2), "Right"));
        let body: DetectionJson = serde_json::from_str(&body).unwrap();
        let resp = controls(state(dir.path()), Json(body)).await;
        let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(v["outcome"], "insufficient_points");
        assert_eq!(v["found"], 2);
    }

    #[tokio::test]
    async fn controls_rejects_short_landmark_lists() {
        let dir = tempfile::tempdir().unwrap();
        let body: DetectionJson =
            serde_json::from_str(r#"{"hands":[{"landmarks":[{"x":0.1,"y":0.1}]}]}"#).unwrap();
        let resp = controls(state(dir.path()), Json(body)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("a/index.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("x.mp3")), "audio/mpeg");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn router_builds_from_config() {
        let _ = router(ServerState::from_config(&AppConfig::default()));
    }
}
