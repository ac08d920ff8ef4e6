use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use campus_core::logging::{LogDestination, init_logging};
use campus_core::pipeline::{PipelineResult, run_pipeline};
use campus_core::{GigaChatClient, Settings};

/// Uploads can carry multi-sheet workbooks; keep the limit generous.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    settings: Settings,
    upload_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    println!(
        "Server start (local): {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f %z")
    );
    init_logging(LogDestination::FileAndStderr)?;

    let settings = Settings::from_env()?;
    let upload_dir = PathBuf::from(
        std::env::var("CAMPUS_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
    );
    std::fs::create_dir_all(&upload_dir)?;

    let bind = std::env::var("CAMPUS_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let addr: SocketAddr = bind.parse()?;

    let app = router(AppState {
        settings,
        upload_dir,
    });

    info!(%addr, "campus schedule uploader listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    // The browser frontend is served elsewhere; allow it in.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// POST /upload — accepts one table file, runs it through the extraction
/// pipeline, and returns the pipeline result as JSON.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PipelineResult>, (StatusCode, Json<Value>)> {
    let mut saved: Option<(String, PathBuf)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("malformed multipart body: {err}")))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let file_name = field
            .file_name()
            .map(sanitize_file_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "upload.bin".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|err| bad_request(format!("failed to read upload: {err}")))?;

        let path = state.upload_dir.join(&file_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|err| internal_error(&file_name, format!("failed to store upload: {err}")))?;

        info!(file = %file_name, bytes = data.len(), "stored uploaded table");
        saved = Some((file_name, path));
        break;
    }

    let Some((file_name, path)) = saved else {
        return Err(bad_request("missing file field".to_string()));
    };

    let client = GigaChatClient::new(state.settings.clone())
        .map_err(|err| internal_error(&file_name, err.to_string()))?;

    match run_pipeline(&path, &client).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            error!(file = %file_name, error = %err, "pipeline aborted");
            Err(internal_error(&file_name, err.to_string()))
        }
    }
}

/// Client-supplied names may carry path components; keep only the last one.
fn sanitize_file_name(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "error": message})),
    )
}

fn internal_error(file: &str, message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"status": "error", "error": message, "file": file})),
    )
}
