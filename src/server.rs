//! HTTP front end for the board editor.
//!
//! | Route           | Body              | Answer              |
//! |-----------------|-------------------|---------------------|
//! | `GET /`         |                   | compiled lexicon    |
//! | `POST /refish`  | board document    | columns and boards  |
//! | `POST /compare` | comparison request| chapters            |
//! | `GET /health`   |                   | `OK`                |
//!
//! Jobs shell out to foma and block, so they run on the blocking pool.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::boards::RefishRequest;
use crate::compare::CompareRequest;
use crate::config::Config;
use crate::workflow;

struct AppState {
    config: Config,
    lexicon: PathBuf,
}

/// A failed job, answered with its error chain
struct JobError(anyhow::Error);

impl From<anyhow::Error> for JobError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        log::error!("{:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

async fn run_job<T, F>(state: Arc<AppState>, job: F) -> Result<Json<T>, JobError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> anyhow::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || job(&state))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to finish job: {}", e))?;
    Ok(Json(result?))
}

async fn compile_lexicon(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, JobError> {
    run_job(state, |s| workflow::compile_lexicon(&s.config, &s.lexicon)).await
}

async fn refish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefishRequest>,
) -> Result<impl IntoResponse, JobError> {
    run_job(state, move |s| workflow::refish_document(&s.config, request, &s.lexicon)).await
}

async fn compare(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, JobError> {
    run_job(state, move |s| workflow::compare_transducers(&s.config, &request, &s.lexicon)).await
}

/// Health check handler for the /health endpoint.
async fn health_check() -> &'static str {
    "OK"
}

pub fn router(config: Config, lexicon: PathBuf) -> Router {
    let state = Arc::new(AppState { config, lexicon });
    Router::new()
        .route("/", get(compile_lexicon))
        .route("/refish", post(refish))
        .route("/compare", post(compare))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Listen on `port` until the process is stopped
pub async fn serve(config: Config, lexicon: PathBuf, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind port {}: {}", port, e))?;
    log::info!("Serving {} on http://0.0.0.0:{}", lexicon.display(), port);
    axum::serve(listener, router(config, lexicon))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to serve: {}", e))
}
