use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_stream::stream;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use ryze_api::{ApiError, ApiService, GenerateRequest, RuntimeApi};
use ryze_config::load_config;
use ryze_runtime::{GenerationHandle, RuntimeApp};

#[derive(Clone)]
struct AppState {
    api: Arc<dyn ApiService>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct VersionQuery {
    version: Option<u64>,
}

/// Build the HTTP router around an API service.
pub fn router(api: Arc<dyn ApiService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/versions", get(get_versions).delete(clear_versions))
        .with_state(AppState { api })
}

/// Serve the API; `listen` overrides `server.listen` from the config.
pub async fn run_server(config: PathBuf, listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let config = load_config(&config)
        .with_context(|| format!("load config '{}' failed", config.display()))?;
    let listen = match listen {
        Some(addr) => addr,
        None => config
            .server
            .listen
            .parse()
            .with_context(|| format!("invalid server.listen '{}'", config.server.listen))?,
    };
    let app = RuntimeApp::from_config(config).context("build runtime app failed")?;
    let api: Arc<dyn ApiService> = Arc::new(RuntimeApi::new(app));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!(%listen, "ryze-server listening");
    println!("ryze-server listening on http://{}", listen);
    axum::serve(listener, router(api))
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<
    Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>>,
    (StatusCode, Json<ErrorBody>),
> {
    let Json(request) =
        payload.map_err(|rejection| map_api_error(ApiError::InvalidArgument(rejection.body_text())))?;
    let GenerationHandle {
        mut events, cancel, ..
    } = state.api.generate(request).await.map_err(map_api_error)?;

    // Dropping the response body (client gone) cancels the pipeline.
    let guard = cancel.drop_guard();
    let event_stream = stream! {
        let _guard = guard;
        while let Some(event) = events.recv().await {
            let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
            yield Ok(SseEvent::default().data(payload));
        }
    };

    Ok(Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keepalive"),
    ))
}

async fn get_versions(
    State(state): State<AppState>,
    query: Result<Query<VersionQuery>, QueryRejection>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let Query(query) =
        query.map_err(|rejection| map_api_error(ApiError::InvalidArgument(rejection.body_text())))?;
    match query.version {
        Some(version) => {
            let version = state
                .api
                .get_version(version)
                .await
                .map_err(map_api_error)?;
            Ok(Json(version).into_response())
        }
        None => {
            let list = state.api.list_versions().await.map_err(map_api_error)?;
            Ok(Json(list).into_response())
        }
    }
}

async fn clear_versions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let cleared = state.api.clear_versions().await.map_err(map_api_error)?;
    Ok(Json(cleared))
}

fn map_api_error(err: ApiError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err.code() {
        ryze_api::ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ryze_api::ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ryze_api::ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            code: err.code().as_str().to_string(),
            message: err.to_string(),
        }),
    )
}
