//! Axum router and all HTTP handlers for dwp-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use dwp_runtime::PassOutcome;
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::{
    api_types::{HealthResponse, LastPassResponse, PassErrorResponse},
    state::{execute_pass, AppState, BusMsg, ExecuteError, PassTrigger},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are not applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/passes/last", get(last_pass))
        .route("/v1/passes/run", post(run_pass_now))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = st.snapshot().await;
    let _ = st.bus.send(BusMsg::Status(snap.clone()));
    (StatusCode::OK, Json(snap))
}

// ---------------------------------------------------------------------------
// GET /v1/passes/last
// ---------------------------------------------------------------------------

pub(crate) async fn last_pass(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let report = st.last_report.read().await.clone();
    (StatusCode::OK, Json(LastPassResponse { report }))
}

// ---------------------------------------------------------------------------
// POST /v1/passes/run
// ---------------------------------------------------------------------------

/// Run a pass now, outside the schedule.
///
/// 409 when a pass is already in flight; 502 when the order source cannot
/// list pending orders.
pub(crate) async fn run_pass_now(State(st): State<Arc<AppState>>) -> Response {
    info!("passes/run");
    match execute_pass(&st, PassTrigger::Manual).await {
        Ok(PassOutcome::Completed(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(PassOutcome::SkippedOverlap) => (
            StatusCode::CONFLICT,
            Json(PassErrorResponse {
                error: "PASS_ALREADY_RUNNING".to_string(),
                detail: None,
            }),
        )
            .into_response(),
        Err(e @ ExecuteError::Pass(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(PassErrorResponse {
                error: "PASS_FAILED".to_string(),
                detail: Some(e.to_string()),
            }),
        )
            .into_response(),
        Err(e @ ExecuteError::Join(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PassErrorResponse {
                error: "PASS_FAILED".to_string(),
                detail: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Status(_) => "status",
                    BusMsg::PassCompleted(_) => "pass",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
