//! HTTP API and WebSocket stream over the dashboard state.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::dashboard::DashboardState;

#[derive(Clone)]
struct WebState {
    state: Arc<RwLock<DashboardState>>,
    stream_interval: Duration,
}

pub struct FileServer {
    bind_addr: String,
    state: Arc<RwLock<DashboardState>>,
    stream_interval: Duration,
}

impl FileServer {
    pub fn new(
        bind_addr: String,
        state: Arc<RwLock<DashboardState>>,
        stream_interval: Duration,
    ) -> Self {
        Self {
            bind_addr,
            state,
            stream_interval,
        }
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), anyhow::Error> {
        let app = router(self.state, self.stream_interval);
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "HTTP API listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;
        Ok(())
    }
}

/// Routes for the dashboard API.
pub fn router(state: Arc<RwLock<DashboardState>>, stream_interval: Duration) -> Router {
    let web_state = WebState {
        state,
        stream_interval,
    };

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/agent-systems", get(api_agent_systems))
        .route("/api/agent-systems/:id/workflow", get(api_workflow))
        .route("/api/agent-systems/:id/graph", get(api_graph))
        .route("/api/stream", get(api_stream))
        .layer(CorsLayer::permissive())
        .with_state(web_state)
}

fn not_found(system_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "unknown agent system",
            "id": system_id,
        })),
    )
        .into_response()
}

async fn api_health(State(web): State<WebState>) -> Json<serde_json::Value> {
    let s = web.state.read().await;
    Json(serde_json::json!({
        "ok": true,
        "systems": s.len(),
        "ticks": s.ticks(),
        "startedAt": s.started_at(),
    }))
}

async fn api_agent_systems(State(web): State<WebState>) -> Json<serde_json::Value> {
    let s = web.state.read().await;
    Json(serde_json::json!({ "systems": s.summaries() }))
}

async fn api_workflow(
    State(web): State<WebState>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    let s = web.state.read().await;
    match s.session(&id) {
        Some(session) => Json(session.workflow().clone()).into_response(),
        None => not_found(&id),
    }
}

async fn api_graph(State(web): State<WebState>, AxumPath(id): AxumPath<String>) -> Response {
    let s = web.state.read().await;
    match s.session(&id) {
        Some(session) => Json(session.graph().clone()).into_response(),
        None => not_found(&id),
    }
}

async fn api_stream(ws: WebSocketUpgrade, State(web): State<WebState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_loop(socket, web.state, web.stream_interval))
}

/// Snapshot of every session as pushed on the stream.
pub async fn snapshot_payload(state: &RwLock<DashboardState>) -> serde_json::Value {
    let s = state.read().await;
    let systems: Vec<serde_json::Value> = s
        .sessions()
        .map(|session| {
            serde_json::json!({
                "summary": session.summary(),
                "workflow": session.workflow(),
                "graph": session.graph(),
            })
        })
        .collect();
    serde_json::json!({
        "type": "snapshot",
        "time": chrono::Utc::now(),
        "ticks": s.ticks(),
        "activeTasks": s.active_task_count(),
        "systems": systems,
    })
}

async fn stream_loop(
    mut socket: WebSocket,
    state: Arc<RwLock<DashboardState>>,
    stream_interval: Duration,
) {
    let mut interval = tokio::time::interval(stream_interval);
    loop {
        interval.tick().await;
        let payload = snapshot_payload(&state).await.to_string();
        if socket.send(Message::Text(payload)).await.is_err() {
            tracing::debug!("Stream client disconnected");
            break;
        }
    }
}
