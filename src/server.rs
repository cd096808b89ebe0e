use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::analysis::{AnalysisError, NumberProperties, Orchestrator};

enum ServerError {
    /// Path segment was not a 64-bit integer; the orchestrator is never called.
    InvalidNumber { input: String, details: String },
    Analysis { input: String, error: AnalysisError },
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error, details, input) = match self {
            ServerError::InvalidNumber { input, details } => {
                (StatusCode::BAD_REQUEST, "Invalid number", details, input)
            }
            ServerError::Analysis { input, error } => {
                let status = if error.is_invalid_input() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, "Analysis failed", error.details(), input)
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": error, "details": details, "input": input })),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub start_local: String,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            start_local: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/api/number/analyze/{number}", get(analyze_number))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let orchestrator = state.orchestrator.clone();
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("🚀 Number Analyzer listening at http://{}", addr);
    info!("API endpoint example: http://{}/api/number/analyze/16", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            orchestrator.shutdown();
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn analyze_number(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<NumberProperties>, ServerError> {
    let number: i64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ServerError::InvalidNumber {
        details: format!("'{}' is not a valid 64-bit integer: {}", raw, e),
        input: raw.clone(),
    })?;

    match state.orchestrator.analyze(number).await {
        Ok(properties) => Ok(Json(properties)),
        Err(error) => {
            error!("Analysis failed for {}: {}", number, error.details());
            Err(ServerError::Analysis { input: number.to_string(), error })
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.orchestrator.is_shut_down() { "shutting_down" } else { "ok" };
    Json(serde_json::json!({ "status": status, "since": state.start_local }))
}

async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    // NOTE: HTML content uses double braces {{ }} for escaping in format! macro.
    Html(format!(r####"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Number Analyzer</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, sans-serif; background: #0f0f0f; color: #e0e0e0; max-width: 640px; margin: 60px auto; padding: 0 20px; }}
        .since {{ font-size: 11px; color: #666; font-family: monospace; }}
        form {{ display: flex; gap: 10px; margin: 20px 0; }}
        input {{ flex: 1; background: #1a1a1a; border: 1px solid #333; color: #fff; padding: 8px; border-radius: 4px; }}
        button {{ background: #222; border: 1px solid #333; color: #ccc; padding: 8px 14px; border-radius: 4px; cursor: pointer; }}
        pre {{ background: #111; padding: 15px; border-radius: 6px; border: 1px solid #333; }}
        .error {{ color: #ff3b30; }}
    </style>
</head>
<body>
    <h1>Number Analyzer</h1>
    <div class="since">Up since {}</div>
    <form id="analyze-form">
        <input type="text" id="number-input" placeholder="Enter a non-negative integer" autocomplete="off">
        <button type="submit">Analyze</button>
    </form>
    <pre id="result">Results appear here.</pre>
    <script>
        const result = document.getElementById('result');
        document.getElementById('analyze-form').addEventListener('submit', async (e) => {{
            e.preventDefault();
            const value = document.getElementById('number-input').value.trim();
            if (!value) return;
            const res = await fetch('/api/number/analyze/' + encodeURIComponent(value));
            const body = await res.json();
            result.className = res.ok ? '' : 'error';
            result.textContent = JSON.stringify(body, null, 2);
        }});
    </script>
</body>
</html>"####, state.start_local))
}
