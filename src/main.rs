//! Number Analyzer server entry point.

use anyhow::Result;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

use number_analyzer::analysis::{NumberAnalyzer, Orchestrator};
use number_analyzer::server::{run_server, AppState};
use number_analyzer::utils::init_telemetry;
use number_analyzer::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = ServerConfig::from_env();
    let _telemetry = init_telemetry("number_analyzer", config.otlp_enabled)?;

    info!(
        "Join timeout {}ms, at most {} concurrent checks",
        config.orchestrator.join_timeout.as_millis(),
        config.orchestrator.max_concurrent_checks
    );

    let orchestrator = Arc::new(Orchestrator::with_config(
        Arc::new(NumberAnalyzer::new()),
        Handle::current(),
        config.orchestrator,
    ));

    run_server(AppState::new(orchestrator), &config.bind_addr).await
}
