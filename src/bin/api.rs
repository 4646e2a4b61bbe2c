use budget_optimizer_agent::{
    api::{start_server, ApiState},
    config::{init_tracing, AppConfig},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables (.env included)
    let config = AppConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Budget Optimizer Agent - API Server");
    info!("Port: {}", config.port);

    let state = ApiState::default();
    info!(tools = ?state.tools.list(), "Tool registry initialized");

    // Start API server
    start_server(state, config.port).await?;

    Ok(())
}
