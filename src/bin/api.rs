use finance_intent_router::{
    api::start_server, clock::SystemClock, config::RouterConfig, ledger, router::Router,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Finance Intent Router - API Server");
    info!("Port: {}", api_port);

    let config = RouterConfig::from_env()?;
    let sweep_every = Duration::from_secs(config.session.sweep_interval_seconds);
    let clock = Arc::new(SystemClock);
    let ledger = ledger::from_config(&config, clock.clone())?;

    let router = Arc::new(Router::new(config, ledger, clock)?);
    let _sweeper = router.store().spawn_sweeper(sweep_every);

    info!("Router initialized, starting API server");

    start_server(router, api_port).await?;

    Ok(())
}
