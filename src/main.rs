use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kujira_maker::config::Config;
use kujira_maker::engine::worker::Worker;
use kujira_maker::gateway::client::HttpGateway;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "conf/worker.json".into());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, path = %config_path, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let gateway_url = std::env::var("GATEWAY_URL").unwrap_or_else(|_| config.gateway_url.clone());

    info!(
        id = %config.id,
        market = %config.market,
        chain = %config.chain,
        network = %config.network,
        gateway = %gateway_url,
        tick_interval_ms = config.strategy.tick_interval,
        layers = config.strategy.layers.len(),
        "starting market-making worker"
    );

    let gateway = HttpGateway::new(gateway_url);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = Worker::new(config, gateway, shutdown_rx);
    let handle = tokio::spawn(worker.run());

    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received, stopping worker");
    let _ = shutdown_tx.send(true);
    let _ = handle.await;
}
