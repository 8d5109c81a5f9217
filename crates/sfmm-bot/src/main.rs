//! sfmm market-making agent - Entry Point

use anyhow::Result;
use clap::Parser;
use sfmm_bot::{AppConfig, Scheduler};
use sfmm_client::retry::retry_transport;
use sfmm_client::{RetryingClient, StockfighterClient};
use sfmm_mm::OrderLifecycleManager;
use tracing::{info, warn};

/// Polling market maker for the Stockfighter simulated exchange
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SFMM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    sfmm_telemetry::init_logging()?;

    info!("Starting sfmm v{}", env!("CARGO_PKG_VERSION"));

    let config_path = AppConfig::resolve_path(args.config);
    info!(config_path = %config_path, "Loading configuration");

    let config = AppConfig::from_file(&config_path)?;
    info!(
        base_url = %config.exchange.base_url,
        instance_id = ?config.market.instance_id,
        "Configuration loaded"
    );

    let client = StockfighterClient::new(config.exchange.client_config()?)?;

    // Bootstrap: a configured instance is restarted and defines the market.
    let (venue, symbol, account) = match config.market.instance_id {
        Some(instance_id) => {
            let instance = retry_transport(&config.retry, "restart_instance", || {
                client.restart_instance(instance_id)
            })
            .await?;
            let (venue, symbol) = instance.primary_market()?;
            (venue, symbol, instance.account)
        }
        None => (
            config.market.venue.clone(),
            config.market.symbol.clone(),
            config.market.account.clone(),
        ),
    };

    if !client.venue_heartbeat(&venue).await {
        warn!(venue = %venue, "Venue heartbeat failed, starting anyway");
    }
    info!(venue = %venue, symbol = %symbol, account = %account, "Market selected");

    let services = RetryingClient::new(client, config.retry.clone());
    let manager = OrderLifecycleManager::new(venue, symbol, account);
    let mut scheduler = Scheduler::new(
        services,
        manager,
        config.maker.clone(),
        config.scheduler.clone(),
    );

    scheduler.run().await?;

    info!("Shutdown complete");
    Ok(())
}
