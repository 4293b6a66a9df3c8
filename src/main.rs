use anyhow::{Context, Result};
use dotenv::dotenv;
use tracing::{error, info};

use pancake_sniper::{chain, initialize, logging, BuyExecutor, BuyResult, Config, PairMonitor};

const RULE: &str = "------------------------";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Logging needs the log path, so a config error goes to stderr only.
    let config = Config::from_env().context("Invalid configuration")?;
    logging::init(&config.log_file)?;

    info!("{}", RULE);
    info!("PancakeSwap Sniper Bot Started");
    info!("{}", RULE);

    let client = chain::connect(&config)
        .await
        .context("Failed to connect to BSC")?;

    let token = client.token(config.token_address);
    let metadata = initialize(&token, &config).await;

    let subscription = match client.subscribe_pair_created(config.factory_address).await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("Bot execution failed: {}", e);
            client.shutdown();
            return Err(e).context("Cannot subscribe to PairCreated");
        }
    };

    let router = client.router(config.router_address);
    let executor = BuyExecutor::new(&client, &router, &config);
    let monitor = PairMonitor::new(config.token_address, config.wbnb_address);

    let result = monitor.run(subscription, &executor).await;
    report(&result, &metadata.symbol);

    client.shutdown();
    info!("Bot execution completed");
    Ok(())
}

fn report(result: &BuyResult, symbol: &str) {
    info!("{}", RULE);
    if result.success {
        info!("Buy completed successfully! ({})", symbol);
        if let Some(hash) = result.tx_hash {
            info!("Transaction hash: {}", hash);
        }
        if let Some(block) = result.block_number {
            info!("Block number: {}", block);
        }
    } else {
        info!("Buy failed!");
        if let Some(e) = &result.error {
            info!("Error: {}", e);
        }
    }
    info!("{}", RULE);

    match serde_json::to_string(result) {
        Ok(json) => info!(target: "outcome", "{}", json),
        Err(e) => error!("Cannot serialize buy result: {}", e),
    }
}
