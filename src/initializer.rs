use alloy::primitives::{utils::format_units, U256};
use serde::Serialize;
use tracing::{error, info};

use crate::{config::Config, contracts::TokenMetadataSource, error::Result};

pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl TokenMetadata {
    /// Stand-in for a token that cannot be read yet (often deployed in the same tx as its pool).
    pub fn unknown() -> Self {
        Self {
            symbol: UNKNOWN_SYMBOL.to_string(),
            name: UNKNOWN_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// Best-effort metadata lookup. Never fails.
pub async fn initialize<T>(token: &T, config: &Config) -> TokenMetadata
where
    T: TokenMetadataSource + ?Sized,
{
    let metadata = match fetch_metadata(token).await {
        Ok(metadata) => {
            info!("Bot initialized for token: {} ({})", metadata.name, metadata.symbol);
            metadata
        }
        Err(e) => {
            error!("Initialization error: {}", e);
            info!("Could not get token info. Will continue monitoring for pool creation.");
            TokenMetadata::unknown()
        }
    };

    log_run_summary(config);
    metadata
}

async fn fetch_metadata<T>(token: &T) -> Result<TokenMetadata>
where
    T: TokenMetadataSource + ?Sized,
{
    let symbol = token.symbol().await?;
    let name = token.name().await?;
    let decimals = token.decimals().await?;
    Ok(TokenMetadata {
        symbol,
        name,
        decimals,
    })
}

fn log_run_summary(config: &Config) {
    info!("Wallet address: {}", config.wallet_address());
    info!("Token contract address: {}", config.token_address);
    info!("Amount to spend: {} BNB", format_units(config.amount_in_wei, "ether").unwrap_or_default());
    info!("Priority fee (bribe): {} Gwei", gwei(config.priority_fee_wei));
    info!("Max gas price: {} Gwei", gwei(config.max_gas_price_wei));
    info!("Slippage: {}%", config.slippage_bps as f64 / 100.0);
    if let Some(gas_limit) = config.gas_limit {
        info!("Gas limit: {}", gas_limit);
    }
}

pub(crate) fn gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei").unwrap_or_else(|_| format!("{} wei", wei))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::tests::sample_config, error::SniperError};
    use async_trait::async_trait;

    struct FakeToken {
        symbol: Result<String>,
        name: Result<String>,
        decimals: Result<u8>,
    }

    #[async_trait]
    impl TokenMetadataSource for FakeToken {
        async fn symbol(&self) -> Result<String> {
            self.symbol.clone()
        }

        async fn name(&self) -> Result<String> {
            self.name.clone()
        }

        async fn decimals(&self) -> Result<u8> {
            self.decimals.clone()
        }
    }

    #[tokio::test]
    async fn test_reads_metadata() {
        let token = FakeToken {
            symbol: Ok("CAKE".into()),
            name: Ok("PancakeSwap Token".into()),
            decimals: Ok(18),
        };
        let metadata = initialize(&token, &sample_config()).await;
        assert_eq!(
            metadata,
            TokenMetadata {
                symbol: "CAKE".into(),
                name: "PancakeSwap Token".into(),
                decimals: 18,
            }
        );
    }

    #[tokio::test]
    async fn test_falls_back_when_token_not_deployed() {
        let token = FakeToken {
            symbol: Err(SniperError::Contract("execution reverted".into())),
            name: Ok("never read".into()),
            decimals: Ok(9),
        };
        let metadata = initialize(&token, &sample_config()).await;
        assert_eq!(metadata.symbol, "UNKNOWN");
        assert_eq!(metadata.decimals, 18);
    }

    #[tokio::test]
    async fn test_any_failed_read_falls_back() {
        let token = FakeToken {
            symbol: Ok("TKN".into()),
            name: Ok("Token".into()),
            decimals: Err(SniperError::Network("connection reset".into())),
        };
        assert_eq!(initialize(&token, &sample_config()).await, TokenMetadata::unknown());
    }

    #[test]
    fn test_gwei_formatting() {
        assert_eq!(gwei(3_000_000_000), "3.000000000");
    }
}
