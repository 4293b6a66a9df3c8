use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

use crate::{
    chain::ChainReader,
    config::Config,
    contracts::{Confirmation, SwapOrder, SwapRouter},
    error::{Result, SniperError},
    initializer::gwei,
};

const BPS_DENOMINATOR: u32 = 10_000;

/// Terminal outcome of the single buy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyResult {
    pub success: bool,
    pub tx_hash: Option<TxHash>,
    pub block_number: Option<u64>,
    pub error: Option<SniperError>,
}

impl BuyResult {
    pub fn failed(error: SniperError) -> Self {
        Self {
            success: false,
            tx_hash: None,
            block_number: None,
            error: Some(error),
        }
    }

    fn from_confirmation(confirmation: Confirmation) -> Self {
        let error = (!confirmation.success).then(|| {
            SniperError::Contract(format!(
                "Transaction {} reverted in block {}",
                confirmation.tx_hash,
                confirmation
                    .block_number
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            ))
        });
        Self {
            success: confirmation.success,
            tx_hash: Some(confirmation.tx_hash),
            block_number: confirmation.block_number,
            error,
        }
    }
}

#[async_trait]
pub trait Buyer: Send + Sync {
    async fn buy(&self, token: Address) -> BuyResult;
}

/// Spot price plus a fixed bribe, never above the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPricing {
    pub spot: u128,
    pub priority_fee: u128,
    pub ceiling: u128,
    pub effective: u128,
}

impl GasPricing {
    pub fn compute(spot: u128, priority_fee: u128, ceiling: u128) -> Self {
        Self {
            spot,
            priority_fee,
            ceiling,
            effective: spot.saturating_add(priority_fee).min(ceiling),
        }
    }

    pub fn is_capped(&self) -> bool {
        self.spot.saturating_add(self.priority_fee) > self.ceiling
    }
}

/// `quoted * (1 - slippage)`. A tolerance of 100% or more disables the check.
///
/// `getAmountsOut` ignores transfer tax, so for fee-on-transfer tokens the slippage
/// must also cover the token's buy fee or the swap reverts on chain.
pub fn min_amount_out(quoted: U256, slippage_bps: u32) -> U256 {
    if slippage_bps >= BPS_DENOMINATOR {
        return U256::ZERO;
    }
    quoted.saturating_mul(U256::from(BPS_DENOMINATOR - slippage_bps)) / U256::from(BPS_DENOMINATOR)
}

pub struct BuyExecutor<'a, C: ?Sized, R> {
    chain: &'a C,
    router: &'a R,
    config: &'a Config,
}

impl<'a, C, R> BuyExecutor<'a, C, R>
where
    C: ChainReader + ?Sized,
    R: SwapRouter,
{
    pub fn new(chain: &'a C, router: &'a R, config: &'a Config) -> Self {
        Self {
            chain,
            router,
            config,
        }
    }

    async fn execute(&self, token: Address) -> Result<Confirmation> {
        let now = match self.chain.latest_block_timestamp().await {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => {
                warn!("Latest block unavailable, using local clock for deadline");
                local_timestamp()
            }
            Err(e) => {
                warn!(error = %e, "Latest block lookup failed, using local clock for deadline");
                local_timestamp()
            }
        };

        let spot = self
            .chain
            .gas_price()
            .await
            .map_err(|e| SniperError::Network(format!("Fee estimate unavailable: {}", e)))?;
        let pricing = GasPricing::compute(
            spot,
            self.config.priority_fee_wei,
            self.config.max_gas_price_wei,
        );
        info!("Current gas price: {} Gwei", gwei(pricing.spot));
        info!("Using gas price: {} Gwei", gwei(pricing.effective));
        if pricing.is_capped() {
            warn!(ceiling = %gwei(pricing.ceiling), "Gas price capped at maximum");
        }

        let path = vec![self.config.wbnb_address, token];
        let amount_out_min = if self.config.slippage_bps >= BPS_DENOMINATOR {
            U256::ZERO
        } else {
            let quoted = self
                .router
                .quote_amount_out(self.config.amount_in_wei, &path)
                .await?;
            let min_out = min_amount_out(quoted, self.config.slippage_bps);
            info!(%quoted, %min_out, slippage_bps = self.config.slippage_bps, "Quoted swap output");
            min_out
        };

        let order = SwapOrder {
            amount_in: self.config.amount_in_wei,
            amount_out_min,
            path,
            recipient: self.config.wallet_address(),
            deadline: U256::from(now.saturating_add(self.config.deadline_secs)),
            gas_price: pricing.effective,
            gas_limit: self.config.gas_limit,
        };

        let (tx_hash, pending) = self.router.submit_swap(&order).await?;
        info!("Transaction submitted: {}", tx_hash);

        let confirmation = self.router.confirm(pending).await?;
        match confirmation.block_number {
            Some(block) => info!("Transaction confirmed in block {}", block),
            None => info!("Transaction confirmed"),
        }
        Ok(confirmation)
    }
}

#[async_trait]
impl<'a, C, R> Buyer for BuyExecutor<'a, C, R>
where
    C: ChainReader + ?Sized,
    R: SwapRouter,
{
    async fn buy(&self, token: Address) -> BuyResult {
        info!("Executing buy for pair: {}", token);
        match self.execute(token).await {
            Ok(confirmation) => {
                let result = BuyResult::from_confirmation(confirmation);
                if let Some(e) = &result.error {
                    error!("Buy failed: {}", e);
                }
                result
            }
            Err(e) => {
                error!("Buy failed: {}", e);
                BuyResult::failed(e)
            }
        }
    }
}

fn local_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
