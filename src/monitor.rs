use alloy::primitives::Address;
use futures::StreamExt;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, error, info, warn};

use crate::{
    contracts::{PairCreatedEvent, PairSubscription},
    error::SniperError,
    executor::{BuyResult, Buyer},
};

const WAITING: u8 = 0;
const MATCHED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Waiting,
    Matched,
}

/// Watches `PairCreated` events for the `{target, base}` pool and fires one buy.
///
/// The WAITING -> MATCHED transition is a single compare-and-swap, so only the first
/// qualifying event can reach the buyer even if events were delivered concurrently.
pub struct PairMonitor {
    target: Address,
    base: Address,
    state: AtomicU8,
}

impl PairMonitor {
    pub fn new(target: Address, base: Address) -> Self {
        Self {
            target,
            base,
            state: AtomicU8::new(WAITING),
        }
    }

    pub fn state(&self) -> MonitorState {
        match self.state.load(Ordering::Acquire) {
            WAITING => MonitorState::Waiting,
            _ => MonitorState::Matched,
        }
    }

    /// Unordered comparison of `{token0, token1}` against `{target, base}`.
    /// `Address` equality is byte equality, so the hex case of the source never matters.
    pub fn is_target_pair(&self, event: &PairCreatedEvent) -> bool {
        (event.token0 == self.target && event.token1 == self.base)
            || (event.token0 == self.base && event.token1 == self.target)
    }

    fn try_match(&self) -> bool {
        self.state
            .compare_exchange(WAITING, MATCHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Suspends until the pair shows up, then cancels `subscription` and buys once.
    /// No timeout: the only other way out is the stream ending.
    pub async fn run<S, B>(&self, mut subscription: S, buyer: &B) -> BuyResult
    where
        S: PairSubscription,
        B: Buyer + ?Sized,
    {
        info!("Starting to monitor for pair creation with token: {}", self.target);
        info!("Waiting for liquidity to be added...");

        let event = loop {
            let Some(event) = subscription.next().await else {
                error!("PairCreated stream ended before the pair was created");
                return BuyResult::failed(SniperError::Network(
                    "event stream closed before a matching pair was seen".into(),
                ));
            };

            if !self.is_target_pair(&event) {
                debug!(token0 = %event.token0, token1 = %event.token1, pair = %event.pair, "Ignoring unrelated pair");
                continue;
            }

            if !self.try_match() {
                warn!(pair = %event.pair, "Pair already matched, ignoring duplicate");
                return BuyResult::failed(SniperError::AlreadyMatched(format!(
                    "buy for {} already triggered, pair {} ignored",
                    self.target, event.pair
                )));
            }

            // Must happen before the first await below.
            if let Err(e) = subscription.cancel() {
                warn!(error = %e, "Failed to cancel PairCreated subscription");
            }
            break event;
        };
        drop(subscription);

        info!("Pair created! Address: {}", event.pair);
        info!("Token0: {}", event.token0);
        info!("Token1: {}", event.token1);

        buyer.buy(self.target).await
    }
}
