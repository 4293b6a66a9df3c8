use alloy::{
    network::Ethereum,
    primitives::{Address, TxHash, B256, U256},
    providers::{PendingTransactionBuilder, Provider, RootProvider},
    pubsub::PubSubFrontend,
    rpc::types::Log,
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use futures::{stream::BoxStream, Stream, StreamExt};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tracing::{debug, warn};

use crate::error::{Result, SniperError};

pub type HttpTransport = Http<Client>;

sol! {
    #[sol(rpc)]
    interface IPancakeFactory {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 pairIndex);
    }

    #[sol(rpc)]
    interface IPancakeRouter {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactETHForTokensSupportingFeeOnTransferTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable;
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCreatedEvent {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
}

impl PairCreatedEvent {
    pub fn from_log(log: &Log) -> Result<Self> {
        let decoded = log.log_decode::<IPancakeFactory::PairCreated>()?;
        let event = decoded.inner.data;
        Ok(Self {
            token0: event.token0,
            token1: event.token1,
            pair: event.pair,
        })
    }
}

/// Fully resolved swap call: path, limits and gas are all decided before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    pub deadline: U256,
    pub gas_price: u128,
    pub gas_limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn symbol(&self) -> Result<String>;
    async fn name(&self) -> Result<String>;
    async fn decimals(&self) -> Result<u8>;
}

#[async_trait]
pub trait SwapRouter: Send + Sync {
    /// Handle to a submitted transaction, consumed when waiting for its receipt.
    type Pending: Send;

    /// Expected output of the last hop for `amount_in` along `path`.
    async fn quote_amount_out(&self, amount_in: U256, path: &[Address]) -> Result<U256>;
    async fn submit_swap(&self, order: &SwapOrder) -> Result<(TxHash, Self::Pending)>;
    async fn confirm(&self, pending: Self::Pending) -> Result<Confirmation>;
}

/// Ordered stream of decoded factory events that can be torn down without awaiting.
pub trait PairSubscription: Stream<Item = PairCreatedEvent> + Unpin + Send {
    fn cancel(&mut self) -> Result<()>;
}

pub struct Erc20Metadata<P> {
    contract: IERC20Metadata::IERC20MetadataInstance<HttpTransport, P>,
}

impl<P> Erc20Metadata<P>
where
    P: Provider<HttpTransport> + Clone,
{
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: IERC20Metadata::new(address, provider),
        }
    }
}

#[async_trait]
impl<P> TokenMetadataSource for Erc20Metadata<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    async fn symbol(&self) -> Result<String> {
        Ok(self.contract.symbol().call().await?._0)
    }

    async fn name(&self) -> Result<String> {
        Ok(self.contract.name().call().await?._0)
    }

    async fn decimals(&self) -> Result<u8> {
        Ok(self.contract.decimals().call().await?._0)
    }
}

pub struct PancakeRouter<P> {
    contract: IPancakeRouter::IPancakeRouterInstance<HttpTransport, P>,
}

impl<P> PancakeRouter<P>
where
    P: Provider<HttpTransport> + Clone,
{
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            contract: IPancakeRouter::new(address, provider),
        }
    }
}

#[async_trait]
impl<P> SwapRouter for PancakeRouter<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    type Pending = PendingTransactionBuilder<HttpTransport, Ethereum>;

    async fn quote_amount_out(&self, amount_in: U256, path: &[Address]) -> Result<U256> {
        let quote = self
            .contract
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await?;
        quote
            .amounts
            .last()
            .copied()
            .ok_or_else(|| SniperError::Contract("getAmountsOut returned no amounts".into()))
    }

    async fn submit_swap(&self, order: &SwapOrder) -> Result<(TxHash, Self::Pending)> {
        let mut call = self
            .contract
            .swapExactETHForTokensSupportingFeeOnTransferTokens(
                order.amount_out_min,
                order.path.clone(),
                order.recipient,
                order.deadline,
            )
            .value(order.amount_in)
            .gas_price(order.gas_price);
        if let Some(gas_limit) = order.gas_limit {
            call = call.gas(gas_limit);
        }

        let calldata = call.calldata();
        debug!(calldata_prefix = %format!("0x{}...", hex::encode(&calldata[..20.min(calldata.len())])), "Swap calldata");

        let pending = call.send().await?;
        Ok((*pending.tx_hash(), pending))
    }

    async fn confirm(&self, pending: Self::Pending) -> Result<Confirmation> {
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SniperError::Network(format!("Waiting for receipt failed: {}", e)))?;
        Ok(Confirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        })
    }
}

/// Live `PairCreated` log subscription on the factory, over the WebSocket provider.
pub struct FactorySubscription {
    id: B256,
    provider: RootProvider<PubSubFrontend>,
    events: BoxStream<'static, PairCreatedEvent>,
    cancelled: bool,
}

impl FactorySubscription {
    pub(crate) fn new(
        id: B256,
        provider: RootProvider<PubSubFrontend>,
        logs: impl Stream<Item = Log> + Send + 'static,
    ) -> Self {
        let events = logs
            .filter_map(|log| async move {
                match PairCreatedEvent::from_log(&log) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!(error = %e, tx = ?log.transaction_hash, "Undecodable PairCreated log skipped");
                        None
                    }
                }
            })
            .boxed();

        Self {
            id,
            provider,
            events,
            cancelled: false,
        }
    }
}

impl Stream for FactorySubscription {
    type Item = PairCreatedEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        self.events.poll_next_unpin(cx)
    }
}

impl PairSubscription for FactorySubscription {
    fn cancel(&mut self) -> Result<()> {
        if self.cancelled {
            return Ok(());
        }
        self.cancelled = true;
        self.provider.unsubscribe(self.id)?;
        Ok(())
    }
}
