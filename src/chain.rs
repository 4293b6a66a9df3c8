use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder, RootProvider, WsConnect},
    pubsub::PubSubFrontend,
    rpc::types::{BlockTransactionsKind, Filter},
    sol_types::SolEvent,
};
use async_trait::async_trait;
use tracing::info;

use crate::{
    config::Config,
    contracts::{Erc20Metadata, FactorySubscription, HttpTransport, IPancakeFactory, PancakeRouter},
    error::{Result, SniperError},
};

/// Point queries the buy path needs from the request connection.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `None` when the node has no latest block to report.
    async fn latest_block_timestamp(&self) -> Result<Option<u64>>;
    async fn gas_price(&self) -> Result<u128>;
}

/// Request/response connection (signing wallet attached) plus the streaming connection.
pub struct ChainClient<P> {
    http: P,
    ws: RootProvider<PubSubFrontend>,
    wallet_address: Address,
}

/// Opens both connections. Any failure here aborts startup.
pub async fn connect(
    config: &Config,
) -> Result<ChainClient<impl Provider<HttpTransport> + Clone + 'static>> {
    let wallet = EthereumWallet::from(config.signer.clone());
    let wallet_address = config.wallet_address();

    let http = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(config.rpc_url.clone());

    let chain_id = http
        .get_chain_id()
        .await
        .map_err(|e| SniperError::Network(format!("RPC endpoint unreachable: {}", e)))?;
    info!(chain_id, "Connected to RPC endpoint");

    info!("Connecting to WebSocket...");
    let ws = ProviderBuilder::new()
        .on_ws(WsConnect::new(config.wss_url.as_str()))
        .await
        .map_err(|e| SniperError::Network(format!("WebSocket connection failed: {}", e)))?;
    info!("WebSocket connected");

    Ok(ChainClient {
        http,
        ws,
        wallet_address,
    })
}

impl<P> ChainClient<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    pub fn token(&self, address: Address) -> Erc20Metadata<P> {
        Erc20Metadata::new(address, self.http.clone())
    }

    pub fn router(&self, address: Address) -> PancakeRouter<P> {
        PancakeRouter::new(address, self.http.clone())
    }

    /// Subscribes to `PairCreated` logs emitted by `factory`.
    pub async fn subscribe_pair_created(&self, factory: Address) -> Result<FactorySubscription> {
        let filter = Filter::new()
            .address(factory)
            .event_signature(IPancakeFactory::PairCreated::SIGNATURE_HASH);

        let sub = self.ws.subscribe_logs(&filter).await?;
        let id = *sub.local_id();
        Ok(FactorySubscription::new(id, self.ws.clone(), sub.into_stream()))
    }

    /// Drops the streaming connection; the backend task closes the socket.
    pub fn shutdown(self) {
        drop(self.ws);
        info!("WebSocket connection closed");
    }
}

#[async_trait]
impl<P> ChainReader for ChainClient<P>
where
    P: Provider<HttpTransport> + Clone + 'static,
{
    async fn latest_block_timestamp(&self) -> Result<Option<u64>> {
        let block = self
            .http
            .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
            .await?;
        Ok(block.map(|b| b.header.timestamp))
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.http.get_gas_price().await?)
    }
}
