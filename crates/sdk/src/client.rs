//! Chain client construction and common remote operations.
//!
//! The SDK works with any [`Provider`]. [`connect`] builds one from
//! [`ClientConfig`] with retries and optional throttling. The provider is
//! meant to be created once and shared by cloning; the connection is
//! released when the last clone is dropped.

use std::time::Duration;

use alloy::{
    contract::SolCallBuilder,
    eips::BlockId,
    network::{ReceiptResponse, TransactionBuilder},
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{
        client::RpcClient,
        types::{TransactionReceipt, TransactionRequest},
    },
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::{abi::Artifact, error::RbankError};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Chain client connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RPC endpoint to connect to.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Requests per second limit, unlimited if not set.
    #[serde(default)]
    pub throttle: Option<u32>,

    /// Number of retries on rate limiting responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_compute_units_per_second")]
    pub compute_units_per_second: u64,

    /// Interval of polling for transaction receipts and new blocks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_rpc_url() -> String { DEFAULT_RPC_URL.to_string() }

fn default_max_retries() -> u32 { 10 }

fn default_initial_backoff_ms() -> u64 { 100 }

fn default_compute_units_per_second() -> u64 { 200 }

fn default_poll_interval_ms() -> u64 { 100 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            throttle: None,
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            compute_units_per_second: default_compute_units_per_second(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `RBANK_RPC_URL` and `RBANK_RPC_THROTTLE`
    /// environment variables.
    pub fn from_env() -> Result<Self, RbankError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RbankError> {
        let mut config = Self::default();
        if let Some(url) = lookup("RBANK_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(throttle) = lookup("RBANK_RPC_THROTTLE") {
            config.throttle = Some(throttle.parse().map_err(|err| {
                RbankError::InvalidArgument(format!(
                    "invalid RBANK_RPC_THROTTLE {:?}: {}",
                    throttle, err
                ))
            })?);
        }
        Ok(config)
    }
}

/// Connects to the chain client described by `config`.
pub async fn connect(config: &ClientConfig) -> Result<DynProvider, RbankError> {
    let retry = RetryBackoffLayer::new(
        config.max_retries,
        config.initial_backoff_ms,
        config.compute_units_per_second,
    );
    let client = if let Some(throttle) = config.throttle {
        RpcClient::builder()
            .layer(ThrottleLayer::new(throttle))
            .layer(retry)
            .connect(&config.rpc_url)
            .await?
    } else {
        RpcClient::builder().layer(retry).connect(&config.rpc_url).await?
    };
    client.set_poll_interval(Duration::from_millis(config.poll_interval_ms));
    let provider = ProviderBuilder::new().connect_client(client).erased();

    let chain_id = provider.get_chain_id().await?;
    tracing::info!(rpc_url = %config.rpc_url, chain_id, throttle = ?config.throttle, "connected");
    Ok(provider)
}

/// First account managed by the node, used when no sender is specified.
pub async fn default_account<P: Provider>(provider: &P) -> Result<Address, RbankError> {
    provider
        .get_accounts()
        .await?
        .first()
        .copied()
        .ok_or_else(|| RbankError::NotFound("node manages no accounts".to_string()))
}

/// Sends contract call as a transaction from `from` or [`default_account`],
/// waiting for it to be mined.
pub async fn send<P, C>(
    provider: &P,
    call: SolCallBuilder<&P, C>,
    from: Option<Address>,
) -> Result<TransactionReceipt, RbankError>
where
    P: Provider,
    C: SolCall,
{
    let from = match from {
        Some(from) => from,
        None => default_account(provider).await?,
    };
    let receipt = call.from(from).send().await?.get_receipt().await?;
    if !ReceiptResponse::status(&receipt) {
        return Err(RbankError::Reverted(receipt.transaction_hash));
    }
    tracing::info!(
        method = C::SIGNATURE,
        %from,
        tx_hash = %receipt.transaction_hash,
        block_number = ?receipt.block_number,
        "transaction mined"
    );
    Ok(receipt)
}

/// Deploys compiled contract with ABI-encoded `constructor_args`, returning
/// its address.
pub async fn deploy<P: Provider>(
    provider: &P,
    artifact: &Artifact,
    constructor_args: Vec<u8>,
    from: Option<Address>,
) -> Result<Address, RbankError> {
    let from = match from {
        Some(from) => from,
        None => default_account(provider).await?,
    };
    let mut code = artifact.bytecode.to_vec();
    code.extend(constructor_args);
    let tx = TransactionRequest::default().with_from(from).with_deploy_code(code);

    let receipt = provider.send_transaction(tx).await?.get_receipt().await?;
    if !ReceiptResponse::status(&receipt) {
        return Err(RbankError::Reverted(receipt.transaction_hash));
    }
    let address = receipt.contract_address.ok_or_else(|| {
        RbankError::InvalidResponse(format!(
            "no contract address in deployment receipt {}",
            receipt.transaction_hash
        ))
    })?;
    tracing::info!(
        contract = artifact.contract_name.as_deref().unwrap_or_default(),
        %address,
        %from,
        "contract deployed"
    );
    Ok(address)
}

/// Timestamp of the block, in seconds.
pub async fn block_timestamp<P: Provider>(provider: &P, block_number: u64) -> Result<u64, RbankError> {
    let block = provider
        .get_block(BlockId::number(block_number))
        .await?
        .ok_or(RbankError::BlockNotAvailable(block_number))?;
    Ok(block.header.timestamp)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::testing::MockChain;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.throttle, None);
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig { throttle: Some(15), ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let partial: ClientConfig =
            serde_json::from_str(r#"{"rpc_url": "https://public-node.testnet.rsk.co"}"#).unwrap();
        assert_eq!(partial.rpc_url, "https://public-node.testnet.rsk.co");
        assert_eq!(partial.compute_units_per_second, 200);
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> =
            [("RBANK_RPC_URL", "ws://127.0.0.1:8545"), ("RBANK_RPC_THROTTLE", "25")].into();
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.rpc_url, "ws://127.0.0.1:8545");
        assert_eq!(config.throttle, Some(25));

        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());

        let err = ClientConfig::from_lookup(|k| {
            (k == "RBANK_RPC_THROTTLE").then(|| "fast".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, RbankError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_block_timestamp() {
        let chain = MockChain::new();
        chain.push_block(42, 1_650_000_000);
        assert_eq!(block_timestamp(&chain.provider(), 42).await.unwrap(), 1_650_000_000);

        chain.push_missing_block();
        assert!(matches!(
            block_timestamp(&chain.provider(), 43).await,
            Err(RbankError::BlockNotAvailable(43))
        ));
    }

    #[tokio::test]
    async fn test_default_account() {
        let chain = MockChain::new();
        let first = Address::with_last_byte(1);
        chain.push_accounts(&[first, Address::with_last_byte(2)]);
        assert_eq!(default_account(&chain.provider()).await.unwrap(), first);

        chain.push_accounts(&[]);
        assert!(matches!(
            default_account(&chain.provider()).await,
            Err(RbankError::NotFound(_))
        ));
    }
}
