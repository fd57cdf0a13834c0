use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors surfaced by the SDK.
///
/// Remote failures are propagated unchanged, the SDK never retries on its
/// own. Configure [`alloy::transports::layers::RetryBackoffLayer`] on the
/// provider instead, see [`crate::client::connect`].
#[derive(Debug, Error)]
pub enum RbankError {
    /// Malformed address, missing creation parameter or out of range value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity requested by address/index/token is not registered.
    #[error("not found: {0}")]
    NotFound(String),

    /// The chain returned a value the SDK cannot work with.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Requested block is not produced yet.
    #[error("block #{0} is not available")]
    BlockNotAvailable(u64),

    /// Transaction was mined but its execution failed.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),

    #[error(transparent)]
    Decode(#[from] alloy_sol_types::Error),

    #[error("malformed build artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}

impl RbankError {
    /// Indicates the error means absence of the entity rather than a failure
    /// to reach it.
    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }
}
