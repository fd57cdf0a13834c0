//! Mocked chain client for tests.
//!
//! Responses are served strictly in the order they were pushed, so only
//! sequential request flows can be scripted reliably.

use alloy::{
    primitives::{Address, Bytes, U64},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Block,
    transports::mock::Asserter,
};
use alloy_sol_types::SolValue;

#[derive(Clone, derive_more::Debug)]
pub struct MockChain {
    #[debug(skip)]
    asserter: Asserter,
    #[debug(skip)]
    provider: DynProvider,
}

impl Default for MockChain {
    fn default() -> Self { Self::new() }
}

impl MockChain {
    pub fn new() -> Self {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased();
        Self { asserter, provider }
    }

    pub fn provider(&self) -> DynProvider { self.provider.clone() }

    /// Queues return data of a view call.
    pub fn push_return<T: SolValue>(&self, value: T) -> &Self {
        self.asserter.push_success(&Bytes::from(value.abi_encode()));
        self
    }

    /// Queues `eth_accounts` response.
    pub fn push_accounts(&self, accounts: &[Address]) -> &Self {
        self.asserter.push_success(&accounts.to_vec());
        self
    }

    /// Queues `eth_blockNumber` response.
    pub fn push_block_number(&self, block_number: u64) -> &Self {
        self.asserter.push_success(&U64::from(block_number));
        self
    }

    /// Queues `eth_getBlockByNumber` response of an empty block.
    pub fn push_block(&self, block_number: u64, timestamp: u64) -> &Self {
        let mut block: Block = Block::default();
        block.header.inner.number = block_number;
        block.header.inner.timestamp = timestamp;
        self.asserter.push_success(&block);
        self
    }

    /// Queues `null` block, as returned for a block not mined yet.
    pub fn push_missing_block(&self) -> &Self {
        self.asserter.push_success(&());
        self
    }

    /// Queues RPC error response.
    pub fn push_failure(&self, message: &'static str) -> &Self {
        self.asserter.push_failure_msg(message);
        self
    }
}
