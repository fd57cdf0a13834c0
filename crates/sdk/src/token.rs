use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};

use crate::{abi::Token::TokenInstance, client, error::RbankError, types};

/// Handle of an ERC20 token a market operates on.
#[derive(Clone, derive_more::Debug)]
pub struct Token<P> {
    address: Address,
    #[debug(skip)]
    instance: TokenInstance<P>,
}

impl<P: Provider> Token<P> {
    pub fn new(provider: P, address: &str) -> Result<Self, RbankError> {
        Ok(Self::at(provider, types::parse_address(address)?))
    }

    pub fn at(provider: P, address: Address) -> Self {
        Self { address, instance: TokenInstance::new(address, provider) }
    }

    pub fn address(&self) -> Address { self.address }

    pub async fn name(&self) -> Result<String, RbankError> { Ok(self.instance.name().call().await?) }

    pub async fn symbol(&self) -> Result<String, RbankError> {
        Ok(self.instance.symbol().call().await?)
    }

    pub async fn decimals(&self) -> Result<u8, RbankError> {
        Ok(self.instance.decimals().call().await?)
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, RbankError> {
        Ok(self.instance.balanceOf(owner).call().await?)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, RbankError> {
        Ok(self.instance.allowance(owner, spender).call().await?)
    }

    /// Allows `spender` (usually a market) to transfer up to `amount` on behalf
    /// of the sender.
    pub async fn approve(
        &self,
        spender: Address,
        amount: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.instance.provider(), self.instance.approve(spender, amount), from).await
    }
}
