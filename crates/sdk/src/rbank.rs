use alloy::{primitives::Address, providers::Provider};
use futures::future;

use crate::{
    controller::Controller,
    error::RbankError,
    market::Market,
    types::{self, MarketId},
};

/// Entry point bound to a deployed controller, giving access to the markets
/// registered within it.
#[derive(Clone, derive_more::Debug)]
pub struct Rbank<P> {
    #[debug(skip)]
    provider: P,
    controller: Controller<P>,
}

impl<P: Provider + Clone> Rbank<P> {
    /// Binds the controller deployed at textual `controller` address.
    pub fn new(provider: P, controller: &str) -> Result<Self, RbankError> {
        let controller = Controller::at(provider.clone(), types::parse_address(controller)?);
        Ok(Self { provider, controller })
    }

    pub fn at(provider: P, controller: Address) -> Self {
        Self { controller: Controller::at(provider.clone(), controller), provider }
    }

    pub fn provider(&self) -> &P { &self.provider }

    pub fn controller(&self) -> &Controller<P> { &self.controller }

    /// All markets registered within the controller, in registration order.
    pub async fn markets(&self) -> Result<Vec<Market<P>>, RbankError> {
        let size = self.controller.market_list_size().await?;
        let addresses =
            future::try_join_all((0..size).map(|index| self.controller.market_address(index)))
                .await?;
        Ok(addresses
            .into_iter()
            .map(|address| Market::at(self.provider.clone(), address))
            .collect())
    }

    /// Market by its position in the registry or by its address.
    pub async fn market(&self, id: impl Into<MarketId>) -> Result<Market<P>, RbankError> {
        match id.into() {
            MarketId::Index(index) => {
                let size = self.controller.market_list_size().await?;
                if index >= size {
                    return Err(RbankError::NotFound(format!(
                        "no market at index {} out of {}",
                        index, size
                    )));
                }
                let address = self.controller.market_address(index).await?;
                Ok(Market::at(self.provider.clone(), address))
            },
            MarketId::Address(address) => self
                .markets()
                .await?
                .into_iter()
                .find(|market| market.address() == address)
                .ok_or_else(|| RbankError::NotFound(format!("no market with address {}", address))),
        }
    }

    /// Checks a market trading `token` is registered.
    pub async fn market_exists_by_token(&self, token: Address) -> Result<bool, RbankError> {
        match self.controller.market_address_by_token(token).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => {
                tracing::debug!(%token, "no market for token");
                Ok(false)
            },
            Err(err) => Err(err),
        }
    }
}
