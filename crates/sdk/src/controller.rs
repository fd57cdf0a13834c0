use alloy::{
    eips::BlockId,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};

use crate::{
    abi::{Artifact, Controller::ControllerInstance},
    client,
    error::RbankError,
    health,
    history::{self, BalancePoint, HistoricalSource, Period},
    num::{self, Mantissa},
    types::{self, AccountValues},
};

/// Handle of the on-chain `Controller`, the registry of markets and the
/// authority on account solvency.
#[derive(Clone, derive_more::Debug)]
pub struct Controller<P> {
    address: Address,
    #[debug(skip)]
    instance: ControllerInstance<P>,
}

impl<P: Provider> Controller<P> {
    /// Binds the controller deployed at textual `address`.
    pub fn new(provider: P, address: &str) -> Result<Self, RbankError> {
        Ok(Self::at(provider, types::parse_address(address)?))
    }

    pub fn at(provider: P, address: Address) -> Self {
        Self { address, instance: ControllerInstance::new(address, provider) }
    }

    /// Deploys a new controller from its build artifact.
    pub async fn create(
        provider: P,
        artifact: &Artifact,
        from: Option<Address>,
    ) -> Result<Self, RbankError> {
        let address = client::deploy(&provider, artifact, Vec::new(), from).await?;
        Ok(Self::at(provider, address))
    }

    pub fn address(&self) -> Address { self.address }

    pub fn provider(&self) -> &P { self.instance.provider() }

    pub async fn mantissa(&self) -> Result<Mantissa, RbankError> {
        Mantissa::new(self.instance.MANTISSA().call().await?)
    }

    /// Block the controller was deployed at.
    pub async fn deploy_block(&self) -> Result<u64, RbankError> {
        num::to_u64(self.instance.deployBlock().call().await?, "deploy block")
    }

    pub async fn owner(&self) -> Result<Address, RbankError> {
        Ok(self.instance.owner().call().await?)
    }

    /// Checks `from`, or the default node account, owns the controller.
    pub async fn is_owner(&self, from: Option<Address>) -> Result<bool, RbankError> {
        let (owner, account) = futures::try_join!(self.owner(), async {
            match from {
                Some(from) => Ok(from),
                None => client::default_account(self.provider()).await,
            }
        })?;
        Ok(owner == account)
    }

    /// Share of the supplied value accounted as collateral.
    pub async fn collateral_factor(&self) -> Result<f64, RbankError> {
        let (mantissa, raw) = futures::try_join!(self.mantissa(), async {
            Ok::<_, RbankError>(self.instance.collateralFactor().call().await?)
        })?;
        Ok(mantissa.ratio(raw))
    }

    pub async fn liquidation_factor(&self) -> Result<f64, RbankError> {
        let (mantissa, raw) = futures::try_join!(self.mantissa(), async {
            Ok::<_, RbankError>(self.instance.liquidationFactor().call().await?)
        })?;
        Ok(mantissa.ratio(raw))
    }

    /// Number of markets registered within the controller.
    pub async fn market_list_size(&self) -> Result<u64, RbankError> {
        num::to_u64(self.instance.marketListSize().call().await?, "market list size")
    }

    /// Address of the market registered at `index`.
    pub async fn market_address(&self, index: u64) -> Result<Address, RbankError> {
        Ok(self.instance.marketList(U256::from(index)).call().await?)
    }

    /// Address of the market trading `token`.
    pub async fn market_address_by_token(&self, token: Address) -> Result<Address, RbankError> {
        let market = self.instance.marketsByToken(token).call().await?;
        if market.is_zero() {
            return Err(RbankError::NotFound(format!("no market for token {}", token)));
        }
        Ok(market)
    }

    /// Price of the market's token, as set by the owner.
    pub async fn market_price(&self, market: Address) -> Result<U256, RbankError> {
        Ok(self.instance.prices(market).call().await?)
    }

    pub async fn account_values(&self, account: Address) -> Result<AccountValues, RbankError> {
        self.account_values_at_block(account, BlockId::latest()).await
    }

    /// Account values as of `block_number`.
    pub async fn account_values_at(
        &self,
        account: Address,
        block_number: u64,
    ) -> Result<AccountValues, RbankError> {
        tracing::debug!(controller = %self.address, %account, block_number, "account values");
        self.account_values_at_block(account, BlockId::number(block_number)).await
    }

    async fn account_values_at_block(
        &self,
        account: Address,
        block: BlockId,
    ) -> Result<AccountValues, RbankError> {
        let values = self.instance.getAccountValues(account).block(block).call().await?;
        Ok(AccountValues { supply_value: values.supplyValue, borrow_value: values.borrowValue })
    }

    /// Value the account can still borrow across all markets.
    pub async fn account_liquidity(&self, account: Address) -> Result<U256, RbankError> {
        Ok(self.instance.getAccountLiquidity(account).call().await?)
    }

    /// Account health normalized to `[0, 1]`, see [`health::normalize`].
    pub async fn account_health(&self, account: Address) -> Result<f64, RbankError> {
        let (mantissa, values) = futures::try_join!(self.mantissa(), self.account_values(account))?;
        if !values.has_debt() {
            return Ok(1.0);
        }
        let raw = self.instance.getAccountHealth(account).call().await?;
        Ok(health::normalize(raw, mantissa, true))
    }

    pub async fn set_collateral_factor(
        &self,
        factor: f64,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        let raw = self.mantissa().await?.scale(factor)?;
        client::send(self.provider(), self.instance.setCollateralFactor(raw), from).await
    }

    pub async fn set_liquidation_factor(
        &self,
        factor: f64,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        let raw = self.mantissa().await?.scale(factor)?;
        client::send(self.provider(), self.instance.setLiquidationFactor(raw), from).await
    }

    /// Registers the market, fails if it is already registered.
    pub async fn add_market(
        &self,
        market: Address,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.addMarket(market), from).await
    }

    pub async fn set_market_price(
        &self,
        market: Address,
        price: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.setPrice(market, price), from).await
    }

    /// Block numbers sampled over `period`, see [`history::past_block_numbers`].
    pub async fn past_block_numbers(&self, period: Period) -> Result<Vec<u64>, RbankError> {
        let (deploy_block, current_block) = futures::try_join!(self.deploy_block(), async {
            Ok::<_, RbankError>(self.provider().get_block_number().await?)
        })?;
        let block_numbers = history::past_block_numbers(period, deploy_block, current_block);
        tracing::debug!(
            controller = %self.address,
            %period,
            deploy_block,
            current_block,
            ?block_numbers,
            "sampled past blocks"
        );
        Ok(block_numbers)
    }

    /// Net balance of the account over `period`, most recent first.
    pub async fn overall_balance(
        &self,
        account: Address,
        period: Period,
    ) -> Result<Vec<BalancePoint>, RbankError> {
        let block_numbers = self.past_block_numbers(period).await?;
        let series = history::collect(&self.account_history(account), &block_numbers).await?;
        Ok(series
            .into_iter()
            .map(|(time, values)| BalancePoint { time, balance: values.net() })
            .collect())
    }

    pub fn account_history(&self, account: Address) -> AccountHistory<'_, P> {
        AccountHistory { controller: self, account }
    }
}

/// Account values over time.
#[derive(Debug)]
pub struct AccountHistory<'c, P> {
    controller: &'c Controller<P>,
    account: Address,
}

impl<P: Provider> HistoricalSource for AccountHistory<'_, P> {
    type Value = AccountValues;

    async fn value_at(&self, block_number: u64) -> Result<AccountValues, RbankError> {
        self.controller.account_values_at(self.account, block_number).await
    }

    async fn timestamp_at(&self, block_number: u64) -> Result<u64, RbankError> {
        client::block_timestamp(self.controller.provider(), block_number).await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::I256;

    use super::*;
    use crate::testing::MockChain;

    const ADDRESS: &str = "0xe78A0F7E598Cc8b0Bb87894B0F60dD2a88d6a8Ab";

    #[test]
    fn test_new_validates_address() {
        let chain = MockChain::new();
        assert!(matches!(
            Controller::new(chain.provider(), ""),
            Err(RbankError::InvalidArgument(_))
        ));
        assert!(matches!(
            Controller::new(chain.provider(), "0xe78A0F7E598Cc8b0Bb87894B0F60dD2a88d6a8"),
            Err(RbankError::InvalidArgument(_))
        ));

        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        assert_eq!(controller.address(), types::parse_address(ADDRESS).unwrap());
    }

    #[tokio::test]
    async fn test_views() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();

        chain.push_return(U256::from(1_000_000));
        assert_eq!(controller.mantissa().await.unwrap().value(), U256::from(1_000_000));

        chain.push_return(U256::from(4_242));
        assert_eq!(controller.deploy_block().await.unwrap(), 4_242);

        chain.push_return(U256::from(2));
        assert_eq!(controller.market_list_size().await.unwrap(), 2);

        let owner = Address::with_last_byte(7);
        chain.push_return(owner);
        assert_eq!(controller.owner().await.unwrap(), owner);

        chain.push_return(owner);
        assert!(controller.is_owner(Some(owner)).await.unwrap());
        chain.push_return(owner);
        assert!(!controller.is_owner(Some(Address::with_last_byte(8))).await.unwrap());

        chain.push_return((U256::from(300), U256::from(100)));
        let values = controller.account_values(owner).await.unwrap();
        assert_eq!(values.supply_value, U256::from(300));
        assert_eq!(values.borrow_value, U256::from(100));
    }

    #[tokio::test]
    async fn test_zero_mantissa() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        chain.push_return(U256::ZERO);
        assert!(matches!(controller.mantissa().await, Err(RbankError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_market_address_by_token() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        let token = Address::with_last_byte(1);

        chain.push_return(Address::ZERO);
        assert!(matches!(
            controller.market_address_by_token(token).await,
            Err(RbankError::NotFound(_))
        ));

        let market = Address::with_last_byte(2);
        chain.push_return(market);
        assert_eq!(controller.market_address_by_token(token).await.unwrap(), market);
    }

    /// Tests debt-free accounts skip the health query.
    #[tokio::test]
    async fn test_account_health() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        let account = Address::with_last_byte(5);

        // Nothing is queued after the values, a health query would fail
        chain.push_return(U256::from(1_000_000)).push_return((U256::from(300), U256::ZERO));
        assert_eq!(controller.account_health(account).await.unwrap(), 1.0);

        chain
            .push_return(U256::from(1_000_000))
            .push_return((U256::from(300), U256::from(100)))
            .push_return(I256::from_dec_str("3333333").unwrap());
        assert_eq!(controller.account_health(account).await.unwrap(), 0.871926);

        chain
            .push_return(U256::from(1_000_000))
            .push_return((U256::from(100), U256::from(300)))
            .push_return(I256::from_dec_str("-2000000").unwrap());
        assert_eq!(controller.account_health(account).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_past_block_numbers() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();

        chain.push_return(U256::from(95_000)).push_block_number(100_000);
        assert_eq!(
            controller.past_block_numbers(Period::Week).await.unwrap(),
            vec![100_000, 97_263, 95_000, 95_000, 95_000, 95_000, 95_000]
        );
    }

    /// Tests balance points carry supplied minus borrowed value.
    #[tokio::test]
    async fn test_overall_balance() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        let account = Address::with_last_byte(5);

        // Freshly deployed, every sample reads the same block
        chain.push_return(U256::from(500)).push_block_number(500);
        for _ in 0..Period::Week.labels() {
            chain.push_return((U256::from(100), U256::from(300)));
        }
        for _ in 0..Period::Week.labels() {
            chain.push_block(500, 1_600_000_000);
        }

        let points = controller.overall_balance(account, Period::Week).await.unwrap();
        assert_eq!(points.len(), 7);
        for point in points {
            assert_eq!(point.balance, I256::from_dec_str("-200").unwrap());
            assert_eq!(point.time.timestamp(), 1_600_000_000);
        }
    }

    #[tokio::test]
    async fn test_remote_failure_is_propagated() {
        let chain = MockChain::new();
        let controller = Controller::new(chain.provider(), ADDRESS).unwrap();
        chain.push_failure("header not found");
        assert!(matches!(controller.deploy_block().await, Err(RbankError::Contract(_))));
    }
}
