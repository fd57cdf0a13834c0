use std::time::Duration;

use alloy::{
    eips::BlockId,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use alloy_sol_types::SolConstructor;
use futures::Stream;

use crate::{
    abi::{
        Artifact,
        Market::{MarketEvents, MarketInstance, constructorCall},
    },
    client,
    error::RbankError,
    history::{self, HistoricalSource, MarketPoint, Period},
    num, stream,
    token::Token,
    types::{self, MarketTotals},
};

/// Handle of an on-chain `Market`, the pool of a single token accounts
/// supply to and borrow from.
#[derive(Clone, derive_more::Debug)]
pub struct Market<P> {
    address: Address,
    #[debug(skip)]
    instance: MarketInstance<P>,
}

impl<P: Provider> Market<P> {
    /// Binds the market deployed at textual `address`.
    pub fn new(provider: P, address: &str) -> Result<Self, RbankError> {
        Ok(Self::at(provider, types::parse_address(address)?))
    }

    pub fn at(provider: P, address: Address) -> Self {
        Self { address, instance: MarketInstance::new(address, provider) }
    }

    /// Deploys a new market of the ERC20 `token`.
    ///
    /// Both the token address and the base borrow rate are required, their
    /// absence is reported before any remote call is made.
    pub async fn create(
        provider: P,
        artifact: &Artifact,
        token: &str,
        base_borrow_rate: Option<U256>,
        from: Option<Address>,
    ) -> Result<Self, RbankError> {
        let (token, base_borrow_rate) = match (types::parse_address(token), base_borrow_rate) {
            (Ok(token), Some(rate)) => (token, rate),
            _ => {
                return Err(RbankError::InvalidArgument(
                    "either the token address or the base borrow rate are missing".to_string(),
                ));
            },
        };
        let args = constructorCall { token, baseBorrowRate: base_borrow_rate }.abi_encode();
        let address = client::deploy(&provider, artifact, args, from).await?;
        Ok(Self::at(provider, address))
    }

    pub fn address(&self) -> Address { self.address }

    pub fn provider(&self) -> &P { self.instance.provider() }

    /// Controller the market is registered with.
    pub async fn controller(&self) -> Result<Address, RbankError> {
        Ok(self.instance.controller().call().await?)
    }

    pub async fn deploy_block(&self) -> Result<u64, RbankError> {
        num::to_u64(self.instance.deployBlock().call().await?, "deploy block")
    }

    pub async fn base_borrow_rate(&self) -> Result<U256, RbankError> {
        Ok(self.instance.baseBorrowRate().call().await?)
    }

    /// Amount of the market token held by the market.
    pub async fn balance(&self) -> Result<U256, RbankError> {
        Ok(self.instance.getCash().call().await?)
    }

    /// Amount supplied by `from`, or by the default node account.
    pub async fn supply_of(&self, from: Option<Address>) -> Result<U256, RbankError> {
        let account = match from {
            Some(from) => from,
            None => client::default_account(self.provider()).await?,
        };
        Ok(self.instance.supplyOf(account).call().await?)
    }

    pub async fn borrow_by(&self, account: Address) -> Result<U256, RbankError> {
        Ok(self.instance.borrowBy(account).call().await?)
    }

    pub async fn totals(&self) -> Result<MarketTotals, RbankError> {
        self.totals_at_block(BlockId::latest()).await
    }

    /// Market totals as of `block_number`.
    pub async fn totals_at(&self, block_number: u64) -> Result<MarketTotals, RbankError> {
        tracing::debug!(market = %self.address, block_number, "market totals");
        self.totals_at_block(BlockId::number(block_number)).await
    }

    async fn totals_at_block(&self, block: BlockId) -> Result<MarketTotals, RbankError> {
        let total_supply = self.instance.totalSupply().block(block);
        let total_borrow = self.instance.totalBorrows().block(block);
        let (total_supply, total_borrow) = futures::try_join!(
            total_supply.call().into_future(),
            total_borrow.call().into_future()
        )?;
        Ok(MarketTotals { total_supply, total_borrow })
    }

    /// ERC20 token the market operates on.
    pub async fn token(&self) -> Result<Token<P>, RbankError>
    where
        P: Clone,
    {
        let address = self.instance.token().call().await?;
        Ok(Token::at(self.provider().clone(), address))
    }

    pub async fn set_controller(
        &self,
        controller: Address,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.setController(controller), from).await
    }

    /// Approves the market to transfer `amount` of its token on behalf of the
    /// sender, then supplies it.
    pub async fn supply(
        &self,
        amount: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError>
    where
        P: Clone,
    {
        let from = match from {
            Some(from) => from,
            None => client::default_account(self.provider()).await?,
        };
        self.token().await?.approve(self.address, amount, Some(from)).await?;
        client::send(self.provider(), self.instance.supply(amount), Some(from)).await
    }

    /// Borrows `amount`, requires collateral supplied to other markets.
    pub async fn borrow(
        &self,
        amount: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.borrow(amount), from).await
    }

    pub async fn redeem(
        &self,
        amount: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.redeem(amount), from).await
    }

    pub async fn pay_borrow(
        &self,
        amount: U256,
        from: Option<Address>,
    ) -> Result<TransactionReceipt, RbankError> {
        client::send(self.provider(), self.instance.payBorrow(amount), from).await
    }

    pub async fn past_block_numbers(&self, period: Period) -> Result<Vec<u64>, RbankError> {
        let (deploy_block, current_block) = futures::try_join!(self.deploy_block(), async {
            Ok::<_, RbankError>(self.provider().get_block_number().await?)
        })?;
        let block_numbers = history::past_block_numbers(period, deploy_block, current_block);
        tracing::debug!(
            market = %self.address,
            %period,
            deploy_block,
            current_block,
            ?block_numbers,
            "sampled past blocks"
        );
        Ok(block_numbers)
    }

    /// Total supply and borrow of the market over `period`, most recent
    /// first.
    pub async fn history(&self, period: Period) -> Result<Vec<MarketPoint>, RbankError> {
        let block_numbers = self.past_block_numbers(period).await?;
        let series = history::collect(self, &block_numbers).await?;
        Ok(series
            .into_iter()
            .map(|(time, totals)| MarketPoint {
                time,
                total_supply: totals.total_supply,
                total_borrow: totals.total_borrow,
            })
            .collect())
    }

    /// Stream of market events starting from `from_block`, see
    /// [`stream::events`].
    pub fn events<S, SFut>(
        &self,
        from_block: u64,
        sleep: S,
    ) -> impl Stream<Item = Result<stream::ContractBlockEvents<MarketEvents>, RbankError>>
    where
        P: Clone,
        S: Fn(Duration) -> SFut + Copy,
        SFut: Future<Output = ()>,
    {
        stream::events::<MarketEvents, _, _, _>(
            self.provider().clone(),
            self.address,
            from_block,
            sleep,
        )
    }
}

impl<P: Provider> HistoricalSource for Market<P> {
    type Value = MarketTotals;

    async fn value_at(&self, block_number: u64) -> Result<MarketTotals, RbankError> {
        self.totals_at(block_number).await
    }

    async fn timestamp_at(&self, block_number: u64) -> Result<u64, RbankError> {
        client::block_timestamp(self.provider(), block_number).await
    }
}
