use alloy::primitives::{Address, U256};
use rbank_sdk::{Rbank, error::RbankError, testing::MockChain, types::MarketId};

const CONTROLLER: &str = "0xe78a0f7e598cc8b0bb87894b0f60dd2a88d6a8ab";

fn market_address(n: u8) -> Address { Address::with_last_byte(0xa0 + n) }

#[test]
fn test_invalid_controller_address() {
    let chain = MockChain::new();
    for bad in ["", "0x", "e78a0f7e598cc8b0bb87894b0f60dd2a88d6a8ab", "0xe78a0f7e598cc8b0bb87894b0f60dd2a8"]
    {
        assert!(matches!(Rbank::new(chain.provider(), bad), Err(RbankError::InvalidArgument(_))));
    }
    let rbank = Rbank::new(chain.provider(), CONTROLLER).unwrap();
    assert_eq!(rbank.controller().address().to_string().to_lowercase(), CONTROLLER);
}

/// Tests markets lookup by their position in the registry.
#[tokio::test]
async fn test_market_by_index() {
    let chain = MockChain::new();
    let rbank = Rbank::new(chain.provider(), CONTROLLER).unwrap();

    chain.push_return(U256::from(2)).push_return(market_address(1));
    let market = rbank.market(1u64).await.unwrap();
    assert_eq!(market.address(), market_address(1));

    chain.push_return(U256::from(2));
    assert!(matches!(rbank.market(2u64).await, Err(RbankError::NotFound(_))));

    chain.push_return(U256::ZERO);
    assert!(matches!(rbank.market(MarketId::Index(0)).await, Err(RbankError::NotFound(_))));
}

/// Tests markets lookup by their address.
#[tokio::test]
async fn test_market_by_address() {
    let chain = MockChain::new();
    let rbank = Rbank::new(chain.provider(), CONTROLLER).unwrap();

    chain
        .push_return(U256::from(2))
        .push_return(market_address(1))
        .push_return(market_address(2));
    let market = rbank.market(market_address(2)).await.unwrap();
    assert_eq!(market.address(), market_address(2));

    chain.push_return(U256::from(1)).push_return(market_address(1));
    assert!(matches!(rbank.market(market_address(3)).await, Err(RbankError::NotFound(_))));

    let id: MarketId = "0x00000000000000000000000000000000000000a1".parse().unwrap();
    chain.push_return(U256::from(1)).push_return(market_address(1));
    assert_eq!(rbank.market(id).await.unwrap().address(), market_address(1));
}

#[tokio::test]
async fn test_markets() {
    let chain = MockChain::new();
    let rbank = Rbank::new(chain.provider(), CONTROLLER).unwrap();

    chain.push_return(U256::ZERO);
    assert!(rbank.markets().await.unwrap().is_empty());

    chain.push_return(U256::from(1)).push_return(market_address(4));
    let markets = rbank.markets().await.unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].address(), market_address(4));
}

/// Tests only the absence of a market maps to `false`.
#[tokio::test]
async fn test_market_exists_by_token() {
    let chain = MockChain::new();
    let rbank = Rbank::new(chain.provider(), CONTROLLER).unwrap();
    let token = Address::with_last_byte(0x70);

    chain.push_return(Address::ZERO);
    assert!(!rbank.market_exists_by_token(token).await.unwrap());

    chain.push_return(market_address(1));
    assert!(rbank.market_exists_by_token(token).await.unwrap());

    chain.push_failure("connection refused");
    assert!(matches!(rbank.market_exists_by_token(token).await, Err(RbankError::Contract(_))));
}
