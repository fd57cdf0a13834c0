mod event;

use std::{fmt::Display, str::FromStr};

use alloy::primitives::{Address, I256, U256};
pub use event::*;

use crate::{error::RbankError, num};

/// Parses `0x`-prefixed, 40 hex digits address, in any letter case.
///
/// Checksum is not verified.
pub fn parse_address(s: &str) -> Result<Address, RbankError> {
    let well_formed = s.len() == 42
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit());
    if !well_formed {
        return Err(RbankError::InvalidArgument(format!("invalid address: {:?}", s)));
    }
    Address::from_str(s)
        .map_err(|err| RbankError::InvalidArgument(format!("invalid address {}: {}", s, err)))
}

/// Market lookup key within the controller registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketId {
    /// Position in the controller's market list.
    Index(u64),
    Address(Address),
}

impl FromStr for MarketId {
    type Err = RbankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            return parse_address(s).map(MarketId::Address);
        }
        if let Ok(index) = u64::from_str(s) {
            return Ok(MarketId::Index(index));
        }
        Err(RbankError::InvalidArgument(format!("invalid market address or index: {}", s)))
    }
}

impl From<Address> for MarketId {
    fn from(address: Address) -> Self { MarketId::Address(address) }
}

impl From<u64> for MarketId {
    fn from(index: u64) -> Self { MarketId::Index(index) }
}

impl Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketId::Index(index) => write!(f, "#{}", index),
            MarketId::Address(address) => write!(f, "{}", address),
        }
    }
}

/// Supplied and borrowed value of an account across all markets, in the
/// controller's price units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AccountValues {
    pub supply_value: U256,
    pub borrow_value: U256,
}

impl AccountValues {
    pub fn has_debt(&self) -> bool { !self.borrow_value.is_zero() }

    /// Supplied minus borrowed value.
    pub fn net(&self) -> I256 { num::net(self.supply_value, self.borrow_value) }
}

/// Aggregated supply and borrow of a single market, in market token units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MarketTotals {
    pub total_supply: U256,
    pub total_borrow: U256,
}
