//! Historical time series approximated by sampling past blocks.
//!
//! A [`Period`] selects how many samples are taken and how far apart they
//! are. [`past_block_numbers`] walks back from the current block, never
//! going before the block the sampled contract was deployed at. [`collect`]
//! then reads values and timestamps at every sampled block concurrently.

use std::{convert::Infallible, fmt::Display, future::Future, str::FromStr};

use alloy::primitives::{I256, U256};
use chrono::{DateTime, Utc};
use futures::future;
use serde::{Deserialize, Serialize};

use crate::error::RbankError;

/// Approximation of the number of blocks produced per year.
pub const BLOCKS_PER_YEAR: u64 = 1_000_000;

/// Time span a historical query covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    /// Number of samples taken over the period.
    pub const fn labels(self) -> usize {
        match self {
            Period::Day => 12,
            Period::Week => 7,
            Period::Month => 15,
            Period::Year => 12,
        }
    }

    /// Number of blocks between consecutive samples.
    pub const fn stride(self) -> u64 {
        // 365.25 days per year, kept integral as 36_525 / 100
        match self {
            Period::Day => BLOCKS_PER_YEAR * 100 / (36_525 * 12),
            Period::Week => BLOCKS_PER_YEAR * 100 / 36_525,
            Period::Month => BLOCKS_PER_YEAR * 2 * 100 / 36_525,
            Period::Year => BLOCKS_PER_YEAR / 12,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl From<&str> for Period {
    fn from(value: &str) -> Self {
        match value {
            "day" => Period::Day,
            "week" => Period::Week,
            "month" => Period::Month,
            "year" => Period::Year,
            _ => Period::Week,
        }
    }
}

impl From<String> for Period {
    fn from(value: String) -> Self { Period::from(value.as_str()) }
}

impl FromStr for Period {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Period::from(s)) }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block numbers to sample over `period`, most recent first.
///
/// Samples that would precede `deploy_block` are clamped to it, so the
/// sequence flattens once the period exceeds the contract age.
pub fn past_block_numbers(period: Period, deploy_block: u64, current_block: u64) -> Vec<u64> {
    let stride = period.stride();
    (0..period.labels() as u64)
        .map(|i| current_block.saturating_sub(stride * i).max(deploy_block))
        .collect()
}

/// Source of point-in-time values a time series is assembled from.
pub trait HistoricalSource {
    type Value;

    /// Value as of the given block.
    fn value_at(&self, block_number: u64) -> impl Future<Output = Result<Self::Value, RbankError>>;

    /// Timestamp of the given block, in seconds.
    fn timestamp_at(&self, block_number: u64) -> impl Future<Output = Result<u64, RbankError>>;
}

/// Reads values and timestamps at every block concurrently, preserving the
/// order of `block_numbers`.
///
/// Fails as a whole if any of the reads fails.
pub async fn collect<S: HistoricalSource>(
    source: &S,
    block_numbers: &[u64],
) -> Result<Vec<(DateTime<Utc>, S::Value)>, RbankError> {
    let values = future::try_join_all(block_numbers.iter().map(|bn| source.value_at(*bn)));
    let timestamps =
        future::try_join_all(block_numbers.iter().map(|bn| source.timestamp_at(*bn)));
    let (values, timestamps) = futures::try_join!(values, timestamps)?;

    timestamps
        .into_iter()
        .zip(values)
        .map(|(ts, value)| Ok((block_time(ts)?, value)))
        .collect()
}

/// Converts block timestamp in seconds to date/time.
pub fn block_time(timestamp: u64) -> Result<DateTime<Utc>, RbankError> {
    i64::try_from(timestamp)
        .ok()
        .and_then(|ts| ts.checked_mul(1000))
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| {
            RbankError::InvalidResponse(format!("invalid block timestamp: {}", timestamp))
        })
}

/// Net account balance at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalancePoint {
    pub time: DateTime<Utc>,
    /// Supplied minus borrowed value.
    pub balance: I256,
}

/// Market totals at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketPoint {
    pub time: DateTime<Utc>,
    pub total_supply: U256,
    pub total_borrow: U256,
}
