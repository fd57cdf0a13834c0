//! Account health normalization.
//!
//! The controller reports account health as a signed, mantissa-scaled
//! statistic. [`normalize`] maps it onto a `[0, 1]` score, where `0` means the
//! account can be liquidated and `1` means it has no debt at all.

use alloy::primitives::I256;

use crate::num::Mantissa;

/// Sigmoid output mapped to a score of `0`.
pub const SIGMOID_LOW: f64 = 0.731059;

/// Sigmoid output mapped to a score of `1`.
pub const SIGMOID_HIGH: f64 = 0.999999;

/// Normalized health score of an account.
///
/// Accounts without outstanding debt are always perfectly healthy and
/// `raw_health` is not looked at.
pub fn normalize(raw_health: I256, mantissa: Mantissa, has_outstanding_debt: bool) -> f64 {
    if !has_outstanding_debt {
        return 1.0;
    }
    score(mantissa.ratio_signed(raw_health))
}

/// Score of the real-valued health `ratio`.
///
/// Rounded half away from zero at the 6th decimal of the binary value, ties
/// of the decimal expansion may land one millionth apart from decimal
/// string rounding.
pub fn score(ratio: f64) -> f64 {
    let sigmoid = 1.0 / (1.0 + (-ratio).exp());
    let pct = (sigmoid - SIGMOID_LOW) / (SIGMOID_HIGH - SIGMOID_LOW);
    if pct.is_nan() || pct < 0.0 {
        return 0.0;
    }
    // Calibration bounds are below the sigmoid supremum
    ((pct * 1e6).round() / 1e6).min(1.0)
}
