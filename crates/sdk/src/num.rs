use alloy::primitives::{I256, U256};

use crate::error::RbankError;

/// Fixed-point scale the controller represents fractional values with,
/// see `Controller.MANTISSA()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mantissa(U256);

impl Mantissa {
    pub fn new(value: U256) -> Result<Self, RbankError> {
        if value.is_zero() {
            return Err(RbankError::InvalidResponse("mantissa must be positive".to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> U256 { self.0 }

    /// Real-valued ratio represented by the mantissa-scaled `raw` value.
    pub fn ratio(&self, raw: U256) -> f64 { to_f64(raw) / to_f64(self.0) }

    /// Same as [`Self::ratio`] for signed on-chain statistics.
    pub fn ratio_signed(&self, raw: I256) -> f64 {
        let (sign, abs) = raw.into_sign_and_abs();
        let ratio = self.ratio(abs);
        if sign.is_negative() { -ratio } else { ratio }
    }

    /// Mantissa-scaled representation of `ratio`, rounded to the nearest
    /// integer.
    pub fn scale(&self, ratio: f64) -> Result<U256, RbankError> {
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(RbankError::InvalidArgument(format!(
                "ratio must be finite and non-negative: {}",
                ratio
            )));
        }
        let scaled = (ratio * to_f64(self.0)).round();
        if scaled >= u128::MAX as f64 {
            return Err(RbankError::InvalidArgument(format!("ratio is too large: {}", ratio)));
        }
        Ok(U256::from(scaled as u128))
    }
}

/// `supply - borrow`, negative when the account owes more than it supplied.
pub fn net(supply: U256, borrow: U256) -> I256 {
    if supply >= borrow {
        I256::from_raw(supply - borrow)
    } else {
        -I256::from_raw(borrow - supply)
    }
}

/// Narrows on-chain counter (block number, list size) to `u64`.
pub(crate) fn to_u64(value: U256, what: &str) -> Result<u64, RbankError> {
    if value > U256::from(u64::MAX) {
        return Err(RbankError::InvalidResponse(format!("{} out of range: {}", what, value)));
    }
    Ok(value.to::<u64>())
}

fn to_f64(value: U256) -> f64 {
    if value <= U256::from(u128::MAX) {
        value.to::<u128>() as f64
    } else {
        // Decimal parsing rounds to the nearest representable value
        value.to_string().parse().unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mantissa() -> Mantissa { Mantissa::new(U256::from(1_000_000)).unwrap() }

    #[test]
    fn test_zero_mantissa() {
        assert!(matches!(Mantissa::new(U256::ZERO), Err(RbankError::InvalidResponse(_))));
    }

    #[test]
    fn test_ratio() {
        let m = mantissa();
        assert_eq!(m.ratio(U256::from(500_000)), 0.5);
        assert_eq!(m.ratio(U256::ZERO), 0.0);
        assert_eq!(m.ratio_signed(I256::from_dec_str("-2500000").unwrap()), -2.5);
        assert_eq!(m.ratio_signed(I256::from_dec_str("1500000").unwrap()), 1.5);
        assert!(m.ratio(U256::MAX) > 1e70);
    }

    #[test]
    fn test_scale() {
        let m = mantissa();
        assert_eq!(m.scale(0.5).unwrap(), U256::from(500_000));
        assert_eq!(m.scale(1.0).unwrap(), U256::from(1_000_000));
        assert_eq!(m.scale(0.0000004).unwrap(), U256::ZERO);
        assert!(m.scale(-0.1).is_err());
        assert!(m.scale(f64::NAN).is_err());
        assert!(m.scale(f64::INFINITY).is_err());
    }

    #[test]
    fn test_to_u64() {
        assert_eq!(to_u64(U256::from(42), "block").unwrap(), 42);
        assert_eq!(to_u64(U256::from(u64::MAX), "block").unwrap(), u64::MAX);
        assert!(to_u64(U256::from(u64::MAX) + U256::from(1), "block").is_err());
    }

    #[test]
    fn test_net() {
        assert_eq!(net(U256::from(10), U256::from(4)), I256::from_dec_str("6").unwrap());
        assert_eq!(net(U256::from(4), U256::from(10)), I256::from_dec_str("-6").unwrap());
        assert_eq!(net(U256::ZERO, U256::ZERO), I256::ZERO);
    }
}
