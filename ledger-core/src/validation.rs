//! Request validation
//!
//! Pure checks that run before any store access, so a rejected request
//! never opens a unit of work.

use crate::{Error, Result, WalletAddress};
use rust_decimal::Decimal;

/// Reject non-positive amounts, then self-transfers
pub fn validate_transfer(from: &WalletAddress, to: &WalletAddress, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount);
    }
    if from == to {
        return Err(Error::SelfTransfer);
    }
    Ok(())
}

/// History limit must be positive; returns it as a count
pub fn validate_limit(n: i64) -> Result<usize> {
    if n <= 0 {
        return Err(Error::InvalidAmount);
    }
    usize::try_from(n).map_err(|_| Error::InvalidAmount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::new(s)
    }

    #[test]
    fn test_valid_transfer() {
        assert!(validate_transfer(&addr("a"), &addr("b"), dec!(0.01)).is_ok());
    }

    #[test]
    fn test_non_positive_amounts() {
        assert_eq!(
            validate_transfer(&addr("a"), &addr("b"), dec!(0)),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            validate_transfer(&addr("a"), &addr("b"), dec!(-5)),
            Err(Error::InvalidAmount)
        );
    }

    #[test]
    fn test_self_transfer() {
        assert_eq!(
            validate_transfer(&addr("a"), &addr("a"), dec!(10)),
            Err(Error::SelfTransfer)
        );
    }

    #[test]
    fn test_amount_checked_before_self_transfer() {
        assert_eq!(
            validate_transfer(&addr("a"), &addr("a"), dec!(0)),
            Err(Error::InvalidAmount)
        );
    }

    #[test]
    fn test_limits() {
        assert_eq!(validate_limit(5), Ok(5));
        assert_eq!(validate_limit(0), Err(Error::InvalidAmount));
        assert_eq!(validate_limit(-3), Err(Error::InvalidAmount));
    }
}
