//! Validation Helpers for vaultbank
//!
//! Pure checks shared by every entry point. None of them touch state, so a
//! failure never needs a rollback.

use crate::{
    errors::{BankError, BankResult},
    types::{Asset, Operation},
};

/// Check a condition and return an error if it fails.
///
/// ```rust,ignore
/// check!(amount <= cap, BankError::WithdrawalCapExceeded { requested: amount, cap });
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use crate::check;

/// Reject zero amounts for `operation` on `asset`
pub fn require_non_zero(amount: u128, operation: Operation, asset: Asset) -> BankResult<()> {
    check!(amount > 0, BankError::ZeroAmount { operation, asset });
    Ok(())
}
