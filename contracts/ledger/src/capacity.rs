//! Capacity Guard
//!
//! Pure checks against the global bank cap and the per-operation
//! withdrawal cap. Both run before any ledger mutation.

use vaultbank_common::check;
use vaultbank_common::errors::{BankError, BankResult};

/// Deposits only. `requested` is the asset A equivalent of the deposit.
pub fn check_bank_cap(requested: u128, total_value_locked: u128, cap: u128) -> BankResult<()> {
    let available = cap.saturating_sub(total_value_locked);
    check!(
        requested <= available,
        BankError::BankCapExceeded { requested, available }
    );
    Ok(())
}

/// Withdrawals only, in the asset's own unit
pub fn check_withdrawal_cap(requested: u128, cap: u128) -> BankResult<()> {
    check!(
        requested <= cap,
        BankError::WithdrawalCapExceeded { requested, cap }
    );
    Ok(())
}
