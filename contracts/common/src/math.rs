//! Mathematical Utilities for vaultbank
//!
//! Overflow policy types, safe math and the fixed-point valuation used to
//! convert between asset A, asset B and USD.
//!
//! ## Overflow policies
//!
//! - [`WrapOnOverflow`]: per-vault fields. Bounded in practice by the bank
//!   cap, which is enforced with checked arithmetic before the vault is
//!   touched, so wrapping is acceptable and never fails.
//! - [`FailOnOverflow`]: process-wide counters. Any overflow or underflow is
//!   an error and the value is left unchanged.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::oracle::MAX_DECIMALS;
use crate::errors::{BankError, BankResult};
use crate::types::Asset;

// ============================================================================
// Ledger integers
// ============================================================================

/// Unsigned integer usable under either overflow policy
pub trait LedgerInt: Copy + Default + Ord + fmt::Debug + fmt::Display {
    const ONE: Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn checked_add(self, rhs: Self) -> Option<Self>;
    fn checked_sub(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_ledger_int {
    ($($t:ty),*) => {
        $(
            impl LedgerInt for $t {
                const ONE: Self = 1;

                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }

                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_add(self, rhs)
                }

                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_sub(self, rhs)
                }
            }
        )*
    };
}

impl_ledger_int!(u64, u128);

// ============================================================================
// Overflow policy types
// ============================================================================

/// Per-vault quantity: wraps on overflow.
///
/// Only valid for values bounded by a checked global invariant.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(transparent)]
pub struct WrapOnOverflow<T>(T);

impl<T: LedgerInt> WrapOnOverflow<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(self) -> T {
        self.0
    }

    pub fn credit(&mut self, amount: T) {
        self.0 = self.0.wrapping_add(amount);
    }

    pub fn debit(&mut self, amount: T) {
        self.0 = self.0.wrapping_sub(amount);
    }

    pub fn increment(&mut self) {
        self.credit(T::ONE);
    }
}

impl<T: fmt::Display> fmt::Display for WrapOnOverflow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Global quantity: must fail loudly on overflow or underflow.
///
/// A failed update leaves the value unchanged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(transparent)]
pub struct FailOnOverflow<T>(T);

impl<T: LedgerInt> FailOnOverflow<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(self) -> T {
        self.0
    }

    pub fn try_add(&mut self, amount: T) -> BankResult<()> {
        self.0 = self.0.checked_add(amount).ok_or(BankError::Overflow)?;
        Ok(())
    }

    pub fn try_sub(&mut self, amount: T) -> BankResult<()> {
        self.0 = self.0.checked_sub(amount).ok_or(BankError::Underflow)?;
        Ok(())
    }

    pub fn try_increment(&mut self) -> BankResult<()> {
        self.try_add(T::ONE)
    }
}

impl<T: fmt::Display> fmt::Display for FailOnOverflow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Safe math
// ============================================================================

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> BankResult<u128> {
    a.checked_add(b).ok_or(BankError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> BankResult<u128> {
    a.checked_sub(b).ok_or(BankError::Underflow)
}

/// `a * b / denominator`, rounding down
pub fn mul_div(a: u128, b: u128, denominator: u128) -> BankResult<u128> {
    if denominator == 0 {
        return Err(BankError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(BankError::Overflow)?;
    Ok(product / denominator)
}

/// `a * b / denominator`, rounding up
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> BankResult<u128> {
    if denominator == 0 {
        return Err(BankError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(BankError::Overflow)?;
    Ok(product.div_ceil(denominator))
}

/// `part * amount / whole` for `amount <= whole`, rounding down.
///
/// Splits `part` into quotient and remainder first so the product cannot
/// overflow for any `part` when `whole` fits in 64 bits.
pub fn proportional_share(part: u128, amount: u128, whole: u128) -> BankResult<u128> {
    if whole == 0 {
        return Err(BankError::DivisionByZero);
    }
    if amount >= whole {
        return Ok(part);
    }
    let whole_units = (part / whole).checked_mul(amount).ok_or(BankError::Overflow)?;
    let remainder = mul_div(part % whole, amount, whole)?;
    safe_add(whole_units, remainder)
}

/// 10^decimals as u128
pub fn pow10(decimals: u8) -> BankResult<u128> {
    10u128
        .checked_pow(decimals as u32)
        .ok_or(BankError::Overflow)
}

// ============================================================================
// Valuation
// ============================================================================

/// Fixed-point conversion between asset A, asset B and USD.
///
/// USD values are expressed in asset B base units (asset B is pegged 1:1).
/// Prices are "USD per whole unit of asset A" scaled by `10^price_decimals`.
///
/// usd = amount_a * price * 10^b / (10^a * 10^p)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    asset_a_decimals: u8,
    asset_b_decimals: u8,
    price_decimals: u8,
    /// 10^(a + p - b)
    scale: u128,
}

impl Valuation {
    pub fn new(asset_a_decimals: u8, asset_b_decimals: u8, price_decimals: u8) -> BankResult<Self> {
        let numerator_decimals = asset_a_decimals as u16 + price_decimals as u16;
        if (asset_b_decimals as u16) > numerator_decimals {
            return Err(BankError::InvalidConfig {
                param: "asset_b_decimals",
                reason: "must not exceed asset_a_decimals + price_decimals",
            });
        }
        let scale_decimals = numerator_decimals - asset_b_decimals as u16;
        if scale_decimals > MAX_DECIMALS as u16 {
            return Err(BankError::InvalidConfig {
                param: "asset_a_decimals",
                reason: "combined decimal scale does not fit in u128",
            });
        }

        Ok(Self {
            asset_a_decimals,
            asset_b_decimals,
            price_decimals,
            scale: pow10(scale_decimals as u8)?,
        })
    }

    pub fn asset_a_decimals(&self) -> u8 {
        self.asset_a_decimals
    }

    pub fn asset_b_decimals(&self) -> u8 {
        self.asset_b_decimals
    }

    pub fn price_decimals(&self) -> u8 {
        self.price_decimals
    }

    /// USD value (asset B base units) of `amount` of `asset` at `price`
    pub fn usd_value(&self, asset: Asset, amount: u128, price: u128) -> BankResult<u128> {
        match asset {
            Asset::A => mul_div(amount, price, self.scale),
            Asset::B => Ok(amount),
        }
    }

    /// Asset A equivalent of `amount` of `asset` at `price`, rounded up.
    ///
    /// This is the unit the bank cap and total value locked are kept in.
    /// Rounding up means no non-zero amount is ever counted as zero.
    pub fn asset_a_equivalent(&self, asset: Asset, amount: u128, price: u128) -> BankResult<u128> {
        match asset {
            Asset::A => Ok(amount),
            Asset::B => mul_div_ceil(amount, self.scale, price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{asset_a, asset_b, oracle};

    const PRICE_2000: u128 = 2_000_00000000; // $2,000 with 8 decimals

    fn mainnet_valuation() -> Valuation {
        Valuation::new(asset_a::DECIMALS, asset_b::DECIMALS, oracle::PRICE_DECIMALS).unwrap()
    }

    #[test]
    fn test_wrap_policy_wraps() {
        let mut value = WrapOnOverflow::new(u64::MAX);
        value.increment();
        assert_eq!(value.get(), 0);

        value.debit(1);
        assert_eq!(value.get(), u64::MAX);
    }

    #[test]
    fn test_fail_policy_fails_and_keeps_value() {
        let mut value = FailOnOverflow::new(u128::MAX - 1);
        value.try_increment().unwrap();
        assert_eq!(value.try_increment(), Err(BankError::Overflow));
        assert_eq!(value.get(), u128::MAX);

        let mut value = FailOnOverflow::new(3u64);
        assert_eq!(value.try_sub(4), Err(BankError::Underflow));
        assert_eq!(value.get(), 3);
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div(1, 1, 0), Err(BankError::DivisionByZero));
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(BankError::Overflow));
    }

    #[test]
    fn test_proportional_share() {
        assert_eq!(proportional_share(2, 2_000, 4_000).unwrap(), 1);
        assert_eq!(proportional_share(3, 1, 3).unwrap(), 1);
        assert_eq!(proportional_share(1, 1, 3).unwrap(), 0);
        // The whole amount always releases the whole part
        assert_eq!(proportional_share(7, 3, 3).unwrap(), 7);
        assert_eq!(proportional_share(0, 0, 0), Err(BankError::DivisionByZero));

        // Large part, large amount: no intermediate overflow
        let part = 100 * asset_a::ONE;
        let whole = 400_000_000 * asset_b::ONE;
        assert_eq!(proportional_share(part, whole / 2, whole).unwrap(), 50 * asset_a::ONE);
    }

    #[test]
    fn test_mul_div_ceil() {
        assert_eq!(mul_div_ceil(10, 3, 4).unwrap(), 8);
        assert_eq!(mul_div_ceil(10, 2, 4).unwrap(), 5);
        assert_eq!(mul_div_ceil(0, 2, 4).unwrap(), 0);
        assert_eq!(mul_div_ceil(1, 1, 0), Err(BankError::DivisionByZero));
    }

    #[test]
    fn test_usd_value_of_asset_a() {
        let valuation = mainnet_valuation();

        // 0.0005 ETH at $2,000 = $1
        let usd = valuation.usd_value(Asset::A, 500_000_000_000_000, PRICE_2000).unwrap();
        assert_eq!(usd, asset_b::ONE);

        // 1 ETH at $2,000 = $2,000
        let usd = valuation.usd_value(Asset::A, asset_a::ONE, PRICE_2000).unwrap();
        assert_eq!(usd, 2_000 * asset_b::ONE);
    }

    #[test]
    fn test_asset_b_is_pegged() {
        let valuation = mainnet_valuation();
        assert_eq!(valuation.usd_value(Asset::B, 42, PRICE_2000).unwrap(), 42);
    }

    #[test]
    fn test_asset_a_equivalent_of_asset_b() {
        let valuation = mainnet_valuation();

        // $1 at $2,000/ETH = 0.0005 ETH
        let eq = valuation.asset_a_equivalent(Asset::B, asset_b::ONE, PRICE_2000).unwrap();
        assert_eq!(eq, 500_000_000_000_000);

        // Dust never counts as zero
        let valuation = Valuation::new(0, 6, 8).unwrap();
        assert_eq!(valuation.asset_a_equivalent(Asset::B, 1, PRICE_2000).unwrap(), 1);
        assert_eq!(valuation.asset_a_equivalent(Asset::B, 1_999 * asset_b::ONE, PRICE_2000).unwrap(), 1);
        assert_eq!(valuation.asset_a_equivalent(Asset::B, 0, PRICE_2000).unwrap(), 0);

        assert_eq!(
            valuation.asset_a_equivalent(Asset::B, asset_b::ONE, 0),
            Err(BankError::DivisionByZero)
        );
    }

    #[test]
    fn test_whole_unit_valuation() {
        // Asset A without decimals, as used by the capacity examples
        let valuation = Valuation::new(0, 6, 8).unwrap();
        assert_eq!(valuation.usd_value(Asset::A, 3, PRICE_2000).unwrap(), 6_000 * asset_b::ONE);
    }

    #[test]
    fn test_invalid_decimal_combinations() {
        assert!(Valuation::new(0, 9, 8).is_err());
        assert!(Valuation::new(38, 0, 8).is_err());
        assert!(Valuation::new(30, 0, 8).is_ok());
    }
}
