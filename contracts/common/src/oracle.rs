//! Oracle Module
//!
//! Adapter over an external latest-price source.
//!
//! The adapter performs no caching and no sign or staleness validation:
//! every call is a live read of the feed. Turning the raw answer into a
//! usable [`PriceSnapshot`] is a separate, explicit step so the caller owns
//! the policy for non-positive prices.

use std::cell::RefCell;
use std::rc::Rc;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{BankError, BankResult};
use crate::types::RawReason;

// ============================================================================
// Feed interface
// ============================================================================

/// One answer from the external feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoundData {
    /// Round the answer belongs to
    pub round_id: u64,
    /// Scaled price, may be non-positive on a broken feed
    pub answer: i128,
    /// Feed-side timestamp of the answer
    pub updated_at: u64,
}

/// External latest-price source
pub trait PriceFeed {
    /// Decimal scale of `RoundData::answer`
    fn decimals(&self) -> u8;

    /// Latest answer, or the raw failure payload
    fn latest_round(&self) -> Result<RoundData, RawReason>;
}

impl<T: PriceFeed + ?Sized> PriceFeed for Rc<T> {
    fn decimals(&self) -> u8 {
        (**self).decimals()
    }

    fn latest_round(&self) -> Result<RoundData, RawReason> {
        (**self).latest_round()
    }
}

impl<T: PriceFeed> PriceFeed for RefCell<T> {
    fn decimals(&self) -> u8 {
        self.borrow().decimals()
    }

    fn latest_round(&self) -> Result<RoundData, RawReason> {
        self.borrow().latest_round()
    }
}

// ============================================================================
// Prices
// ============================================================================

/// Raw fixed-point price as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FixedPointPrice {
    /// Scaled value (`value / 10^decimals` USD per unit of asset A)
    pub value: i128,
    /// Decimal scale
    pub decimals: u8,
    /// Round the value was read from
    pub round_id: u64,
    /// Feed-side timestamp
    pub updated_at: u64,
}

impl FixedPointPrice {
    /// Validate the price for use in one operation.
    ///
    /// Non-positive prices are rejected.
    pub fn snapshot(&self) -> BankResult<PriceSnapshot> {
        if self.value <= 0 {
            return Err(BankError::InvalidOraclePrice { price: self.value });
        }
        Ok(PriceSnapshot {
            price: self.value as u128,
            decimals: self.decimals,
            round_id: self.round_id,
        })
    }
}

/// Positive price fetched once at the start of an operation and reused for
/// every conversion inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PriceSnapshot {
    price: u128,
    decimals: u8,
    round_id: u64,
}

impl PriceSnapshot {
    pub fn price(&self) -> u128 {
        self.price
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn round_id(&self) -> u64 {
        self.round_id
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Price oracle adapter
pub struct PriceOracle {
    feed: Box<dyn PriceFeed>,
    decimals: u8,
}

impl PriceOracle {
    /// Wrap `feed`, checking that it reports `expected_decimals`
    pub fn new(feed: Box<dyn PriceFeed>, expected_decimals: u8) -> BankResult<Self> {
        let decimals = feed.decimals();
        if decimals != expected_decimals {
            return Err(BankError::InvalidConfig {
                param: "price_decimals",
                reason: "feed decimals do not match configuration",
            });
        }
        Ok(Self { feed, decimals })
    }

    /// Latest price from the feed. Always a live read.
    pub fn get_price(&self) -> BankResult<FixedPointPrice> {
        let round = self
            .feed
            .latest_round()
            .map_err(|reason| BankError::OracleUnavailable { reason })?;

        Ok(FixedPointPrice {
            value: round.answer,
            decimals: self.decimals,
            round_id: round.round_id,
            updated_at: round.updated_at,
        })
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

impl std::fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceOracle")
            .field("decimals", &self.decimals)
            .finish_non_exhaustive()
    }
}
