//! Reference Price Feed
//!
//! Asset A / USD price feed for the vaultbank ledger. A trusted operator
//! publishes rounds; an admin can rotate the operator or pause the feed.
//!
//! The ledger reads it through [`PriceFeed`]. Each accepted update opens a
//! new round; a paused feed answers every read with an error payload.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vaultbank_common::{
    constants::oracle::{MAX_PRICE_DEVIATION_BPS, PRICE_DECIMALS},
    oracle::{PriceFeed, RoundData},
    types::{Address, RawReason},
};

// ============ Errors ============

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("0x{} is not the feed operator", hex::encode(.caller))]
    NotOperator { caller: Address },

    #[error("0x{} is not the feed admin", hex::encode(.caller))]
    AdminOnly { caller: Address },

    #[error("feed is paused")]
    Paused,

    #[error("price must be positive, got {price}")]
    NonPositivePrice { price: i128 },

    #[error("price moved {deviation_bps} bps from {old_price} to {new_price}, max {max_deviation_bps}")]
    PriceDeviation {
        old_price: i128,
        new_price: i128,
        deviation_bps: u128,
        max_deviation_bps: u128,
    },

    #[error("round timestamp {timestamp} is before {last_update}")]
    OutOfOrder { timestamp: u64, last_update: u64 },

    #[error("operator unchanged")]
    SameOperator,
}

// ============ Feed State ============

/// Feed contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeedState {
    /// Latest answer, scaled by `10^decimals`
    pub answer: i128,
    pub round_id: u64,
    pub updated_at: u64,
    /// Authorized operator (can publish rounds)
    pub operator: Address,
    /// Admin (can change operator, pause)
    pub admin: Address,
    pub is_active: bool,
    pub decimals: u8,
}

impl FeedState {
    /// Create a feed with a first round at `timestamp`
    pub fn new(admin: Address, operator: Address, initial_price: i128, timestamp: u64) -> Self {
        Self {
            answer: initial_price,
            round_id: 1,
            updated_at: timestamp,
            operator,
            admin,
            is_active: true,
            decimals: PRICE_DECIMALS,
        }
    }

    /// Default price for testing ($2,000)
    pub const DEFAULT_PRICE: i128 = 2_000_00000000;

    /// Publish a new round
    pub fn update_price(&mut self, signer: Address, price: i128, timestamp: u64) -> FeedResult<RoundData> {
        // 1. Only operator can update price
        if signer != self.operator {
            return Err(FeedError::NotOperator { caller: signer });
        }

        // 2. Feed must be active
        if !self.is_active {
            return Err(FeedError::Paused);
        }

        // 3. Price must be positive
        if price <= 0 {
            return Err(FeedError::NonPositivePrice { price });
        }

        // 4. Rounds move forward in time
        if timestamp < self.updated_at {
            return Err(FeedError::OutOfOrder {
                timestamp,
                last_update: self.updated_at,
            });
        }

        // 5. Check price deviation (prevent manipulation)
        let deviation_bps = calculate_price_deviation(self.answer, price);
        if deviation_bps > MAX_PRICE_DEVIATION_BPS {
            return Err(FeedError::PriceDeviation {
                old_price: self.answer,
                new_price: price,
                deviation_bps,
                max_deviation_bps: MAX_PRICE_DEVIATION_BPS,
            });
        }

        self.answer = price;
        self.updated_at = timestamp;
        self.round_id += 1;
        Ok(self.round())
    }

    /// Rotate the operator
    pub fn set_operator(&mut self, signer: Address, new_operator: Address) -> FeedResult<()> {
        if signer != self.admin {
            return Err(FeedError::AdminOnly { caller: signer });
        }
        if new_operator == self.operator {
            return Err(FeedError::SameOperator);
        }
        self.operator = new_operator;
        Ok(())
    }

    /// Pause or resume the feed
    pub fn set_active(&mut self, signer: Address, active: bool) -> FeedResult<()> {
        if signer != self.admin {
            return Err(FeedError::AdminOnly { caller: signer });
        }
        self.is_active = active;
        Ok(())
    }

    /// Latest round, regardless of pause state
    pub fn round(&self) -> RoundData {
        RoundData {
            round_id: self.round_id,
            answer: self.answer,
            updated_at: self.updated_at,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new([0u8; 32], [0u8; 32], Self::DEFAULT_PRICE, 0)
    }
}

impl PriceFeed for FeedState {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_round(&self) -> Result<RoundData, RawReason> {
        if !self.is_active {
            return Err(RawReason::from_message(&FeedError::Paused.to_string()));
        }
        Ok(self.round())
    }
}

// ============ Helper Functions ============

/// Calculate price deviation in basis points
///
/// 100 bps = 1%, 10000 bps = 100%
fn calculate_price_deviation(old_price: i128, new_price: i128) -> u128 {
    if old_price <= 0 {
        return 10000; // 100% if no usable previous price
    }

    let diff = old_price.abs_diff(new_price);
    // Saturates instead of overflowing for absurd moves
    diff.saturating_mul(10000) / old_price.unsigned_abs()
}

// ============ Tests ============
