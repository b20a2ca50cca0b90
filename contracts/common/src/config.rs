//! Bank Configuration
//!
//! Construction-time parameters of a ledger. Defaults come from
//! [`crate::constants`]; a host can override any of them from JSON.
//!
//! ```rust,ignore
//! let config = BankConfig::from_json(r#"{ "bank_cap": "10", "withdrawal_cap_a": "2" }"#)?;
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{asset_a, asset_b, limits, oracle, reward};
use crate::errors::{BankError, BankResult};
use crate::math::Valuation;
use crate::types::Asset;

/// Ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct BankConfig {
    /// Global ceiling on total value locked, asset A base units
    #[serde(with = "u128_string")]
    pub bank_cap: u128,
    /// Per-withdrawal ceiling for asset A, base units
    #[serde(with = "u128_string")]
    pub withdrawal_cap_a: u128,
    /// Per-withdrawal ceiling for asset B, base units
    #[serde(with = "u128_string")]
    pub withdrawal_cap_b: u128,
    /// Reward threshold, asset A base units
    #[serde(with = "u128_string")]
    pub reward_threshold: u128,
    /// Metadata reference passed to the reward issuer
    pub reward_metadata_uri: String,
    pub asset_a_decimals: u8,
    pub asset_b_decimals: u8,
    pub price_decimals: u8,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            bank_cap: limits::DEFAULT_BANK_CAP,
            withdrawal_cap_a: limits::DEFAULT_WITHDRAWAL_CAP_A,
            withdrawal_cap_b: limits::DEFAULT_WITHDRAWAL_CAP_B,
            reward_threshold: reward::DEFAULT_THRESHOLD,
            reward_metadata_uri: reward::DEFAULT_METADATA_URI.to_string(),
            asset_a_decimals: asset_a::DECIMALS,
            asset_b_decimals: asset_b::DECIMALS,
            price_decimals: oracle::PRICE_DECIMALS,
        }
    }
}

impl BankConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> BankResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| BankError::InvalidConfig {
            param: "json",
            reason: "malformed bank configuration",
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter
    pub fn validate(&self) -> BankResult<()> {
        if self.bank_cap == 0 {
            return Err(BankError::InvalidConfig {
                param: "bank_cap",
                reason: "must be positive",
            });
        }
        validate_withdrawal_caps(self.withdrawal_cap_a, self.withdrawal_cap_b)?;
        validate_reward_parameters(self.reward_threshold, &self.reward_metadata_uri)?;
        self.valuation()?;
        Ok(())
    }

    /// Fixed-point conversion for these decimals
    pub fn valuation(&self) -> BankResult<Valuation> {
        Valuation::new(self.asset_a_decimals, self.asset_b_decimals, self.price_decimals)
    }

    /// Per-operation cap for `asset`
    pub fn withdrawal_cap(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.withdrawal_cap_a,
            Asset::B => self.withdrawal_cap_b,
        }
    }
}

/// Withdrawal caps must allow some withdrawal of each asset
pub fn validate_withdrawal_caps(cap_a: u128, cap_b: u128) -> BankResult<()> {
    if cap_a == 0 {
        return Err(BankError::InvalidConfig {
            param: "withdrawal_cap_a",
            reason: "must be positive",
        });
    }
    if cap_b == 0 {
        return Err(BankError::InvalidConfig {
            param: "withdrawal_cap_b",
            reason: "must be positive",
        });
    }
    Ok(())
}

/// Reward threshold must be positive and the metadata reference non-empty
pub fn validate_reward_parameters(threshold: u128, metadata_uri: &str) -> BankResult<()> {
    if threshold == 0 {
        return Err(BankError::InvalidConfig {
            param: "reward_threshold",
            reason: "must be positive",
        });
    }
    if metadata_uri.trim().is_empty() {
        return Err(BankError::InvalidConfig {
            param: "reward_metadata_uri",
            reason: "must not be empty",
        });
    }
    if metadata_uri.len() > reward::MAX_METADATA_URI_LEN {
        return Err(BankError::InvalidConfig {
            param: "reward_metadata_uri",
            reason: "too long",
        });
    }
    Ok(())
}

/// u128 amounts travel as decimal strings in JSON
mod u128_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
