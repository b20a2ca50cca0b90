//! Protocol Constants
//!
//! Decimal scales, default limits and reward parameters for vaultbank.
//! Every value here is only a default: a deployment overrides them through
//! [`crate::config::BankConfig`].

/// Asset A (native asset, arrives as attached value)
pub mod asset_a {
    /// Display symbol
    pub const SYMBOL: &str = "ETH";
    /// Decimal places
    pub const DECIMALS: u8 = 18;
    /// One whole unit in base units
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Asset B (USD-pegged fungible token, 1 unit = 1 USD)
pub mod asset_b {
    /// Display symbol
    pub const SYMBOL: &str = "USDC";
    /// Decimal places
    pub const DECIMALS: u8 = 6;
    /// One whole unit in base units
    pub const ONE: u128 = 1_000_000;
}

/// Oracle Configuration
pub mod oracle {
    /// Price precision (8 decimals, Chainlink style USD feeds)
    pub const PRICE_DECIMALS: u8 = 8;

    /// Maximum decimals accepted anywhere in the valuation pipeline.
    /// 10^38 is the largest power of ten that fits in a u128.
    pub const MAX_DECIMALS: u8 = 38;

    /// Maximum move between two operator updates (10% = 1000 bps)
    pub const MAX_PRICE_DEVIATION_BPS: u128 = 1000;
}

/// Capacity Limits
pub mod limits {
    use super::{asset_a, asset_b};

    /// Global ceiling on value held, in asset A base units (100 ETH)
    pub const DEFAULT_BANK_CAP: u128 = 100 * asset_a::ONE;

    /// Per-withdrawal ceiling for asset A (1 ETH)
    pub const DEFAULT_WITHDRAWAL_CAP_A: u128 = asset_a::ONE;

    /// Per-withdrawal ceiling for asset B (1,000 USDC)
    pub const DEFAULT_WITHDRAWAL_CAP_B: u128 = 1_000 * asset_b::ONE;
}

/// Reward Configuration
pub mod reward {
    use super::asset_a;

    /// Valuation threshold, expressed in asset A base units and priced with
    /// the snapshot of the triggering deposit (1 ETH)
    pub const DEFAULT_THRESHOLD: u128 = asset_a::ONE;

    /// Metadata reference handed to the issuance service
    pub const DEFAULT_METADATA_URI: &str = "ipfs://vaultbank/reward/founder.json";

    /// Longest metadata reference accepted by configuration
    pub const MAX_METADATA_URI_LEN: usize = 256;
}
