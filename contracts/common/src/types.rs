//! Core Types for vaultbank
//!
//! Identities, asset kinds, raw failure payloads and the per-user vault
//! record.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{asset_a, asset_b};
use crate::math::WrapOnOverflow;

/// Type alias for user and contract identities (32-byte hash)
pub type Address = [u8; 32];

/// Identifier returned by the reward issuance service
pub type RewardId = u64;

/// Derive a deterministic identity from a label.
///
/// Used for the bank's own address and for fixtures; user identities are
/// supplied by the host.
pub fn derive_address(label: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"vaultbank/address/");
    hasher.update(label);
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

// ============ Assets ============

/// The two asset kinds held by the ledger
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Asset {
    /// Native asset, priced by the oracle
    A = 0,
    /// USD-pegged fungible token, valued 1:1
    B = 1,
}

impl Asset {
    /// Display symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::A => asset_a::SYMBOL,
            Asset::B => asset_b::SYMBOL,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Direction of a balance-mutating operation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum Operation {
    Deposit,
    Withdrawal,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit => f.write_str("deposit"),
            Operation::Withdrawal => f.write_str("withdrawal"),
        }
    }
}

// ============ External Failure Payload ============

/// Raw failure payload returned by an external collaborator.
///
/// Carried unchanged inside errors so the caller sees exactly what the
/// collaborator reported.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct RawReason(pub Vec<u8>);

impl RawReason {
    /// Empty payload (collaborator returned `false` without data)
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Payload built from a UTF-8 message
    pub fn from_message(message: &str) -> Self {
        Self(message.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<no data>");
        }
        match std::str::from_utf8(&self.0) {
            Ok(text) => f.write_str(text),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

// ============ Vault ============

/// Per-user record of balances and cumulative statistics.
///
/// Created lazily on first deposit and never deleted. All fields follow the
/// wrap-on-overflow policy: they are bounded by the bank cap, which is
/// enforced with checked arithmetic before any vault field changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Vault {
    /// Owner identity
    pub owner: Address,
    /// Raw asset A held
    pub asset_a_balance: WrapOnOverflow<u128>,
    /// Raw asset B held
    pub asset_b_balance: WrapOnOverflow<u128>,
    /// Incrementally maintained USD valuation (asset B base units)
    pub total_usd: WrapOnOverflow<u128>,
    /// Lifetime USD deposited
    pub cumulative_deposited_usd: WrapOnOverflow<u128>,
    /// Lifetime USD withdrawn
    pub cumulative_withdrawn_usd: WrapOnOverflow<u128>,
    /// Asset A equivalent this vault's asset A holdings contribute to total value locked
    pub asset_a_locked: WrapOnOverflow<u128>,
    /// Asset A equivalent this vault's asset B holdings contribute to total value locked
    pub asset_b_locked: WrapOnOverflow<u128>,
    /// Number of deposits
    pub deposit_count: WrapOnOverflow<u64>,
    /// Number of withdrawals
    pub withdrawal_count: WrapOnOverflow<u64>,
}

impl Vault {
    /// Creates an empty vault for `owner`
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            asset_a_balance: WrapOnOverflow::default(),
            asset_b_balance: WrapOnOverflow::default(),
            total_usd: WrapOnOverflow::default(),
            cumulative_deposited_usd: WrapOnOverflow::default(),
            cumulative_withdrawn_usd: WrapOnOverflow::default(),
            asset_a_locked: WrapOnOverflow::default(),
            asset_b_locked: WrapOnOverflow::default(),
            deposit_count: WrapOnOverflow::default(),
            withdrawal_count: WrapOnOverflow::default(),
        }
    }

    /// Raw balance of one asset
    pub fn balance(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.asset_a_balance.get(),
            Asset::B => self.asset_b_balance.get(),
        }
    }

    /// Mutable balance slot of one asset
    pub fn balance_mut(&mut self, asset: Asset) -> &mut WrapOnOverflow<u128> {
        match asset {
            Asset::A => &mut self.asset_a_balance,
            Asset::B => &mut self.asset_b_balance,
        }
    }

    /// Value locked on behalf of one asset's holdings
    pub fn locked(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.asset_a_locked.get(),
            Asset::B => self.asset_b_locked.get(),
        }
    }

    /// Mutable locked-value slot of one asset
    pub fn locked_mut(&mut self, asset: Asset) -> &mut WrapOnOverflow<u128> {
        match asset {
            Asset::A => &mut self.asset_a_locked,
            Asset::B => &mut self.asset_b_locked,
        }
    }

    /// Current valuation in USD base units
    pub fn total_usd(&self) -> u128 {
        self.total_usd.get()
    }

    /// (deposit_count, withdrawal_count)
    pub fn counts(&self) -> (u64, u64) {
        (self.deposit_count.get(), self.withdrawal_count.get())
    }

    /// Returns true if nothing is held in either asset
    pub fn is_empty(&self) -> bool {
        self.asset_a_balance.get() == 0 && self.asset_b_balance.get() == 0
    }
}
