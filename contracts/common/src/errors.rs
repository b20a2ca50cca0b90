//! Error Types for vaultbank
//!
//! Every failure is reported to the immediate caller with a structured
//! reason. Nothing is retried internally and nothing is swallowed.

use thiserror::Error;

use crate::access_control::Role;
use crate::types::{Address, Asset, Operation, RawReason};

/// Result type alias for vaultbank operations
pub type BankResult<T> = Result<T, BankError>;

/// Main error enum for all ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    // ============ Validation Errors ============
    /// Deposit or withdrawal of zero units
    #[error("{operation} of zero {asset} is not allowed")]
    ZeroAmount { operation: Operation, asset: Asset },

    /// Deposit would push total value locked past the bank cap
    #[error("bank cap exceeded: requested {requested}, available {available}")]
    BankCapExceeded { requested: u128, available: u128 },

    /// Single withdrawal larger than the per-operation cap
    #[error("withdrawal exceeds cap: requested {requested}, cap {cap}")]
    WithdrawalCapExceeded { requested: u128, cap: u128 },

    /// Withdrawal larger than the vault's balance of that asset
    #[error(
        "insufficient balance for {}: balance {balance}, requested {requested}",
        hex::encode(.account)
    )]
    InsufficientBalance {
        account: Address,
        balance: u128,
        requested: u128,
    },

    // ============ Guard Errors ============
    /// A mutating entry point was invoked while another one is in flight
    #[error("reentrant call rejected")]
    ReentrantCall,

    // ============ External Call Errors ============
    /// Asset transfer reported failure
    #[error("transfer failed: {reason}")]
    TransferFailed { reason: RawReason },

    /// Oracle answered with a price the ledger cannot value against
    #[error("invalid oracle price {price}")]
    InvalidOraclePrice { price: i128 },

    /// Oracle call itself failed
    #[error("oracle unavailable: {reason}")]
    OracleUnavailable { reason: RawReason },

    // ============ Math Errors ============
    /// Arithmetic overflow on a checked quantity
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow on a checked quantity
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ Authorization Errors ============
    /// Caller lacks the role required for an administrative operation
    #[error("caller {} lacks role {role:?}", hex::encode(.caller))]
    Unauthorized { role: Role, caller: Address },

    // ============ Configuration Errors ============
    /// Configuration value rejected
    #[error("invalid config `{param}`: {reason}")]
    InvalidConfig {
        param: &'static str,
        reason: &'static str,
    },
}

impl BankError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroAmount { .. } => "E001_ZERO_AMOUNT",
            Self::BankCapExceeded { .. } => "E002_BANK_CAP",
            Self::WithdrawalCapExceeded { .. } => "E003_WITHDRAWAL_CAP",
            Self::InsufficientBalance { .. } => "E004_INSUFFICIENT_BALANCE",
            Self::ReentrantCall => "E010_REENTRANT_CALL",
            Self::TransferFailed { .. } => "E020_TRANSFER_FAILED",
            Self::InvalidOraclePrice { .. } => "E030_INVALID_PRICE",
            Self::OracleUnavailable { .. } => "E031_ORACLE_UNAVAILABLE",
            Self::Overflow => "E040_OVERFLOW",
            Self::Underflow => "E041_UNDERFLOW",
            Self::DivisionByZero => "E042_DIV_ZERO",
            Self::Unauthorized { .. } => "E050_UNAUTHORIZED",
            Self::InvalidConfig { .. } => "E060_INVALID_CONFIG",
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ZeroAmount { .. } => true,              // Send a real amount
            Self::BankCapExceeded { .. } => true,         // Deposit less
            Self::WithdrawalCapExceeded { .. } => true,   // Split the withdrawal
            Self::InsufficientBalance { .. } => true,     // Withdraw less
            Self::TransferFailed { .. } => true,          // Approve / fund, then retry
            _ => false,
        }
    }
}
