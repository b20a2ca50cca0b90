//! Ledger Events for vaultbank
//!
//! Events are emitted during execution and carry enough data for an
//! external observer to rebuild every vault without reading storage.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Asset, RewardId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Balance Events (0x01 - 0x1F)
    Deposit = 0x01,
    DepositAssetB = 0x02,
    Withdrawal = 0x03,
    WithdrawalAssetB = 0x04,

    // Reward Events (0x20 - 0x3F)
    RewardGranted = 0x20,

    // Admin Events (0x80 - 0x9F)
    ParametersUpdated = 0x80,
}

/// Main event enum containing all ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum BankEvent {
    // ============ Balance Events ============

    /// Asset A credited to a vault
    Deposit {
        user: Address,
        amount: u128,
        /// USD value added to the vault's valuation
        usd_value: u128,
    },

    /// Asset B credited to a vault
    DepositAssetB {
        user: Address,
        amount: u128,
        usd_value: u128,
    },

    /// Asset A debited from a vault and paid out
    Withdrawal {
        user: Address,
        amount: u128,
        /// USD value removed from the vault's valuation
        usd_value: u128,
    },

    /// Asset B debited from a vault and paid out
    WithdrawalAssetB {
        user: Address,
        amount: u128,
        usd_value: u128,
    },

    // ============ Reward Events ============

    /// One-time reward issued
    RewardGranted {
        user: Address,
        reward_id: RewardId,
    },

    // ============ Admin Events ============

    /// Administrative parameters changed
    ParametersUpdated {
        by: Address,
        withdrawal_cap_a: u128,
        withdrawal_cap_b: u128,
        reward_threshold: u128,
        reward_metadata_uri: String,
    },
}

impl BankEvent {
    /// Balance event for a deposit of `asset`
    pub fn deposit(asset: Asset, user: Address, amount: u128, usd_value: u128) -> Self {
        match asset {
            Asset::A => Self::Deposit { user, amount, usd_value },
            Asset::B => Self::DepositAssetB { user, amount, usd_value },
        }
    }

    /// Balance event for a withdrawal of `asset`
    pub fn withdrawal(asset: Asset, user: Address, amount: u128, usd_value: u128) -> Self {
        match asset {
            Asset::A => Self::Withdrawal { user, amount, usd_value },
            Asset::B => Self::WithdrawalAssetB { user, amount, usd_value },
        }
    }

    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Deposit { .. } => EventType::Deposit,
            Self::DepositAssetB { .. } => EventType::DepositAssetB,
            Self::Withdrawal { .. } => EventType::Withdrawal,
            Self::WithdrawalAssetB { .. } => EventType::WithdrawalAssetB,
            Self::RewardGranted { .. } => EventType::RewardGranted,
            Self::ParametersUpdated { .. } => EventType::ParametersUpdated,
        }
    }

    /// Identity the event is about, if any
    pub fn user(&self) -> Option<&Address> {
        match self {
            Self::Deposit { user, .. }
            | Self::DepositAssetB { user, .. }
            | Self::Withdrawal { user, .. }
            | Self::WithdrawalAssetB { user, .. }
            | Self::RewardGranted { user, .. } => Some(user),
            Self::ParametersUpdated { .. } => None,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BankEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: BankEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[BankEvent] {
        &self.events
    }

    /// Remove and return all events, leaving the log empty
    pub fn drain(&mut self) -> Vec<BankEvent> {
        std::mem::take(&mut self.events)
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&BankEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Position to roll back to if the current operation is undone
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    /// Drop every event emitted after `mark`
    pub fn rollback_to(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
