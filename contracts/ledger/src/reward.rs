//! Reward Trigger
//!
//! Post-deposit check that issues the one-time reward. A user is marked as
//! a recipient before the issuer is called and the mark is released if
//! issuance fails, so the reward is granted at most once.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vaultbank_common::{
    interfaces::RewardIssuer,
    types::{Address, RawReason, RewardId},
};

/// Outcome of the reward check for one deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum RewardStatus {
    /// Valuation below the threshold
    NotEligible,
    /// User already holds the reward
    AlreadyGranted,
    /// Reward issued by this deposit
    Granted(RewardId),
    /// Issuer refused; the user stays eligible
    IssuanceFailed(RawReason),
}

impl RewardStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Recipients and the ids issued to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RewardRegistry {
    /// Permanent membership set
    granted: BTreeSet<Address>,
    issued: BTreeMap<Address, RewardId>,
}

impl RewardRegistry {
    pub fn is_recipient(&self, user: &Address) -> bool {
        self.granted.contains(user)
    }

    pub fn reward_of(&self, user: &Address) -> Option<RewardId> {
        self.issued.get(user).copied()
    }

    pub fn recipient_count(&self) -> usize {
        self.granted.len()
    }
}

pub struct RewardTrigger {
    issuer: Box<dyn RewardIssuer>,
    registry: RefCell<RewardRegistry>,
}

impl RewardTrigger {
    pub fn new(issuer: Box<dyn RewardIssuer>) -> Self {
        Self {
            issuer,
            registry: RefCell::new(RewardRegistry::default()),
        }
    }

    pub fn registry(&self) -> RewardRegistry {
        self.registry.borrow().clone()
    }

    pub fn is_recipient(&self, user: &Address) -> bool {
        self.registry.borrow().is_recipient(user)
    }

    pub fn reward_of(&self, user: &Address) -> Option<RewardId> {
        self.registry.borrow().reward_of(user)
    }

    /// Issue the reward if `user` is not yet a recipient and `total_usd`
    /// has reached `threshold_usd`.
    ///
    /// Both values must come from the deposit's own price snapshot.
    pub fn evaluate(
        &self,
        user: &Address,
        total_usd: u128,
        threshold_usd: u128,
        metadata_ref: &str,
    ) -> RewardStatus {
        {
            let mut registry = self.registry.borrow_mut();
            if registry.is_recipient(user) {
                return RewardStatus::AlreadyGranted;
            }
            if total_usd < threshold_usd {
                return RewardStatus::NotEligible;
            }
            registry.granted.insert(*user);
        }

        debug!(user = %hex::encode(user), total_usd = %total_usd, "reward threshold reached");

        // No borrow held: the issuer may call back into read-only queries.
        match self.issuer.mint(user, metadata_ref) {
            Ok(reward_id) => {
                self.registry.borrow_mut().issued.insert(*user, reward_id);
                info!(user = %hex::encode(user), reward_id, "reward granted");
                RewardStatus::Granted(reward_id)
            }
            Err(reason) => {
                self.registry.borrow_mut().granted.remove(user);
                warn!(user = %hex::encode(user), %reason, "reward issuance failed");
                RewardStatus::IssuanceFailed(reason)
            }
        }
    }
}

impl std::fmt::Debug for RewardTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardTrigger")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
