//! Collaborator Interfaces
//!
//! Boundaries to the services the ledger invokes but does not implement:
//! asset B transfers, asset A payouts and reward issuance. Each call either
//! succeeds or hands back the collaborator's raw failure payload.
//!
//! Implementations may call back into the ledger while a call is in
//! flight. The ledger's reentrancy guard rejects such calls.

use std::rc::Rc;

use crate::types::{Address, RawReason, RewardId};

/// Standard fungible-token transfer interface for asset B.
///
/// The implementation is bound to the ledger's own identity, so
/// `transfer` moves tokens out of the ledger and `transfer_from` spends the
/// allowance `from` granted to the ledger.
pub trait FungibleToken {
    /// Pull `amount` from `from` into `to`. `Ok(false)` means the token
    /// refused without reverting.
    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<bool, RawReason>;

    /// Send `amount` held by the ledger to `to`
    fn transfer(&self, to: &Address, amount: u128) -> Result<bool, RawReason>;

    /// Balance of `owner`
    fn balance_of(&self, owner: &Address) -> u128;
}

/// Payout of asset A (the native asset)
pub trait NativeTransfer {
    fn send(&self, to: &Address, amount: u128) -> Result<(), RawReason>;
}

/// Reward issuance service (mints a non-fungible reward)
pub trait RewardIssuer {
    fn mint(&self, to: &Address, metadata_ref: &str) -> Result<RewardId, RawReason>;
}

impl<T: FungibleToken + ?Sized> FungibleToken for Rc<T> {
    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<bool, RawReason> {
        (**self).transfer_from(from, to, amount)
    }

    fn transfer(&self, to: &Address, amount: u128) -> Result<bool, RawReason> {
        (**self).transfer(to, amount)
    }

    fn balance_of(&self, owner: &Address) -> u128 {
        (**self).balance_of(owner)
    }
}

impl<T: NativeTransfer + ?Sized> NativeTransfer for Rc<T> {
    fn send(&self, to: &Address, amount: u128) -> Result<(), RawReason> {
        (**self).send(to, amount)
    }
}

impl<T: RewardIssuer + ?Sized> RewardIssuer for Rc<T> {
    fn mint(&self, to: &Address, metadata_ref: &str) -> Result<RewardId, RawReason> {
        (**self).mint(to, metadata_ref)
    }
}
