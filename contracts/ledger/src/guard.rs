//! Reentrancy Guard
//!
//! A single lock shared by every mutating entry point. Acquisition returns
//! a [`LockGuard`]; dropping it releases the lock, so every exit path
//! (success, early `?` return, unwinding) leaves the ledger unlocked.

use std::cell::Cell;

use vaultbank_common::errors::{BankError, BankResult};

/// `Unlocked -> Locked -> Unlocked`
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    locked: Cell<bool>,
}

impl ReentrancyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or fail with `ReentrantCall` if it is held
    pub fn acquire(&self) -> BankResult<LockGuard<'_>> {
        if self.locked.get() {
            return Err(BankError::ReentrantCall);
        }
        self.locked.set(true);
        Ok(LockGuard { lock: self })
    }

    /// True exactly while an entry point is executing
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

/// Scoped ownership of the [`ReentrancyLock`]
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.set(false);
    }
}
