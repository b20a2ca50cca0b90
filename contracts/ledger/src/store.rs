//! Ledger Store
//!
//! Owns every vault record and the process-wide totals. All balance
//! mutation in the crate goes through here.
//!
//! Mutations are split in two phases. `prepare_*` performs every check
//! and every checked global update on a copy, touching nothing; `commit_*`
//! applies the prepared result and cannot fail. Callers hold the
//! reentrancy lock across both phases, so nothing can change in between.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use vaultbank_common::{
    check,
    errors::{BankError, BankResult},
    math::{proportional_share, FailOnOverflow, Valuation},
    oracle::PriceSnapshot,
    types::{Address, Asset, Vault},
};

// ============ Global State ============

/// Process-wide totals. Every field fails loudly on overflow.
#[derive(
    Debug, Clone, Default, PartialEq, Eq,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct GlobalLedger {
    /// Asset A equivalent of everything held, bounded by the bank cap
    pub total_value_locked: FailOnOverflow<u128>,
    /// Raw asset A custodied
    pub held_asset_a: FailOnOverflow<u128>,
    /// Raw asset B custodied
    pub held_asset_b: FailOnOverflow<u128>,
    pub global_deposit_count: FailOnOverflow<u64>,
    pub global_withdrawal_count: FailOnOverflow<u64>,
}

impl GlobalLedger {
    pub fn held(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.held_asset_a.get(),
            Asset::B => self.held_asset_b.get(),
        }
    }

    fn held_mut(&mut self, asset: Asset) -> &mut FailOnOverflow<u128> {
        match asset {
            Asset::A => &mut self.held_asset_a,
            Asset::B => &mut self.held_asset_b,
        }
    }
}

// ============ Mutation Types ============

/// Conversion of one amount at one price snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub asset: Asset,
    pub amount: u128,
    /// USD value (asset B base units)
    pub usd_value: u128,
    /// Asset A equivalent, the unit of the bank cap. Rounded up on the way
    /// in; on the way out, the share of the vault's locked value released.
    pub value_locked: u128,
}

/// Fully checked deposit waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeposit {
    user: Address,
    quote: Quote,
    globals: GlobalLedger,
}

impl PendingDeposit {
    pub fn user(&self) -> Address {
        self.user
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }
}

/// Fully checked withdrawal waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWithdrawal {
    user: Address,
    quote: Quote,
    globals: GlobalLedger,
}

impl PendingWithdrawal {
    pub fn user(&self) -> Address {
        self.user
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }
}

/// Saved copy of one vault and the globals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    user: Address,
    vault: Option<Vault>,
    globals: GlobalLedger,
}

// ============ Store ============

/// User identity -> vault record, plus global totals
#[derive(Debug, Clone)]
pub struct LedgerStore {
    vaults: BTreeMap<Address, Vault>,
    globals: GlobalLedger,
    valuation: Valuation,
}

impl LedgerStore {
    pub fn new(valuation: Valuation) -> Self {
        Self {
            vaults: BTreeMap::new(),
            globals: GlobalLedger::default(),
            valuation,
        }
    }

    // ============ Queries ============

    pub fn vault(&self, user: &Address) -> Option<&Vault> {
        self.vaults.get(user)
    }

    pub fn vaults(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values()
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    pub fn globals(&self) -> &GlobalLedger {
        &self.globals
    }

    pub fn total_value_locked(&self) -> u128 {
        self.globals.total_value_locked.get()
    }

    pub fn balance(&self, user: &Address, asset: Asset) -> u128 {
        self.vaults.get(user).map_or(0, |v| v.balance(asset))
    }

    /// Convert `amount` of `asset` at `price`
    pub fn quote(&self, asset: Asset, amount: u128, price: &PriceSnapshot) -> BankResult<Quote> {
        Ok(Quote {
            asset,
            amount,
            usd_value: self.valuation.usd_value(asset, amount, price.price())?,
            value_locked: self.valuation.asset_a_equivalent(asset, amount, price.price())?,
        })
    }

    // ============ Deposit ============

    /// Check a deposit of an already quoted amount. Touches nothing.
    pub fn prepare_deposit(&self, user: Address, quote: Quote) -> BankResult<PendingDeposit> {
        let mut globals = self.globals.clone();
        globals.total_value_locked.try_add(quote.value_locked)?;
        globals.held_mut(quote.asset).try_add(quote.amount)?;
        globals.global_deposit_count.try_increment()?;

        Ok(PendingDeposit { user, quote, globals })
    }

    /// Apply a prepared deposit, creating the vault on first use
    pub fn commit_deposit(&mut self, pending: PendingDeposit) -> Quote {
        let PendingDeposit { user, quote, globals } = pending;

        let vault = self.vaults.entry(user).or_insert_with(|| Vault::new(user));
        vault.balance_mut(quote.asset).credit(quote.amount);
        vault.locked_mut(quote.asset).credit(quote.value_locked);
        vault.total_usd.credit(quote.usd_value);
        vault.cumulative_deposited_usd.credit(quote.usd_value);
        vault.deposit_count.increment();

        self.globals = globals;
        quote
    }

    /// Prepare and commit in one step
    pub fn deposit(
        &mut self,
        user: Address,
        asset: Asset,
        amount: u128,
        price: &PriceSnapshot,
    ) -> BankResult<Quote> {
        let quote = self.quote(asset, amount, price)?;
        let pending = self.prepare_deposit(user, quote)?;
        Ok(self.commit_deposit(pending))
    }

    // ============ Withdrawal ============

    /// Check a withdrawal, balance first. Touches nothing.
    ///
    /// Total value locked is released by the withdrawn share of what the
    /// vault locked for this asset, not re-quoted at the current price, so
    /// it returns to zero exactly when every vault is empty.
    pub fn prepare_withdrawal(
        &self,
        user: Address,
        asset: Asset,
        amount: u128,
        price: &PriceSnapshot,
    ) -> BankResult<PendingWithdrawal> {
        let balance = self.balance(&user, asset);
        check!(
            amount <= balance,
            BankError::InsufficientBalance {
                account: user,
                balance,
                requested: amount,
            }
        );

        let mut quote = self.quote(asset, amount, price)?;
        let locked = self.vaults.get(&user).map_or(0, |v| v.locked(asset));
        quote.value_locked = if amount == balance {
            locked
        } else {
            proportional_share(locked, amount, balance)?
        };

        let mut globals = self.globals.clone();
        globals.total_value_locked.try_sub(quote.value_locked)?;
        globals.held_mut(asset).try_sub(amount)?;
        globals.global_withdrawal_count.try_increment()?;

        Ok(PendingWithdrawal { user, quote, globals })
    }

    /// Apply a prepared withdrawal.
    ///
    /// The valuation is reduced by the quote, floored at zero: if the price
    /// rose since the asset was deposited the quote can exceed what the
    /// vault was credited with.
    pub fn commit_withdrawal(&mut self, pending: PendingWithdrawal) -> Quote {
        let PendingWithdrawal { user, quote, globals } = pending;

        let vault = self.vaults.entry(user).or_insert_with(|| Vault::new(user));
        let usd_removed = quote.usd_value.min(vault.total_usd());
        vault.balance_mut(quote.asset).debit(quote.amount);
        vault.locked_mut(quote.asset).debit(quote.value_locked);
        vault.total_usd.debit(usd_removed);
        vault.cumulative_withdrawn_usd.credit(quote.usd_value);
        vault.withdrawal_count.increment();

        self.globals = globals;
        quote
    }

    /// Prepare and commit in one step
    pub fn withdraw(
        &mut self,
        user: Address,
        asset: Asset,
        amount: u128,
        price: &PriceSnapshot,
    ) -> BankResult<Quote> {
        let pending = self.prepare_withdrawal(user, asset, amount, price)?;
        Ok(self.commit_withdrawal(pending))
    }

    // ============ Compensation ============

    /// Save `user`'s vault and the globals
    pub fn checkpoint(&self, user: &Address) -> Checkpoint {
        Checkpoint {
            user: *user,
            vault: self.vaults.get(user).cloned(),
            globals: self.globals.clone(),
        }
    }

    /// Put back exactly what `checkpoint` saved
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        let Checkpoint { user, vault, globals } = checkpoint;
        match vault {
            Some(vault) => {
                self.vaults.insert(user, vault);
            }
            None => {
                self.vaults.remove(&user);
            }
        }
        self.globals = globals;
    }
}
