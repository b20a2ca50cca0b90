//! vaultbank Ledger
//!
//! Dual-asset accounting ledger. Users deposit and withdraw asset A (the
//! native asset) and asset B (a USD-pegged token); every operation is
//! valued through an external price feed and bounded by a global bank cap
//! and per-asset withdrawal caps.
//!
//! ## Operation Order
//!
//! Every mutating entry point runs the same sequence under one lock:
//!
//! 1. acquire the reentrancy lock
//! 2. reject zero amounts
//! 3. fetch the price once
//! 4. capacity check (bank cap on deposits, withdrawal cap on withdrawals)
//! 5. balance check (withdrawals)
//! 6. mutate the ledger store
//! 7. emit the event
//! 8. reward check (deposits) or payout (withdrawals)
//! 9. release the lock
//!
//! Asset B deposits pull the tokens between 5 and 6, before any write.
//!
//! ## Collaborators
//!
//! The price feed, asset B token, asset A payout, reward issuer and role
//! check are injected as trait objects. Any of them may call back into the
//! bank while a call is in flight: mutating entry points fail with
//! `ReentrantCall`, read-only queries answer from committed state.

use std::cell::RefCell;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vaultbank_common::{
    access_control::Authorizer,
    config::BankConfig,
    errors::{BankError, BankResult},
    events::{BankEvent, EventLog},
    interfaces::{FungibleToken, NativeTransfer, RewardIssuer},
    math::Valuation,
    oracle::{FixedPointPrice, PriceFeed, PriceOracle, PriceSnapshot},
    types::{Address, Asset, Operation, RawReason, RewardId, Vault},
    validation::require_non_zero,
};

pub mod admin;
pub mod capacity;
pub mod guard;
pub mod reward;
pub mod store;

#[cfg(test)]
mod test_support;



pub use capacity::{check_bank_cap, check_withdrawal_cap};
pub use guard::{LockGuard, ReentrancyLock};
pub use reward::{RewardRegistry, RewardStatus, RewardTrigger};
pub use store::{GlobalLedger, LedgerStore, Quote};

// ============ Receipts ============

/// Result of a committed deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DepositReceipt {
    pub user: Address,
    pub asset: Asset,
    pub amount: u128,
    /// USD value credited to the vault
    pub usd_value: u128,
    /// Price the whole operation used
    pub price: PriceSnapshot,
    pub reward: RewardStatus,
}

/// Result of a committed and paid out withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct WithdrawalReceipt {
    pub user: Address,
    pub asset: Asset,
    pub amount: u128,
    /// USD value of the withdrawn amount at `price`
    pub usd_value: u128,
    pub price: PriceSnapshot,
}

// ============ Bank ============

/// External services the bank is wired to
pub struct Collaborators {
    pub price_feed: Box<dyn PriceFeed>,
    /// Asset B token, bound to the bank's own identity
    pub asset_b: Box<dyn FungibleToken>,
    pub asset_a_payout: Box<dyn NativeTransfer>,
    pub rewards: Box<dyn RewardIssuer>,
    pub authorizer: Box<dyn Authorizer>,
}

/// The ledger
pub struct Bank {
    address: Address,
    config: RefCell<BankConfig>,
    valuation: Valuation,
    oracle: PriceOracle,
    asset_b: Box<dyn FungibleToken>,
    payout: Box<dyn NativeTransfer>,
    authorizer: Box<dyn Authorizer>,
    lock: ReentrancyLock,
    store: RefCell<LedgerStore>,
    rewards: RewardTrigger,
    events: RefCell<EventLog>,
}

impl Bank {
    /// Creates a bank at `address`.
    ///
    /// Fails if `config` is invalid or the feed reports a different
    /// number of decimals than configured.
    pub fn new(address: Address, config: BankConfig, collaborators: Collaborators) -> BankResult<Self> {
        config.validate()?;
        let valuation = config.valuation()?;
        let oracle = PriceOracle::new(collaborators.price_feed, config.price_decimals)?;

        info!(
            bank = %hex::encode(address),
            bank_cap = %config.bank_cap,
            withdrawal_cap_a = %config.withdrawal_cap_a,
            withdrawal_cap_b = %config.withdrawal_cap_b,
            "bank initialized"
        );

        Ok(Self {
            address,
            valuation,
            oracle,
            asset_b: collaborators.asset_b,
            payout: collaborators.asset_a_payout,
            authorizer: collaborators.authorizer,
            lock: ReentrancyLock::new(),
            store: RefCell::new(LedgerStore::new(valuation)),
            rewards: RewardTrigger::new(collaborators.rewards),
            events: RefCell::new(EventLog::new()),
            config: RefCell::new(config),
        })
    }

    // ============ Deposits ============

    /// Credit `amount` of asset A, already attached to the call by `caller`
    pub fn deposit_asset_a(&self, caller: Address, amount: u128) -> BankResult<DepositReceipt> {
        let _guard = self.enter("deposit_asset_a")?;
        require_non_zero(amount, Operation::Deposit, Asset::A)?;
        let price = self.price_snapshot()?;

        let prepared = self.prepare_deposit(caller, Asset::A, amount, &price)?;
        Ok(self.commit_deposit(prepared, price))
    }

    /// Pull `amount` of asset B from `caller` and credit it.
    ///
    /// `caller` must have approved the bank for at least `amount`.
    pub fn deposit_asset_b(&self, caller: Address, amount: u128) -> BankResult<DepositReceipt> {
        let _guard = self.enter("deposit_asset_b")?;
        require_non_zero(amount, Operation::Deposit, Asset::B)?;
        let price = self.price_snapshot()?;

        let prepared = self.prepare_deposit(caller, Asset::B, amount, &price)?;

        // Funds received, or nothing is written
        match self.asset_b.transfer_from(&caller, &self.address, amount) {
            Ok(true) => {}
            Ok(false) => return Err(self.transfer_failed(&caller, Asset::B, RawReason::empty())),
            Err(reason) => return Err(self.transfer_failed(&caller, Asset::B, reason)),
        }

        Ok(self.commit_deposit(prepared, price))
    }

    /// Every check and computation of a deposit. Writes nothing.
    fn prepare_deposit(
        &self,
        user: Address,
        asset: Asset,
        amount: u128,
        price: &PriceSnapshot,
    ) -> BankResult<PreparedDeposit> {
        let (bank_cap, reward_threshold, reward_metadata_uri) = {
            let config = self.config.borrow();
            (config.bank_cap, config.reward_threshold, config.reward_metadata_uri.clone())
        };

        let store = self.store.borrow();
        let quote = store.quote(asset, amount, price)?;
        check_bank_cap(quote.value_locked, store.total_value_locked(), bank_cap)?;
        let pending = store.prepare_deposit(user, quote)?;

        // Same snapshot as the deposit itself
        let threshold_usd = self.valuation.usd_value(Asset::A, reward_threshold, price.price())?;

        debug!(
            user = %hex::encode(user),
            %asset,
            amount = %amount,
            usd_value = %quote.usd_value,
            "deposit accepted"
        );

        Ok(PreparedDeposit {
            pending,
            threshold_usd,
            reward_metadata_uri,
        })
    }

    fn commit_deposit(&self, prepared: PreparedDeposit, price: PriceSnapshot) -> DepositReceipt {
        let PreparedDeposit {
            pending,
            threshold_usd,
            reward_metadata_uri,
        } = prepared;

        let user = pending.user();
        let (quote, total_usd) = {
            let mut store = self.store.borrow_mut();
            let quote = store.commit_deposit(pending);
            (quote, store.vault(&user).map_or(0, Vault::total_usd))
        };

        self.events
            .borrow_mut()
            .emit(BankEvent::deposit(quote.asset, user, quote.amount, quote.usd_value));

        info!(
            user = %hex::encode(user),
            asset = %quote.asset,
            amount = %quote.amount,
            usd_value = %quote.usd_value,
            total_usd = %total_usd,
            "deposit committed"
        );

        let reward = self
            .rewards
            .evaluate(&user, total_usd, threshold_usd, &reward_metadata_uri);
        if let RewardStatus::Granted(reward_id) = reward {
            self.events
                .borrow_mut()
                .emit(BankEvent::RewardGranted { user, reward_id });
        }

        DepositReceipt {
            user,
            asset: quote.asset,
            amount: quote.amount,
            usd_value: quote.usd_value,
            price,
            reward,
        }
    }

    // ============ Withdrawals ============

    /// Debit `amount` of asset A and send it to `caller`
    pub fn withdraw_asset_a(&self, caller: Address, amount: u128) -> BankResult<WithdrawalReceipt> {
        self.withdraw(caller, Asset::A, amount)
    }

    /// Debit `amount` of asset B and transfer it to `caller`
    pub fn withdraw_asset_b(&self, caller: Address, amount: u128) -> BankResult<WithdrawalReceipt> {
        self.withdraw(caller, Asset::B, amount)
    }

    fn withdraw(&self, caller: Address, asset: Asset, amount: u128) -> BankResult<WithdrawalReceipt> {
        let _guard = self.enter(match asset {
            Asset::A => "withdraw_asset_a",
            Asset::B => "withdraw_asset_b",
        })?;
        require_non_zero(amount, Operation::Withdrawal, asset)?;
        let price = self.price_snapshot()?;

        let cap = self.config.borrow().withdrawal_cap(asset);
        check_withdrawal_cap(amount, cap)?;

        let pending = self.store.borrow().prepare_withdrawal(caller, asset, amount, &price)?;

        let checkpoint = self.store.borrow().checkpoint(&caller);
        let mark = self.events.borrow().mark();

        let quote = self.store.borrow_mut().commit_withdrawal(pending);
        self.events
            .borrow_mut()
            .emit(BankEvent::withdrawal(asset, caller, amount, quote.usd_value));

        if let Err(reason) = self.pay_out(asset, &caller, amount) {
            self.store.borrow_mut().restore(checkpoint);
            self.events.borrow_mut().rollback_to(mark);
            return Err(self.transfer_failed(&caller, asset, reason));
        }

        info!(
            user = %hex::encode(caller),
            %asset,
            amount = %amount,
            usd_value = %quote.usd_value,
            "withdrawal committed"
        );

        Ok(WithdrawalReceipt {
            user: caller,
            asset,
            amount,
            usd_value: quote.usd_value,
            price,
        })
    }

    fn pay_out(&self, asset: Asset, to: &Address, amount: u128) -> Result<(), RawReason> {
        match asset {
            Asset::A => self.payout.send(to, amount),
            Asset::B => {
                if self.asset_b.transfer(to, amount)? {
                    Ok(())
                } else {
                    Err(RawReason::empty())
                }
            }
        }
    }

    // ============ Read-only Queries ============

    /// (deposit_count, withdrawal_count) of `user`
    pub fn get_account_counts(&self, user: &Address) -> (u64, u64) {
        self.store.borrow().vault(user).map_or((0, 0), Vault::counts)
    }

    /// Asset A held by the bank
    pub fn get_contract_balance(&self) -> u128 {
        self.store.borrow().globals().held(Asset::A)
    }

    /// Asset B held by the bank according to the ledger
    pub fn get_contract_balance_asset_b(&self) -> u128 {
        self.store.borrow().globals().held(Asset::B)
    }

    /// Current feed price, unvalidated
    pub fn get_latest_price(&self) -> BankResult<FixedPointPrice> {
        self.oracle.get_price()
    }

    pub fn vault(&self, user: &Address) -> Option<Vault> {
        self.store.borrow().vault(user).cloned()
    }

    pub fn balance(&self, user: &Address, asset: Asset) -> u128 {
        self.store.borrow().balance(user, asset)
    }

    pub fn total_value_locked(&self) -> u128 {
        self.store.borrow().total_value_locked()
    }

    pub fn globals(&self) -> GlobalLedger {
        self.store.borrow().globals().clone()
    }

    pub fn has_reward(&self, user: &Address) -> bool {
        self.rewards.is_recipient(user)
    }

    pub fn reward_of(&self, user: &Address) -> Option<RewardId> {
        self.rewards.reward_of(user)
    }

    pub fn config(&self) -> BankConfig {
        self.config.borrow().clone()
    }

    pub fn valuation(&self) -> Valuation {
        self.valuation
    }

    /// Events emitted so far
    pub fn events(&self) -> Vec<BankEvent> {
        self.events.borrow().events().to_vec()
    }

    /// Take all emitted events. Not allowed while an operation is in flight.
    pub fn drain_events(&self) -> BankResult<Vec<BankEvent>> {
        let _guard = self.enter("drain_events")?;
        Ok(self.events.borrow_mut().drain())
    }

    /// True while an entry point is executing
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    // ============ Helpers ============

    fn enter(&self, operation: &'static str) -> BankResult<LockGuard<'_>> {
        self.lock.acquire().map_err(|err| {
            warn!(operation, "reentrant call rejected");
            err
        })
    }

    /// One live read per operation
    fn price_snapshot(&self) -> BankResult<PriceSnapshot> {
        let price = self.oracle.get_price()?.snapshot()?;
        debug!(price = %price.price(), round_id = price.round_id(), "price fetched");
        Ok(price)
    }

    fn transfer_failed(&self, user: &Address, asset: Asset, reason: RawReason) -> BankError {
        warn!(user = %hex::encode(user), %asset, %reason, "transfer failed");
        BankError::TransferFailed { reason }
    }
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("address", &hex::encode(self.address))
            .field("config", &self.config)
            .field("lock", &self.lock)
            .field("store", &self.store)
            .field("rewards", &self.rewards)
            .finish_non_exhaustive()
    }
}

/// Checked deposit plus the reward inputs taken from the same snapshot
struct PreparedDeposit {
    pending: store::PendingDeposit,
    threshold_usd: u128,
    reward_metadata_uri: String,
}
