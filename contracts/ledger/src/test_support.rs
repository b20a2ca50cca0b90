//! In-memory collaborators and a wired-up bank for tests.
//!
//! Every fake can run a hook in the middle of its call, which is how tests
//! re-enter the bank from inside an external call.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use vaultbank_common::{
    access_control::{AccessControlState, Role},
    config::BankConfig,
    events::BankEvent,
    interfaces::{FungibleToken, NativeTransfer, RewardIssuer},
    oracle::{PriceFeed, RoundData},
    types::{derive_address, Address, RawReason, RewardId, Vault},
};

use crate::{Bank, Collaborators, GlobalLedger, RewardRegistry};

/// $2,000 per unit of asset A, 8 decimals
pub const PRICE_2000: i128 = 2_000_00000000;

/// One USD in asset B base units
pub const USD: u128 = 1_000_000;

pub fn addr(label: &[u8]) -> Address {
    derive_address(label)
}

type Hook = Rc<dyn Fn()>;

#[derive(Default)]
struct HookSlot(RefCell<Option<Hook>>);

impl HookSlot {
    fn set(&self, hook: impl Fn() + 'static) {
        *self.0.borrow_mut() = Some(Rc::new(hook));
    }

    fn run(&self) {
        let hook = self.0.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

// ============ Price Feed ============

pub struct MockFeed {
    pub answer: Cell<i128>,
    pub decimals: u8,
    pub reads: Cell<u32>,
    pub unavailable: Cell<bool>,
    round: Cell<u64>,
    hook: HookSlot,
}

impl MockFeed {
    pub fn new(answer: i128, decimals: u8) -> Self {
        Self {
            answer: Cell::new(answer),
            decimals,
            reads: Cell::new(0),
            unavailable: Cell::new(false),
            round: Cell::new(1),
            hook: HookSlot::default(),
        }
    }

    /// Publish a new round
    pub fn set_price(&self, answer: i128) {
        self.answer.set(answer);
        self.round.set(self.round.get() + 1);
    }

    pub fn on_read(&self, hook: impl Fn() + 'static) {
        self.hook.set(hook);
    }
}

impl PriceFeed for MockFeed {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_round(&self) -> Result<RoundData, RawReason> {
        self.reads.set(self.reads.get() + 1);
        if self.unavailable.get() {
            return Err(RawReason::from_message("feed offline"));
        }
        let round = RoundData {
            round_id: self.round.get(),
            answer: self.answer.get(),
            updated_at: 1_700_000_000,
        };
        self.hook.run();
        Ok(round)
    }
}

// ============ Asset B Token ============

/// Token bound to the bank's identity: `transfer` spends the bank's
/// balance and `transfer_from` spends allowances granted to the bank.
pub struct MockToken {
    spender: Address,
    balances: RefCell<BTreeMap<Address, u128>>,
    allowances: RefCell<BTreeMap<(Address, Address), u128>>,
    /// Answer `Ok(false)` instead of moving tokens
    pub refuse: Cell<bool>,
    /// Fail every call with this payload
    pub fail_with: RefCell<Option<RawReason>>,
    hook: HookSlot,
}

impl MockToken {
    pub fn new(spender: Address) -> Self {
        Self {
            spender,
            balances: RefCell::new(BTreeMap::new()),
            allowances: RefCell::new(BTreeMap::new()),
            refuse: Cell::new(false),
            fail_with: RefCell::new(None),
            hook: HookSlot::default(),
        }
    }

    pub fn mint(&self, to: Address, amount: u128) {
        *self.balances.borrow_mut().entry(to).or_insert(0) += amount;
    }

    pub fn approve(&self, owner: Address, amount: u128) {
        self.allowances.borrow_mut().insert((owner, self.spender), amount);
    }

    pub fn allowance(&self, owner: &Address) -> u128 {
        self.allowances
            .borrow()
            .get(&(*owner, self.spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn on_transfer(&self, hook: impl Fn() + 'static) {
        self.hook.set(hook);
    }

    fn move_tokens(&self, from: &Address, to: &Address, amount: u128) -> Result<(), RawReason> {
        let mut balances = self.balances.borrow_mut();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(RawReason::from_message("insufficient balance"));
        }
        balances.insert(*from, from_balance - amount);
        *balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn failure(&self) -> Option<Result<bool, RawReason>> {
        if let Some(reason) = self.fail_with.borrow().clone() {
            return Some(Err(reason));
        }
        if self.refuse.get() {
            return Some(Ok(false));
        }
        None
    }
}

impl FungibleToken for MockToken {
    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<bool, RawReason> {
        self.hook.run();
        if let Some(result) = self.failure() {
            return result;
        }
        let allowance = self.allowance(from);
        if allowance < amount {
            return Err(RawReason::from_message("insufficient allowance"));
        }
        self.move_tokens(from, to, amount)?;
        self.allowances
            .borrow_mut()
            .insert((*from, self.spender), allowance - amount);
        Ok(true)
    }

    fn transfer(&self, to: &Address, amount: u128) -> Result<bool, RawReason> {
        self.hook.run();
        if let Some(result) = self.failure() {
            return result;
        }
        let spender = self.spender;
        self.move_tokens(&spender, to, amount)?;
        Ok(true)
    }

    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.borrow().get(owner).copied().unwrap_or(0)
    }
}

// ============ Asset A Payout ============

#[derive(Default)]
pub struct MockPayout {
    pub sent: RefCell<Vec<(Address, u128)>>,
    pub fail_with: RefCell<Option<RawReason>>,
    hook: HookSlot,
}

impl MockPayout {
    pub fn on_send(&self, hook: impl Fn() + 'static) {
        self.hook.set(hook);
    }

    pub fn total_sent_to(&self, to: &Address) -> u128 {
        self.sent
            .borrow()
            .iter()
            .filter(|(recipient, _)| recipient == to)
            .map(|(_, amount)| amount)
            .sum()
    }
}

impl NativeTransfer for MockPayout {
    fn send(&self, to: &Address, amount: u128) -> Result<(), RawReason> {
        self.hook.run();
        if let Some(reason) = self.fail_with.borrow().clone() {
            return Err(reason);
        }
        self.sent.borrow_mut().push((*to, amount));
        Ok(())
    }
}

// ============ Reward Issuer ============

#[derive(Default)]
pub struct MockRewards {
    next_id: Cell<RewardId>,
    pub minted: RefCell<Vec<(Address, String)>>,
    pub fail_with: RefCell<Option<RawReason>>,
    hook: HookSlot,
}

impl MockRewards {
    pub fn on_mint(&self, hook: impl Fn() + 'static) {
        self.hook.set(hook);
    }

    pub fn mint_count(&self) -> usize {
        self.minted.borrow().len()
    }
}

impl RewardIssuer for MockRewards {
    fn mint(&self, to: &Address, metadata_ref: &str) -> Result<RewardId, RawReason> {
        self.hook.run();
        if let Some(reason) = self.fail_with.borrow().clone() {
            return Err(reason);
        }
        self.minted.borrow_mut().push((*to, metadata_ref.to_string()));
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Ok(id)
    }
}

// ============ Harness ============

/// Everything observable about the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerView {
    pub globals: GlobalLedger,
    pub vaults: Vec<Vault>,
    pub rewards: RewardRegistry,
    pub events: Vec<BankEvent>,
    pub config: BankConfig,
}

pub struct Harness {
    pub bank: Rc<Bank>,
    pub feed: Rc<MockFeed>,
    pub token: Rc<MockToken>,
    pub payout: Rc<MockPayout>,
    pub rewards: Rc<MockRewards>,
    pub roles: Rc<RefCell<AccessControlState>>,
    pub admin: Address,
}

impl Harness {
    /// Whole-unit asset A: bank cap 10, withdrawal caps 2 units and
    /// $2,000, reward at 1 unit, price $2,000.
    pub fn new() -> Self {
        Self::with_config(unit_config())
    }

    pub fn with_config(config: BankConfig) -> Self {
        let bank_address = addr(b"bank");
        let admin = addr(b"admin");

        let feed = Rc::new(MockFeed::new(PRICE_2000, config.price_decimals));
        let token = Rc::new(MockToken::new(bank_address));
        let payout = Rc::new(MockPayout::default());
        let rewards = Rc::new(MockRewards::default());
        let roles = Rc::new(RefCell::new(AccessControlState::new(admin)));

        let collaborators = Collaborators {
            price_feed: Box::new(Rc::clone(&feed)),
            asset_b: Box::new(Rc::clone(&token)),
            asset_a_payout: Box::new(Rc::clone(&payout)),
            rewards: Box::new(Rc::clone(&rewards)),
            authorizer: Box::new(Rc::clone(&roles)),
        };
        let bank = Rc::new(Bank::new(bank_address, config, collaborators).unwrap());

        Self {
            bank,
            feed,
            token,
            payout,
            rewards,
            roles,
            admin,
        }
    }

    pub fn grant(&self, who: Address, role: Role) {
        self.roles.borrow_mut().grant_role(self.admin, who, role).unwrap();
    }

    /// Give `user` asset B and approve the bank for all of it
    pub fn fund_asset_b(&self, user: Address, amount: u128) {
        self.token.mint(user, amount);
        self.token.approve(user, self.token.allowance(&user) + amount);
    }

    pub fn view(&self) -> LedgerView {
        let store = self.bank.store.borrow();
        LedgerView {
            globals: store.globals().clone(),
            vaults: store.vaults().cloned().collect(),
            rewards: self.bank.rewards.registry(),
            events: self.bank.events(),
            config: self.bank.config(),
        }
    }
}

pub fn unit_config() -> BankConfig {
    BankConfig {
        bank_cap: 10,
        withdrawal_cap_a: 2,
        withdrawal_cap_b: 2_000 * USD,
        reward_threshold: 1,
        reward_metadata_uri: "ipfs://reward".to_string(),
        asset_a_decimals: 0,
        asset_b_decimals: 6,
        price_decimals: 8,
    }
}
