//! The ledger wired to the reference price feed and stable token.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vaultbank_common::{
    access_control::{AccessControlState, Role},
    config::BankConfig,
    constants::{asset_a, asset_b},
    errors::BankError,
    interfaces::{NativeTransfer, RewardIssuer},
    types::{derive_address, Address, Asset, RawReason, RewardId},
};
use vaultbank_ledger::{Bank, Collaborators, RewardStatus};
use vaultbank_price_feed::FeedState;
use vaultbank_stable_token::{StableToken, StableTokenClient};

const USDC: u128 = asset_b::ONE;
const ETH: u128 = asset_a::ONE;

#[derive(Default)]
struct Payouts(RefCell<Vec<(Address, u128)>>);

impl NativeTransfer for Payouts {
    fn send(&self, to: &Address, amount: u128) -> Result<(), RawReason> {
        self.0.borrow_mut().push((*to, amount));
        Ok(())
    }
}

#[derive(Default)]
struct Badges(Cell<RewardId>);

impl RewardIssuer for Badges {
    fn mint(&self, _to: &Address, _metadata_ref: &str) -> Result<RewardId, RawReason> {
        self.0.set(self.0.get() + 1);
        Ok(self.0.get())
    }
}

struct Deployment {
    bank: Bank,
    feed: Rc<RefCell<FeedState>>,
    token: Rc<RefCell<StableToken>>,
    payouts: Rc<Payouts>,
    admin: Address,
    operator: Address,
    treasury: Address,
}

fn deploy() -> Deployment {
    let admin = derive_address(b"admin");
    let operator = derive_address(b"operator");
    let treasury = derive_address(b"treasury");
    let bank_address = derive_address(b"bank");

    let feed = Rc::new(RefCell::new(FeedState::new(
        admin,
        operator,
        FeedState::DEFAULT_PRICE,
        1_700_000_000,
    )));
    let token = Rc::new(RefCell::new(StableToken::new(treasury)));
    let payouts = Rc::new(Payouts::default());

    let config = BankConfig::from_json(
        r#"{
            "bank_cap": "10000000000000000000",
            "withdrawal_cap_a": "1000000000000000000",
            "withdrawal_cap_b": "5000000000"
        }"#,
    )
    .unwrap();

    let bank = Bank::new(
        bank_address,
        config,
        Collaborators {
            price_feed: Box::new(Rc::clone(&feed)),
            asset_b: Box::new(StableTokenClient::new(Rc::clone(&token), bank_address)),
            asset_a_payout: Box::new(Rc::clone(&payouts)),
            rewards: Box::new(Badges::default()),
            authorizer: Box::new(AccessControlState::new(admin)),
        },
    )
    .unwrap();

    Deployment {
        bank,
        feed,
        token,
        payouts,
        admin,
        operator,
        treasury,
    }
}

#[test]
fn stable_token_deposit_and_withdraw() {
    let d = deploy();
    let alice = derive_address(b"alice");

    d.token.borrow_mut().mint(d.treasury, alice, 3_000 * USDC).unwrap();
    d.token.borrow_mut().approve(alice, d.bank.address(), 2_500 * USDC);

    let receipt = d.bank.deposit_asset_b(alice, 2_500 * USDC).unwrap();
    assert_eq!(receipt.usd_value, 2_500 * USDC);
    assert_eq!(receipt.reward, RewardStatus::Granted(1));
    assert_eq!(d.token.borrow().balance_of(&d.bank.address()), 2_500 * USDC);
    // $2,500 at $2,000 per ETH
    assert_eq!(d.bank.total_value_locked(), 1_250_000_000_000_000_000);

    // Allowance used up
    assert_eq!(
        d.bank.deposit_asset_b(alice, USDC),
        Err(BankError::TransferFailed {
            reason: RawReason::from_message("insufficient allowance: have 0, need 1000000"),
        })
    );

    d.bank.withdraw_asset_b(alice, 1_000 * USDC).unwrap();
    assert_eq!(d.token.borrow().balance_of(&alice), 1_500 * USDC);
    assert_eq!(d.bank.balance(&alice, Asset::B), 1_500 * USDC);
}

#[test]
fn operator_price_updates_flow_into_valuation() {
    let d = deploy();
    let bob = derive_address(b"bob");

    d.bank.deposit_asset_a(bob, ETH / 2).unwrap();
    assert_eq!(d.bank.vault(&bob).unwrap().total_usd(), 1_000 * USDC);

    d.feed
        .borrow_mut()
        .update_price(d.operator, 2_100_00000000, 1_700_000_060)
        .unwrap();

    let receipt = d.bank.deposit_asset_a(bob, ETH / 2).unwrap();
    assert_eq!(receipt.usd_value, 1_050 * USDC);
    assert_eq!(receipt.price.round_id(), 2);
    assert_eq!(d.bank.vault(&bob).unwrap().total_usd(), 2_050 * USDC);
    // Threshold is 1 ETH at the deposit's price: $2,100
    assert_eq!(receipt.reward, RewardStatus::NotEligible);

    d.bank.withdraw_asset_a(bob, ETH).unwrap();
    assert_eq!(d.payouts.0.borrow().as_slice(), &[(bob, ETH)]);
    assert_eq!(d.bank.get_contract_balance(), 0);
}

#[test]
fn paused_feed_blocks_operations() {
    let d = deploy();
    let carol = derive_address(b"carol");

    d.feed.borrow_mut().set_active(d.admin, false).unwrap();
    assert_eq!(
        d.bank.deposit_asset_a(carol, ETH),
        Err(BankError::OracleUnavailable {
            reason: RawReason::from_message("feed is paused"),
        })
    );
    assert!(d.bank.vault(&carol).is_none());
}

#[test]
fn root_admin_updates_parameters() {
    let d = deploy();
    let stranger = derive_address(b"stranger");

    assert!(matches!(
        d.bank.set_withdrawal_caps(stranger, ETH, USDC),
        Err(BankError::Unauthorized { role: Role::Manager, .. })
    ));
    d.bank.set_withdrawal_caps(d.admin, 2 * ETH, USDC).unwrap();
    assert_eq!(d.bank.config().withdrawal_cap_a, 2 * ETH);
}
