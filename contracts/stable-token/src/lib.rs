//! Stable Token Contract
//!
//! Reference fungible token for asset B. Balances and allowances follow the
//! usual approve / transfer_from model; only the minter can mint.
//!
//! [`StableTokenClient`] binds a shared token to one caller identity and
//! exposes it through [`FungibleToken`], which is how the ledger sees it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vaultbank_common::{
    constants::asset_b,
    interfaces::FungibleToken,
    types::{Address, RawReason},
};

// ============ Errors ============

pub type TokenResult<T> = Result<T, TokenError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("amount must be positive")]
    ZeroAmount,

    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    #[error("insufficient allowance: have {available}, need {requested}")]
    InsufficientAllowance { available: u128, requested: u128 },

    #[error("0x{} is not the minter", hex::encode(.caller))]
    NotMinter { caller: Address },

    #[error("total supply overflow")]
    SupplyOverflow,
}

impl From<TokenError> for RawReason {
    fn from(err: TokenError) -> Self {
        RawReason::from_message(&err.to_string())
    }
}

// ============ Token State ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StableToken {
    /// Authorized minter
    pub minter: Address,
    pub total_supply: u128,
    balances: BTreeMap<Address, u128>,
    /// (owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address), u128>,
}

// Default intentionally not implemented: a zero-address minter is never valid.

impl StableToken {
    pub fn new(minter: Address) -> Self {
        Self {
            minter,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn symbol() -> &'static str {
        asset_b::SYMBOL
    }

    pub fn decimals() -> u8 {
        asset_b::DECIMALS
    }

    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, caller: Address, to: Address, amount: u128) -> TokenResult<()> {
        if caller != self.minter {
            return Err(TokenError::NotMinter { caller });
        }
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        // Bounded by total_supply
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    /// Destroy `amount` of the caller's tokens
    pub fn burn(&mut self, caller: Address, amount: u128) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        self.debit(&caller, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: u128) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        self.debit(&caller, amount)?;
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }

    /// Set the allowance of `spender` over the caller's tokens
    pub fn approve(&mut self, caller: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(caller, spender));
        } else {
            self.allowances.insert((caller, spender), amount);
        }
    }

    /// Move `amount` from `from` to `to`, spending the caller's allowance
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> TokenResult<()> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let available = self.allowance(&from, &caller);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                available,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.approve(from, caller, available - amount);
        Ok(())
    }

    fn debit(&mut self, owner: &Address, amount: u128) -> TokenResult<()> {
        let available = self.balance_of(owner);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances.insert(*owner, available - amount);
        Ok(())
    }
}

// ============ Client ============

/// A shared token seen from one identity
#[derive(Debug, Clone)]
pub struct StableTokenClient {
    token: Rc<RefCell<StableToken>>,
    caller: Address,
}

impl StableTokenClient {
    pub fn new(token: Rc<RefCell<StableToken>>, caller: Address) -> Self {
        Self { token, caller }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }
}

impl FungibleToken for StableTokenClient {
    fn transfer_from(&self, from: &Address, to: &Address, amount: u128) -> Result<bool, RawReason> {
        self.token
            .borrow_mut()
            .transfer_from(self.caller, *from, *to, amount)?;
        Ok(true)
    }

    fn transfer(&self, to: &Address, amount: u128) -> Result<bool, RawReason> {
        self.token.borrow_mut().transfer(self.caller, *to, amount)?;
        Ok(true)
    }

    fn balance_of(&self, owner: &Address) -> u128 {
        self.token.borrow().balance_of(owner)
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    const MINTER: Address = [0u8; 32];
    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];
    const SPENDER: Address = [3u8; 32];

    fn token_with_alice(amount: u128) -> StableToken {
        let mut token = StableToken::new(MINTER);
        token.mint(MINTER, ALICE, amount).unwrap();
        token
    }

    #[test]
    fn test_mint_only_minter() {
        let mut token = StableToken::new(MINTER);
        assert_eq!(
            token.mint(ALICE, ALICE, 100),
            Err(TokenError::NotMinter { caller: ALICE })
        );
        token.mint(MINTER, ALICE, 100).unwrap();
        assert_eq!(token.total_supply, 100);
        assert_eq!(token.balance_of(&ALICE), 100);
    }

    #[test]
    fn test_transfer() {
        let mut token = token_with_alice(100);
        token.transfer(ALICE, BOB, 40).unwrap();
        assert_eq!(token.balance_of(&ALICE), 60);
        assert_eq!(token.balance_of(&BOB), 40);

        assert_eq!(
            token.transfer(ALICE, BOB, 61),
            Err(TokenError::InsufficientBalance { available: 60, requested: 61 })
        );
        assert_eq!(token.transfer(ALICE, BOB, 0), Err(TokenError::ZeroAmount));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut token = token_with_alice(100);
        token.approve(ALICE, SPENDER, 50);

        token.transfer_from(SPENDER, ALICE, BOB, 30).unwrap();
        assert_eq!(token.allowance(&ALICE, &SPENDER), 20);
        assert_eq!(token.balance_of(&BOB), 30);

        assert_eq!(
            token.transfer_from(SPENDER, ALICE, BOB, 21),
            Err(TokenError::InsufficientAllowance { available: 20, requested: 21 })
        );
    }

    #[test]
    fn test_failed_transfer_from_keeps_allowance() {
        let mut token = token_with_alice(10);
        token.approve(ALICE, SPENDER, 50);

        assert!(matches!(
            token.transfer_from(SPENDER, ALICE, BOB, 20),
            Err(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(token.allowance(&ALICE, &SPENDER), 50);
    }

    #[test]
    fn test_burn() {
        let mut token = token_with_alice(100);
        token.burn(ALICE, 25).unwrap();
        assert_eq!(token.total_supply, 75);
        assert!(token.burn(BOB, 1).is_err());
    }

    #[test]
    fn test_client_reports_raw_reason() {
        let token = Rc::new(RefCell::new(token_with_alice(100)));
        let client = StableTokenClient::new(Rc::clone(&token), SPENDER);

        assert_eq!(
            client.transfer_from(&ALICE, &SPENDER, 10),
            Err(RawReason::from_message("insufficient allowance: have 0, need 10"))
        );

        token.borrow_mut().approve(ALICE, SPENDER, 10);
        assert_eq!(client.transfer_from(&ALICE, &SPENDER, 10), Ok(true));
        assert_eq!(client.balance_of(&SPENDER), 10);

        assert_eq!(client.transfer(&BOB, 4), Ok(true));
        assert_eq!(token.borrow().balance_of(&BOB), 4);
    }
}
