//! Administrative Parameter Updates
//!
//! Off the hot path. Callers need `Role::Manager` or `Role::Admin`. Updates
//! take the reentrancy lock like any other mutation. The bank cap and the
//! decimal scales are fixed at construction.

use tracing::info;

use vaultbank_common::{
    access_control::Role,
    config::{validate_reward_parameters, validate_withdrawal_caps},
    errors::{BankError, BankResult},
    events::BankEvent,
    types::Address,
};

use crate::Bank;

impl Bank {
    /// Replace both per-withdrawal caps
    pub fn set_withdrawal_caps(&self, caller: Address, cap_a: u128, cap_b: u128) -> BankResult<()> {
        let _guard = self.enter("set_withdrawal_caps")?;
        self.require_manager(&caller)?;
        validate_withdrawal_caps(cap_a, cap_b)?;

        {
            let mut config = self.config.borrow_mut();
            config.withdrawal_cap_a = cap_a;
            config.withdrawal_cap_b = cap_b;
        }
        info!(by = %hex::encode(caller), cap_a = %cap_a, cap_b = %cap_b, "withdrawal caps updated");
        self.emit_parameters(caller);
        Ok(())
    }

    /// Replace the reward threshold (asset A units) and metadata reference.
    ///
    /// Existing recipients keep their reward.
    pub fn set_reward_parameters(
        &self,
        caller: Address,
        threshold: u128,
        metadata_uri: &str,
    ) -> BankResult<()> {
        let _guard = self.enter("set_reward_parameters")?;
        self.require_manager(&caller)?;
        validate_reward_parameters(threshold, metadata_uri)?;

        {
            let mut config = self.config.borrow_mut();
            config.reward_threshold = threshold;
            config.reward_metadata_uri = metadata_uri.to_string();
        }
        info!(by = %hex::encode(caller), threshold = %threshold, "reward parameters updated");
        self.emit_parameters(caller);
        Ok(())
    }

    fn require_manager(&self, caller: &Address) -> BankResult<()> {
        if self.authorizer.has_role(Role::Manager, caller)
            || self.authorizer.has_role(Role::Admin, caller)
        {
            return Ok(());
        }
        Err(BankError::Unauthorized {
            role: Role::Manager,
            caller: *caller,
        })
    }

    fn emit_parameters(&self, by: Address) {
        let event = {
            let config = self.config.borrow();
            BankEvent::ParametersUpdated {
                by,
                withdrawal_cap_a: config.withdrawal_cap_a,
                withdrawal_cap_b: config.withdrawal_cap_b,
                reward_threshold: config.reward_threshold,
                reward_metadata_uri: config.reward_metadata_uri.clone(),
            }
        };
        self.events.borrow_mut().emit(event);
    }
}
