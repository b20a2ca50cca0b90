//! Access Control Module
//!
//! Role-based authorization for vaultbank administrative operations.
//!
//! The ledger never depends on a concrete role store: it is handed an
//! [`Authorizer`] capability and only ever asks `has_role`. The
//! [`AccessControlState`] below is the reference store used by hosts and
//! tests.

use std::cell::RefCell;
use std::rc::Rc;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{BankError, BankResult};
use crate::types::Address;

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum Role {
    /// Can grant and revoke roles, and do anything a manager can
    Admin,
    /// Can adjust withdrawal caps and reward parameters
    Manager,
}

impl Role {
    /// Get role priority (higher = more powerful)
    pub fn priority(&self) -> u8 {
        match self {
            Role::Admin => 100,
            Role::Manager => 50,
        }
    }
}

/// Capability consumed by the ledger
pub trait Authorizer {
    /// Returns true if `identity` currently holds `role`
    fn has_role(&self, role: Role, identity: &Address) -> bool;
}

impl<T: Authorizer + ?Sized> Authorizer for Rc<T> {
    fn has_role(&self, role: Role, identity: &Address) -> bool {
        (**self).has_role(role, identity)
    }
}

impl<T: Authorizer> Authorizer for RefCell<T> {
    fn has_role(&self, role: Role, identity: &Address) -> bool {
        self.borrow().has_role(role, identity)
    }
}

/// Role assignment for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleAssignment {
    /// Address with the role
    pub address: Address,
    /// Assigned role
    pub role: Role,
    /// Address that granted the role
    pub granted_by: Address,
    /// Whether assignment is active
    pub is_active: bool,
}

impl RoleAssignment {
    pub fn new(address: Address, role: Role, granted_by: Address) -> Self {
        Self {
            address,
            role,
            granted_by,
            is_active: true,
        }
    }
}

/// Access control state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessControlState {
    /// Root admin, cannot lose the Admin role
    pub root_admin: Address,
    /// Role assignments
    pub roles: Vec<RoleAssignment>,
}

impl AccessControlState {
    /// Create new access control state with a root admin
    pub fn new(root_admin: Address) -> Self {
        Self {
            root_admin,
            roles: vec![RoleAssignment::new(root_admin, Role::Admin, root_admin)],
        }
    }

    /// Grant a role to an address. Only admins may grant.
    pub fn grant_role(&mut self, granter: Address, grantee: Address, role: Role) -> BankResult<()> {
        if !self.has_role(Role::Admin, &granter) {
            return Err(BankError::Unauthorized {
                role: Role::Admin,
                caller: granter,
            });
        }

        if self.has_role(role, &grantee) {
            return Ok(()); // Already has role
        }

        self.roles.push(RoleAssignment::new(grantee, role, granter));
        Ok(())
    }

    /// Revoke a role from an address. Only admins may revoke.
    pub fn revoke_role(&mut self, revoker: Address, target: Address, role: Role) -> BankResult<()> {
        if target == self.root_admin && role == Role::Admin {
            return Err(BankError::InvalidConfig {
                param: "role",
                reason: "root admin cannot lose the admin role",
            });
        }

        if !self.has_role(Role::Admin, &revoker) {
            return Err(BankError::Unauthorized {
                role: Role::Admin,
                caller: revoker,
            });
        }

        for r in &mut self.roles {
            if r.address == target && r.role == role && r.is_active {
                r.is_active = false;
            }
        }

        Ok(())
    }

    /// Get all active roles for an address
    pub fn get_roles(&self, address: &Address) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|r| r.address == *address && r.is_active)
            .map(|r| r.role)
            .collect()
    }
}

impl Authorizer for AccessControlState {
    fn has_role(&self, role: Role, identity: &Address) -> bool {
        self.roles
            .iter()
            .any(|r| r.address == *identity && r.role == role && r.is_active)
    }
}

// ============================================================================
// Tests
// ============================================================================
