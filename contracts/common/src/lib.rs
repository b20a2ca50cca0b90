//! vaultbank Common Library
//!
//! Shared types, constants and utilities for the vaultbank ledger and its
//! reference collaborators.
//!
//! ## Contents
//!
//! - **Errors**: one error taxonomy with stable codes
//! - **Types**: identities, assets, raw failure payloads, vault records
//! - **Math**: explicit overflow policies and fixed-point valuation
//! - **Events**: notifications emitted by the ledger
//! - **Config**: construction-time parameters with JSON loading
//! - **Access Control**: role capability and a reference role store
//! - **Oracle**: price feed interface and the live-read adapter
//! - **Interfaces**: asset transfer and reward issuance boundaries

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod config;
pub mod access_control;
pub mod oracle;
pub mod interfaces;
pub mod validation;


// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use config::*;
pub use access_control::*;
pub use oracle::*;
pub use interfaces::*;
pub use validation::require_non_zero;
