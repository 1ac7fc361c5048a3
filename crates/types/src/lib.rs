//! Shared types for the Tuition Portal simulator
//!
//! This crate contains the domain types shared by the simulator, payment and
//! portal crates: transactions, users, notifications, receipts, the static
//! currency table and the error hierarchy.

pub mod currency;
pub mod error;
pub mod payment;
pub mod transaction;
pub mod user;
pub mod utils;

// Re-export commonly used types
pub use currency::*;
pub use error::{
    ConfigError, LifecycleError, PortalError, ReceiptError, Result, SimulationError, WalletError,
};
pub use payment::*;
pub use transaction::*;
pub use user::*;
