//! Payment calculation and transaction lifecycle
//!
//! This crate converts USD amounts into crypto quotes, forges pending
//! transactions for students and moves them through the status machine
//! (pending, confirming, confirmed, then an admin review).

pub mod calculator;
pub mod forger;
pub mod lifecycle;
pub mod policies;

pub use calculator::*;
pub use forger::*;
pub use lifecycle::*;
pub use policies::*;
