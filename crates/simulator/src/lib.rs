//! Mock chain, wallet and receipt storage
//!
//! This crate fakes everything the portal would normally get from a
//! blockchain: gas estimates, payment submission with injected failures,
//! block confirmations ticking on a timer, wallet sessions and IPFS uploads.
//! Every call takes the current [`config::SimulationConfig`] by reference
//! instead of reading shared state.

pub mod engine;
pub mod failure;
pub mod hash;
pub mod ipfs;
pub mod pricing;
pub mod registry;
pub mod ticker;
pub mod traits;
pub mod wallet;

pub use engine::*;
pub use failure::*;
pub use hash::*;
pub use ipfs::*;
pub use pricing::*;
pub use registry::*;
pub use ticker::*;
pub use traits::*;
pub use wallet::*;
