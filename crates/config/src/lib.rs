//! Configuration management for the Tuition Portal simulator
//!
//! This crate handles parsing, validation, and management of configuration
//! from YAML files and environment variables, including the simulation knobs
//! that are threaded into every mock chain call.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigLoader;
pub use schema::*;
pub use validation::*;
