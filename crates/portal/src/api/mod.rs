//! HTTP API server implementation

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use server::ApiServer;
