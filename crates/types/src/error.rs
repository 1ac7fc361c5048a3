//! Error types for the Tuition Portal simulator

use crate::transaction::TransactionStatus;
use thiserror::Error;

/// Main error type for the portal
#[derive(Error, Debug)]
pub enum PortalError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Simulated chain errors
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Simulated wallet errors
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Receipt storage errors
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Transaction lifecycle errors
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Login with an unknown email
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Conflicting state, e.g. a duplicate email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors raised by the mock chain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Currency symbol missing from the static table
    #[error("Unsupported currency: {symbol}")]
    UnsupportedCurrency { symbol: String },

    /// Injected failure
    #[error("Transaction failed: insufficient gas or network congestion")]
    TransactionFailed,

    /// Amount is not a positive finite number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A ticker is already running for this transaction
    #[error("Confirmation already in progress for transaction {transaction_id}")]
    TickerAlreadyRunning { transaction_id: String },

    /// The ticker task ended abnormally
    #[error("Confirmation ticker aborted: {0}")]
    TickerAborted(String),
}

/// Errors raised by the mock wallet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet connection failed")]
    ConnectionFailed,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("User rejected transaction")]
    UserRejected,

    #[error("Network switch failed")]
    NetworkSwitchFailed,

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
}

/// Errors raised by the mock receipt storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("Please upload a PDF or image file (got {content_type})")]
    UnsupportedFileType { content_type: String },

    #[error("File size must be less than 5MB (got {size} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("File name cannot be empty")]
    EmptyFileName,
}

/// Transaction state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction is in terminal state {status}")]
    TerminalState { status: TransactionStatus },

    #[error("Transaction has no hash assigned")]
    MissingHash,

    #[error("Notes are required to flag a transaction")]
    NotesRequired,

    #[error("Inconsistent transaction {id}: {message}")]
    Inconsistent { id: String, message: String },
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl From<ConfigError> for PortalError {
    fn from(err: ConfigError) -> Self {
        PortalError::Config(err.to_string())
    }
}

impl PortalError {
    /// Shorthand for a missing resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        PortalError::NotFound {
            resource: resource.into(),
        }
    }
}
