//! Error types for the QuerySmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each stage of the pipeline has its own error enum; [`SqlExecutionError`]
//! is kept separate because the repair loop treats it as data, not a fault.

use thiserror::Error;

/// The top-level error type for all QuerySmith operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Row selection errors ---
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    // --- Token budget errors ---
    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    // --- Database errors (outside of query execution) ---
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Stage errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

/// The completion service answered a row-selection directive with something
/// that is not a usable index list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Response is not a list of row indices: {response}")]
    NotAList { response: String },

    #[error("Invalid list element '{element}' in response")]
    InvalidElement { element: String },

    #[error("Row index {index} out of range for a partition of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error(
        "Directive of {directive_tokens} tokens leaves no room for table content (budget {budget})"
    )]
    Exhausted { directive_tokens: usize, budget: i64 },
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Schema introspection failed: {0}")]
    Introspection(String),

    #[error("Synonym table could not be loaded from {path}: {reason}")]
    Synonyms { path: String, reason: String },
}

/// A SQL statement failed to execute. Carries the driver-level message
/// verbatim so it can be handed back to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlExecutionError {
    pub message: String,
}

impl SqlExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
