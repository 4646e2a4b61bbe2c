//! Error types for the budget optimizer agent

use thiserror::Error;

/// Result type alias for budget analysis operations
pub type Result<T> = std::result::Result<T, BudgetError>;

#[derive(Error, Debug)]
pub enum BudgetError {

    // =============================
    // Analysis Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown user status: {0:?} (expected \"Working\" or \"Retired\")")]
    UnknownStatus(String),

    #[error("Invalid corpus: {0}")]
    InvalidCorpus(String),

    // =============================
    // Tool Boundary Errors
    // =============================

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BudgetError {
    /// Stable machine-readable kind, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BudgetError::InvalidInput(_) => "invalid_input",
            BudgetError::UnknownStatus(_) => "unknown_status",
            BudgetError::InvalidCorpus(_) => "invalid_corpus",
            BudgetError::ToolNotFound(_) => "tool_not_found",
            BudgetError::InvalidToolInput(_) => "invalid_tool_input",
            BudgetError::ConfigError(_) => "config_error",
            BudgetError::SerializationError(_) => "serialization_error",
            BudgetError::IoError(_) => "io_error",
        }
    }
}
