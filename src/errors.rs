use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for the domain, service, and storage layers.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
    #[error("Budget entry not found: {0}")]
    EntryNotFound(String),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Wishlist not found: {0}")]
    WishlistNotFound(String),
    #[error("Wishlist item not found: {0}")]
    WishlistItemNotFound(String),
    #[error("Savings goal not found: {0}")]
    GoalNotFound(String),
    #[error("Spending challenge not found: {0}")]
    ChallengeNotFound(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Cash-flow entry not found: {0}")]
    CashFlowEntryNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors surfaced by the interactive shell outside of a single command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] BudgetError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

pub type Result<T> = StdResult<T, BudgetError>;

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        BudgetError::Storage(err.to_string())
    }
}
