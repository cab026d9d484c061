pub mod budget_service;
pub mod cashflow_service;
pub mod challenge_service;
pub mod expense_service;
pub mod goal_service;
pub mod invoice_service;
pub mod project_service;
pub mod summary_service;
pub mod wallet_service;
pub mod wishlist_service;

pub use budget_service::BudgetService;
pub use cashflow_service::CashFlowService;
pub use challenge_service::ChallengeService;
pub use expense_service::ExpenseService;
pub use goal_service::GoalService;
pub use invoice_service::InvoiceService;
pub use project_service::ProjectService;
pub use summary_service::{Summary, SummaryService};
pub use wallet_service::WalletService;
pub use wishlist_service::WishlistService;

use crate::errors::{BudgetError, Result};

/// Rejects negative, NaN and infinite amounts.
pub(crate) fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(crate::currency::round_cents(amount))
    } else {
        Err(BudgetError::InvalidInput(format!(
            "amount must be a non-negative number (got {})",
            amount
        )))
    }
}

pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(BudgetError::InvalidInput(format!("{} name cannot be empty", kind)))
    } else {
        Ok(trimmed.to_string())
    }
}
