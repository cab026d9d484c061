pub mod budget;
pub mod cashflow;
pub mod common;
pub mod goals;
pub mod invoice;
pub mod project;
pub mod templates;
pub mod wallet;
pub mod wishlist;

pub use budget::{BudgetPath, Category, Discrepancy, Line, Subcategory};
pub use cashflow::{CashFlowEntry, CashFlowPlan, CashFlowRow, FlowKind, Schedule, YearMonth};
pub use common::{Amounted, EntityId, Identifiable, NamedEntity};
pub use goals::{ChallengeStatus, SavingsGoal, SpendingChallenge};
pub use invoice::{DocumentKind, Invoice, InvoiceItem, InvoiceStatus};
pub use project::{CategoryUsage, Project, ProjectStatus, RealExpense};
pub use templates::ProjectTemplate;
pub use wallet::Wallet;
pub use wishlist::{ItemStatus, Priority, Wishlist, WishlistItem};
