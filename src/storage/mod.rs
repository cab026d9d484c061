//! Flat key/value persistence and the typed repository built on top of it.

pub mod file_store;
pub mod memory_store;
pub mod repository;

use crate::errors::Result;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use repository::{LoadReport, Repository};

/// Storage keys. Each key holds one JSON document.
pub mod keys {
    pub const PROJECTS: &str = "mapocket_projects";
    /// Written by the first releases; migrated into [`PROJECTS`] and removed on save.
    pub const LEGACY_PROJECTS: &str = "savedProjects";
    /// Mirror of [`PROJECTS`], read only when the canonical document is missing or corrupt.
    pub const PROJECTS_BACKUP: &str = "mapocket_projects_backup";
    pub const INVOICES: &str = "mapocket_invoices";
    pub const WISHLISTS: &str = "mapocket_wishlists";
    pub const SAVINGS_GOALS: &str = "mapocket_savings_goals";
    pub const CHALLENGES: &str = "mapocket_spending_challenges";
    pub const WALLETS: &str = "mapocket_wallets";
    pub const CASHFLOW: &str = "mapocket_cashflow";

    pub const ALL: &[&str] = &[
        PROJECTS,
        LEGACY_PROJECTS,
        PROJECTS_BACKUP,
        INVOICES,
        WISHLISTS,
        SAVINGS_GOALS,
        CHALLENGES,
        WALLETS,
        CASHFLOW,
    ];
}

/// A flat string store in the spirit of browser local storage.
///
/// Writes replace the whole value; there is no cross-key transaction.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
