use tracing::info;

use crate::domain::common::matches_reference;
use crate::domain::{
    CashFlowPlan, Identifiable, Invoice, NamedEntity, Project, SavingsGoal, SpendingChallenge,
    Wallet, Wishlist,
};
use crate::errors::{BudgetError, Result};
use crate::storage::{KeyValueStore, LoadReport, Repository};

/// Every collection the application keeps, loaded in memory.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub projects: Vec<Project>,
    pub invoices: Vec<Invoice>,
    pub wishlists: Vec<Wishlist>,
    pub goals: Vec<SavingsGoal>,
    pub challenges: Vec<SpendingChallenge>,
    pub wallets: Vec<Wallet>,
    pub cashflow: Option<CashFlowPlan>,
}

/// Resolves a user reference (id, id prefix or name) to an index.
///
/// An exact id always wins; otherwise the reference must match one record only.
pub fn find_index<T: Identifiable + NamedEntity>(
    records: &[T],
    reference: &str,
) -> Result<Option<usize>> {
    let reference = reference.trim();
    if let Some(index) = records
        .iter()
        .position(|record| record.id().as_str() == reference)
    {
        return Ok(Some(index));
    }
    let mut matches = records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_reference(*record, reference))
        .map(|(index, _)| index);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        return Err(BudgetError::InvalidInput(format!(
            "`{}` matches several records; use the id instead",
            reference
        )));
    }
    Ok(first)
}

macro_rules! lookup {
    ($field:ident, $get:ident, $get_mut:ident, $ty:ty, $missing:ident) => {
        pub fn $get(&self, reference: &str) -> Result<&$ty> {
            let index = find_index(&self.$field, reference)?
                .ok_or_else(|| BudgetError::$missing(reference.to_string()))?;
            Ok(&self.$field[index])
        }

        pub fn $get_mut(&mut self, reference: &str) -> Result<&mut $ty> {
            let index = find_index(&self.$field, reference)?
                .ok_or_else(|| BudgetError::$missing(reference.to_string()))?;
            Ok(&mut self.$field[index])
        }
    };
}

impl Workspace {
    lookup!(projects, project, project_mut, Project, ProjectNotFound);
    lookup!(invoices, invoice, invoice_mut, Invoice, InvoiceNotFound);
    lookup!(wishlists, wishlist, wishlist_mut, Wishlist, WishlistNotFound);
    lookup!(goals, goal, goal_mut, SavingsGoal, GoalNotFound);
    lookup!(challenges, challenge, challenge_mut, SpendingChallenge, ChallengeNotFound);
    lookup!(wallets, wallet, wallet_mut, Wallet, WalletNotFound);

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
            && self.invoices.is_empty()
            && self.wishlists.is_empty()
            && self.goals.is_empty()
            && self.challenges.is_empty()
            && self.wallets.is_empty()
            && self.cashflow.is_none()
    }
}

/// A persisted collection, used to save only what a command touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Projects,
    Invoices,
    Wishlists,
    Goals,
    Challenges,
    Wallets,
    CashFlow,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Projects,
        Collection::Invoices,
        Collection::Wishlists,
        Collection::Goals,
        Collection::Challenges,
        Collection::Wallets,
        Collection::CashFlow,
    ];
}

/// Outcome of loading the workspace.
#[derive(Debug, Clone, Default)]
pub struct LoadMetadata {
    pub warnings: Vec<String>,
    pub migrations: Vec<String>,
}

impl LoadMetadata {
    fn absorb<T>(&mut self, report: LoadReport<T>) -> T {
        self.warnings.extend(report.warnings);
        self.migrations.extend(report.migrations);
        report.value
    }
}

/// Owns the store and the in-memory workspace, and moves data between them.
pub struct WorkspaceManager {
    pub current: Workspace,
    storage: Box<dyn KeyValueStore>,
}

impl WorkspaceManager {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            current: Workspace::default(),
            storage,
        }
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    fn repository(&self) -> Repository<'_> {
        Repository::new(self.storage.as_ref())
    }

    /// Replaces the in-memory workspace with what the store holds.
    pub fn load(&mut self) -> Result<LoadMetadata> {
        let repo = self.repository();
        let mut meta = LoadMetadata::default();
        let workspace = Workspace {
            projects: meta.absorb(repo.load_projects()?),
            invoices: meta.absorb(repo.load_invoices()?),
            wishlists: meta.absorb(repo.load_wishlists()?),
            goals: meta.absorb(repo.load_goals()?),
            challenges: meta.absorb(repo.load_challenges()?),
            wallets: meta.absorb(repo.load_wallets()?),
            cashflow: meta.absorb(repo.load_cashflow()?),
        };
        info!(
            warnings = meta.warnings.len(),
            migrations = meta.migrations.len(),
            "workspace loaded"
        );
        self.current = workspace;
        Ok(meta)
    }

    pub fn save(&self, collections: &[Collection]) -> Result<()> {
        let repo = self.repository();
        let ws = &self.current;
        for collection in collections {
            match collection {
                Collection::Projects => repo.save_projects(&ws.projects)?,
                Collection::Invoices => repo.save_invoices(&ws.invoices)?,
                Collection::Wishlists => repo.save_wishlists(&ws.wishlists)?,
                Collection::Goals => repo.save_goals(&ws.goals)?,
                Collection::Challenges => repo.save_challenges(&ws.challenges)?,
                Collection::Wallets => repo.save_wallets(&ws.wallets)?,
                Collection::CashFlow => repo.save_cashflow(ws.cashflow.as_ref())?,
            }
        }
        Ok(())
    }

    pub fn save_all(&self) -> Result<()> {
        self.save(&Collection::ALL)
    }
}
