//! Wallets that fund one or more projects.

use serde::{Deserialize, Serialize};

use crate::currency::{round_cents, CurrencyCode};

use super::common::{deserialize_amount, deserialize_text, EntityId, Identifiable, NamedEntity};
use super::project::Project;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub balance: f64,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub linked_projects: Vec<EntityId>,
}

impl Wallet {
    pub fn new(name: impl Into<String>, balance: f64, currency: CurrencyCode) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            balance,
            currency,
            linked_projects: Vec::new(),
        }
    }

    /// Links a project; returns `false` when it was already linked.
    pub fn link(&mut self, project_id: &EntityId) -> bool {
        if self.is_linked(project_id) {
            return false;
        }
        self.linked_projects.push(project_id.clone());
        true
    }

    /// Unlinks a project; returns `false` when it was not linked.
    pub fn unlink(&mut self, project_id: &EntityId) -> bool {
        let before = self.linked_projects.len();
        self.linked_projects.retain(|id| id != project_id);
        before != self.linked_projects.len()
    }

    pub fn is_linked(&self, project_id: &EntityId) -> bool {
        self.linked_projects.iter().any(|id| id == project_id)
    }

    /// Spending already recorded on the linked projects.
    pub fn committed(&self, projects: &[Project]) -> f64 {
        round_cents(
            projects
                .iter()
                .filter(|project| self.is_linked(&project.id))
                .map(Project::spent)
                .sum(),
        )
    }

    pub fn available(&self, projects: &[Project]) -> f64 {
        round_cents(self.balance - self.committed(projects))
    }
}

impl Identifiable for Wallet {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Wallet {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::RealExpense;

    #[test]
    fn link_is_idempotent() {
        let mut wallet = Wallet::new("Main", 1000.0, CurrencyCode::default());
        let id = EntityId::from("p1");
        assert!(wallet.link(&id));
        assert!(!wallet.link(&id));
        assert_eq!(wallet.linked_projects.len(), 1);
        assert!(wallet.unlink(&id));
        assert!(!wallet.unlink(&id));
    }

    #[test]
    fn available_subtracts_linked_spending() {
        let mut linked = Project::new("Linked");
        linked.real_expenses.push(RealExpense::new("a", 150.0, None));
        let mut other = Project::new("Other");
        other.real_expenses.push(RealExpense::new("b", 999.0, None));

        let mut wallet = Wallet::new("Main", 1000.0, CurrencyCode::default());
        wallet.link(&linked.id);
        let projects = vec![linked, other];
        assert_eq!(wallet.committed(&projects), 150.0);
        assert_eq!(wallet.available(&projects), 850.0);
    }
}
