//! Typed collections over the key/value store.
//!
//! Reading is tolerant: a record that fails to decode is skipped and reported,
//! a field that cannot be read falls back to its default and is reported,
//! and a document that is not a JSON array decodes to an empty collection.
//! Projects are additionally reconciled across the canonical, legacy and
//! mirror keys, and their budget trees are recomputed on every load.

use std::collections::HashSet;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::common::collect_fallbacks;
use crate::domain::{
    CashFlowPlan, Identifiable, Invoice, NamedEntity, Project, SavingsGoal, SpendingChallenge,
    Wallet, Wishlist,
};
use crate::errors::Result;

use super::{keys, KeyValueStore};

/// A loaded value plus what was repaired or skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadReport<T> {
    pub value: T,
    pub warnings: Vec<String>,
    pub migrations: Vec<String>,
}

impl<T> LoadReport<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
            migrations: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.migrations.is_empty()
    }
}

enum Document<T> {
    Missing,
    Corrupt(String),
    Records(Vec<T>, Vec<String>),
}

pub struct Repository<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Loads projects, merging legacy records and falling back to the mirror.
    pub fn load_projects(&self) -> Result<LoadReport<Vec<Project>>> {
        let mut report = LoadReport::new(Vec::new());

        let canonical = match self.read_document::<Project>(keys::PROJECTS)? {
            Document::Records(records, warnings) => {
                report.warnings.extend(warnings);
                Some(records)
            }
            Document::Corrupt(reason) => {
                report.warnings.push(format!(
                    "{} is unreadable ({}); trying {}",
                    keys::PROJECTS,
                    reason,
                    keys::PROJECTS_BACKUP
                ));
                None
            }
            Document::Missing => None,
        };

        let mut projects = match canonical {
            Some(records) => records,
            None => match self.read_document::<Project>(keys::PROJECTS_BACKUP)? {
                Document::Records(records, warnings) => {
                    report.warnings.extend(warnings);
                    if !records.is_empty() {
                        report.migrations.push(format!(
                            "restored {} project(s) from {}",
                            records.len(),
                            keys::PROJECTS_BACKUP
                        ));
                    }
                    records
                }
                Document::Corrupt(reason) => {
                    report.warnings.push(format!(
                        "{} is unreadable ({})",
                        keys::PROJECTS_BACKUP,
                        reason
                    ));
                    Vec::new()
                }
                Document::Missing => Vec::new(),
            },
        };

        let mut seen: HashSet<String> = HashSet::new();
        projects.retain(|project| {
            let fresh = seen.insert(project.id.as_str().to_string());
            if !fresh {
                report.warnings.push(format!(
                    "dropped duplicate project id {} (`{}`)",
                    project.id, project.project_name
                ));
            }
            fresh
        });

        match self.read_document::<Project>(keys::LEGACY_PROJECTS)? {
            Document::Records(records, warnings) => {
                report.warnings.extend(warnings);
                for project in records {
                    if seen.insert(project.id.as_str().to_string()) {
                        report.migrations.push(format!(
                            "migrated project `{}` from {}",
                            project.project_name,
                            keys::LEGACY_PROJECTS
                        ));
                        projects.push(project);
                    }
                }
            }
            Document::Corrupt(reason) => report.warnings.push(format!(
                "{} is unreadable ({}); legacy projects ignored",
                keys::LEGACY_PROJECTS,
                reason
            )),
            Document::Missing => {}
        }

        for project in &mut projects {
            let discrepancies = project.discrepancies();
            project.recompute_totals();
            if !discrepancies.is_empty() {
                report.warnings.push(format!(
                    "recomputed totals of `{}`: {}",
                    project.project_name,
                    discrepancies
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ")
                ));
            }
        }

        info!(
            projects = projects.len(),
            warnings = report.warnings.len(),
            migrations = report.migrations.len(),
            "loaded projects"
        );
        report.value = projects;
        Ok(report)
    }

    /// Writes the canonical key and its mirror, then drops the legacy key.
    pub fn save_projects(&self, projects: &[Project]) -> Result<()> {
        let json = serde_json::to_string_pretty(projects)?;
        self.store.set(keys::PROJECTS, &json)?;
        self.store.set(keys::PROJECTS_BACKUP, &json)?;
        if self.store.contains(keys::LEGACY_PROJECTS)? {
            self.store.remove(keys::LEGACY_PROJECTS)?;
            info!(key = keys::LEGACY_PROJECTS, "removed legacy project key");
        }
        debug!(projects = projects.len(), "saved projects");
        Ok(())
    }

    pub fn load_invoices(&self) -> Result<LoadReport<Vec<Invoice>>> {
        let mut report = self.load_collection::<Invoice>(keys::INVOICES)?;
        for invoice in &mut report.value {
            let stored = (invoice.total_ht, invoice.total_vat, invoice.total_ttc);
            invoice.recompute_totals();
            if stored != (invoice.total_ht, invoice.total_vat, invoice.total_ttc) {
                report.warnings.push(format!(
                    "recomputed totals of invoice {}",
                    display_name(invoice)
                ));
            }
        }
        Ok(report)
    }

    pub fn save_invoices(&self, invoices: &[Invoice]) -> Result<()> {
        self.save_collection(keys::INVOICES, invoices)
    }

    pub fn load_wishlists(&self) -> Result<LoadReport<Vec<Wishlist>>> {
        self.load_collection(keys::WISHLISTS)
    }

    pub fn save_wishlists(&self, wishlists: &[Wishlist]) -> Result<()> {
        self.save_collection(keys::WISHLISTS, wishlists)
    }

    pub fn load_goals(&self) -> Result<LoadReport<Vec<SavingsGoal>>> {
        self.load_collection(keys::SAVINGS_GOALS)
    }

    pub fn save_goals(&self, goals: &[SavingsGoal]) -> Result<()> {
        self.save_collection(keys::SAVINGS_GOALS, goals)
    }

    pub fn load_challenges(&self) -> Result<LoadReport<Vec<SpendingChallenge>>> {
        self.load_collection(keys::CHALLENGES)
    }

    pub fn save_challenges(&self, challenges: &[SpendingChallenge]) -> Result<()> {
        self.save_collection(keys::CHALLENGES, challenges)
    }

    pub fn load_wallets(&self) -> Result<LoadReport<Vec<Wallet>>> {
        self.load_collection(keys::WALLETS)
    }

    pub fn save_wallets(&self, wallets: &[Wallet]) -> Result<()> {
        self.save_collection(keys::WALLETS, wallets)
    }

    pub fn load_cashflow(&self) -> Result<LoadReport<Option<CashFlowPlan>>> {
        let mut report = LoadReport::new(None);
        if let Some(raw) = self.store.get(keys::CASHFLOW)? {
            let (decoded, notes) = collect_fallbacks(|| serde_json::from_str::<CashFlowPlan>(&raw));
            match decoded {
                Ok(plan) => {
                    for note in notes {
                        warn!(key = keys::CASHFLOW, %note, "replaced unreadable value");
                        report.warnings.push(format!("{}: {}", keys::CASHFLOW, note));
                    }
                    report.value = Some(plan);
                }
                Err(err) => {
                    warn!(key = keys::CASHFLOW, error = %err, "discarding unreadable plan");
                    report
                        .warnings
                        .push(format!("{} is unreadable ({})", keys::CASHFLOW, err));
                }
            }
        }
        Ok(report)
    }

    /// `None` removes the stored plan.
    pub fn save_cashflow(&self, plan: Option<&CashFlowPlan>) -> Result<()> {
        match plan {
            Some(plan) => self
                .store
                .set(keys::CASHFLOW, &serde_json::to_string_pretty(plan)?),
            None => self.store.remove(keys::CASHFLOW),
        }
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<LoadReport<Vec<T>>> {
        let mut report = LoadReport::new(Vec::new());
        match self.read_document::<T>(key)? {
            Document::Records(records, warnings) => {
                report.value = records;
                report.warnings = warnings;
            }
            Document::Corrupt(reason) => report
                .warnings
                .push(format!("{} is unreadable ({}); starting empty", key, reason)),
            Document::Missing => {}
        }
        debug!(key, records = report.value.len(), "loaded collection");
        Ok(report)
    }

    fn save_collection<T: Serialize>(&self, key: &str, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        self.store.set(key, &json)?;
        debug!(key, records = records.len(), "saved collection");
        Ok(())
    }

    fn read_document<T: DeserializeOwned>(&self, key: &str) -> Result<Document<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Document::Missing);
        };
        if raw.trim().is_empty() || raw.trim() == "null" {
            return Ok(Document::Missing);
        }
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                warn!(key, "stored document is not an array");
                return Ok(Document::Corrupt(format!(
                    "expected an array, found {}",
                    json_kind(&other)
                )));
            }
            Err(err) => {
                warn!(key, error = %err, "stored document is not valid JSON");
                return Ok(Document::Corrupt(err.to_string()));
            }
        };

        let mut records = Vec::with_capacity(items.len());
        let mut warnings = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let (decoded, notes) = collect_fallbacks(|| serde_json::from_value::<T>(item));
            match decoded {
                Ok(record) => {
                    for note in notes {
                        warn!(key, index, %note, "replaced unreadable value");
                        warnings.push(format!("record #{} in {}: {}", index + 1, key, note));
                    }
                    records.push(record);
                }
                Err(err) => {
                    warn!(key, index, error = %err, "skipping unreadable record");
                    warnings.push(format!("skipped record #{} in {}: {}", index + 1, key, err));
                }
            }
        }
        Ok(Document::Records(records, warnings))
    }
}

fn display_name<T: Identifiable + NamedEntity>(record: &T) -> String {
    let name = record.name();
    if name.is_empty() {
        record.id().to_string()
    } else {
        name.to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InvoiceStatus, ItemStatus, Priority};
    use crate::storage::MemoryStore;

    #[test]
    fn corrupt_records_are_skipped() {
        let store = MemoryStore::with_values([(
            keys::WALLETS,
            r#"[{"id":"w1","name":"Main","balance":"100"},{"name":"no id"}]"#,
        )]);
        let report = Repository::new(&store).load_wallets().unwrap();
        assert_eq!(report.value.len(), 1);
        assert_eq!(report.value[0].balance, 100.0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn unreadable_fields_are_reported_not_silent() {
        let store = MemoryStore::with_values([(
            keys::PROJECTS,
            r#"[{"id":"1","projectName":"X","totalBudget":"abc"},
                {"id":"2","projectName":"Keep me","projectStatus":"en_attente"}]"#,
        )]);
        let report = Repository::new(&store).load_projects().unwrap();
        assert_eq!(report.value.len(), 2);
        assert_eq!(report.value[0].total_budget, 0.0);
        assert_eq!(report.value[1].project_name, "Keep me");
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("`abc`"));
        assert!(report.warnings[1].contains("record #2"));
        assert!(report.warnings[1].contains("en_attente"));
    }

    #[test]
    fn unknown_wishlist_and_invoice_states_keep_the_record() {
        let store = MemoryStore::with_values([
            (
                keys::WISHLISTS,
                r#"[{"id":"l1","name":"Birthday","items":[
                    {"id":"i1","name":"Book","price":12,"status":"lost","priority":"urgent"}]}]"#,
            ),
            (
                keys::INVOICES,
                r#"[{"id":"f1","number":"FAC-2025-001","clientName":"ACME","status":"disputed"}]"#,
            ),
        ]);
        let repo = Repository::new(&store);
        let wishlists = repo.load_wishlists().unwrap();
        let item = &wishlists.value[0].items[0];
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(wishlists.warnings.len(), 2);

        let invoices = repo.load_invoices().unwrap();
        assert_eq!(invoices.value.len(), 1);
        assert_eq!(invoices.value[0].status, InvoiceStatus::Draft);
        assert_eq!(invoices.warnings.len(), 1);
    }

    #[test]
    fn corrupt_document_yields_empty_collection() {
        let store = MemoryStore::with_values([(keys::WISHLISTS, "{not json")]);
        let report = Repository::new(&store).load_wishlists().unwrap();
        assert!(report.value.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn mirror_used_only_when_canonical_unreadable() {
        let store = MemoryStore::with_values([
            (keys::PROJECTS, "garbage"),
            (
                keys::PROJECTS_BACKUP,
                r#"[{"id":"1","projectName":"Saved","totalBudget":50}]"#,
            ),
        ]);
        let report = Repository::new(&store).load_projects().unwrap();
        assert_eq!(report.value.len(), 1);
        assert_eq!(report.value[0].project_name, "Saved");
        assert_eq!(report.migrations.len(), 1);

        let store = MemoryStore::with_values([
            (keys::PROJECTS, r#"[]"#),
            (
                keys::PROJECTS_BACKUP,
                r#"[{"id":"1","projectName":"Stale"}]"#,
            ),
        ]);
        let report = Repository::new(&store).load_projects().unwrap();
        assert!(report.value.is_empty());
    }

    #[test]
    fn stale_invoice_totals_are_recomputed() {
        let store = MemoryStore::with_values([(
            keys::INVOICES,
            r#"[{"id":"i1","number":"FAC-2025-001","clientName":"ACME",
                "items":[{"description":"Work","quantity":2,"unitPrice":50,"vatRate":20}],
                "totalHT":1,"totalTVA":1,"totalTTC":1}]"#,
        )]);
        let report = Repository::new(&store).load_invoices().unwrap();
        assert_eq!(report.value[0].total_ttc, 120.0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn cashflow_plan_can_be_cleared() {
        let store = MemoryStore::new();
        let repo = Repository::new(&store);
        let plan = CashFlowPlan::new("2025-01".parse().unwrap(), 10.0);
        repo.save_cashflow(Some(&plan)).unwrap();
        assert_eq!(repo.load_cashflow().unwrap().value, Some(plan));
        repo.save_cashflow(None).unwrap();
        assert_eq!(repo.load_cashflow().unwrap().value, None);
    }
}
