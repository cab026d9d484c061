//! Budget projects: the budget tree plus the spending recorded against it.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::round_cents;

use super::budget::{
    check_tree, computed_total, recompute_categories, same_name, Category, Discrepancy,
};
use super::common::{
    deserialize_amount, deserialize_flag, deserialize_optional_date, deserialize_or_default,
    deserialize_text, deserialize_timestamp, sum_amounts, Amounted, EntityId, Identifiable,
    NamedEntity,
};
use super::templates::ProjectTemplate;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProjectStatus {
    #[default]
    #[serde(alias = "en_cours", alias = "in_progress", alias = "active")]
    InProgress,
    #[serde(alias = "termine", alias = "terminé", alias = "done")]
    Completed,
    #[serde(alias = "archive", alias = "archivé")]
    Archived,
}

impl ProjectStatus {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "inprogress" | "in-progress" | "in_progress" | "active" | "en_cours" => {
                Some(ProjectStatus::InProgress)
            }
            "completed" | "done" | "termine" | "terminé" => Some(ProjectStatus::Completed),
            "archived" | "archive" | "archivé" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectStatus::InProgress => "In progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Archived => "Archived",
        };
        f.write_str(label)
    }
}

/// Spending actually recorded against a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealExpense {
    #[serde(default)]
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl RealExpense {
    pub fn new(description: impl Into<String>, amount: f64, date: Option<NaiveDate>) -> Self {
        Self {
            id: EntityId::generate(),
            description: description.into(),
            amount,
            date,
            category: None,
            subcategory: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

impl Amounted for RealExpense {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Identifiable for RealExpense {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for RealExpense {
    fn name(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub text: String,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Identifiable for Attachment {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Attachment {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Identifiable for Comment {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Comment {
    fn name(&self) -> &str {
        &self.text
    }
}

/// A budget project with its category tree and recorded spending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default, alias = "name")]
    pub project_name: String,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub project_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub project_end_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub total_budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub project_status: ProjectStatus,
    #[serde(deserialize_with = "deserialize_flag", default)]
    pub link_to_wallet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<EntityId>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub real_expenses: Vec<RealExpense>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            project_name: name.into(),
            project_date: None,
            project_end_date: None,
            total_budget: 0.0,
            template: None,
            project_status: ProjectStatus::default(),
            link_to_wallet: false,
            wallet_id: None,
            categories: Vec::new(),
            real_expenses: Vec::new(),
            attachments: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a project seeded with the template's category skeleton.
    pub fn from_template(name: impl Into<String>, template: &ProjectTemplate) -> Self {
        let mut project = Self::new(name);
        project.categories = template.categories();
        project.template = Some(template.key.to_string());
        project.recompute_totals();
        project
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| same_name(&c.name, name))
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| same_name(&c.name, name))
    }

    /// Restores the budget invariant across the whole tree.
    ///
    /// Projects without categories keep their stored total.
    pub fn recompute_totals(&mut self) -> f64 {
        let total = recompute_categories(&mut self.categories);
        self.total_budget = if self.categories.is_empty() {
            round_cents(self.total_budget)
        } else {
            total
        };
        self.total_budget
    }

    pub fn discrepancies(&self) -> Vec<Discrepancy> {
        check_tree(&self.categories, self.total_budget)
    }

    pub fn computed_total(&self) -> f64 {
        if self.categories.is_empty() {
            round_cents(self.total_budget)
        } else {
            computed_total(&self.categories)
        }
    }

    pub fn spent(&self) -> f64 {
        sum_amounts(&self.real_expenses)
    }

    pub fn remaining(&self) -> f64 {
        round_cents(self.total_budget - self.spent())
    }

    /// Share of the budget already spent; `None` when nothing was budgeted.
    pub fn usage_ratio(&self) -> Option<f64> {
        if self.total_budget.abs() < f64::EPSILON {
            None
        } else {
            Some(self.spent() / self.total_budget)
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent() - self.total_budget > 0.005
    }

    /// Budgeted versus spent amounts per category, in tree order. Expenses
    /// whose category matches nothing are grouped under [`UNCATEGORIZED`].
    pub fn category_usage(&self) -> Vec<CategoryUsage> {
        let mut rows: Vec<CategoryUsage> = self
            .categories
            .iter()
            .map(|category| CategoryUsage::new(&category.name, category.amount))
            .collect();
        let mut uncategorized = CategoryUsage::new(UNCATEGORIZED, 0.0);
        for expense in &self.real_expenses {
            let position = expense
                .category
                .as_deref()
                .and_then(|name| rows.iter().position(|row| same_name(&row.name, name)));
            match position {
                Some(index) => rows[index].spent += expense.amount,
                None => uncategorized.spent += expense.amount,
            }
        }
        if uncategorized.spent.abs() > f64::EPSILON {
            rows.push(uncategorized);
        }
        for row in &mut rows {
            row.spent = round_cents(row.spent);
        }
        rows
    }
}

impl Identifiable for Project {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Project {
    fn name(&self) -> &str {
        &self.project_name
    }
}

/// Budget consumption for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUsage {
    pub name: String,
    pub budgeted: f64,
    pub spent: f64,
}

impl CategoryUsage {
    fn new(name: &str, budgeted: f64) -> Self {
        Self {
            name: name.to_string(),
            budgeted,
            spent: 0.0,
        }
    }

    pub fn remaining(&self) -> f64 {
        round_cents(self.budgeted - self.spent)
    }

    pub fn ratio(&self) -> Option<f64> {
        if self.budgeted.abs() < f64::EPSILON {
            None
        } else {
            Some(self.spent / self.budgeted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget::Subcategory;
    use crate::domain::common::collect_fallbacks;

    #[test]
    fn legacy_project_json_decodes() {
        let json = r#"{
            "id": 1699999999999,
            "projectName": "Mariage",
            "projectDate": "14/06/2025",
            "totalBudget": "5 000,00 €",
            "projectStatus": "en_cours",
            "linkToWallet": "true",
            "categories": [{"name": "Salle", "amount": "3000", "subcategories": []}],
            "realExpenses": [{"description": "Acompte", "amount": "500"}]
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id.as_str(), "1699999999999");
        assert_eq!(project.project_name, "Mariage");
        assert_eq!(project.project_date, NaiveDate::from_ymd_opt(2025, 6, 14));
        assert_eq!(project.total_budget, 5000.0);
        assert!(project.link_to_wallet);
        assert_eq!(project.project_status, ProjectStatus::InProgress);
        assert_eq!(project.spent(), 500.0);
        assert_eq!(project.discrepancies().len(), 1);
    }

    #[test]
    fn status_parsing_accepts_stored_spellings() {
        assert_eq!(ProjectStatus::parse("Terminé"), Some(ProjectStatus::Completed));
        assert_eq!(ProjectStatus::parse("archivé"), Some(ProjectStatus::Archived));
        assert_eq!(ProjectStatus::parse("EN_COURS"), Some(ProjectStatus::InProgress));
        assert_eq!(ProjectStatus::parse("paused"), None);
    }

    #[test]
    fn unknown_status_keeps_the_project() {
        let json = r#"{"id": "1", "projectName": "Keep me", "projectStatus": "en_attente"}"#;
        let (project, notes) = collect_fallbacks(|| serde_json::from_str::<Project>(json));
        let project = project.unwrap();
        assert_eq!(project.project_name, "Keep me");
        assert_eq!(project.project_status, ProjectStatus::InProgress);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("en_attente"));
    }

    #[test]
    fn recompute_keeps_total_without_categories() {
        let mut project = Project::new("Trip");
        project.total_budget = 1200.0;
        assert_eq!(project.recompute_totals(), 1200.0);

        let mut food = Category::new("Food", 0.0);
        food.subcategories.push(Subcategory::new("Restaurants", 300.0));
        project.categories.push(food);
        assert_eq!(project.recompute_totals(), 300.0);
        assert!(project.discrepancies().is_empty());
    }

    #[test]
    fn template_projects_start_at_zero() {
        let template = ProjectTemplate::find("wedding").unwrap();
        let project = Project::from_template("Our wedding", template);
        assert_eq!(project.template.as_deref(), Some("wedding"));
        assert_eq!(project.categories.len(), 5);
        assert_eq!(project.total_budget, 0.0);
    }

    #[test]
    fn usage_groups_unmatched_expenses() {
        let mut project = Project::new("Party");
        project.categories.push(Category::new("Food", 200.0));
        project.recompute_totals();
        project.real_expenses.push(
            RealExpense::new("Pizza", 80.0, None).with_category(Some("food".into())),
        );
        project
            .real_expenses
            .push(RealExpense::new("Taxi", 20.0, None));

        let usage = project.category_usage();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].spent, 80.0);
        assert_eq!(usage[0].remaining(), 120.0);
        assert_eq!(usage[1].name, UNCATEGORIZED);
        assert_eq!(project.remaining(), 100.0);
        assert_eq!(project.usage_ratio(), Some(0.5));
    }
}
