//! Three-level budget tree (category → subcategory → line) and its
//! bottom-up aggregation rules.
//!
//! A node with children always carries the sum of its children. A node
//! without children is a leaf budget and keeps its own amount.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::currency::round_cents;
use crate::errors::{BudgetError, Result};

use super::common::{deserialize_amount, deserialize_text, sum_amounts, Amounted, NamedEntity};

/// Tolerance used when comparing stored and computed totals.
pub const TOTAL_TOLERANCE: f64 = 0.005;

/// A single expense line inside a subcategory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
}

impl Line {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Groups expense lines under a named heading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subcategory {
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(default, alias = "expenses")]
    pub lines: Vec<Line>,
}

impl Subcategory {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            lines: Vec::new(),
        }
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|line| same_name(&line.name, name))
    }

    pub fn line_mut(&mut self, name: &str) -> Option<&mut Line> {
        self.lines.iter_mut().find(|line| same_name(&line.name, name))
    }

    /// Recomputes the subcategory amount from its lines and returns it.
    pub fn recompute(&mut self) -> f64 {
        for line in &mut self.lines {
            line.amount = round_cents(line.amount);
        }
        self.amount = if self.lines.is_empty() {
            round_cents(self.amount)
        } else {
            sum_amounts(&self.lines)
        };
        self.amount
    }

    pub fn computed_amount(&self) -> f64 {
        if self.lines.is_empty() {
            round_cents(self.amount)
        } else {
            sum_amounts(&self.lines)
        }
    }
}

/// Top-level budget heading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(default, alias = "subCategories")]
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            subcategories: Vec::new(),
        }
    }

    pub fn subcategory(&self, name: &str) -> Option<&Subcategory> {
        self.subcategories
            .iter()
            .find(|subcategory| same_name(&subcategory.name, name))
    }

    pub fn subcategory_mut(&mut self, name: &str) -> Option<&mut Subcategory> {
        self.subcategories
            .iter_mut()
            .find(|subcategory| same_name(&subcategory.name, name))
    }

    /// Recomputes every subcategory, then the category amount, and returns it.
    pub fn recompute(&mut self) -> f64 {
        for subcategory in &mut self.subcategories {
            subcategory.recompute();
        }
        self.amount = if self.subcategories.is_empty() {
            round_cents(self.amount)
        } else {
            sum_amounts(&self.subcategories)
        };
        self.amount
    }

    pub fn computed_amount(&self) -> f64 {
        if self.subcategories.is_empty() {
            round_cents(self.amount)
        } else {
            round_cents(
                self.subcategories
                    .iter()
                    .map(Subcategory::computed_amount)
                    .sum(),
            )
        }
    }

    pub fn line_count(&self) -> usize {
        self.subcategories.iter().map(|sub| sub.lines.len()).sum()
    }
}

impl Amounted for Line {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Amounted for Subcategory {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Amounted for Category {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl NamedEntity for Line {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntity for Subcategory {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Recomputes a whole tree and returns the grand total of its categories.
pub fn recompute_categories(categories: &mut [Category]) -> f64 {
    for category in categories.iter_mut() {
        category.recompute();
    }
    sum_amounts(categories.iter())
}

/// Grand total implied by a tree without mutating it.
pub fn computed_total(categories: &[Category]) -> f64 {
    round_cents(categories.iter().map(Category::computed_amount).sum())
}

/// A node whose stored amount disagrees with the amount implied by its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub path: String,
    pub stored: f64,
    pub computed: f64,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: stored {:.2}, expected {:.2}",
            self.path, self.stored, self.computed
        )
    }
}

/// Lists every node whose stored amount differs from its computed sum.
/// `total` is the stored project total, checked only when categories exist.
pub fn check_tree(categories: &[Category], total: f64) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    for category in categories {
        for subcategory in &category.subcategories {
            let computed = subcategory.computed_amount();
            if differs(subcategory.amount, computed) {
                found.push(Discrepancy {
                    path: format!("{}/{}", category.name, subcategory.name),
                    stored: subcategory.amount,
                    computed,
                });
            }
        }
        let computed = category.computed_amount();
        if differs(category.amount, computed) {
            found.push(Discrepancy {
                path: category.name.clone(),
                stored: category.amount,
                computed,
            });
        }
    }
    if !categories.is_empty() {
        let computed = computed_total(categories);
        if differs(total, computed) {
            found.push(Discrepancy {
                path: "total".into(),
                stored: total,
                computed,
            });
        }
    }
    found
}

fn differs(stored: f64, computed: f64) -> bool {
    !stored.is_finite() || (stored - computed).abs() > TOTAL_TOLERANCE
}

/// Case-insensitive, whitespace-trimmed name comparison used for tree lookups.
pub fn same_name(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Addresses a node of the tree as `Category`, `Category/Sub` or `Category/Sub/Line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetPath {
    pub category: String,
    pub subcategory: Option<String>,
    pub line: Option<String>,
}

impl BudgetPath {
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            category: name.into(),
            subcategory: None,
            line: None,
        }
    }

    pub fn subcategory(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            line: None,
        }
    }

    pub fn line(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            line: Some(line.into()),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let segments: Vec<&str> = input.split('/').map(str::trim).collect();
        if segments.is_empty() || segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(BudgetError::InvalidInput(format!(
                "`{}` is not a budget path (expected Category[/Subcategory[/Line]])",
                input
            )));
        }
        Ok(Self {
            category: segments[0].to_string(),
            subcategory: segments.get(1).map(|s| s.to_string()),
            line: segments.get(2).map(|s| s.to_string()),
        })
    }

    pub fn depth(&self) -> usize {
        1 + usize::from(self.subcategory.is_some()) + usize::from(self.line.is_some())
    }

    /// Path of the node that contains this one, if any.
    pub fn parent(&self) -> Option<BudgetPath> {
        match (&self.subcategory, &self.line) {
            (Some(sub), Some(_)) => Some(BudgetPath::subcategory(&self.category, sub)),
            (Some(_), None) => Some(BudgetPath::category(&self.category)),
            _ => None,
        }
    }
}

impl fmt::Display for BudgetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.category)?;
        if let Some(sub) = &self.subcategory {
            write!(f, "/{}", sub)?;
        }
        if let Some(line) = &self.line {
            write!(f, "/{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<Category> {
        let mut venue = Subcategory::new("Venue", 0.0);
        venue.lines.push(Line::new("Hall", 1200.0));
        venue.lines.push(Line::new("Chairs", 150.5));
        let mut catering = Subcategory::new("Catering", 0.0);
        catering.lines.push(Line::new("Menu", 2400.0));
        let mut reception = Category::new("Reception", 0.0);
        reception.subcategories.push(venue);
        reception.subcategories.push(catering);
        vec![reception, Category::new("Flowers", 300.0)]
    }

    #[test]
    fn recompute_sums_bottom_up() {
        let mut tree = sample_tree();
        let total = recompute_categories(&mut tree);
        assert_eq!(tree[0].subcategories[0].amount, 1350.5);
        assert_eq!(tree[0].amount, 3750.5);
        assert_eq!(tree[1].amount, 300.0);
        assert_eq!(total, 4050.5);
    }

    #[test]
    fn leaf_nodes_keep_their_amounts() {
        let mut tree = vec![Category::new("Misc", 80.0)];
        tree[0].subcategories.push(Subcategory::new("Tips", 25.0));
        recompute_categories(&mut tree);
        assert_eq!(tree[0].subcategories[0].amount, 25.0);
        assert_eq!(tree[0].amount, 25.0);
    }

    #[test]
    fn check_tree_reports_stale_nodes() {
        let tree = sample_tree();
        let issues = check_tree(&tree, 10.0);
        let paths: Vec<&str> = issues.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"Reception/Venue"));
        assert!(paths.contains(&"Reception"));
        assert!(paths.contains(&"total"));

        let mut fixed = sample_tree();
        let total = recompute_categories(&mut fixed);
        assert!(check_tree(&fixed, total).is_empty());
    }

    #[test]
    fn budget_paths_parse_and_render() {
        let path = BudgetPath::parse(" Reception / Venue/Hall ").unwrap();
        assert_eq!(path, BudgetPath::line("Reception", "Venue", "Hall"));
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "Reception/Venue/Hall");
        assert_eq!(
            path.parent(),
            Some(BudgetPath::subcategory("Reception", "Venue"))
        );
        assert!(BudgetPath::parse("a//b").is_err());
        assert!(BudgetPath::parse("a/b/c/d").is_err());
    }

    #[test]
    fn legacy_tree_decodes_string_amounts() {
        let json = r#"[{"name":"Food","amount":"1 000,00 €","subcategories":[
            {"name":"Drinks","amount":"0","lines":[{"name":"Wine","amount":"250,50"}]}]}]"#;
        let mut tree: Vec<Category> = serde_json::from_str(json).unwrap();
        assert_eq!(tree[0].amount, 1000.0);
        assert_eq!(recompute_categories(&mut tree), 250.5);
    }
}
