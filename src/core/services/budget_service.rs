//! Edits to a project's category tree.
//!
//! Every mutation re-establishes the aggregation invariant and touches the
//! project's `updatedAt`.

use tracing::debug;

use crate::domain::budget::{same_name, Line};
use crate::domain::{BudgetPath, Category, Discrepancy, Project, Subcategory};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct BudgetService;

impl BudgetService {
    pub fn add_category(project: &mut Project, name: &str, amount: f64) -> Result<()> {
        let name = validate_name("category", name)?;
        let amount = validate_amount(amount)?;
        ensure_unique(project.categories.iter().map(|c| c.name.as_str()), &name)?;
        project.categories.push(Category::new(name, amount));
        Self::commit(project);
        Ok(())
    }

    pub fn add_subcategory(
        project: &mut Project,
        category: &str,
        name: &str,
        amount: f64,
    ) -> Result<()> {
        let name = validate_name("subcategory", name)?;
        let amount = validate_amount(amount)?;
        let category = category_mut(project, category)?;
        ensure_unique(category.subcategories.iter().map(|s| s.name.as_str()), &name)?;
        category.subcategories.push(Subcategory::new(name, amount));
        Self::commit(project);
        Ok(())
    }

    pub fn add_line(
        project: &mut Project,
        category: &str,
        subcategory: &str,
        name: &str,
        amount: f64,
    ) -> Result<()> {
        let name = validate_name("line", name)?;
        let amount = validate_amount(amount)?;
        let sub = subcategory_mut(project, category, subcategory)?;
        ensure_unique(sub.lines.iter().map(|l| l.name.as_str()), &name)?;
        sub.lines.push(Line::new(name, amount));
        Self::commit(project);
        Ok(())
    }

    /// Adds the node named by the last segment of `path`.
    pub fn add(project: &mut Project, path: &BudgetPath, amount: f64) -> Result<()> {
        match (&path.subcategory, &path.line) {
            (None, _) => Self::add_category(project, &path.category, amount),
            (Some(sub), None) => Self::add_subcategory(project, &path.category, sub, amount),
            (Some(sub), Some(line)) => {
                Self::add_line(project, &path.category, sub, line, amount)
            }
        }
    }

    /// Sets the amount of a leaf. Nodes with children carry the sum of
    /// their children and cannot be set directly.
    pub fn set_amount(project: &mut Project, path: &BudgetPath, amount: f64) -> Result<()> {
        let amount = validate_amount(amount)?;
        match (&path.subcategory, &path.line) {
            (None, _) => {
                let category = category_mut(project, &path.category)?;
                if !category.subcategories.is_empty() {
                    return Err(aggregated(path, category.subcategories.len()));
                }
                category.amount = amount;
            }
            (Some(sub), None) => {
                let subcategory = subcategory_mut(project, &path.category, sub)?;
                if !subcategory.lines.is_empty() {
                    return Err(aggregated(path, subcategory.lines.len()));
                }
                subcategory.amount = amount;
            }
            (Some(sub), Some(line)) => {
                let subcategory = subcategory_mut(project, &path.category, sub)?;
                let line = subcategory
                    .line_mut(line)
                    .ok_or_else(|| BudgetError::EntryNotFound(path.to_string()))?;
                line.amount = amount;
            }
        }
        debug!(path = %path, amount, "set budget amount");
        Self::commit(project);
        Ok(())
    }

    pub fn rename(project: &mut Project, path: &BudgetPath, new_name: &str) -> Result<()> {
        let new_name = validate_name("budget entry", new_name)?;
        match (&path.subcategory, &path.line) {
            (None, _) => {
                let index = category_index(project, &path.category)?;
                ensure_unique_except(
                    project.categories.iter().map(|c| c.name.as_str()),
                    index,
                    &new_name,
                )?;
                let old_name = std::mem::replace(&mut project.categories[index].name, new_name);
                let new_name = &project.categories[index].name;
                for expense in &mut project.real_expenses {
                    if expense
                        .category
                        .as_deref()
                        .is_some_and(|name| same_name(name, &old_name))
                    {
                        expense.category = Some(new_name.clone());
                    }
                }
            }
            (Some(sub), None) => {
                let category = category_mut(project, &path.category)?;
                let index = category
                    .subcategories
                    .iter()
                    .position(|s| same_name(&s.name, sub))
                    .ok_or_else(|| BudgetError::EntryNotFound(path.to_string()))?;
                ensure_unique_except(
                    category.subcategories.iter().map(|s| s.name.as_str()),
                    index,
                    &new_name,
                )?;
                let category_name = category.name.clone();
                let old_name =
                    std::mem::replace(&mut category.subcategories[index].name, new_name);
                let new_name = category.subcategories[index].name.clone();
                for expense in &mut project.real_expenses {
                    let in_category = expense
                        .category
                        .as_deref()
                        .is_some_and(|name| same_name(name, &category_name));
                    let in_subcategory = expense
                        .subcategory
                        .as_deref()
                        .is_some_and(|name| same_name(name, &old_name));
                    if in_category && in_subcategory {
                        expense.subcategory = Some(new_name.clone());
                    }
                }
            }
            (Some(sub), Some(line)) => {
                let subcategory = subcategory_mut(project, &path.category, sub)?;
                let index = subcategory
                    .lines
                    .iter()
                    .position(|l| same_name(&l.name, line))
                    .ok_or_else(|| BudgetError::EntryNotFound(path.to_string()))?;
                ensure_unique_except(
                    subcategory.lines.iter().map(|l| l.name.as_str()),
                    index,
                    &new_name,
                )?;
                subcategory.lines[index].name = new_name;
            }
        }
        Self::commit(project);
        Ok(())
    }

    /// Removes a node with everything below it; returns the amount it carried.
    /// A parent left without children drops to zero.
    pub fn remove(project: &mut Project, path: &BudgetPath) -> Result<f64> {
        let removed = match (&path.subcategory, &path.line) {
            (None, _) => {
                let index = category_index(project, &path.category)?;
                let removed = project.categories.remove(index).amount;
                if project.categories.is_empty() {
                    project.total_budget = 0.0;
                }
                removed
            }
            (Some(sub), None) => {
                let category = category_mut(project, &path.category)?;
                let index = category
                    .subcategories
                    .iter()
                    .position(|s| same_name(&s.name, sub))
                    .ok_or_else(|| BudgetError::EntryNotFound(path.to_string()))?;
                let removed = category.subcategories.remove(index).amount;
                if category.subcategories.is_empty() {
                    category.amount = 0.0;
                }
                removed
            }
            (Some(sub), Some(line)) => {
                let subcategory = subcategory_mut(project, &path.category, sub)?;
                let index = subcategory
                    .lines
                    .iter()
                    .position(|l| same_name(&l.name, line))
                    .ok_or_else(|| BudgetError::EntryNotFound(path.to_string()))?;
                let removed = subcategory.lines.remove(index).amount;
                if subcategory.lines.is_empty() {
                    subcategory.amount = 0.0;
                }
                removed
            }
        };
        Self::commit(project);
        Ok(removed)
    }

    /// Moves a line under another subcategory (possibly in another category).
    pub fn move_line(project: &mut Project, line: &BudgetPath, target: &BudgetPath) -> Result<()> {
        let (Some(from_sub), Some(line_name)) = (&line.subcategory, &line.line) else {
            return Err(BudgetError::InvalidInput(format!(
                "`{}` does not name a line",
                line
            )));
        };
        let (Some(to_sub), None) = (&target.subcategory, &target.line) else {
            return Err(BudgetError::InvalidInput(format!(
                "`{}` does not name a subcategory",
                target
            )));
        };

        let destination = subcategory_mut(project, &target.category, to_sub)?;
        ensure_unique(destination.lines.iter().map(|l| l.name.as_str()), line_name)?;

        let source = subcategory_mut(project, &line.category, from_sub)?;
        let index = source
            .lines
            .iter()
            .position(|l| same_name(&l.name, line_name))
            .ok_or_else(|| BudgetError::EntryNotFound(line.to_string()))?;
        let moved = source.lines.remove(index);
        if source.lines.is_empty() {
            source.amount = 0.0;
        }

        subcategory_mut(project, &target.category, to_sub)?
            .lines
            .push(moved);
        Self::commit(project);
        Ok(())
    }

    /// Nodes whose stored amount disagrees with their children.
    pub fn check(project: &Project) -> Vec<Discrepancy> {
        project.discrepancies()
    }

    fn commit(project: &mut Project) {
        project.recompute_totals();
        project.touch();
    }
}

fn category_index(project: &Project, name: &str) -> Result<usize> {
    project
        .categories
        .iter()
        .position(|c| same_name(&c.name, name))
        .ok_or_else(|| BudgetError::EntryNotFound(name.to_string()))
}

fn category_mut<'a>(project: &'a mut Project, name: &str) -> Result<&'a mut Category> {
    project
        .category_mut(name)
        .ok_or_else(|| BudgetError::EntryNotFound(name.to_string()))
}

fn subcategory_mut<'a>(
    project: &'a mut Project,
    category: &str,
    subcategory: &str,
) -> Result<&'a mut Subcategory> {
    category_mut(project, category)?
        .subcategory_mut(subcategory)
        .ok_or_else(|| BudgetError::EntryNotFound(format!("{}/{}", category, subcategory)))
}

fn ensure_unique<'a>(mut siblings: impl Iterator<Item = &'a str>, name: &str) -> Result<()> {
    if siblings.any(|existing| same_name(existing, name)) {
        Err(BudgetError::InvalidInput(format!(
            "`{}` already exists at this level",
            name
        )))
    } else {
        Ok(())
    }
}

fn ensure_unique_except<'a>(
    siblings: impl Iterator<Item = &'a str>,
    skip: usize,
    name: &str,
) -> Result<()> {
    ensure_unique(
        siblings
            .enumerate()
            .filter(|(index, _)| *index != skip)
            .map(|(_, sibling)| sibling),
        name,
    )
}

fn aggregated(path: &BudgetPath, children: usize) -> BudgetError {
    BudgetError::InvalidInput(format!(
        "`{}` is the sum of its {} children; edit those instead",
        path, children
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RealExpense;

    fn path(text: &str) -> BudgetPath {
        BudgetPath::parse(text).unwrap()
    }

    fn sample() -> Project {
        let mut project = Project::new("Wedding");
        BudgetService::add(&mut project, &path("Reception"), 0.0).unwrap();
        BudgetService::add(&mut project, &path("Reception/Venue"), 0.0).unwrap();
        BudgetService::add(&mut project, &path("Reception/Venue/Hall"), 2000.0).unwrap();
        BudgetService::add(&mut project, &path("Reception/Catering"), 1500.0).unwrap();
        BudgetService::add(&mut project, &path("Music"), 400.0).unwrap();
        project
    }

    #[test]
    fn editing_a_line_propagates_to_every_level() {
        let mut project = sample();
        assert_eq!(project.total_budget, 3900.0);

        BudgetService::set_amount(&mut project, &path("reception/venue/hall"), 2500.0).unwrap();
        let reception = project.category("Reception").unwrap();
        assert_eq!(reception.subcategory("Venue").unwrap().amount, 2500.0);
        assert_eq!(reception.amount, 4000.0);
        assert_eq!(project.total_budget, 4400.0);
        assert!(BudgetService::check(&project).is_empty());
    }

    #[test]
    fn aggregated_nodes_cannot_be_set() {
        let mut project = sample();
        assert!(BudgetService::set_amount(&mut project, &path("Reception"), 1.0).is_err());
        assert!(BudgetService::set_amount(&mut project, &path("Reception/Venue"), 1.0).is_err());
        BudgetService::set_amount(&mut project, &path("Reception/Catering"), 1000.0).unwrap();
        BudgetService::set_amount(&mut project, &path("Music"), 0.0).unwrap();
        assert_eq!(project.total_budget, 3000.0);
    }

    #[test]
    fn invalid_amounts_and_duplicates_are_rejected() {
        let mut project = sample();
        assert!(BudgetService::add(&mut project, &path("Extra"), -5.0).is_err());
        assert!(BudgetService::add(&mut project, &path("Extra"), f64::NAN).is_err());
        assert!(BudgetService::add(&mut project, &path("music"), 1.0).is_err());
        assert!(BudgetService::add(&mut project, &path("Nope/Sub"), 1.0).is_err());
        assert!(BudgetService::rename(&mut project, &path("Music"), "reception").is_err());
        BudgetService::rename(&mut project, &path("Music"), "Band").unwrap();
        assert!(project.category("Band").is_some());
    }

    #[test]
    fn removing_a_subtree_updates_totals() {
        let mut project = sample();
        let removed = BudgetService::remove(&mut project, &path("Reception/Venue")).unwrap();
        assert_eq!(removed, 2000.0);
        assert_eq!(project.total_budget, 1900.0);
        BudgetService::remove(&mut project, &path("Reception/Catering")).unwrap();
        assert_eq!(project.category("Reception").unwrap().amount, 0.0);
        assert_eq!(project.total_budget, 400.0);
        BudgetService::remove(&mut project, &path("Reception")).unwrap();
        BudgetService::remove(&mut project, &path("Music")).unwrap();
        assert_eq!(project.total_budget, 0.0);
    }

    #[test]
    fn removing_the_only_line_empties_its_subcategory() {
        let mut project = sample();
        let removed = BudgetService::remove(&mut project, &path("Reception/Venue/Hall")).unwrap();
        assert_eq!(removed, 2000.0);
        let reception = project.category("Reception").unwrap();
        assert_eq!(reception.subcategory("Venue").unwrap().amount, 0.0);
        assert_eq!(reception.amount, 1500.0);
        assert_eq!(project.total_budget, 1900.0);
        assert!(BudgetService::check(&project).is_empty());
    }

    #[test]
    fn lines_move_between_subcategories() {
        let mut project = sample();
        BudgetService::add(&mut project, &path("Music/Band"), 0.0).unwrap();
        BudgetService::move_line(&mut project, &path("Reception/Venue/Hall"), &path("Music/Band"))
            .unwrap();
        assert_eq!(project.category("Music").unwrap().amount, 2000.0);
        assert_eq!(project.category("Reception").unwrap().amount, 1500.0);
        assert_eq!(project.total_budget, 3500.0);
        assert!(project
            .category("Reception")
            .unwrap()
            .subcategory("Venue")
            .unwrap()
            .lines
            .is_empty());
        let not_a_line =
            BudgetService::move_line(&mut project, &path("Music"), &path("Music/Band"));
        assert!(not_a_line.is_err());
    }

    #[test]
    fn renaming_keeps_spending_attached() {
        let mut project = sample();
        project.real_expenses.push(
            RealExpense::new("Deposit", 80.0, None).with_category(Some("reception".into())),
        );
        project.real_expenses[0].subcategory = Some("venue".into());
        BudgetService::rename(&mut project, &path("Reception/Venue"), "Hall hire").unwrap();
        BudgetService::rename(&mut project, &path("Reception"), "Party").unwrap();

        let expense = &project.real_expenses[0];
        assert_eq!(expense.category.as_deref(), Some("Party"));
        assert_eq!(expense.subcategory.as_deref(), Some("Hall hire"));
        let usage = project.category_usage();
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].name, "Party");
        assert_eq!(usage[0].spent, 80.0);
    }
}
