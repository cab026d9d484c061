use chrono::NaiveDate;
use tracing::debug;

use crate::core::workspace::find_index;
use crate::domain::{CategoryUsage, EntityId, Project, RealExpense};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct ExpenseService;

impl ExpenseService {
    /// Records spending. A category that matches an existing one is stored
    /// with that category's spelling; unknown categories are kept as typed
    /// and reported under "Uncategorized".
    pub fn add(
        project: &mut Project,
        description: &str,
        amount: f64,
        date: Option<NaiveDate>,
        category: Option<&str>,
    ) -> Result<EntityId> {
        let description = validate_name("expense", description)?;
        let amount = validate_amount(amount)?;
        let category = category.map(str::trim).filter(|c| !c.is_empty()).map(|c| {
            project
                .category(c)
                .map(|known| known.name.clone())
                .unwrap_or_else(|| c.to_string())
        });
        let expense = RealExpense::new(description, amount, date).with_category(category);
        let id = expense.id.clone();
        debug!(project = %project.project_name, amount, "recorded expense");
        project.real_expenses.push(expense);
        project.touch();
        Ok(id)
    }

    pub fn remove(project: &mut Project, reference: &str) -> Result<RealExpense> {
        let index = find_index(&project.real_expenses, reference)?
            .ok_or_else(|| BudgetError::EntryNotFound(format!("expense {}", reference)))?;
        let removed = project.real_expenses.remove(index);
        project.touch();
        Ok(removed)
    }

    /// Expenses ordered by date, undated ones last.
    pub fn list(project: &Project) -> Vec<&RealExpense> {
        let mut expenses: Vec<&RealExpense> = project.real_expenses.iter().collect();
        expenses.sort_by_key(|expense| (expense.date.is_none(), expense.date));
        expenses
    }

    pub fn usage(project: &Project) -> Vec<CategoryUsage> {
        project.category_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::UNCATEGORIZED;
    use crate::domain::Category;

    #[test]
    fn expenses_feed_category_usage() {
        let mut project = Project::new("Trip");
        project.categories.push(Category::new("Food", 300.0));
        project.recompute_totals();

        ExpenseService::add(&mut project, "Dinner", 45.5, None, Some("food")).unwrap();
        let taxi =
            ExpenseService::add(&mut project, "Taxi", 20.0, None, Some("Transport")).unwrap();
        assert!(ExpenseService::add(&mut project, "Bad", -1.0, None, None).is_err());
        assert_eq!(project.real_expenses[0].category.as_deref(), Some("Food"));

        let usage = ExpenseService::usage(&project);
        assert_eq!(usage[0].spent, 45.5);
        assert_eq!(usage[1].name, UNCATEGORIZED);

        ExpenseService::remove(&mut project, taxi.as_str()).unwrap();
        assert_eq!(project.spent(), 45.5);
    }

    #[test]
    fn listing_orders_by_date() {
        let mut project = Project::new("Trip");
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day);
        ExpenseService::add(&mut project, "late", 1.0, d(20), None).unwrap();
        ExpenseService::add(&mut project, "undated", 1.0, None, None).unwrap();
        ExpenseService::add(&mut project, "early", 1.0, d(2), None).unwrap();
        let names: Vec<&str> = ExpenseService::list(&project)
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(names, vec!["early", "late", "undated"]);
    }
}
