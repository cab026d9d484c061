use chrono::NaiveDate;
use tracing::info;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::{EntityId, SavingsGoal};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct GoalService;

impl GoalService {
    pub fn create(
        ws: &mut Workspace,
        name: &str,
        target: f64,
        deadline: Option<NaiveDate>,
    ) -> Result<EntityId> {
        let name = validate_name("goal", name)?;
        let target = validate_amount(target)?;
        if target == 0.0 {
            return Err(BudgetError::InvalidInput(
                "a savings goal needs a target above zero".into(),
            ));
        }
        let goal = SavingsGoal::new(name, target, deadline);
        let id = goal.id.clone();
        ws.goals.push(goal);
        Ok(id)
    }

    pub fn contribute(ws: &mut Workspace, goal: &str, amount: f64, date: NaiveDate) -> Result<()> {
        let goal = ws.goal_mut(goal)?;
        let was_completed = goal.is_completed();
        goal.contribute(amount, date)?;
        if goal.is_completed() && !was_completed {
            info!(goal = %goal.name, "savings goal reached");
        }
        Ok(())
    }

    pub fn withdraw(ws: &mut Workspace, goal: &str, amount: f64, date: NaiveDate) -> Result<()> {
        ws.goal_mut(goal)?.withdraw(amount, date)
    }

    pub fn delete(ws: &mut Workspace, goal: &str) -> Result<SavingsGoal> {
        let index = find_index(&ws.goals, goal)?
            .ok_or_else(|| BudgetError::GoalNotFound(goal.to_string()))?;
        Ok(ws.goals.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributions_and_withdrawals() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut ws = Workspace::default();
        assert!(GoalService::create(&mut ws, "Nothing", 0.0, None).is_err());
        GoalService::create(&mut ws, "Car", 1000.0, None).unwrap();

        GoalService::contribute(&mut ws, "car", 400.0, today).unwrap();
        GoalService::withdraw(&mut ws, "car", 100.0, today).unwrap();
        assert!(GoalService::withdraw(&mut ws, "car", 500.0, today).is_err());
        let goal = ws.goal("car").unwrap();
        assert_eq!(goal.current_amount, 300.0);
        assert_eq!(goal.progress_percent(), 30.0);

        GoalService::delete(&mut ws, "car").unwrap();
        assert!(ws.goals.is_empty());
    }
}
