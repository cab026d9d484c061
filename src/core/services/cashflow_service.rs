use chrono::NaiveDate;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::{
    CashFlowEntry, CashFlowPlan, CashFlowRow, EntityId, FlowKind, Schedule, YearMonth,
};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct CashFlowService;

impl CashFlowService {
    /// The workspace plan, created on first use starting at `today`'s month.
    pub fn plan_mut(ws: &mut Workspace, today: NaiveDate) -> &mut CashFlowPlan {
        ws.cashflow
            .get_or_insert_with(|| CashFlowPlan::new(YearMonth::from_date(today), 0.0))
    }

    pub fn set_opening(ws: &mut Workspace, balance: f64, today: NaiveDate) -> Result<()> {
        if !balance.is_finite() {
            return Err(BudgetError::InvalidInput("opening balance must be a number".into()));
        }
        Self::plan_mut(ws, today).opening_balance = crate::currency::round_cents(balance);
        Ok(())
    }

    pub fn set_start(ws: &mut Workspace, start: YearMonth, today: NaiveDate) {
        Self::plan_mut(ws, today).start_month = start;
    }

    pub fn add_entry(
        ws: &mut Workspace,
        label: &str,
        amount: f64,
        kind: FlowKind,
        schedule: Schedule,
        today: NaiveDate,
    ) -> Result<EntityId> {
        let label = validate_name("entry", label)?;
        let amount = validate_amount(amount)?;
        if let Schedule::Monthly {
            from: Some(from),
            until: Some(until),
        } = schedule
        {
            if until < from {
                return Err(BudgetError::InvalidInput(format!(
                    "schedule ends ({}) before it starts ({})",
                    until, from
                )));
            }
        }
        let entry = CashFlowEntry::new(label, amount, kind, schedule);
        let id = entry.id.clone();
        Self::plan_mut(ws, today).entries.push(entry);
        Ok(id)
    }

    pub fn remove_entry(ws: &mut Workspace, reference: &str) -> Result<CashFlowEntry> {
        let plan = ws
            .cashflow
            .as_mut()
            .ok_or_else(|| BudgetError::CashFlowEntryNotFound(reference.to_string()))?;
        let index = find_index(&plan.entries, reference)?
            .ok_or_else(|| BudgetError::CashFlowEntryNotFound(reference.to_string()))?;
        Ok(plan.entries.remove(index))
    }

    /// Rows for the next `months` months; empty when no plan exists.
    pub fn project(ws: &Workspace, months: usize) -> Vec<CashFlowRow> {
        ws.cashflow
            .as_ref()
            .map(|plan| plan.project(months))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_is_created_on_first_edit() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 14).unwrap();
        let mut ws = Workspace::default();
        assert!(CashFlowService::project(&ws, 3).is_empty());

        CashFlowService::set_opening(&mut ws, 1000.0, today).unwrap();
        CashFlowService::add_entry(
            &mut ws,
            "Salary",
            2500.0,
            FlowKind::Income,
            Schedule::default(),
            today,
        )
        .unwrap();
        let bonus = Schedule::Once {
            month: YearMonth::new(2026, 1).unwrap(),
        };
        CashFlowService::add_entry(&mut ws, "Gifts", 300.0, FlowKind::Expense, bonus, today)
            .unwrap();

        let rows = CashFlowService::project(&ws, 3);
        assert_eq!(rows[0].month.to_string(), "2025-11");
        assert_eq!(rows[1].closing_balance, 6000.0);
        assert_eq!(rows[2].net, 2200.0);
        assert_eq!(rows[2].closing_balance, 8200.0);

        CashFlowService::remove_entry(&mut ws, "gifts").unwrap();
        assert!(CashFlowService::remove_entry(&mut ws, "gifts").is_err());
    }

    #[test]
    fn backwards_schedules_are_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut ws = Workspace::default();
        let schedule = Schedule::Monthly {
            from: Some(YearMonth::new(2025, 6).unwrap()),
            until: Some(YearMonth::new(2025, 2).unwrap()),
        };
        let result =
            CashFlowService::add_entry(&mut ws, "Rent", 800.0, FlowKind::Expense, schedule, today);
        assert!(result.is_err());
    }
}
