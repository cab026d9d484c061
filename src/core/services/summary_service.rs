use chrono::NaiveDate;

use crate::core::workspace::Workspace;
use crate::currency::round_cents;
use crate::domain::{ChallengeStatus, DocumentKind, InvoiceStatus, ItemStatus, ProjectStatus};

/// Dashboard totals across every collection of the workspace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub projects: usize,
    pub active_projects: usize,
    pub over_budget_projects: usize,
    pub total_budget: f64,
    pub total_spent: f64,
    pub outstanding_invoices: usize,
    pub outstanding_amount: f64,
    pub overdue_invoices: usize,
    pub paid_amount: f64,
    pub open_quotes: usize,
    pub wishlist_items: usize,
    pub pending_wishlist_items: usize,
    pub savings_current: f64,
    pub savings_target: f64,
    pub completed_goals: usize,
    pub active_challenges: usize,
    pub failed_challenges: usize,
    pub wallet_balance: f64,
}

impl Summary {
    pub fn remaining_budget(&self) -> f64 {
        round_cents(self.total_budget - self.total_spent)
    }

    pub fn savings_percent(&self) -> f64 {
        if self.savings_target <= 0.0 {
            return 0.0;
        }
        (self.savings_current / self.savings_target * 100.0).clamp(0.0, 100.0)
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn current(ws: &Workspace, today: NaiveDate) -> Summary {
        let mut summary = Summary {
            projects: ws.projects.len(),
            ..Summary::default()
        };

        for project in &ws.projects {
            if project.project_status == ProjectStatus::InProgress {
                summary.active_projects += 1;
            }
            if project.is_over_budget() {
                summary.over_budget_projects += 1;
            }
            summary.total_budget += project.total_budget;
            summary.total_spent += project.spent();
        }

        for invoice in &ws.invoices {
            match (invoice.kind, invoice.status) {
                (DocumentKind::Invoice, InvoiceStatus::Sent) => {
                    summary.outstanding_invoices += 1;
                    summary.outstanding_amount += invoice.total_ttc;
                    if invoice.is_overdue(today) {
                        summary.overdue_invoices += 1;
                    }
                }
                (DocumentKind::Invoice, InvoiceStatus::Paid) => {
                    summary.paid_amount += invoice.total_ttc;
                }
                (DocumentKind::Quote, InvoiceStatus::Draft | InvoiceStatus::Sent) => {
                    summary.open_quotes += 1;
                }
                _ => {}
            }
        }

        for item in ws.wishlists.iter().flat_map(|list| &list.items) {
            summary.wishlist_items += 1;
            if item.status == ItemStatus::Pending {
                summary.pending_wishlist_items += 1;
            }
        }

        for goal in &ws.goals {
            summary.savings_current += goal.current_amount;
            summary.savings_target += goal.target_amount;
            if goal.is_completed() {
                summary.completed_goals += 1;
            }
        }

        for challenge in &ws.challenges {
            match challenge.status(today) {
                ChallengeStatus::Active => summary.active_challenges += 1,
                ChallengeStatus::Failed => summary.failed_challenges += 1,
                _ => {}
            }
        }

        summary.wallet_balance = ws.wallets.iter().map(|wallet| wallet.balance).sum();

        summary.total_budget = round_cents(summary.total_budget);
        summary.total_spent = round_cents(summary.total_spent);
        summary.outstanding_amount = round_cents(summary.outstanding_amount);
        summary.paid_amount = round_cents(summary.paid_amount);
        summary.savings_current = round_cents(summary.savings_current);
        summary.savings_target = round_cents(summary.savings_target);
        summary.wallet_balance = round_cents(summary.wallet_balance);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::{ExpenseService, GoalService, InvoiceService, ProjectService};
    use crate::domain::InvoiceItem;

    #[test]
    fn totals_span_the_workspace() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let mut ws = Workspace::default();
        ProjectService::create(&mut ws, "Garden", None, None).unwrap();
        ProjectService::set_total(&mut ws, "garden", 100.0).unwrap();
        let garden = ws.project_mut("garden").unwrap();
        ExpenseService::add(garden, "Shed", 150.0, Some(today), None).unwrap();

        let invoice =
            InvoiceService::create(&mut ws, DocumentKind::Invoice, "Bob", today, Some(today))
                .unwrap();
        let item = InvoiceItem::new("Pruning", 1.0, 100.0, 20.0);
        InvoiceService::add_item(&mut ws, invoice.as_str(), item).unwrap();
        InvoiceService::set_status(&mut ws, invoice.as_str(), InvoiceStatus::Sent).unwrap();

        GoalService::create(&mut ws, "Holiday", 400.0, None).unwrap();
        GoalService::contribute(&mut ws, "holiday", 100.0, today).unwrap();

        let later = today.succ_opt().unwrap();
        let summary = SummaryService::current(&ws, later);
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.over_budget_projects, 1);
        assert_eq!(summary.remaining_budget(), -50.0);
        assert_eq!(summary.outstanding_amount, 120.0);
        assert_eq!(summary.overdue_invoices, 1);
        assert_eq!(summary.savings_percent(), 25.0);
    }
}
