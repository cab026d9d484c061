use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::core::services::SummaryService;
use crate::currency::format_percent;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "summary",
        "Dashboard totals across projects, invoices and savings",
        "summary",
        cmd_summary,
    )]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = SummaryService::current(context.workspace(), context.today());
    let money = |amount: f64| context.format_amount(amount);

    io::print_section("Projects");
    io::print_info(format!(
        "  {} project(s), {} in progress",
        summary.projects, summary.active_projects
    ));
    io::print_info(format!("  Budgeted  : {}", money(summary.total_budget)));
    io::print_info(format!("  Spent     : {}", money(summary.total_spent)));
    io::print_info(format!("  Remaining : {}", money(summary.remaining_budget())));
    if summary.over_budget_projects > 0 {
        io::print_warning(format!(
            "{} project(s) over budget.",
            summary.over_budget_projects
        ));
    }

    io::print_section("Invoices");
    io::print_info(format!(
        "  Outstanding : {} ({} invoice(s))",
        money(summary.outstanding_amount),
        summary.outstanding_invoices
    ));
    io::print_info(format!("  Paid        : {}", money(summary.paid_amount)));
    io::print_info(format!("  Open quotes : {}", summary.open_quotes));
    if summary.overdue_invoices > 0 {
        io::print_warning(format!("{} invoice(s) overdue.", summary.overdue_invoices));
    }

    io::print_section("Savings");
    io::print_info(format!(
        "  Goals      : {} of {} ({}), {} completed",
        money(summary.savings_current),
        money(summary.savings_target),
        format_percent(summary.savings_percent() / 100.0),
        summary.completed_goals
    ));
    io::print_info(format!(
        "  Challenges : {} active, {} failed",
        summary.active_challenges, summary.failed_challenges
    ));
    io::print_info(format!(
        "  Wishlists  : {} item(s), {} still wanted",
        summary.wishlist_items, summary.pending_wishlist_items
    ));
    io::print_info(format!("  Wallets    : {}", money(summary.wallet_balance)));
    Ok(())
}
