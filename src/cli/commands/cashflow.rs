use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{parse_money, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::CashFlowService;
use crate::core::workspace::Collection;
use crate::domain::{FlowKind, Schedule, YearMonth};

const USAGE: &str = "cashflow <show|entries|opening|start|add|remove> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "cashflow",
        "Monthly cash-flow plan and balance projection",
        USAGE,
        cmd_cashflow,
    )]
}

fn parse_month(input: &str) -> Result<YearMonth, CommandError> {
    Ok(input.parse::<YearMonth>()?)
}

fn cmd_cashflow(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return show(context, context.config.projection_months);
    }
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    let today = context.today();
    match action.as_str() {
        "show" => {
            let months = match parsed.get(0) {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    CommandError::InvalidArguments(format!(
                        "month count must be numeric: `{}`",
                        raw
                    ))
                })?,
                None => context.config.projection_months,
            };
            show(context, months)
        }
        "entries" => entries(context),
        "opening" => {
            let balance = parse_money(parsed.require(0, "cashflow opening <amount>")?)?;
            context.mutate(&[Collection::CashFlow], |ws| {
                CashFlowService::set_opening(ws, balance, today)
            })?;
            io::print_success(format!(
                "Opening balance set to {}.",
                context.format_amount(balance)
            ));
            Ok(())
        }
        "start" => {
            let start = parse_month(parsed.require(0, "cashflow start <YYYY-MM>")?)?;
            context.mutate(&[Collection::CashFlow], |ws| {
                CashFlowService::set_start(ws, start, today);
                Ok(())
            })?;
            io::print_success(format!("Projection starts in {}.", start));
            Ok(())
        }
        "add" => {
            let usage = "cashflow add <income|expense> <amount> <label> [--once YYYY-MM | --from YYYY-MM --until YYYY-MM]";
            let raw_kind = parsed.require(0, usage)?;
            let kind = FlowKind::parse(raw_kind).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown flow kind `{}`", raw_kind))
            })?;
            let amount = parse_money(parsed.require(1, usage)?)?;
            let label = parsed.rest(2).ok_or_else(|| CommandError::usage(usage))?;
            let schedule = match parsed.flag("once") {
                Some(month) => Schedule::Once {
                    month: parse_month(month)?,
                },
                None => Schedule::Monthly {
                    from: parsed.flag("from").map(parse_month).transpose()?,
                    until: parsed.flag("until").map(parse_month).transpose()?,
                },
            };
            let description = schedule.to_string();
            context.mutate(&[Collection::CashFlow], |ws| {
                CashFlowService::add_entry(ws, &label, amount, kind, schedule, today)
            })?;
            io::print_success(format!(
                "{} `{}` of {} added ({}).",
                kind,
                label,
                context.format_amount(amount),
                description
            ));
            Ok(())
        }
        "remove" => {
            let usage = "cashflow remove <entry>";
            let entry = parsed.rest(0).ok_or_else(|| CommandError::usage(usage))?;
            let removed = context.mutate(&[Collection::CashFlow], |ws| {
                CashFlowService::remove_entry(ws, &entry)
            })?;
            io::print_success(format!("Removed `{}`.", removed.label));
            Ok(())
        }
        other => Err(unknown_action("cashflow", other)),
    }
}

fn show(context: &ShellContext, months: usize) -> CommandResult {
    let rows = CashFlowService::project(context.workspace(), months);
    if rows.is_empty() {
        io::print_warning("No cash-flow plan yet. Start with `cashflow opening <amount>`.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Month"),
        TableColumn::right("Income"),
        TableColumn::right("Expense"),
        TableColumn::right("Net"),
        TableColumn::right("Balance"),
    ]);
    let mut first_negative = None;
    for row in &rows {
        if row.closing_balance < 0.0 && first_negative.is_none() {
            first_negative = Some(row.month);
        }
        table.push(vec![
            row.month.to_string(),
            context.format_amount(row.income),
            context.format_amount(row.expense),
            context.format_amount(row.net),
            context.format_amount(row.closing_balance),
        ]);
    }
    io::print_info(table.render());
    if let Some(month) = first_negative {
        io::print_warning(format!("Balance turns negative in {}.", month));
    }
    Ok(())
}

fn entries(context: &ShellContext) -> CommandResult {
    let Some(plan) = &context.workspace().cashflow else {
        io::print_warning("No cash-flow plan yet.");
        return Ok(());
    };
    io::print_info(format!(
        "Opening balance {} from {}.",
        context.format_amount(plan.opening_balance),
        plan.start_month
    ));
    let mut table = Table::new(vec![
        TableColumn::left("Id"),
        TableColumn::left("Label"),
        TableColumn::left("Kind"),
        TableColumn::left("Schedule"),
        TableColumn::right("Amount"),
    ]);
    for entry in &plan.entries {
        table.push(vec![
            entry.id.short().to_string(),
            entry.label.clone(),
            entry.kind.to_string(),
            entry.schedule.to_string(),
            context.format_amount(entry.amount),
        ]);
    }
    io::print_info(table.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{run_script, script_context};
    use crate::core::services::CashFlowService;
    use tempfile::TempDir;

    #[test]
    fn plan_is_built_from_commands() {
        let temp = TempDir::new().unwrap();
        let mut context = script_context(temp.path());
        run_script(
            &mut context,
            &[
                "cashflow opening 1000",
                "cashflow start 2026-01",
                "cashflow add income 2000 Salary",
                "cashflow add expense 1500 Rent --from 2026-02",
                "cashflow add expense 600 Insurance --once 2026-03",
            ],
        );
        let rows = CashFlowService::project(context.workspace(), 3);
        let balances: Vec<f64> = rows.iter().map(|row| row.closing_balance).collect();
        assert_eq!(balances, vec![3000.0, 3500.0, 3400.0]);
    }
}
