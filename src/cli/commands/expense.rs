use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{
    parse_date, parse_money, CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::ExpenseService;
use crate::core::workspace::Collection;
use crate::currency::format_percent;

const USAGE: &str = "expense <add|remove|list|usage> <project> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "expense",
        "Record real spending against a project",
        USAGE,
        cmd_expense,
    )]
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "add" => {
            let usage =
                "expense add <project> <amount> <description> [--date YYYY-MM-DD] [--category name]";
            let project = parsed.require(0, usage)?;
            let amount = parse_money(parsed.require(1, usage)?)?;
            let description = parsed.rest(2).ok_or_else(|| CommandError::usage(usage))?;
            let date = match parsed.flag("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let category = parsed.flag("category");
            let over_budget = context.mutate(&[Collection::Projects], |ws| {
                let project = ws.project_mut(project)?;
                ExpenseService::add(project, &description, amount, Some(date), category)?;
                Ok(project.is_over_budget())
            })?;
            io::print_success(format!(
                "Recorded {} for `{}`.",
                context.format_amount(amount),
                description
            ));
            if over_budget {
                io::print_warning("This project is now over budget.");
            }
            Ok(())
        }
        "remove" => {
            let usage = "expense remove <project> <expense id>";
            let project = parsed.require(0, usage)?;
            let expense = parsed.require(1, usage)?;
            let removed = context.mutate(&[Collection::Projects], |ws| {
                ExpenseService::remove(ws.project_mut(project)?, expense)
            })?;
            io::print_success(format!("Removed expense `{}`.", removed.description));
            Ok(())
        }
        "list" => list(context, parsed.require(0, "expense list <project>")?),
        "usage" => usage(context, parsed.require(0, "expense usage <project>")?),
        other => Err(unknown_action("expense", other)),
    }
}

fn list(context: &ShellContext, reference: &str) -> CommandResult {
    let project = context.workspace().project(reference)?;
    let expenses = ExpenseService::list(project);
    if expenses.is_empty() {
        io::print_warning(format!("No expenses recorded for `{}`.", project.project_name));
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Id"),
        TableColumn::left("Date"),
        TableColumn::left("Description"),
        TableColumn::left("Category"),
        TableColumn::right("Amount"),
    ]);
    for expense in expenses {
        table.push(vec![
            expense.id.short().to_string(),
            expense
                .date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".into()),
            expense.description.clone(),
            expense.category.clone().unwrap_or_else(|| "-".into()),
            context.format_amount(expense.amount),
        ]);
    }
    io::print_info(table.render());
    io::print_info(format!(
        "Spent {} of {}.",
        context.format_amount(project.spent()),
        context.format_amount(project.total_budget)
    ));
    Ok(())
}

fn usage(context: &ShellContext, reference: &str) -> CommandResult {
    let project = context.workspace().project(reference)?;
    let mut table = Table::new(vec![
        TableColumn::left("Category"),
        TableColumn::right("Budgeted"),
        TableColumn::right("Spent"),
        TableColumn::right("Remaining"),
        TableColumn::right("Used"),
    ]);
    for row in ExpenseService::usage(project) {
        table.push(vec![
            row.name.clone(),
            context.format_amount(row.budgeted),
            context.format_amount(row.spent),
            context.format_amount(row.remaining()),
            row.ratio().map(format_percent).unwrap_or_else(|| "-".into()),
        ]);
    }
    io::print_info(table.render());
    Ok(())
}
