use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{
    parse_date, parse_money, parse_optional_date, CommandError, CommandResult, ParsedArgs,
    ShellContext,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::GoalService;
use crate::core::workspace::Collection;
use crate::currency::format_percent;

const USAGE: &str = "goal <list|new|contribute|withdraw|delete> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "goal",
        "Track savings goals and contributions",
        USAGE,
        cmd_goal,
    )]
}

fn cmd_goal(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "list" => list(context),
        "new" => {
            let usage = "goal new <target> <name> [--deadline YYYY-MM-DD]";
            let target = parse_money(parsed.require(0, usage)?)?;
            let name = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let deadline = match parsed.flag("deadline") {
                Some(raw) => parse_optional_date(raw)?,
                None => None,
            };
            context.mutate(&[Collection::Goals], |ws| {
                GoalService::create(ws, &name, target, deadline)
            })?;
            io::print_success(format!(
                "Goal `{}` created with a target of {}.",
                name,
                context.format_amount(target)
            ));
            Ok(())
        }
        "contribute" | "withdraw" => {
            let usage = "goal <contribute|withdraw> <goal> <amount> [--date YYYY-MM-DD]";
            let goal = parsed.require(0, usage)?;
            let amount = parse_money(parsed.require(1, usage)?)?;
            let date = match parsed.flag("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let deposit = action == "contribute";
            let (current, completed) = context.mutate(&[Collection::Goals], |ws| {
                if deposit {
                    GoalService::contribute(ws, goal, amount, date)?;
                } else {
                    GoalService::withdraw(ws, goal, amount, date)?;
                }
                let goal = ws.goal(goal)?;
                Ok((goal.current_amount, goal.is_completed()))
            })?;
            io::print_success(format!("Saved so far: {}.", context.format_amount(current)));
            if deposit && completed {
                io::print_success("Goal reached!");
            }
            Ok(())
        }
        "delete" => {
            let goal = parsed.require(0, "goal delete <goal>")?;
            let name = context.workspace().goal(goal)?.name.clone();
            if !context.confirm(&format!("Delete goal `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Goals], |ws| GoalService::delete(ws, goal))?;
            io::print_success(format!("Goal `{}` deleted.", name));
            Ok(())
        }
        other => Err(unknown_action("goal", other)),
    }
}

fn list(context: &ShellContext) -> CommandResult {
    let goals = &context.workspace().goals;
    if goals.is_empty() {
        io::print_warning("No savings goals yet.");
        return Ok(());
    }
    let today = context.today();
    let mut table = Table::new(vec![
        TableColumn::left("Goal"),
        TableColumn::right("Saved"),
        TableColumn::right("Target"),
        TableColumn::right("Progress"),
        TableColumn::left("Deadline"),
        TableColumn::right("Per month"),
    ]);
    for goal in goals {
        table.push(vec![
            goal.name.clone(),
            context.format_amount(goal.current_amount),
            context.format_amount(goal.target_amount),
            format_percent(goal.progress_percent() / 100.0),
            goal.deadline
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".into()),
            goal.monthly_required(today)
                .map(|amount| context.format_amount(amount))
                .unwrap_or_else(|| "-".into()),
        ]);
    }
    io::print_info(table.render());
    Ok(())
}
