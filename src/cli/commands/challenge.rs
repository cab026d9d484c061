use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{
    parse_date, parse_money, CommandError, CommandResult, ParsedArgs, ShellContext,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::ChallengeService;
use crate::core::workspace::Collection;
use crate::currency::format_percent;
use crate::domain::ChallengeStatus;

const USAGE: &str = "challenge <list|new|record|delete> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "challenge",
        "Spending challenges with a cap over a period",
        USAGE,
        cmd_challenge,
    )]
}

fn cmd_challenge(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "list" => list(context),
        "new" => {
            let usage = "challenge new <limit> <start> <end> <name> [--category name]";
            let limit = parse_money(parsed.require(0, usage)?)?;
            let start = parse_date(parsed.require(1, usage)?)?;
            let end = parse_date(parsed.require(2, usage)?)?;
            let name = parsed.rest(3).ok_or_else(|| CommandError::usage(usage))?;
            let category = parsed.flag("category");
            context.mutate(&[Collection::Challenges], |ws| {
                ChallengeService::create(ws, &name, limit, start, end, category)
            })?;
            io::print_success(format!("Challenge `{}` created.", name));
            Ok(())
        }
        "record" => {
            let usage = "challenge record <challenge> <amount> [note] [--date YYYY-MM-DD]";
            let challenge = parsed.require(0, usage)?;
            let amount = parse_money(parsed.require(1, usage)?)?;
            let note = parsed.rest(2);
            let date = match parsed.flag("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let (status, remaining) = context.mutate(&[Collection::Challenges], |ws| {
                let status =
                    ChallengeService::record(ws, challenge, amount, date, note.as_deref())?;
                Ok((status, ws.challenge(challenge)?.remaining_budget()))
            })?;
            if status == ChallengeStatus::Failed {
                io::print_warning(format!(
                    "Limit exceeded by {}.",
                    context.format_amount(-remaining)
                ));
            } else {
                io::print_success(format!("{} left.", context.format_amount(remaining)));
            }
            Ok(())
        }
        "delete" => {
            let challenge = parsed.require(0, "challenge delete <challenge>")?;
            let name = context.workspace().challenge(challenge)?.name.clone();
            if !context.confirm(&format!("Delete challenge `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Challenges], |ws| {
                ChallengeService::delete(ws, challenge)
            })?;
            io::print_success(format!("Challenge `{}` deleted.", name));
            Ok(())
        }
        other => Err(unknown_action("challenge", other)),
    }
}

fn list(context: &ShellContext) -> CommandResult {
    let challenges = &context.workspace().challenges;
    if challenges.is_empty() {
        io::print_warning("No spending challenges yet.");
        return Ok(());
    }
    let today = context.today();
    let mut table = Table::new(vec![
        TableColumn::left("Challenge"),
        TableColumn::left("Status"),
        TableColumn::right("Spent"),
        TableColumn::right("Limit"),
        TableColumn::right("Used"),
        TableColumn::right("Days left"),
    ]);
    for challenge in challenges {
        table.push(vec![
            challenge.name.clone(),
            challenge.status(today).to_string(),
            context.format_amount(challenge.spent_amount),
            context.format_amount(challenge.limit_amount),
            format_percent(challenge.progress_percent() / 100.0),
            challenge
                .remaining_days(today)
                .map(|days| days.to_string())
                .unwrap_or_else(|| "-".into()),
        ]);
    }
    io::print_info(table.render());
    Ok(())
}
