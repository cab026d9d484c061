use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{parse_money, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::core::services::BudgetService;
use crate::core::workspace::Collection;
use crate::domain::BudgetPath;

const USAGE: &str = "budget <show|add|set|rename|remove|move|check> <project> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Edit a project's category / subcategory / line tree",
        USAGE,
        cmd_budget,
    )]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "show" => show(context, parsed.require(0, "budget show <project>")?),
        "add" => {
            let usage = "budget add <project> <Category[/Sub[/Line]]> [amount]";
            let project = parsed.require(0, usage)?;
            let path = BudgetPath::parse(parsed.require(1, usage)?)?;
            let amount = parsed.get(2).map(parse_money).transpose()?.unwrap_or(0.0);
            context.mutate(&[Collection::Projects], |ws| {
                BudgetService::add(ws.project_mut(project)?, &path, amount)
            })?;
            io::print_success(format!("Added `{}`.", path));
            Ok(())
        }
        "set" => {
            let usage = "budget set <project> <path> <amount>";
            let project = parsed.require(0, usage)?;
            let path = BudgetPath::parse(parsed.require(1, usage)?)?;
            let amount = parse_money(parsed.require(2, usage)?)?;
            let total = context.mutate(&[Collection::Projects], |ws| {
                let project = ws.project_mut(project)?;
                BudgetService::set_amount(project, &path, amount)?;
                Ok(project.total_budget)
            })?;
            io::print_success(format!(
                "`{}` set to {}. Project total is now {}.",
                path,
                context.format_amount(amount),
                context.format_amount(total)
            ));
            Ok(())
        }
        "rename" => {
            let usage = "budget rename <project> <path> <new name>";
            let project = parsed.require(0, usage)?;
            let path = BudgetPath::parse(parsed.require(1, usage)?)?;
            let name = parsed.rest(2).ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Projects], |ws| {
                BudgetService::rename(ws.project_mut(project)?, &path, &name)
            })?;
            io::print_success(format!("`{}` renamed to `{}`.", path, name));
            Ok(())
        }
        "remove" => {
            let usage = "budget remove <project> <path>";
            let project = parsed.require(0, usage)?;
            let path = BudgetPath::parse(parsed.require(1, usage)?)?;
            if !context.confirm(&format!("Remove `{}` and everything under it?", path))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            let removed = context.mutate(&[Collection::Projects], |ws| {
                BudgetService::remove(ws.project_mut(project)?, &path)
            })?;
            io::print_success(format!(
                "Removed `{}` ({}).",
                path,
                context.format_amount(removed)
            ));
            Ok(())
        }
        "move" => {
            let usage = "budget move <project> <Category/Sub/Line> <Category/Sub>";
            let project = parsed.require(0, usage)?;
            let line = BudgetPath::parse(parsed.require(1, usage)?)?;
            let target = BudgetPath::parse(parsed.require(2, usage)?)?;
            context.mutate(&[Collection::Projects], |ws| {
                BudgetService::move_line(ws.project_mut(project)?, &line, &target)
            })?;
            io::print_success(format!("Moved `{}` to `{}`.", line, target));
            Ok(())
        }
        "check" => {
            let project = context
                .workspace()
                .project(parsed.require(0, "budget check <project>")?)?;
            let found = BudgetService::check(project);
            if found.is_empty() {
                io::print_success("Budget tree is consistent.");
            } else {
                for discrepancy in found {
                    io::print_warning(discrepancy);
                }
            }
            Ok(())
        }
        other => Err(unknown_action("budget", other)),
    }
}

fn show(context: &ShellContext, reference: &str) -> CommandResult {
    let project = context.workspace().project(reference)?;
    io::print_section(format!("Budget: {}", project.project_name));
    if project.categories.is_empty() {
        io::print_info(format!(
            "  No categories. Total budget {}.",
            context.format_amount(project.total_budget)
        ));
        return Ok(());
    }
    for category in &project.categories {
        io::print_info(format!(
            "  {:<36} {:>14}",
            category.name,
            context.format_amount(category.amount)
        ));
        for sub in &category.subcategories {
            io::print_info(format!(
                "    {:<34} {:>14}",
                sub.name,
                context.format_amount(sub.amount)
            ));
            for line in &sub.lines {
                io::print_info(format!(
                    "      {:<32} {:>14}",
                    line.name,
                    context.format_amount(line.amount)
                ));
            }
        }
    }
    io::print_info(format!(
        "  {:<36} {:>14}",
        "Total",
        context.format_amount(project.total_budget)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{run_script, script_context};
    use tempfile::TempDir;

    #[test]
    fn edits_keep_the_tree_summed() {
        let temp = TempDir::new().unwrap();
        let mut context = script_context(temp.path());
        run_script(
            &mut context,
            &[
                "project new Kitchen --template none",
                "budget add Kitchen Works",
                "budget add Kitchen Works/Plumbing",
                "budget add Kitchen Works/Plumbing/Sink 300",
                "budget add Kitchen Works/Plumbing/Pipes 150",
                "budget add Kitchen Works/Paint 80",
                "budget set Kitchen Works/Plumbing/Sink 350",
            ],
        );
        let project = context.workspace().project("Kitchen").unwrap();
        assert_eq!(project.total_budget, 580.0);
        assert!(project.discrepancies().is_empty());

        run_script(&mut context, &["budget remove Kitchen Works/Paint"]);
        let project = context.workspace().project("Kitchen").unwrap();
        assert_eq!(project.total_budget, 500.0);
    }
}
