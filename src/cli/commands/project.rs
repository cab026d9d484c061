use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{
    parse_date, parse_money, parse_optional_date, CommandError, CommandResult, ParsedArgs,
    ShellContext,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::{ProjectService, WalletService};
use crate::core::workspace::Collection;
use crate::domain::{Project, ProjectStatus, ProjectTemplate};

const USAGE: &str = "project <list|new|show|rename|dates|status|total|duplicate|delete|comment|uncomment|attach|detach|templates>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "project",
        "Create, inspect and organise budget projects",
        USAGE,
        cmd_project,
    )]
}

fn cmd_project(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "list" => list(context),
        "templates" => {
            templates();
            Ok(())
        }
        "new" => create(context, &parsed),
        "show" => {
            let reference = parsed.require(0, "project show <project>")?;
            show(context, reference)
        }
        "rename" => {
            let usage = "project rename <project> <new name>";
            let reference = parsed.require(0, usage)?;
            let name = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::rename(ws, reference, &name)
            })?;
            io::print_success(format!("Project renamed to `{}`.", name));
            Ok(())
        }
        "dates" => {
            let usage = "project dates <project> <start|-> [end|-]";
            let reference = parsed.require(0, usage)?;
            let start = parse_optional_date(parsed.require(1, usage)?)?;
            let end = match parsed.get(2) {
                Some(raw) => parse_optional_date(raw)?,
                None => None,
            };
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::set_dates(ws, reference, start, end)
            })?;
            io::print_success("Project dates updated.");
            Ok(())
        }
        "status" => {
            let usage = "project status <project> <in-progress|completed|archived>";
            let reference = parsed.require(0, usage)?;
            let raw = parsed.require(1, usage)?;
            let status = ProjectStatus::parse(raw).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown project status `{}`", raw))
            })?;
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::set_status(ws, reference, status)
            })?;
            io::print_success(format!("Project marked {}.", status));
            Ok(())
        }
        "total" => {
            let usage = "project total <project> <amount>";
            let reference = parsed.require(0, usage)?;
            let amount = parse_money(parsed.require(1, usage)?)?;
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::set_total(ws, reference, amount)
            })?;
            io::print_success(format!("Total budget set to {}.", context.format_amount(amount)));
            Ok(())
        }
        "duplicate" => {
            let reference = parsed.require(0, "project duplicate <project> [new name]")?;
            let name = parsed.rest(1);
            let id = context.mutate(&[Collection::Projects], |ws| {
                ProjectService::duplicate(ws, reference, name.as_deref())
            })?;
            let copy = context.workspace().project(id.as_str())?;
            io::print_success(format!(
                "Project duplicated as `{}` ({}).",
                copy.project_name,
                id.short()
            ));
            Ok(())
        }
        "delete" => {
            let reference = parsed.require(0, "project delete <project>")?;
            let name = context.workspace().project(reference)?.project_name.clone();
            if !context.confirm(&format!("Delete project `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Projects, Collection::Wallets], |ws| {
                ProjectService::delete(ws, reference)
            })?;
            io::print_success(format!("Project `{}` deleted.", name));
            Ok(())
        }
        "comment" => {
            let usage = "project comment <project> <text> [--author name]";
            let reference = parsed.require(0, usage)?;
            let text = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let author = parsed.flag("author");
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::add_comment(ws, reference, author, &text)
            })?;
            io::print_success("Comment added.");
            Ok(())
        }
        "uncomment" => {
            let usage = "project uncomment <project> <comment id>";
            let reference = parsed.require(0, usage)?;
            let comment = parsed.require(1, usage)?;
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::remove_comment(ws, reference, comment)
            })?;
            io::print_success("Comment removed.");
            Ok(())
        }
        "attach" => {
            let usage = "project attach <project> <name> [--path file]";
            let reference = parsed.require(0, usage)?;
            let name = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let path = parsed.flag("path");
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::add_attachment(ws, reference, &name, path)
            })?;
            io::print_success(format!("Attachment `{}` added.", name));
            Ok(())
        }
        "detach" => {
            let usage = "project detach <project> <attachment>";
            let reference = parsed.require(0, usage)?;
            let attachment = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Projects], |ws| {
                ProjectService::remove_attachment(ws, reference, &attachment)
            })?;
            io::print_success("Attachment removed.");
            Ok(())
        }
        other => Err(unknown_action("project", other)),
    }
}

fn create(context: &mut ShellContext, parsed: &ParsedArgs) -> CommandResult {
    let usage = "project new <name> [--template key] [--date YYYY-MM-DD]";
    let name = parsed.rest(0).ok_or_else(|| CommandError::usage(usage))?;
    let template = match parsed.flag("template") {
        Some("none") => None,
        Some(key) => Some(key.to_string()),
        None => context.config.default_template.clone(),
    };
    let date = parsed.flag("date").map(parse_date).transpose()?;
    let id = context.mutate(&[Collection::Projects], |ws| {
        ProjectService::create(ws, &name, template.as_deref(), date)
    })?;
    io::print_success(format!("Project `{}` created ({}).", name, id.short()));
    Ok(())
}

fn list(context: &ShellContext) -> CommandResult {
    let projects = ProjectService::list(context.workspace());
    if projects.is_empty() {
        io::print_warning("No projects yet. Use `project new <name>` to create one.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Id"),
        TableColumn::left("Name"),
        TableColumn::left("Date"),
        TableColumn::left("Status"),
        TableColumn::right("Budget"),
        TableColumn::right("Spent"),
    ]);
    for project in projects {
        table.push(vec![
            project.id.short().to_string(),
            project.project_name.clone(),
            project
                .project_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".into()),
            project.project_status.to_string(),
            context.format_amount(project.total_budget),
            context.format_amount(project.spent()),
        ]);
    }
    io::print_info(table.render());
    Ok(())
}

fn templates() {
    io::print_section("Project templates");
    for template in ProjectTemplate::all() {
        let names: Vec<String> = template
            .categories()
            .into_iter()
            .map(|category| category.name)
            .collect();
        io::print_info(format!(
            "  {:<10} {:<22} {}",
            template.key,
            template.label,
            names.join(", ")
        ));
    }
}

fn show(context: &ShellContext, reference: &str) -> CommandResult {
    let ws = context.workspace();
    let project = ws.project(reference)?;
    io::print_section(&project.project_name);
    io::print_info(format!("  Id        : {}", project.id));
    io::print_info(format!("  Status    : {}", project.project_status));
    io::print_info(format!("  Dates     : {}", describe_dates(project)));
    if let Some(template) = &project.template {
        io::print_info(format!("  Template  : {}", template));
    }
    io::print_info(format!(
        "  Budget    : {}",
        context.format_amount(project.total_budget)
    ));
    io::print_info(format!("  Spent     : {}", context.format_amount(project.spent())));
    io::print_info(format!(
        "  Remaining : {}",
        context.format_amount(project.remaining())
    ));
    if project.is_over_budget() {
        io::print_warning("Spending exceeds the budget.");
    }
    if let Some(wallet) = WalletService::wallet_for(ws, project) {
        io::print_info(format!("  Wallet    : {}", wallet.name));
    }
    if !project.comments.is_empty() {
        io::print_info("  Comments:");
        for comment in &project.comments {
            io::print_info(format!(
                "    [{}] {}: {}",
                comment.id.short(),
                comment.author.as_deref().unwrap_or("anonymous"),
                comment.text
            ));
        }
    }
    if !project.attachments.is_empty() {
        io::print_info("  Attachments:");
        for attachment in &project.attachments {
            io::print_info(format!(
                "    [{}] {}{}",
                attachment.id.short(),
                attachment.name,
                attachment
                    .path
                    .as_deref()
                    .map(|path| format!(" ({})", path))
                    .unwrap_or_default()
            ));
        }
    }
    Ok(())
}

fn describe_dates(project: &Project) -> String {
    match (project.project_date, project.project_end_date) {
        (Some(start), Some(end)) => format!("{} to {}", start, end),
        (Some(start), None) => start.to_string(),
        (None, Some(end)) => format!("until {}", end),
        (None, None) => "-".into(),
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{run_script, script_context};
    use tempfile::TempDir;

    #[test]
    fn project_lifecycle_through_the_shell() {
        let temp = TempDir::new().unwrap();
        let mut context = script_context(temp.path());
        run_script(
            &mut context,
            &[
                "project new Summer Wedding --template wedding --date 2026-06-20",
                "project status \"summer wedding\" completed",
                "project comment \"Summer Wedding\" Book the DJ --author Sam",
                "project duplicate \"Summer Wedding\"",
            ],
        );
        let ws = context.workspace();
        assert_eq!(ws.projects.len(), 2);
        let original = ws.project("Summer Wedding").unwrap();
        assert_eq!(original.template.as_deref(), Some("wedding"));
        assert_eq!(original.comments[0].author.as_deref(), Some("Sam"));
        assert!(ws.project("Summer Wedding (copy)").is_ok());

        run_script(&mut context, &["project delete \"Summer Wedding (copy)\""]);
        assert_eq!(context.workspace().projects.len(), 1);
    }
}
