use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::domain::ProjectTemplate;

const USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore <name|number>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and manage preferences",
        USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return show(context);
    }
    let (action, rest) = split_action(args, USAGE)?;
    match action.as_str() {
        "show" => show(context),
        "set" => {
            let (Some(key), Some(_)) = (rest.first(), rest.get(1)) else {
                return Err(CommandError::usage("config set <key> <value>"));
            };
            let value = rest[1..].join(" ");
            if key.eq_ignore_ascii_case("default_template") && value != "none" {
                ProjectTemplate::find(&value)?;
            }
            context.config.set(key, &value)?;
            context.persist_config()?;
            io::print_success("Configuration updated.");
            Ok(())
        }
        "backup" => {
            let note = if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            };
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            io::print_success(format!("Configuration backup saved: {}", name));
            Ok(())
        }
        "backups" => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                io::print_warning("No configuration backups found.");
                return Ok(());
            }
            io::print_info("Available configuration backups:");
            for (idx, name) in backups.iter().enumerate() {
                io::print_info(format!("  {:>2}. {}", idx + 1, name));
            }
            Ok(())
        }
        "restore" => {
            let reference = rest
                .first()
                .ok_or_else(|| CommandError::usage("config restore <name|number>"))?;
            let name = resolve_backup(context, reference)?;
            context.config = context.config_manager.restore(&name)?;
            context.persist_config()?;
            io::print_success(format!("Configuration restored from {}.", name));
            Ok(())
        }
        other => Err(unknown_action("config", other)),
    }
}

fn show(context: &ShellContext) -> CommandResult {
    io::print_section("Configuration");
    for (key, value) in context.config.entries() {
        io::print_info(format!("  {:<18} {}", key, value));
    }
    Ok(())
}

/// Accepts a 1-based position in the backup listing or part of a file name.
fn resolve_backup(context: &ShellContext, reference: &str) -> Result<String, CommandError> {
    let backups = context.config_manager.list_backups()?;
    if backups.is_empty() {
        return Err(CommandError::InvalidArguments(
            "no configuration backups available".into(),
        ));
    }
    if let Ok(position) = reference.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|index| backups.get(index))
            .cloned()
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "configuration backup {} out of range",
                    reference
                ))
            });
    }
    backups
        .into_iter()
        .find(|candidate| candidate.contains(reference))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "no configuration backup matches `{}`",
                reference
            ))
        })
}
