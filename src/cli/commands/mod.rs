pub mod budget;
pub mod cashflow;
pub mod challenge;
pub mod config;
pub mod expense;
pub mod goal;
pub mod invoice;
pub mod open;
pub mod project;
pub mod summary;
pub mod system;
pub mod wallet;
pub mod wishlist;

use crate::cli::core::CommandError;
use crate::cli::registry::{CommandEntry, CommandRegistry};

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(project::definitions());
    commands.extend(budget::definitions());
    commands.extend(expense::definitions());
    commands.extend(invoice::definitions());
    commands.extend(wishlist::definitions());
    commands.extend(goal::definitions());
    commands.extend(challenge::definitions());
    commands.extend(wallet::definitions());
    commands.extend(cashflow::definitions());
    commands.extend(open::definitions());
    commands.extend(summary::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in all_definitions() {
        registry.register(entry);
    }
}

/// Splits `<action> <args...>`, lower-casing the action.
pub(crate) fn split_action<'a, 'b>(
    args: &'b [&'a str],
    usage: &str,
) -> Result<(String, &'b [&'a str]), CommandError> {
    match args.split_first() {
        Some((action, rest)) => Ok((action.to_ascii_lowercase(), rest)),
        None => Err(CommandError::usage(usage)),
    }
}

pub(crate) fn unknown_action(command: &str, action: &str) -> CommandError {
    CommandError::InvalidArguments(format!("unknown {} subcommand `{}`", command, action))
}
