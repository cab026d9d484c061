//! Shell context, command dispatch, and the helpers shared by command handlers.

use std::{io, path::PathBuf};

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::cli::commands;
use crate::cli::io as cli_io;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::config::{Config, ConfigManager};
use crate::core::utils::PathResolver;
use crate::core::workspace::{Collection, LoadMetadata, Workspace, WorkspaceManager};
use crate::currency::{format_currency_value, parse_amount, FormatOptions};
use crate::domain::common::parse_flexible_date;
use crate::errors::{BudgetError, CliError};
use crate::storage::FileStore;

const PROMPT: &str = "mapocket> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] BudgetError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl CommandError {
    pub(crate) fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("usage: {}", usage))
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

/// Everything a command handler can reach: the loaded workspace, the
/// configuration and the command registry.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub manager: WorkspaceManager,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, PathResolver::base_dir())
    }

    /// Opens the file store and configuration under `base` and loads the workspace.
    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let store = FileStore::new(Some(base), Some(config.backup_retention))?;
        let mut manager = WorkspaceManager::new(Box::new(store));
        let report = manager.load()?;
        let context = Self::from_parts(mode, manager, config_manager, config);
        context.report_load(&report);
        Ok(context)
    }

    pub fn from_parts(
        mode: CliMode,
        manager: WorkspaceManager,
        config_manager: ConfigManager,
        config: Config,
    ) -> Self {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        cli_io::apply_config(&config);
        Self {
            mode,
            registry,
            manager,
            config_manager,
            config,
            last_command: None,
            running: true,
        }
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn prompt(&self) -> String {
        PROMPT.to_string()
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.manager.current
    }

    /// Applies a change to the workspace, then writes the touched collections.
    pub(crate) fn mutate<T>(
        &mut self,
        collections: &[Collection],
        change: impl FnOnce(&mut Workspace) -> crate::errors::Result<T>,
    ) -> Result<T, CommandError> {
        let value = change(&mut self.manager.current)?;
        self.manager.save(collections)?;
        debug!(?collections, "workspace saved");
        Ok(value)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn format_amount(&self, amount: f64) -> String {
        format_currency_value(
            amount,
            &self.config.currency_code(),
            &self.config.locale_config(),
            &FormatOptions::default(),
        )
    }

    /// Asks before a destructive action; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(prompt, false)
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        cli_io::apply_config(&self.config);
        Ok(())
    }

    fn report_load(&self, report: &LoadMetadata) {
        for note in &report.migrations {
            cli_io::print_info(format!("Migration: {}", note));
        }
        for warning in &report.warnings {
            cli_io::print_warning(warning);
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    /// Tokenizes and runs one input line.
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                cli_io::print_warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        if raw.starts_with('#') {
            return Ok(LoopControl::Continue);
        }

        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.registry.suggest(input) {
            cli_io::print_info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.confirm("Exit shell?").map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Io(err) => Err(CliError::Command(err.to_string())),
            other => {
                cli_io::print_error(other);
                Ok(())
            }
        }
    }
}

/// Positional arguments plus `--flag value` pairs.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    positional: Vec<&'a str>,
    flags: Vec<(&'a str, &'a str)>,
}

impl<'a> ParsedArgs<'a> {
    pub(crate) fn parse(args: &[&'a str]) -> Self {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(flag) if !flag.is_empty() => {
                    parsed.flags.push((flag, iter.next().unwrap_or("")));
                }
                _ => parsed.positional.push(arg),
            }
        }
        parsed
    }

    pub(crate) fn get(&self, index: usize) -> Option<&'a str> {
        self.positional.get(index).copied()
    }

    pub(crate) fn require(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.get(index).ok_or_else(|| CommandError::usage(usage))
    }

    /// Positional arguments from `index` on, joined with spaces.
    pub(crate) fn rest(&self, index: usize) -> Option<String> {
        let rest = self.positional.get(index..)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }

    pub(crate) fn flag(&self, name: &str) -> Option<&'a str> {
        self.flags
            .iter()
            .rev()
            .find(|(flag, _)| flag.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    parse_flexible_date(input).ok_or_else(|| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

/// `-` or `none` clear an optional date.
pub(crate) fn parse_optional_date(input: &str) -> Result<Option<NaiveDate>, CommandError> {
    match input.trim() {
        "-" | "none" | "" => Ok(None),
        other => parse_date(other).map(Some),
    }
}

pub(crate) fn parse_money(input: &str) -> Result<f64, CommandError> {
    parse_amount(input)
        .ok_or_else(|| CommandError::InvalidArguments(format!("invalid amount `{}`", input)))
}

#[cfg(test)]
pub(crate) fn script_context(base: &std::path::Path) -> ShellContext {
    let mut context = ShellContext::with_base_dir(CliMode::Script, base.to_path_buf())
        .expect("open shell context");
    context.config.color_output = false;
    cli_io::apply_config(&context.config);
    context
}

#[cfg(test)]
pub(crate) fn run_script(context: &mut ShellContext, lines: &[&str]) {
    for line in lines {
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => panic!("`{}` failed: {}", line, err),
        }
    }
}
