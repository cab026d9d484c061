use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{parse_money, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::WalletService;
use crate::core::workspace::Collection;
use crate::currency::{format_currency_value, CurrencyCode, FormatOptions};
use crate::domain::Wallet;

const USAGE: &str = "wallet <list|new|balance|link|unlink|delete> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "wallet",
        "Wallets that fund projects",
        USAGE,
        cmd_wallet,
    )]
}

fn cmd_wallet(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "list" => list(context),
        "new" => {
            let usage = "wallet new <balance> <name> [--currency code]";
            let balance = parse_money(parsed.require(0, usage)?)?;
            let name = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let currency = parsed
                .flag("currency")
                .map(CurrencyCode::new)
                .unwrap_or_else(|| context.config.currency_code());
            context.mutate(&[Collection::Wallets], |ws| {
                WalletService::create(ws, &name, balance, currency)
            })?;
            io::print_success(format!("Wallet `{}` created.", name));
            Ok(())
        }
        "balance" => {
            let usage = "wallet balance <wallet> <amount>";
            let wallet = parsed.require(0, usage)?;
            let balance = parse_money(parsed.require(1, usage)?)?;
            context.mutate(&[Collection::Wallets], |ws| {
                WalletService::set_balance(ws, wallet, balance)
            })?;
            io::print_success("Wallet balance updated.");
            Ok(())
        }
        "link" | "unlink" => {
            let usage = "wallet <link|unlink> <wallet> <project>";
            let wallet = parsed.require(0, usage)?;
            let project = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let linking = action == "link";
            context.mutate(&[Collection::Wallets, Collection::Projects], |ws| {
                if linking {
                    WalletService::link(ws, wallet, &project)
                } else {
                    WalletService::unlink(ws, wallet, &project)
                }
            })?;
            if linking {
                io::print_success(format!("`{}` now draws on wallet `{}`.", project, wallet));
            } else {
                io::print_success(format!("`{}` unlinked from wallet `{}`.", project, wallet));
            }
            Ok(())
        }
        "delete" => {
            let wallet = parsed.require(0, "wallet delete <wallet>")?;
            let name = context.workspace().wallet(wallet)?.name.clone();
            if !context.confirm(&format!("Delete wallet `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Wallets, Collection::Projects], |ws| {
                WalletService::delete(ws, wallet)
            })?;
            io::print_success(format!("Wallet `{}` deleted.", name));
            Ok(())
        }
        other => Err(unknown_action("wallet", other)),
    }
}

fn format_in_wallet(context: &ShellContext, wallet: &Wallet, amount: f64) -> String {
    format_currency_value(
        amount,
        &wallet.currency,
        &context.config.locale_config(),
        &FormatOptions::default(),
    )
}

fn list(context: &ShellContext) -> CommandResult {
    let ws = context.workspace();
    if ws.wallets.is_empty() {
        io::print_warning("No wallets yet.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::left("Wallet"),
        TableColumn::right("Balance"),
        TableColumn::right("Committed"),
        TableColumn::right("Available"),
        TableColumn::left("Projects"),
    ]);
    for wallet in &ws.wallets {
        let projects: Vec<&str> = ws
            .projects
            .iter()
            .filter(|project| wallet.is_linked(&project.id))
            .map(|project| project.project_name.as_str())
            .collect();
        table.push(vec![
            wallet.name.clone(),
            format_in_wallet(context, wallet, wallet.balance),
            format_in_wallet(context, wallet, wallet.committed(&ws.projects)),
            format_in_wallet(context, wallet, wallet.available(&ws.projects)),
            if projects.is_empty() {
                "-".into()
            } else {
                projects.join(", ")
            },
        ]);
    }
    io::print_info(table.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{run_script, script_context};
    use tempfile::TempDir;

    #[test]
    fn linking_moves_a_project_between_wallets() {
        let temp = TempDir::new().unwrap();
        let mut context = script_context(temp.path());
        run_script(
            &mut context,
            &[
                "project new Roof --template none",
                "wallet new 5000 Savings",
                "wallet new 800 Current --currency USD",
                "wallet link Savings Roof",
                "wallet link Current Roof",
            ],
        );
        let ws = context.workspace();
        let roof = ws.project("Roof").unwrap();
        let current = ws.wallet("Current").unwrap();
        assert_eq!(roof.wallet_id.as_ref(), Some(&current.id));
        assert_eq!(current.currency.as_str(), "USD");
        assert!(ws.wallet("Savings").unwrap().linked_projects.is_empty());

        run_script(&mut context, &["wallet delete Current"]);
        assert!(context.workspace().project("Roof").unwrap().wallet_id.is_none());
    }
}
