use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{
    parse_date, parse_money, parse_optional_date, CommandError, CommandResult, ParsedArgs,
    ShellContext,
};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::InvoiceService;
use crate::core::workspace::Collection;
use crate::domain::invoice::DEFAULT_VAT_RATE;
use crate::domain::{DocumentKind, Invoice, InvoiceItem, InvoiceStatus};

const USAGE: &str = "invoice <new|item|status|convert|delete|list|overdue|show> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "invoice",
        "Issue invoices and quotes (FAC-/DEV- numbering)",
        USAGE,
        cmd_invoice,
    )]
}

fn parse_kind(input: &str) -> Result<DocumentKind, CommandError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "invoice" | "facture" => Ok(DocumentKind::Invoice),
        "quote" | "devis" => Ok(DocumentKind::Quote),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown document kind `{}` (use invoice or quote)",
            other
        ))),
    }
}

fn cmd_invoice(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "new" => {
            let usage = "invoice new <invoice|quote> <client> [--date YYYY-MM-DD] [--due YYYY-MM-DD]";
            let kind = parse_kind(parsed.require(0, usage)?)?;
            let client = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let issue = match parsed.flag("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let due = match parsed.flag("due") {
                Some(raw) => parse_optional_date(raw)?,
                None => None,
            };
            let id = context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::create(ws, kind, &client, issue, due)
            })?;
            let number = &context.workspace().invoice(id.as_str())?.number;
            io::print_success(format!("{} {} created for {}.", kind, number, client));
            Ok(())
        }
        "item" => item(context, rest),
        "status" => {
            let usage = "invoice status <number> <draft|sent|accepted|paid|cancelled>";
            let reference = parsed.require(0, usage)?;
            let raw = parsed.require(1, usage)?;
            let status = InvoiceStatus::parse(raw).ok_or_else(|| {
                CommandError::InvalidArguments(format!("unknown invoice status `{}`", raw))
            })?;
            context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::set_status(ws, reference, status)
            })?;
            io::print_success(format!("{} is now {}.", reference, status));
            Ok(())
        }
        "convert" => {
            let usage = "invoice convert <quote number> [--date YYYY-MM-DD]";
            let quote = parsed.require(0, usage)?;
            let issue = match parsed.flag("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let id = context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::convert_quote(ws, quote, issue)
            })?;
            let number = &context.workspace().invoice(id.as_str())?.number;
            io::print_success(format!("Quote {} converted into invoice {}.", quote, number));
            Ok(())
        }
        "delete" => {
            let reference = parsed.require(0, "invoice delete <number>")?;
            let number = context.workspace().invoice(reference)?.number.clone();
            if !context.confirm(&format!("Delete {}?", number))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::delete(ws, reference)
            })?;
            io::print_success(format!("{} deleted.", number));
            Ok(())
        }
        "list" => {
            let kind = parsed.get(0).map(parse_kind).transpose()?;
            let ws = context.workspace();
            render_list(context, &InvoiceService::list(ws, kind));
            Ok(())
        }
        "overdue" => {
            let overdue = InvoiceService::overdue(context.workspace(), context.today());
            if overdue.is_empty() {
                io::print_success("No overdue invoices.");
            } else {
                io::print_warning(format!("{} overdue invoice(s).", overdue.len()));
                render_list(context, &overdue);
            }
            Ok(())
        }
        "show" => show(context, parsed.require(0, "invoice show <number>")?),
        other => Err(unknown_action("invoice", other)),
    }
}

fn item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "invoice item <add|remove> <number> ...";
    let (action, rest) = split_action(args, usage)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "add" => {
            let usage =
                "invoice item add <number> <quantity> <unit price> <description> [--vat rate]";
            let reference = parsed.require(0, usage)?;
            let quantity = parse_money(parsed.require(1, usage)?)?;
            let price = parse_money(parsed.require(2, usage)?)?;
            let description = parsed.rest(3).ok_or_else(|| CommandError::usage(usage))?;
            let vat = parsed
                .flag("vat")
                .map(parse_money)
                .transpose()?
                .unwrap_or(DEFAULT_VAT_RATE);
            let item = InvoiceItem::new(description, quantity, price, vat);
            let total = context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::add_item(ws, reference, item)?;
                Ok(ws.invoice(reference)?.total_ttc)
            })?;
            io::print_success(format!(
                "Item added. Total is now {}.",
                context.format_amount(total)
            ));
            Ok(())
        }
        "remove" => {
            let usage = "invoice item remove <number> <position>";
            let reference = parsed.require(0, usage)?;
            let raw = parsed.require(1, usage)?;
            let position = raw.parse::<usize>().map_err(|_| {
                CommandError::InvalidArguments(format!("item position must be numeric: `{}`", raw))
            })?;
            let removed = context.mutate(&[Collection::Invoices], |ws| {
                InvoiceService::remove_item(ws, reference, position)
            })?;
            io::print_success(format!("Removed item `{}`.", removed.description));
            Ok(())
        }
        other => Err(unknown_action("invoice item", other)),
    }
}

fn render_list(context: &ShellContext, invoices: &[&Invoice]) {
    if invoices.is_empty() {
        io::print_warning("No documents found.");
        return;
    }
    let today = context.today();
    let mut table = Table::new(vec![
        TableColumn::left("Number"),
        TableColumn::left("Client"),
        TableColumn::left("Issued"),
        TableColumn::left("Due"),
        TableColumn::left("Status"),
        TableColumn::right("Total TTC"),
    ]);
    for invoice in invoices {
        let mut status = invoice.status.to_string();
        if invoice.is_overdue(today) {
            status.push_str(" (overdue)");
        }
        table.push(vec![
            invoice.number.clone(),
            invoice.client_name.clone(),
            format_date(invoice.issue_date),
            format_date(invoice.due_date),
            status,
            context.format_amount(invoice.total_ttc),
        ]);
    }
    io::print_info(table.render());
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|date| date.to_string()).unwrap_or_else(|| "-".into())
}

fn show(context: &ShellContext, reference: &str) -> CommandResult {
    let invoice = context.workspace().invoice(reference)?;
    io::print_section(format!("{} {}", invoice.kind, invoice.number));
    io::print_info(format!("  Client : {}", invoice.client_name));
    io::print_info(format!("  Status : {}", invoice.status));
    io::print_info(format!("  Issued : {}", format_date(invoice.issue_date)));
    io::print_info(format!("  Due    : {}", format_date(invoice.due_date)));
    if let Some(source) = &invoice.source_quote_id {
        if let Ok(quote) = context.workspace().invoice(source.as_str()) {
            io::print_info(format!("  From   : {}", quote.number));
        }
    }
    if invoice.items.is_empty() {
        io::print_info("  No items.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        TableColumn::right("#"),
        TableColumn::left("Description"),
        TableColumn::right("Qty"),
        TableColumn::right("Unit price"),
        TableColumn::right("VAT"),
        TableColumn::right("Total HT"),
    ]);
    for (idx, item) in invoice.items.iter().enumerate() {
        table.push(vec![
            (idx + 1).to_string(),
            item.description.clone(),
            format!("{}", item.quantity),
            context.format_amount(item.unit_price),
            format!("{}%", item.vat_rate),
            context.format_amount(item.total_ht()),
        ]);
    }
    io::print_info(table.render());
    io::print_info(format!("  Total HT  : {}", context.format_amount(invoice.total_ht)));
    io::print_info(format!("  VAT       : {}", context.format_amount(invoice.total_vat)));
    io::print_info(format!("  Total TTC : {}", context.format_amount(invoice.total_ttc)));
    Ok(())
}
