use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::core::links::PageRequest;
use crate::core::services::WishlistService;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "open",
        "Resolve a page link such as `?id=...&edit=true` or `?share=...`",
        "open <query>",
        cmd_open,
    )]
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let query = args.join("&");
    if query.trim().is_empty() {
        return Err(CommandError::usage("open <query>"));
    }
    let request = PageRequest::parse(&query);
    let mode = if request.is_read_only() {
        "read-only"
    } else {
        "editable"
    };
    io::print_info(format!("Opening {} ({}).", request, mode));

    let ws = context.workspace();
    match &request {
        PageRequest::NewProject => {
            io::print_hint("Use `project new <name>` to create the project.");
        }
        PageRequest::ViewProject(id) | PageRequest::EditProject(id) => {
            let project = ws.project(id.as_str())?;
            io::print_info(format!(
                "Project `{}`: budget {}, spent {}.",
                project.project_name,
                context.format_amount(project.total_budget),
                context.format_amount(project.spent())
            ));
        }
        PageRequest::InvoiceFromQuote(id) => {
            let quote = ws.invoice(id.as_str())?;
            io::print_info(format!(
                "Quote {} for {} ({}).",
                quote.number,
                quote.client_name,
                context.format_amount(quote.total_ttc)
            ));
            io::print_hint(format!("Use `invoice convert {}` to issue the invoice.", quote.number));
        }
        PageRequest::SharedWishlist(token) => {
            let list = WishlistService::find_by_token(ws, token)?;
            io::print_info(format!(
                "Wishlist `{}` with {} item(s).",
                list.name,
                list.items.len()
            ));
            io::print_hint(format!("Use `wishlist shared {}` to browse it.", token));
        }
    }
    Ok(())
}
