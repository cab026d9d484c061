use crate::cli::commands::{split_action, unknown_action};
use crate::cli::core::{parse_money, CommandError, CommandResult, ParsedArgs, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::table::{Table, TableColumn};
use crate::core::services::WishlistService;
use crate::core::workspace::Collection;
use crate::domain::{Priority, Wishlist};

const USAGE: &str =
    "wishlist <list|new|show|add|remove|reserve|release|gift|share|shared|delete> ...";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "wishlist",
        "Gift lists with reservations and share tokens",
        USAGE,
        cmd_wishlist,
    )]
}

fn cmd_wishlist(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (action, rest) = split_action(args, USAGE)?;
    let parsed = ParsedArgs::parse(rest);
    match action.as_str() {
        "list" => {
            let lists = &context.workspace().wishlists;
            if lists.is_empty() {
                io::print_warning("No wishlists yet.");
                return Ok(());
            }
            let mut table = Table::new(vec![
                TableColumn::left("Id"),
                TableColumn::left("Name"),
                TableColumn::right("Items"),
                TableColumn::right("Value"),
                TableColumn::right("Still wanted"),
            ]);
            for list in lists {
                table.push(vec![
                    list.id.short().to_string(),
                    list.name.clone(),
                    list.items.len().to_string(),
                    context.format_amount(list.total_value()),
                    context.format_amount(list.remaining_value()),
                ]);
            }
            io::print_info(table.render());
            Ok(())
        }
        "new" => {
            let usage = "wishlist new <name> [--description text]";
            let name = parsed.rest(0).ok_or_else(|| CommandError::usage(usage))?;
            let description = parsed.flag("description");
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::create(ws, &name, description)
            })?;
            io::print_success(format!("Wishlist `{}` created.", name));
            Ok(())
        }
        "show" => {
            let list = context
                .workspace()
                .wishlist(parsed.require(0, "wishlist show <wishlist>")?)?;
            show(context, list, false);
            Ok(())
        }
        "shared" => {
            let token = parsed.require(0, "wishlist shared <token>")?;
            let list = WishlistService::find_by_token(context.workspace(), token)?;
            show(context, list, true);
            Ok(())
        }
        "add" => {
            let usage =
                "wishlist add <wishlist> <price> <item name> [--priority low|medium|high] [--link url]";
            let list = parsed.require(0, usage)?;
            let price = parse_money(parsed.require(1, usage)?)?;
            let name = parsed.rest(2).ok_or_else(|| CommandError::usage(usage))?;
            let priority = match parsed.flag("priority") {
                Some(raw) => Priority::parse(raw).ok_or_else(|| {
                    CommandError::InvalidArguments(format!("unknown priority `{}`", raw))
                })?,
                None => Priority::default(),
            };
            let link = parsed.flag("link");
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::add_item(ws, list, &name, price, priority, link)
            })?;
            io::print_success(format!("Added `{}`.", name));
            Ok(())
        }
        "remove" => {
            let usage = "wishlist remove <wishlist> <item>";
            let list = parsed.require(0, usage)?;
            let item = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let removed = context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::remove_item(ws, list, &item)
            })?;
            io::print_success(format!("Removed `{}`.", removed.name));
            Ok(())
        }
        "reserve" => {
            let usage = "wishlist reserve <wishlist> <item> --by name";
            let list = parsed.require(0, usage)?;
            let item = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            let by = parsed
                .flag("by")
                .filter(|by| !by.trim().is_empty())
                .ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::reserve(ws, list, &item, by)
            })?;
            io::print_success(format!("`{}` reserved by {}.", item, by));
            Ok(())
        }
        "release" => {
            let usage = "wishlist release <wishlist> <item>";
            let list = parsed.require(0, usage)?;
            let item = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::release(ws, list, &item)
            })?;
            io::print_success(format!("`{}` is available again.", item));
            Ok(())
        }
        "gift" => {
            let usage = "wishlist gift <wishlist> <item>";
            let list = parsed.require(0, usage)?;
            let item = parsed.rest(1).ok_or_else(|| CommandError::usage(usage))?;
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::gift(ws, list, &item)
            })?;
            io::print_success(format!("`{}` marked as gifted.", item));
            Ok(())
        }
        "share" => {
            let list = parsed.require(0, "wishlist share <wishlist>")?;
            let token = context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::share(ws, list)
            })?;
            io::print_success(format!("Share link: ?share={}", token));
            Ok(())
        }
        "delete" => {
            let list = parsed.require(0, "wishlist delete <wishlist>")?;
            let name = context.workspace().wishlist(list)?.name.clone();
            if !context.confirm(&format!("Delete wishlist `{}`?", name))? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.mutate(&[Collection::Wishlists], |ws| {
                WishlistService::delete(ws, list)
            })?;
            io::print_success(format!("Wishlist `{}` deleted.", name));
            Ok(())
        }
        other => Err(unknown_action("wishlist", other)),
    }
}

/// Shared views hide who reserved what.
fn show(context: &ShellContext, list: &Wishlist, shared: bool) {
    io::print_section(&list.name);
    if let Some(description) = &list.description {
        io::print_info(format!("  {}", description));
    }
    if list.items.is_empty() {
        io::print_info("  No items.");
        return;
    }
    let mut table = Table::new(vec![
        TableColumn::left("Item"),
        TableColumn::left("Priority"),
        TableColumn::left("Status"),
        TableColumn::right("Price"),
    ]);
    for item in list.sorted_items() {
        let status = match (&item.reserved_by, shared) {
            (Some(by), false) => format!("{} ({})", item.status, by),
            _ => item.status.to_string(),
        };
        table.push(vec![
            item.name.clone(),
            item.priority.to_string(),
            status,
            context.format_amount(item.price),
        ]);
    }
    io::print_info(table.render());
}
