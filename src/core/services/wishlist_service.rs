use tracing::info;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::{EntityId, Priority, Wishlist, WishlistItem};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct WishlistService;

impl WishlistService {
    pub fn create(ws: &mut Workspace, name: &str, description: Option<&str>) -> Result<EntityId> {
        let name = validate_name("wishlist", name)?;
        let mut wishlist = Wishlist::new(name);
        wishlist.description = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from);
        let id = wishlist.id.clone();
        ws.wishlists.push(wishlist);
        Ok(id)
    }

    pub fn add_item(
        ws: &mut Workspace,
        wishlist: &str,
        name: &str,
        price: f64,
        priority: Priority,
        link: Option<&str>,
    ) -> Result<EntityId> {
        let name = validate_name("item", name)?;
        let price = validate_amount(price)?;
        let list = ws.wishlist_mut(wishlist)?;
        let mut item = WishlistItem::new(name, price, priority);
        item.link = link.map(String::from);
        let id = item.id.clone();
        list.items.push(item);
        Ok(id)
    }

    pub fn remove_item(ws: &mut Workspace, wishlist: &str, item: &str) -> Result<WishlistItem> {
        let list = ws.wishlist_mut(wishlist)?;
        let index = find_index(&list.items, item)?
            .ok_or_else(|| BudgetError::WishlistItemNotFound(item.to_string()))?;
        Ok(list.items.remove(index))
    }

    pub fn reserve(ws: &mut Workspace, wishlist: &str, item: &str, by: &str) -> Result<()> {
        ws.wishlist_mut(wishlist)?.item_mut(item)?.reserve(by)
    }

    pub fn release(ws: &mut Workspace, wishlist: &str, item: &str) -> Result<()> {
        ws.wishlist_mut(wishlist)?.item_mut(item)?.release()
    }

    pub fn gift(ws: &mut Workspace, wishlist: &str, item: &str) -> Result<()> {
        ws.wishlist_mut(wishlist)?.item_mut(item)?.mark_gifted()
    }

    /// Returns the share token, creating it on first use.
    pub fn share(ws: &mut Workspace, wishlist: &str) -> Result<String> {
        let list = ws.wishlist_mut(wishlist)?;
        let token = list.share().to_string();
        info!(wishlist = %list.name, "shared wishlist");
        Ok(token)
    }

    pub fn find_by_token<'a>(ws: &'a Workspace, token: &str) -> Result<&'a Wishlist> {
        let token = token.trim();
        ws.wishlists
            .iter()
            .find(|list| list.share_token.as_deref() == Some(token))
            .ok_or_else(|| BudgetError::WishlistNotFound(format!("share token {}", token)))
    }

    pub fn delete(ws: &mut Workspace, wishlist: &str) -> Result<Wishlist> {
        let index = find_index(&ws.wishlists, wishlist)?
            .ok_or_else(|| BudgetError::WishlistNotFound(wishlist.to_string()))?;
        Ok(ws.wishlists.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;

    #[test]
    fn item_lifecycle() {
        let mut ws = Workspace::default();
        WishlistService::create(&mut ws, "Birthday", Some("  ")).unwrap();
        assert!(ws.wishlists[0].description.is_none());
        WishlistService::add_item(&mut ws, "birthday", "Kite", 25.0, Priority::High, None)
            .unwrap();
        assert!(
            WishlistService::add_item(&mut ws, "birthday", "Bad", -3.0, Priority::Low, None)
                .is_err()
        );

        WishlistService::reserve(&mut ws, "birthday", "kite", "Jo").unwrap();
        assert!(WishlistService::reserve(&mut ws, "birthday", "kite", "Max").is_err());
        WishlistService::release(&mut ws, "birthday", "kite").unwrap();
        WishlistService::gift(&mut ws, "birthday", "kite").unwrap();
        assert_eq!(ws.wishlists[0].items[0].status, ItemStatus::Gifted);

        WishlistService::remove_item(&mut ws, "birthday", "kite").unwrap();
        assert!(WishlistService::remove_item(&mut ws, "birthday", "kite").is_err());
    }

    #[test]
    fn shared_lists_are_found_by_token() {
        let mut ws = Workspace::default();
        WishlistService::create(&mut ws, "Wedding", None).unwrap();
        let token = WishlistService::share(&mut ws, "wedding").unwrap();
        assert_eq!(WishlistService::share(&mut ws, "wedding").unwrap(), token);
        assert_eq!(WishlistService::find_by_token(&ws, &token).unwrap().name, "Wedding");
        assert!(WishlistService::find_by_token(&ws, "nope").is_err());

        WishlistService::delete(&mut ws, "wedding").unwrap();
        assert!(WishlistService::find_by_token(&ws, &token).is_err());
    }
}
