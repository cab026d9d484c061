//! Shareable gift lists.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::currency::round_cents;
use crate::errors::{BudgetError, Result};

use super::common::{
    deserialize_amount, deserialize_or_default, deserialize_text, matches_reference, EntityId,
    Identifiable, NamedEntity,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Reserved,
    #[serde(alias = "purchased", alias = "offered")]
    Gifted,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Reserved => "Reserved",
            ItemStatus::Gifted => "Gifted",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "low" | "basse" | "1" => Some(Priority::Low),
            "medium" | "moyenne" | "normal" | "2" => Some(Priority::Medium),
            "high" | "haute" | "3" => Some(Priority::High),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }
        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Priority::parse(&value.to_string()),
            Raw::Text(text) => Priority::parse(&text),
        };
        parsed.ok_or_else(|| de::Error::custom("unknown wishlist priority"))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(default)]
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub status: ItemStatus,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<String>,
}

impl WishlistItem {
    pub fn new(name: impl Into<String>, price: f64, priority: Priority) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            price,
            link: None,
            status: ItemStatus::Pending,
            priority,
            reserved_by: None,
        }
    }

    pub fn reserve(&mut self, by: &str) -> Result<()> {
        let by = by.trim();
        if by.is_empty() {
            return Err(BudgetError::InvalidInput(
                "a reservation needs the name of the person reserving".into(),
            ));
        }
        match self.status {
            ItemStatus::Pending => {
                self.status = ItemStatus::Reserved;
                self.reserved_by = Some(by.to_string());
                Ok(())
            }
            other => Err(self.transition_error(other, ItemStatus::Reserved)),
        }
    }

    pub fn release(&mut self) -> Result<()> {
        match self.status {
            ItemStatus::Reserved => {
                self.status = ItemStatus::Pending;
                self.reserved_by = None;
                Ok(())
            }
            other => Err(self.transition_error(other, ItemStatus::Pending)),
        }
    }

    pub fn mark_gifted(&mut self) -> Result<()> {
        match self.status {
            ItemStatus::Pending | ItemStatus::Reserved => {
                self.status = ItemStatus::Gifted;
                Ok(())
            }
            other => Err(self.transition_error(other, ItemStatus::Gifted)),
        }
    }

    fn transition_error(&self, from: ItemStatus, to: ItemStatus) -> BudgetError {
        BudgetError::InvalidTransition(format!(
            "`{}` is {} and cannot become {}",
            self.name, from, to
        ))
    }
}

impl Identifiable for WishlistItem {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for WishlistItem {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            description: None,
            share_token: None,
            items: Vec::new(),
        }
    }

    /// Assigns a share token on first call and returns it.
    pub fn share(&mut self) -> &str {
        self.share_token
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .as_str()
    }

    pub fn item_mut(&mut self, reference: &str) -> Result<&mut WishlistItem> {
        self.items
            .iter_mut()
            .find(|item| matches_reference(&**item, reference))
            .ok_or_else(|| BudgetError::WishlistItemNotFound(reference.to_string()))
    }

    pub fn total_value(&self) -> f64 {
        round_cents(self.items.iter().map(|item| item.price).sum())
    }

    /// Value of the items nobody has claimed yet.
    pub fn remaining_value(&self) -> f64 {
        round_cents(
            self.items
                .iter()
                .filter(|item| item.status == ItemStatus::Pending)
                .map(|item| item.price)
                .sum(),
        )
    }

    /// Items ordered by priority (high first) then name.
    pub fn sorted_items(&self) -> Vec<&WishlistItem> {
        let mut items: Vec<&WishlistItem> = self.items.iter().collect();
        items.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        items
    }
}

impl Identifiable for Wishlist {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Wishlist {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_rules() {
        let mut item = WishlistItem::new("Lamp", 40.0, Priority::High);
        assert!(item.reserve("  ").is_err());
        item.reserve("Alex").unwrap();
        assert_eq!(item.reserved_by.as_deref(), Some("Alex"));
        assert!(item.reserve("Sam").is_err());
        item.release().unwrap();
        assert!(item.reserved_by.is_none());
        item.mark_gifted().unwrap();
        assert!(item.release().is_err());
        assert!(item.mark_gifted().is_err());
    }

    #[test]
    fn share_token_is_stable() {
        let mut list = Wishlist::new("Birthday");
        let first = list.share().to_string();
        let second = list.share().to_string();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn values_and_ordering() {
        let mut list = Wishlist::new("Birthday");
        list.items.push(WishlistItem::new("book", 15.0, Priority::Low));
        list.items.push(WishlistItem::new("Bike", 300.0, Priority::High));
        list.items.push(WishlistItem::new("apron", 20.0, Priority::High));
        list.items[1].reserve("Kim").unwrap();
        assert_eq!(list.total_value(), 335.0);
        assert_eq!(list.remaining_value(), 35.0);
        let names: Vec<&str> = list.sorted_items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["apron", "Bike", "book"]);
    }

    #[test]
    fn legacy_statuses_and_numeric_priorities_decode() {
        let json = r#"{"id":"1","name":"Noel","items":[
            {"id":"a","name":"Train","price":"59,90","status":"purchased","priority":3}]}"#;
        let list: Wishlist = serde_json::from_str(json).unwrap();
        assert_eq!(list.items[0].status, ItemStatus::Gifted);
        assert_eq!(list.items[0].priority, Priority::High);
        assert_eq!(list.items[0].price, 59.9);
    }
}
