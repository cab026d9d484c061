//! Invoices and quotes with HT / TVA / TTC totals.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::round_cents;
use crate::errors::{BudgetError, Result};

use super::common::{
    deserialize_amount, deserialize_optional_date, deserialize_or_default, deserialize_quantity,
    deserialize_text, deserialize_timestamp, EntityId, Identifiable, NamedEntity,
};

pub const DEFAULT_VAT_RATE: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    #[default]
    #[serde(alias = "facture")]
    Invoice,
    #[serde(alias = "devis")]
    Quote,
}

impl DocumentKind {
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "FAC",
            DocumentKind::Quote => "DEV",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Quote => "Quote",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceStatus {
    #[default]
    #[serde(alias = "brouillon")]
    Draft,
    #[serde(alias = "envoyee", alias = "envoyée")]
    Sent,
    #[serde(alias = "accepte", alias = "accepté")]
    Accepted,
    #[serde(alias = "payee", alias = "payée")]
    Paid,
    #[serde(alias = "annulee", alias = "annulée")]
    Cancelled,
}

impl InvoiceStatus {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "accepted" => Some(InvoiceStatus::Accepted),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" | "canceled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled | InvoiceStatus::Accepted
        )
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Accepted => "Accepted",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[serde(deserialize_with = "deserialize_text", default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_quantity", default = "one")]
    pub quantity: f64,
    #[serde(deserialize_with = "deserialize_amount", default, alias = "price")]
    pub unit_price: f64,
    #[serde(
        deserialize_with = "deserialize_amount",
        default = "default_vat_rate",
        alias = "tva"
    )]
    pub vat_rate: f64,
}

fn one() -> f64 {
    1.0
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

impl InvoiceItem {
    pub fn new(
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        vat_rate: f64,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate,
        }
    }

    pub fn total_ht(&self) -> f64 {
        round_cents(self.quantity * self.unit_price)
    }

    pub fn total_vat(&self) -> f64 {
        round_cents(self.total_ht() * self.vat_rate / 100.0)
    }

    pub fn total_ttc(&self) -> f64 {
        round_cents(self.total_ht() + self.total_vat())
    }
}

/// An invoice or a quote issued to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub number: String,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub kind: DocumentKind,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    #[serde(rename = "totalHT", deserialize_with = "deserialize_amount", default)]
    pub total_ht: f64,
    #[serde(rename = "totalTVA", deserialize_with = "deserialize_amount", default)]
    pub total_vat: f64,
    #[serde(rename = "totalTTC", deserialize_with = "deserialize_amount", default)]
    pub total_ttc: f64,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_quote_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(kind: DocumentKind, client_name: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            id: EntityId::generate(),
            number: String::new(),
            kind,
            client_name: client_name.into(),
            client_email: None,
            issue_date: Some(issue_date),
            due_date: None,
            items: Vec::new(),
            total_ht: 0.0,
            total_vat: 0.0,
            total_ttc: 0.0,
            status: InvoiceStatus::Draft,
            source_quote_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn recompute_totals(&mut self) {
        self.total_ht = round_cents(self.items.iter().map(InvoiceItem::total_ht).sum());
        self.total_vat = round_cents(self.items.iter().map(InvoiceItem::total_vat).sum());
        self.total_ttc = round_cents(self.total_ht + self.total_vat);
    }

    /// A sent invoice whose due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.kind == DocumentKind::Invoice
            && self.status == InvoiceStatus::Sent
            && self.due_date.map(|due| due < today).unwrap_or(false)
    }

    pub fn is_outstanding(&self) -> bool {
        self.kind == DocumentKind::Invoice && self.status == InvoiceStatus::Sent
    }

    pub fn can_edit_items(&self) -> bool {
        self.status == InvoiceStatus::Draft
    }

    /// Validates and applies a status change.
    pub fn transition(&mut self, next: InvoiceStatus) -> Result<()> {
        use InvoiceStatus::*;
        let allowed = match (self.status, next) {
            (current, next) if current == next => true,
            (Draft, Sent) => true,
            (Sent, Paid) => self.kind == DocumentKind::Invoice,
            (Sent, Accepted) => self.kind == DocumentKind::Quote,
            (Draft | Sent, Cancelled) => true,
            _ => false,
        };
        if !allowed {
            return Err(BudgetError::InvalidTransition(format!(
                "{} {} cannot move from {} to {}",
                self.kind, self.number, self.status, next
            )));
        }
        if next == Sent && self.items.is_empty() {
            return Err(BudgetError::InvalidTransition(format!(
                "{} {} has no items",
                self.kind, self.number
            )));
        }
        self.status = next;
        Ok(())
    }

    pub fn year(&self) -> i32 {
        self.issue_date
            .map(|date| date.year())
            .unwrap_or_else(|| self.created_at.year())
    }
}

impl Identifiable for Invoice {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for Invoice {
    fn name(&self) -> &str {
        &self.number
    }
}

/// Next sequential number (`FAC-2025-001`, `DEV-2025-004`) for a kind and year.
pub fn next_number(existing: &[Invoice], kind: DocumentKind, year: i32) -> String {
    let prefix = format!("{}-{}-", kind.number_prefix(), year);
    let highest = existing
        .iter()
        .filter_map(|invoice| invoice.number.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:03}", prefix, highest.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn totals_follow_items() {
        let mut invoice = Invoice::new(DocumentKind::Invoice, "ACME", date(2025, 1, 10));
        invoice.items.push(InvoiceItem::new("Design", 3.0, 150.0, 20.0));
        invoice.items.push(InvoiceItem::new("Hosting", 1.0, 9.99, 5.5));
        invoice.recompute_totals();
        assert_eq!(invoice.total_ht, 459.99);
        assert_eq!(invoice.total_vat, 90.55);
        assert_eq!(invoice.total_ttc, 550.54);
    }

    #[test]
    fn invoices_cannot_be_accepted_and_quotes_cannot_be_paid() {
        let mut invoice = Invoice::new(DocumentKind::Invoice, "ACME", date(2025, 1, 10));
        invoice.items.push(InvoiceItem::new("Work", 1.0, 10.0, 20.0));
        invoice.transition(InvoiceStatus::Sent).unwrap();
        assert!(invoice.transition(InvoiceStatus::Accepted).is_err());
        invoice.transition(InvoiceStatus::Paid).unwrap();
        assert!(invoice.transition(InvoiceStatus::Cancelled).is_err());

        let mut quote = Invoice::new(DocumentKind::Quote, "ACME", date(2025, 1, 10));
        assert!(quote.transition(InvoiceStatus::Sent).is_err(), "empty quote");
        quote.items.push(InvoiceItem::new("Work", 1.0, 10.0, 20.0));
        quote.transition(InvoiceStatus::Sent).unwrap();
        assert!(quote.transition(InvoiceStatus::Paid).is_err());
        quote.transition(InvoiceStatus::Accepted).unwrap();
    }

    #[test]
    fn overdue_requires_sent_status_and_past_due_date() {
        let mut invoice = Invoice::new(DocumentKind::Invoice, "ACME", date(2025, 1, 10));
        invoice.due_date = Some(date(2025, 2, 10));
        invoice.items.push(InvoiceItem::new("Work", 1.0, 10.0, 20.0));
        assert!(!invoice.is_overdue(date(2025, 3, 1)));
        invoice.transition(InvoiceStatus::Sent).unwrap();
        assert!(!invoice.is_overdue(date(2025, 2, 10)));
        assert!(invoice.is_overdue(date(2025, 2, 11)));
    }

    #[test]
    fn numbering_is_sequential_per_kind_and_year() {
        let mut first = Invoice::new(DocumentKind::Invoice, "A", date(2025, 1, 1));
        first.number = "FAC-2025-007".into();
        let mut quote = Invoice::new(DocumentKind::Quote, "B", date(2025, 1, 1));
        quote.number = "DEV-2025-002".into();
        let existing = vec![first, quote];
        assert_eq!(next_number(&existing, DocumentKind::Invoice, 2025), "FAC-2025-008");
        assert_eq!(next_number(&existing, DocumentKind::Quote, 2025), "DEV-2025-003");
        assert_eq!(next_number(&existing, DocumentKind::Invoice, 2026), "FAC-2026-001");
    }

    #[test]
    fn numbering_past_the_u32_range_keeps_counting() {
        let mut huge = Invoice::new(DocumentKind::Invoice, "ACME", date(2025, 1, 1));
        huge.number = "FAC-2025-4294967295".into();
        assert_eq!(
            next_number(&[huge], DocumentKind::Invoice, 2025),
            "FAC-2025-4294967296"
        );
    }

    #[test]
    fn legacy_invoice_fields_decode() {
        let json = r#"{"id":"17","clientName":"Dupont","items":[{"description":"Conseil",
            "quantity":"2","unitPrice":"100,00","vatRate":20}],"totalHT":"200","totalTVA":"40",
            "totalTTC":"240","status":"payee"}"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.items[0].total_ttc(), 240.0);
        assert_eq!(invoice.total_ttc, 240.0);
    }
}
