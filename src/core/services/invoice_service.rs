use chrono::NaiveDate;
use tracing::info;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::invoice::next_number;
use crate::domain::{DocumentKind, EntityId, Invoice, InvoiceItem, InvoiceStatus};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct InvoiceService;

impl InvoiceService {
    pub fn create(
        ws: &mut Workspace,
        kind: DocumentKind,
        client: &str,
        issue_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<EntityId> {
        let client = validate_name("client", client)?;
        if let Some(due) = due_date {
            if due < issue_date {
                return Err(BudgetError::InvalidInput(format!(
                    "due date {} is before issue date {}",
                    due, issue_date
                )));
            }
        }
        let mut invoice = Invoice::new(kind, client, issue_date);
        invoice.due_date = due_date;
        invoice.number = next_number(&ws.invoices, kind, invoice.year());
        let id = invoice.id.clone();
        info!(number = %invoice.number, "created {}", kind);
        ws.invoices.push(invoice);
        Ok(id)
    }

    pub fn add_item(ws: &mut Workspace, reference: &str, item: InvoiceItem) -> Result<()> {
        validate_name("item", &item.description)?;
        validate_amount(item.unit_price)?;
        validate_amount(item.vat_rate)?;
        if !(item.quantity.is_finite() && item.quantity > 0.0) {
            return Err(BudgetError::InvalidInput(
                "quantity must be greater than zero".into(),
            ));
        }
        let invoice = editable(ws, reference)?;
        invoice.items.push(item);
        invoice.recompute_totals();
        Ok(())
    }

    /// Removes the item at a 1-based position.
    pub fn remove_item(
        ws: &mut Workspace,
        reference: &str,
        position: usize,
    ) -> Result<InvoiceItem> {
        let invoice = editable(ws, reference)?;
        if position == 0 || position > invoice.items.len() {
            return Err(BudgetError::EntryNotFound(format!(
                "item #{} of {}",
                position, invoice.number
            )));
        }
        let removed = invoice.items.remove(position - 1);
        invoice.recompute_totals();
        Ok(removed)
    }

    pub fn set_status(ws: &mut Workspace, reference: &str, status: InvoiceStatus) -> Result<()> {
        let invoice = ws.invoice_mut(reference)?;
        invoice.transition(status)?;
        info!(number = %invoice.number, status = %status, "invoice status changed");
        Ok(())
    }

    /// Creates a draft invoice from a sent or accepted quote, marking the
    /// quote accepted. A quote converts only once.
    pub fn convert_quote(
        ws: &mut Workspace,
        quote: &str,
        issue_date: NaiveDate,
    ) -> Result<EntityId> {
        let source = ws.invoice(quote)?;
        if source.kind != DocumentKind::Quote {
            return Err(BudgetError::InvalidInput(format!(
                "{} is not a quote",
                source.number
            )));
        }
        if !matches!(source.status, InvoiceStatus::Sent | InvoiceStatus::Accepted) {
            return Err(BudgetError::InvalidTransition(format!(
                "quote {} is {} and cannot be invoiced",
                source.number, source.status
            )));
        }
        if let Some(existing) = ws
            .invoices
            .iter()
            .find(|invoice| invoice.source_quote_id.as_ref() == Some(&source.id))
        {
            return Err(BudgetError::InvalidTransition(format!(
                "quote {} was already invoiced as {}",
                source.number, existing.number
            )));
        }

        let mut invoice =
            Invoice::new(DocumentKind::Invoice, source.client_name.clone(), issue_date);
        invoice.client_email = source.client_email.clone();
        invoice.items = source.items.clone();
        invoice.notes = source.notes.clone();
        invoice.source_quote_id = Some(source.id.clone());
        invoice.number = next_number(&ws.invoices, DocumentKind::Invoice, invoice.year());
        invoice.recompute_totals();
        let quote_id = source.id.clone();
        let id = invoice.id.clone();
        info!(quote = %source.number, invoice = %invoice.number, "converted quote");
        ws.invoices.push(invoice);

        let quote = ws.invoice_mut(quote_id.as_str())?;
        quote.transition(InvoiceStatus::Accepted)?;
        Ok(id)
    }

    pub fn delete(ws: &mut Workspace, reference: &str) -> Result<Invoice> {
        let index = find_index(&ws.invoices, reference)?
            .ok_or_else(|| BudgetError::InvoiceNotFound(reference.to_string()))?;
        Ok(ws.invoices.remove(index))
    }

    pub fn overdue(ws: &Workspace, today: NaiveDate) -> Vec<&Invoice> {
        ws.invoices
            .iter()
            .filter(|invoice| invoice.is_overdue(today))
            .collect()
    }

    /// Documents of one kind, newest number first.
    pub fn list(ws: &Workspace, kind: Option<DocumentKind>) -> Vec<&Invoice> {
        let mut invoices: Vec<&Invoice> = ws
            .invoices
            .iter()
            .filter(|invoice| kind.map_or(true, |kind| invoice.kind == kind))
            .collect();
        invoices.sort_by(|a, b| b.number.cmp(&a.number));
        invoices
    }
}

fn editable<'a>(ws: &'a mut Workspace, reference: &str) -> Result<&'a mut Invoice> {
    let invoice = ws.invoice_mut(reference)?;
    if !invoice.can_edit_items() {
        return Err(BudgetError::InvalidTransition(format!(
            "{} is {}; only drafts can be edited",
            invoice.number, invoice.status
        )));
    }
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn quote_with_item(ws: &mut Workspace) -> EntityId {
        let id =
            InvoiceService::create(ws, DocumentKind::Quote, "ACME", date(1, 5), None).unwrap();
        let item = InvoiceItem::new("Audit", 2.0, 500.0, 20.0);
        InvoiceService::add_item(ws, id.as_str(), item).unwrap();
        id
    }

    #[test]
    fn numbering_and_item_editing() {
        let mut ws = Workspace::default();
        let first =
            InvoiceService::create(&mut ws, DocumentKind::Invoice, "A", date(2, 1), None).unwrap();
        InvoiceService::create(&mut ws, DocumentKind::Invoice, "B", date(2, 2), None).unwrap();
        assert_eq!(ws.invoices[1].number, "FAC-2025-002");

        let bad = InvoiceItem::new("Zero", 0.0, 10.0, 20.0);
        assert!(InvoiceService::add_item(&mut ws, first.as_str(), bad).is_err());
        let dev = InvoiceItem::new("Dev", 1.0, 100.0, 20.0);
        InvoiceService::add_item(&mut ws, first.as_str(), dev).unwrap();
        assert_eq!(ws.invoices[0].total_ttc, 120.0);

        InvoiceService::set_status(&mut ws, first.as_str(), InvoiceStatus::Sent).unwrap();
        let late = InvoiceItem::new("Late", 1.0, 1.0, 20.0);
        assert!(InvoiceService::add_item(&mut ws, first.as_str(), late).is_err());
        assert!(InvoiceService::remove_item(&mut ws, first.as_str(), 1).is_err());
    }

    #[test]
    fn quotes_convert_once() {
        let mut ws = Workspace::default();
        let quote = quote_with_item(&mut ws);
        assert!(InvoiceService::convert_quote(&mut ws, quote.as_str(), date(1, 20)).is_err());

        InvoiceService::set_status(&mut ws, quote.as_str(), InvoiceStatus::Sent).unwrap();
        let invoice = InvoiceService::convert_quote(&mut ws, quote.as_str(), date(1, 20)).unwrap();
        let invoice = ws.invoice(invoice.as_str()).unwrap();
        assert_eq!(invoice.number, "FAC-2025-001");
        assert_eq!(invoice.total_ttc, 1200.0);
        assert_eq!(invoice.source_quote_id.as_ref(), Some(&quote));
        assert_eq!(ws.invoice(quote.as_str()).unwrap().status, InvoiceStatus::Accepted);

        assert!(InvoiceService::convert_quote(&mut ws, quote.as_str(), date(1, 21)).is_err());
    }

    #[test]
    fn overdue_listing() {
        let mut ws = Workspace::default();
        let id = InvoiceService::create(
            &mut ws,
            DocumentKind::Invoice,
            "Late payer",
            date(1, 1),
            Some(date(1, 31)),
        )
        .unwrap();
        InvoiceService::add_item(&mut ws, id.as_str(), InvoiceItem::new("Work", 1.0, 50.0, 0.0))
            .unwrap();
        InvoiceService::set_status(&mut ws, id.as_str(), InvoiceStatus::Sent).unwrap();
        assert!(InvoiceService::overdue(&ws, date(1, 31)).is_empty());
        assert_eq!(InvoiceService::overdue(&ws, date(2, 1)).len(), 1);
        let backwards = Some(date(1, 1));
        assert!(
            InvoiceService::create(&mut ws, DocumentKind::Invoice, "x", date(2, 1), backwards)
                .is_err()
        );
    }
}
