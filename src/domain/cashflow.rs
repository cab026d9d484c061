//! Monthly cash-flow plan and its running-balance projection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::currency::round_cents;
use crate::errors::{BudgetError, Result};

use super::common::{
    deserialize_amount, deserialize_or_default, deserialize_text, EntityId, Identifiable,
    NamedEntity,
};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=9999).contains(&year) {
            return Err(BudgetError::InvalidInput(format!(
                "year must be between 1 and 9999 (got {})",
                year
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(BudgetError::InvalidInput(format!(
                "month must be between 1 and 12 (got {})",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Moves forward (or backward, with a negative count) by whole months.
    pub fn add_months(self, count: i32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 + i64::from(count);
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl FromStr for YearMonth {
    type Err = BudgetError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = || BudgetError::InvalidInput(format!("`{}` is not a YYYY-MM month", input));
        let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    #[serde(alias = "revenu")]
    Income,
    #[default]
    #[serde(alias = "depense", alias = "dépense")]
    Expense,
}

impl FlowKind {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "income" | "in" | "revenu" => Some(FlowKind::Income),
            "expense" | "out" | "depense" => Some(FlowKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowKind::Income => "Income",
            FlowKind::Expense => "Expense",
        })
    }
}

/// When an entry applies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schedule {
    Monthly {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<YearMonth>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        until: Option<YearMonth>,
    },
    Once {
        month: YearMonth,
    },
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Monthly {
            from: None,
            until: None,
        }
    }
}

impl Schedule {
    pub fn applies_to(&self, month: YearMonth) -> bool {
        match self {
            Schedule::Monthly { from, until } => {
                from.map_or(true, |start| month >= start) && until.map_or(true, |end| month <= end)
            }
            Schedule::Once { month: target } => *target == month,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Monthly { from, until } => {
                f.write_str("monthly")?;
                if let Some(start) = from {
                    write!(f, " from {}", start)?;
                }
                if let Some(end) = until {
                    write!(f, " until {}", end)?;
                }
                Ok(())
            }
            Schedule::Once { month } => write!(f, "once in {}", month),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEntry {
    #[serde(default)]
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub label: String,
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub kind: FlowKind,
    #[serde(deserialize_with = "deserialize_or_default", default)]
    pub schedule: Schedule,
}

impl CashFlowEntry {
    pub fn new(label: impl Into<String>, amount: f64, kind: FlowKind, schedule: Schedule) -> Self {
        Self {
            id: EntityId::generate(),
            label: label.into(),
            amount,
            kind,
            schedule,
        }
    }
}

impl Identifiable for CashFlowEntry {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for CashFlowEntry {
    fn name(&self) -> &str {
        &self.label
    }
}

/// One month of the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowRow {
    pub month: YearMonth,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowPlan {
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub opening_balance: f64,
    pub start_month: YearMonth,
    #[serde(default)]
    pub entries: Vec<CashFlowEntry>,
}

impl CashFlowPlan {
    pub fn new(start_month: YearMonth, opening_balance: f64) -> Self {
        Self {
            opening_balance,
            start_month,
            entries: Vec::new(),
        }
    }

    /// Projects `months` months starting at `start_month`.
    pub fn project(&self, months: usize) -> Vec<CashFlowRow> {
        let mut balance = round_cents(self.opening_balance);
        (0..months)
            .map(|offset| {
                let month = self.start_month.add_months(offset as i32);
                let (mut income, mut expense) = (0.0, 0.0);
                for entry in self.entries.iter().filter(|e| e.schedule.applies_to(month)) {
                    match entry.kind {
                        FlowKind::Income => income += entry.amount,
                        FlowKind::Expense => expense += entry.amount,
                    }
                }
                let income = round_cents(income);
                let expense = round_cents(expense);
                let net = round_cents(income - expense);
                balance = round_cents(balance + net);
                CashFlowRow {
                    month,
                    income,
                    expense,
                    net,
                    closing_balance: balance,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(text: &str) -> YearMonth {
        text.parse().unwrap()
    }

    #[test]
    fn year_month_parsing_and_arithmetic() {
        assert_eq!(ym("2025-11").add_months(3).to_string(), "2026-02");
        assert_eq!(ym("2025-01").add_months(-1).to_string(), "2024-12");
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("2025/01".parse::<YearMonth>().is_err());
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        assert!("999999999-01".parse::<YearMonth>().is_err());
        assert!("0-05".parse::<YearMonth>().is_err());
        assert_eq!(ym("9999-12").add_months(i32::MAX).month(), 7);
    }

    #[test]
    fn projection_keeps_running_balance() {
        let mut plan = CashFlowPlan::new(ym("2025-01"), 500.0);
        plan.entries.push(CashFlowEntry::new(
            "Salary",
            2000.0,
            FlowKind::Income,
            Schedule::default(),
        ));
        plan.entries.push(CashFlowEntry::new(
            "Rent",
            800.0,
            FlowKind::Expense,
            Schedule::Monthly {
                from: None,
                until: Some(ym("2025-02")),
            },
        ));
        plan.entries.push(CashFlowEntry::new(
            "Insurance",
            300.0,
            FlowKind::Expense,
            Schedule::Once {
                month: ym("2025-03"),
            },
        ));

        let rows = plan.project(3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].net, 1200.0);
        assert_eq!(rows[0].closing_balance, 1700.0);
        assert_eq!(rows[1].closing_balance, 2900.0);
        assert_eq!(rows[2].expense, 300.0);
        assert_eq!(rows[2].closing_balance, 4600.0);
    }

    #[test]
    fn plan_json_shape() {
        let json = r#"{"openingBalance":"1 000","startMonth":"2025-06","entries":[
            {"id":"e1","label":"Bonus","amount":250,"kind":"income",
             "schedule":{"type":"once","month":"2025-07"}}]}"#;
        let plan: CashFlowPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.opening_balance, 1000.0);
        let rows = plan.project(2);
        assert_eq!(rows[0].closing_balance, 1000.0);
        assert_eq!(rows[1].closing_balance, 1250.0);
    }
}
