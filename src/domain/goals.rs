//! Savings goals and spending challenges.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::round_cents;
use crate::errors::{BudgetError, Result};

use super::common::{
    deserialize_amount, deserialize_optional_date, deserialize_text, deserialize_timestamp,
    sum_amounts, Amounted, EntityId, Identifiable, NamedEntity,
};

/// Average month length used to spread a remaining amount over a deadline.
const DAYS_PER_MONTH: f64 = 30.44;

/// A deposit into (positive) or withdrawal from (negative) a savings goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub date: Option<NaiveDate>,
}

impl Amounted for Contribution {
    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(deserialize_with = "deserialize_amount", default, alias = "target")]
    pub target_amount: f64,
    #[serde(deserialize_with = "deserialize_amount", default, alias = "current")]
    pub current_amount: f64,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub deadline: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl SavingsGoal {
    pub fn new(name: impl Into<String>, target_amount: f64, deadline: Option<NaiveDate>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            target_amount,
            current_amount: 0.0,
            deadline,
            created_at: Utc::now(),
            contributions: Vec::new(),
        }
    }

    /// Progress towards the target, clamped to `0..=100`.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return if self.current_amount > 0.0 { 100.0 } else { 0.0 };
        }
        (self.current_amount / self.target_amount * 100.0).clamp(0.0, 100.0)
    }

    pub fn remaining_amount(&self) -> f64 {
        round_cents((self.target_amount - self.current_amount).max(0.0))
    }

    pub fn is_completed(&self) -> bool {
        self.target_amount > 0.0 && self.remaining_amount() <= 0.0
    }

    pub fn remaining_days(&self, today: NaiveDate) -> Option<i64> {
        self.deadline.map(|deadline| (deadline - today).num_days().max(0))
    }

    /// Amount to save each month to reach the target by the deadline.
    ///
    /// With less than a month left the whole remaining amount is due.
    pub fn monthly_required(&self, today: NaiveDate) -> Option<f64> {
        let days = self.remaining_days(today)?;
        let remaining = self.remaining_amount();
        let months = (days as f64 / DAYS_PER_MONTH).floor();
        if months < 1.0 {
            Some(remaining)
        } else {
            Some(round_cents(remaining / months))
        }
    }

    pub fn contribute(&mut self, amount: f64, date: NaiveDate) -> Result<()> {
        validate_positive(amount)?;
        self.current_amount = round_cents(self.current_amount + amount);
        self.contributions.push(Contribution {
            amount,
            date: Some(date),
        });
        Ok(())
    }

    pub fn withdraw(&mut self, amount: f64, date: NaiveDate) -> Result<()> {
        validate_positive(amount)?;
        if amount - self.current_amount > 0.005 {
            return Err(BudgetError::InvalidInput(format!(
                "cannot withdraw {:.2} from `{}`: only {:.2} saved",
                amount, self.name, self.current_amount
            )));
        }
        self.current_amount = round_cents((self.current_amount - amount).max(0.0));
        self.contributions.push(Contribution {
            amount: -amount,
            date: Some(date),
        });
        Ok(())
    }

    /// Net total of the recorded contributions.
    pub fn contributed(&self) -> f64 {
        sum_amounts(&self.contributions)
    }
}

impl Identifiable for SavingsGoal {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for SavingsGoal {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeEntry {
    #[serde(deserialize_with = "deserialize_amount", default)]
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Amounted for ChallengeEntry {
    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Upcoming,
    Active,
    Succeeded,
    Failed,
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChallengeStatus::Upcoming => "Upcoming",
            ChallengeStatus::Active => "Active",
            ChallengeStatus::Succeeded => "Succeeded",
            ChallengeStatus::Failed => "Failed",
        })
    }
}

/// A spending cap over a fixed period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpendingChallenge {
    pub id: EntityId,
    #[serde(deserialize_with = "deserialize_text", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_amount", default, alias = "limit")]
    pub limit_amount: f64,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_optional_date", default)]
    pub end_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_amount", default, alias = "spent")]
    pub spent_amount: f64,
    #[serde(default)]
    pub entries: Vec<ChallengeEntry>,
}

impl SpendingChallenge {
    pub fn new(
        name: impl Into<String>,
        limit_amount: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self> {
        if end_date < start_date {
            return Err(BudgetError::InvalidInput(format!(
                "challenge ends ({}) before it starts ({})",
                end_date, start_date
            )));
        }
        Ok(Self {
            id: EntityId::generate(),
            name: name.into(),
            category: None,
            limit_amount,
            start_date: Some(start_date),
            end_date: Some(end_date),
            spent_amount: 0.0,
            entries: Vec::new(),
        })
    }

    pub fn record(&mut self, amount: f64, date: NaiveDate, note: Option<String>) -> Result<()> {
        validate_positive(amount)?;
        self.entries.push(ChallengeEntry {
            amount,
            date: Some(date),
            note,
        });
        self.spent_amount = round_cents(self.spent_amount + amount);
        Ok(())
    }

    /// Share of the limit already spent, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.limit_amount <= 0.0 {
            return if self.spent_amount > 0.0 { 100.0 } else { 0.0 };
        }
        (self.spent_amount / self.limit_amount * 100.0).clamp(0.0, 100.0)
    }

    /// Money left under the cap; negative once the cap is exceeded.
    pub fn remaining_budget(&self) -> f64 {
        round_cents(self.limit_amount - self.spent_amount)
    }

    pub fn remaining_days(&self, today: NaiveDate) -> Option<i64> {
        self.end_date.map(|end| (end - today).num_days().max(0))
    }

    pub fn status(&self, today: NaiveDate) -> ChallengeStatus {
        if self.spent_amount - self.limit_amount > 0.005 {
            return ChallengeStatus::Failed;
        }
        match (self.start_date, self.end_date) {
            (Some(start), _) if today < start => ChallengeStatus::Upcoming,
            (_, Some(end)) if today > end => ChallengeStatus::Succeeded,
            _ => ChallengeStatus::Active,
        }
    }
}

impl Identifiable for SpendingChallenge {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl NamedEntity for SpendingChallenge {
    fn name(&self) -> &str {
        &self.name
    }
}

fn validate_positive(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(BudgetError::InvalidInput(format!(
            "amount must be a positive number (got {})",
            amount
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spending_adds_to_a_stored_total_without_entries() {
        let json = r#"{"id": "c1", "name": "No takeaway", "limitAmount": 300,
            "startDate": "2025-03-01", "endDate": "2025-03-31", "spent": 200}"#;
        let mut challenge: SpendingChallenge = serde_json::from_str(json).unwrap();
        assert!(challenge.entries.is_empty());
        challenge.record(10.0, date(2025, 3, 5), None).unwrap();
        assert_eq!(challenge.spent_amount, 210.0);
        assert_eq!(challenge.remaining_budget(), 90.0);
    }

    #[test]
    fn goal_progress_and_withdrawals() {
        let mut goal = SavingsGoal::new("Bike", 400.0, Some(date(2025, 12, 31)));
        goal.contribute(100.0, date(2025, 1, 10)).unwrap();
        goal.contribute(50.0, date(2025, 2, 10)).unwrap();
        assert_eq!(goal.progress_percent(), 37.5);
        assert_eq!(goal.remaining_amount(), 250.0);

        assert!(goal.withdraw(500.0, date(2025, 3, 1)).is_err());
        goal.withdraw(150.0, date(2025, 3, 1)).unwrap();
        assert_eq!(goal.current_amount, 0.0);
        assert_eq!(goal.contributed(), 0.0);
        assert!(goal.contribute(-5.0, date(2025, 3, 2)).is_err());
    }

    #[test]
    fn goal_deadline_math() {
        let mut goal = SavingsGoal::new("Trip", 1200.0, Some(date(2025, 7, 1)));
        goal.current_amount = 600.0;
        assert_eq!(goal.remaining_days(date(2025, 1, 1)), Some(181));
        assert_eq!(goal.monthly_required(date(2025, 1, 1)), Some(120.0));
        assert_eq!(goal.remaining_days(date(2025, 8, 1)), Some(0));
        assert_eq!(goal.monthly_required(date(2025, 8, 1)), Some(600.0));

        goal.deadline = None;
        assert_eq!(goal.remaining_days(date(2025, 1, 1)), None);
        assert_eq!(goal.monthly_required(date(2025, 1, 1)), None);
    }

    #[test]
    fn overfunded_goal_caps_at_hundred() {
        let mut goal = SavingsGoal::new("Phone", 100.0, None);
        goal.contribute(130.0, date(2025, 1, 1)).unwrap();
        assert_eq!(goal.progress_percent(), 100.0);
        assert_eq!(goal.remaining_amount(), 0.0);
        assert!(goal.is_completed());
    }

    #[test]
    fn challenge_status_follows_dates_and_limit() {
        let mut challenge =
            SpendingChallenge::new("No takeaway", 100.0, date(2025, 3, 1), date(2025, 3, 31))
                .unwrap();
        assert_eq!(challenge.status(date(2025, 2, 20)), ChallengeStatus::Upcoming);
        assert_eq!(challenge.status(date(2025, 3, 10)), ChallengeStatus::Active);
        challenge.record(60.0, date(2025, 3, 5), None).unwrap();
        assert_eq!(challenge.remaining_budget(), 40.0);
        assert_eq!(challenge.progress_percent(), 60.0);
        assert_eq!(challenge.status(date(2025, 4, 2)), ChallengeStatus::Succeeded);

        challenge
            .record(45.0, date(2025, 3, 6), Some("pizza".into()))
            .unwrap();
        assert_eq!(challenge.status(date(2025, 3, 7)), ChallengeStatus::Failed);
        assert_eq!(challenge.remaining_budget(), -5.0);
        assert_eq!(challenge.remaining_days(date(2025, 3, 21)), Some(10));
    }

    #[test]
    fn challenge_rejects_inverted_period() {
        assert!(SpendingChallenge::new("x", 10.0, date(2025, 3, 2), date(2025, 3, 1)).is_err());
    }
}
