use chrono::NaiveDate;
use tracing::warn;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::{ChallengeStatus, EntityId, SpendingChallenge};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct ChallengeService;

impl ChallengeService {
    pub fn create(
        ws: &mut Workspace,
        name: &str,
        limit: f64,
        start: NaiveDate,
        end: NaiveDate,
        category: Option<&str>,
    ) -> Result<EntityId> {
        let name = validate_name("challenge", name)?;
        let limit = validate_amount(limit)?;
        let mut challenge = SpendingChallenge::new(name, limit, start, end)?;
        challenge.category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from);
        let id = challenge.id.clone();
        ws.challenges.push(challenge);
        Ok(id)
    }

    /// Records spending against a challenge and returns its status afterwards.
    pub fn record(
        ws: &mut Workspace,
        challenge: &str,
        amount: f64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<ChallengeStatus> {
        let challenge = ws.challenge_mut(challenge)?;
        challenge.record(amount, date, note.map(String::from))?;
        let status = challenge.status(date);
        if status == ChallengeStatus::Failed {
            warn!(
                challenge = %challenge.name,
                spent = challenge.spent_amount,
                limit = challenge.limit_amount,
                "spending challenge limit exceeded"
            );
        }
        Ok(status)
    }

    pub fn delete(ws: &mut Workspace, challenge: &str) -> Result<SpendingChallenge> {
        let index = find_index(&ws.challenges, challenge)?
            .ok_or_else(|| BudgetError::ChallengeNotFound(challenge.to_string()))?;
        Ok(ws.challenges.remove(index))
    }
}
