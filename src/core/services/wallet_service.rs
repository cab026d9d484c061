use tracing::info;

use crate::core::workspace::{find_index, Workspace};
use crate::currency::CurrencyCode;
use crate::domain::{EntityId, Project, Wallet};
use crate::errors::{BudgetError, Result};

use super::validate_name;

pub struct WalletService;

impl WalletService {
    pub fn create(
        ws: &mut Workspace,
        name: &str,
        balance: f64,
        currency: CurrencyCode,
    ) -> Result<EntityId> {
        let name = validate_name("wallet", name)?;
        if !balance.is_finite() {
            return Err(BudgetError::InvalidInput("wallet balance must be a number".into()));
        }
        let wallet = Wallet::new(name, crate::currency::round_cents(balance), currency);
        let id = wallet.id.clone();
        ws.wallets.push(wallet);
        Ok(id)
    }

    pub fn set_balance(ws: &mut Workspace, wallet: &str, balance: f64) -> Result<()> {
        if !balance.is_finite() {
            return Err(BudgetError::InvalidInput("wallet balance must be a number".into()));
        }
        ws.wallet_mut(wallet)?.balance = crate::currency::round_cents(balance);
        Ok(())
    }

    /// Links a project to a wallet. A project belongs to one wallet at a
    /// time, so any previous link is dropped.
    pub fn link(ws: &mut Workspace, wallet: &str, project: &str) -> Result<()> {
        let wallet_id = ws.wallet(wallet)?.id.clone();
        let project = ws.project_mut(project)?;
        project.link_to_wallet = true;
        project.wallet_id = Some(wallet_id.clone());
        project.touch();
        let project_id = project.id.clone();

        for other in &mut ws.wallets {
            if other.id == wallet_id {
                other.link(&project_id);
            } else {
                other.unlink(&project_id);
            }
        }
        Ok(())
    }

    pub fn unlink(ws: &mut Workspace, wallet: &str, project: &str) -> Result<()> {
        let wallet_id = ws.wallet(wallet)?.id.clone();
        let project = ws.project_mut(project)?;
        if project.wallet_id.as_ref() == Some(&wallet_id) {
            project.link_to_wallet = false;
            project.wallet_id = None;
            project.touch();
        }
        let project_id = project.id.clone();
        let wallet = ws.wallet_mut(wallet_id.as_str())?;
        if !wallet.unlink(&project_id) {
            return Err(BudgetError::InvalidInput(format!(
                "project is not linked to wallet `{}`",
                wallet.name
            )));
        }
        Ok(())
    }

    /// The wallet a project is linked to, if any.
    pub fn wallet_for<'a>(ws: &'a Workspace, project: &Project) -> Option<&'a Wallet> {
        let wallet_id = project.wallet_id.as_ref().filter(|_| project.link_to_wallet)?;
        ws.wallets.iter().find(|wallet| &wallet.id == wallet_id)
    }

    /// Removes a wallet and clears the link on every project that used it.
    pub fn delete(ws: &mut Workspace, wallet: &str) -> Result<Wallet> {
        let index = find_index(&ws.wallets, wallet)?
            .ok_or_else(|| BudgetError::WalletNotFound(wallet.to_string()))?;
        let removed = ws.wallets.remove(index);
        let mut cleared = 0;
        for project in &mut ws.projects {
            if project.wallet_id.as_ref() == Some(&removed.id) {
                project.link_to_wallet = false;
                project.wallet_id = None;
                project.touch();
                cleared += 1;
            }
        }
        info!(wallet = %removed.name, cleared, "deleted wallet");
        Ok(removed)
    }
}
