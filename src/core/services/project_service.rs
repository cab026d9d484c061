use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::core::workspace::{find_index, Workspace};
use crate::domain::project::{Attachment, Comment};
use crate::domain::{EntityId, Project, ProjectStatus, ProjectTemplate};
use crate::errors::{BudgetError, Result};

use super::{validate_amount, validate_name};

pub struct ProjectService;

impl ProjectService {
    pub fn create(
        ws: &mut Workspace,
        name: &str,
        template: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<EntityId> {
        let name = validate_name("project", name)?;
        let mut project = match template {
            Some(key) => Project::from_template(name, ProjectTemplate::find(key)?),
            None => Project::new(name),
        };
        project.project_date = date;
        let id = project.id.clone();
        info!(project = %project.project_name, template = ?project.template, "created project");
        ws.projects.push(project);
        Ok(id)
    }

    pub fn rename(ws: &mut Workspace, reference: &str, name: &str) -> Result<()> {
        let name = validate_name("project", name)?;
        let project = ws.project_mut(reference)?;
        project.project_name = name;
        project.touch();
        Ok(())
    }

    pub fn set_dates(
        ws: &mut Workspace,
        reference: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<()> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(BudgetError::InvalidInput(format!(
                    "end date {} is before start date {}",
                    end, start
                )));
            }
        }
        let project = ws.project_mut(reference)?;
        project.project_date = start;
        project.project_end_date = end;
        project.touch();
        Ok(())
    }

    pub fn set_status(ws: &mut Workspace, reference: &str, status: ProjectStatus) -> Result<()> {
        let project = ws.project_mut(reference)?;
        project.project_status = status;
        project.touch();
        Ok(())
    }

    /// Sets the budget of a project that has no categories yet.
    pub fn set_total(ws: &mut Workspace, reference: &str, amount: f64) -> Result<()> {
        let amount = validate_amount(amount)?;
        let project = ws.project_mut(reference)?;
        if !project.categories.is_empty() {
            return Err(BudgetError::InvalidInput(format!(
                "the total of `{}` is the sum of its categories",
                project.project_name
            )));
        }
        project.total_budget = amount;
        project.touch();
        Ok(())
    }

    /// Copies the budget tree into a new project; spending, notes and
    /// wallet links stay with the original.
    pub fn duplicate(ws: &mut Workspace, reference: &str, name: Option<&str>) -> Result<EntityId> {
        let source = ws.project(reference)?;
        let name = match name {
            Some(name) => validate_name("project", name)?,
            None => format!("{} (copy)", source.project_name),
        };
        let mut copy = Project::new(name);
        copy.project_date = source.project_date;
        copy.project_end_date = source.project_end_date;
        copy.template = source.template.clone();
        copy.total_budget = source.total_budget;
        copy.categories = source.categories.clone();
        copy.recompute_totals();
        let id = copy.id.clone();
        ws.projects.push(copy);
        Ok(id)
    }

    /// Removes a project and every wallet link pointing at it.
    pub fn delete(ws: &mut Workspace, reference: &str) -> Result<Project> {
        let index = find_index(&ws.projects, reference)?
            .ok_or_else(|| BudgetError::ProjectNotFound(reference.to_string()))?;
        let project = ws.projects.remove(index);
        let mut unlinked = 0;
        for wallet in &mut ws.wallets {
            if wallet.unlink(&project.id) {
                unlinked += 1;
            }
        }
        info!(project = %project.project_name, unlinked, "deleted project");
        Ok(project)
    }

    pub fn add_comment(
        ws: &mut Workspace,
        reference: &str,
        author: Option<&str>,
        text: &str,
    ) -> Result<EntityId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BudgetError::InvalidInput("comment cannot be empty".into()));
        }
        let project = ws.project_mut(reference)?;
        let comment = Comment {
            id: EntityId::generate(),
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let id = comment.id.clone();
        project.comments.push(comment);
        project.touch();
        Ok(id)
    }

    pub fn remove_comment(ws: &mut Workspace, reference: &str, comment: &str) -> Result<()> {
        let project = ws.project_mut(reference)?;
        let index = find_index(&project.comments, comment)?
            .ok_or_else(|| BudgetError::EntryNotFound(format!("comment {}", comment)))?;
        project.comments.remove(index);
        project.touch();
        Ok(())
    }

    pub fn add_attachment(
        ws: &mut Workspace,
        reference: &str,
        name: &str,
        path: Option<&str>,
    ) -> Result<EntityId> {
        let name = validate_name("attachment", name)?;
        let project = ws.project_mut(reference)?;
        let attachment = Attachment {
            id: EntityId::generate(),
            name,
            path: path.map(String::from),
            added_at: Utc::now(),
        };
        let id = attachment.id.clone();
        project.attachments.push(attachment);
        project.touch();
        Ok(id)
    }

    pub fn remove_attachment(ws: &mut Workspace, reference: &str, attachment: &str) -> Result<()> {
        let project = ws.project_mut(reference)?;
        let index = find_index(&project.attachments, attachment)?
            .ok_or_else(|| BudgetError::EntryNotFound(format!("attachment {}", attachment)))?;
        project.attachments.remove(index);
        project.touch();
        Ok(())
    }

    /// Projects sorted by start date (undated last), then name.
    pub fn list(ws: &Workspace) -> Vec<&Project> {
        let mut projects: Vec<&Project> = ws.projects.iter().collect();
        projects.sort_by(|a, b| {
            match (a.project_date, b.project_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| a.project_name.to_lowercase().cmp(&b.project_name.to_lowercase()))
        });
        projects
    }
}
