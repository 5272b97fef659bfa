//! Offline half of the comment import: work out which Assembla comments
//! have a Jira issue to land on, without calling either API.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::config::{Layout, SpaceArgs};
use crate::error::Result;
use crate::model::Record;
use crate::output::{self, Format};
use crate::tabular;

pub const COMMENTS_FILE: &str = "ticket-comments.csv";
pub const JIRA_TICKETS_FILE: &str = "jira-tickets-all.csv";
pub const PLAN_FILE: &str = "ticket-comments-plan.csv";

/// A Jira issue created for an Assembla ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPlan {
    pub plan: String,
    pub comments: usize,
    pub linked: usize,
    pub valid_tickets: Vec<String>,
    pub invalid_tickets: Vec<String>,
}

pub fn run(space: &SpaceArgs, format: Format) -> Result<()> {
    let layout = Layout::from_args(space)?;
    let plan = plan(&layout, format)?;
    output::print_comment_plan(&plan, format)
}

pub fn plan(layout: &Layout, format: Format) -> Result<CommentPlan> {
    let dir = layout.require_space_dir()?;
    let comments_path = dir.join(COMMENTS_FILE);
    let tickets_path = layout.jira_dir().join(JIRA_TICKETS_FILE);

    output::progress(format, comments_path.display());
    let comments = tabular::read_records(&comments_path)?;
    output::progress(format, tickets_path.display());
    let issues = issue_map(&tabular::read_records(&tickets_path)?);

    let (rows, valid_tickets, invalid_tickets) = link_comments(&comments, &issues);
    let plan_path: PathBuf = dir.join(PLAN_FILE);
    tabular::write_records(&plan_path, &rows)?;

    Ok(CommentPlan {
        plan: plan_path.display().to_string(),
        comments: comments.len(),
        linked: rows.iter().filter(|r| r.get("result") == Some("OK")).count(),
        valid_tickets,
        invalid_tickets,
    })
}

/// Assembla ticket id to Jira issue, for tickets whose import succeeded.
pub fn issue_map(tickets: &[Record]) -> HashMap<String, JiraIssue> {
    tickets
        .iter()
        .filter(|t| t.get("result") == Some("OK"))
        .filter_map(|t| {
            let assembla_id = t.get("assembla_ticket_id")?;
            let issue = JiraIssue {
                id: t.get("jira_ticket_id")?.to_string(),
                key: t.get("jira_ticket_key").unwrap_or_default().to_string(),
            };
            Some((assembla_id.to_string(), issue))
        })
        .collect()
}

/// One plan row per comment, plus the distinct linked and unlinked ticket
/// ids in first-seen order.
fn link_comments(
    comments: &[Record],
    issues: &HashMap<String, JiraIssue>,
) -> (Vec<Record>, Vec<String>, Vec<String>) {
    let mut rows = Vec::with_capacity(comments.len());
    let mut valid: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for comment in comments {
        let ticket_id = comment.get("ticket_id").unwrap_or_default();
        let mut row = Record::new()
            .with("comment_id", comment.get("id").unwrap_or_default())
            .with("assembla_ticket_id", ticket_id);

        match issues.get(ticket_id) {
            Some(issue) => {
                row.insert("jira_ticket_id", Some(issue.id.clone()));
                row.insert("jira_ticket_key", Some(issue.key.clone()));
                row.insert("result", Some("OK".into()));
                push_unique(&mut valid, ticket_id);
            }
            None => {
                debug!(ticket_id, "comment has no jira issue");
                row.insert("jira_ticket_id", None);
                row.insert("jira_ticket_key", None);
                row.insert("result", Some("NOK".into()));
                push_unique(&mut invalid, ticket_id);
            }
        }
        rows.push(row);
    }

    (rows, valid, invalid)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
