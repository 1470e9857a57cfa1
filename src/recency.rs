//! Restricting a file inventory to paths touched since a threshold.

use crate::api::{DevOpsClient, Fetch};
use crate::error::Result;
use crate::model::{ChangeKind, ChangeRecord};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyFilter {
    pub since: DateTime<Utc>,
    pub created_only: bool,
}

/// Paths seen in change records, split into added paths and everything
/// added, edited or renamed. Union semantics: a later edit never removes a
/// path from `created`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    created: HashSet<String>,
    touched: HashSet<String>,
}

impl PathSet {
    pub fn record(&mut self, change: &ChangeRecord) {
        match change.kind {
            ChangeKind::Add => {
                self.created.insert(change.path.clone());
                self.touched.insert(change.path.clone());
            }
            ChangeKind::Edit | ChangeKind::Rename => {
                self.touched.insert(change.path.clone());
            }
            ChangeKind::Delete | ChangeKind::Other => {}
        }
    }

    pub fn select(self, created_only: bool) -> HashSet<String> {
        if created_only {
            self.created
        } else {
            self.touched
        }
    }
}

/// `None` when no filter is requested; otherwise the paths the file listing
/// is restricted to. No commits in the window yields an empty set.
pub fn recent_paths<F: Fetch>(
    client: &DevOpsClient<F>,
    project_id: &str,
    repo_id: &str,
    branch: &str,
    filter: Option<&RecencyFilter>,
) -> Result<Option<HashSet<String>>> {
    let Some(filter) = filter else {
        return Ok(None);
    };

    let commit_ids = client
        .list_commits_since(project_id, repo_id, branch, filter.since)
        .map(|c| c.map(|c| c.commit_id))
        .collect::<Result<Vec<_>>>()?;
    debug!("{} commits since {} on {}", commit_ids.len(), filter.since, branch);

    if commit_ids.is_empty() {
        return Ok(Some(HashSet::new()));
    }
    let paths = client.list_changed_paths(project_id, repo_id, &commit_ids, filter.created_only)?;
    Ok(Some(paths))
}
