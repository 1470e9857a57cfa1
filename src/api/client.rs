use super::paginate::{ContinuationPages, OffsetPages};
use super::{with_query, Fetch};
use crate::error::Result;
use crate::model::{ChangeRecord, Commit, FileItem, Project, RawChange, Repository, TreeEntry};
use crate::recency::PathSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_API_VERSION: &str = "7.1-preview.1";
pub const COMMIT_PAGE_SIZE: usize = 200;

/// Typed accessors over the organization's REST surface.
pub struct DevOpsClient<F> {
    fetch: F,
    org_url: String,
    api_version: String,
}

impl<F: Fetch> DevOpsClient<F> {
    pub fn new(fetch: F, org_url: &str) -> Self {
        Self {
            fetch,
            org_url: org_url.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    pub fn fetcher(&self) -> &F {
        &self.fetch
    }

    pub fn list_projects(&self) -> impl Iterator<Item = Result<Project>> + '_ {
        let url = format!("{}/_apis/projects?api-version={}", self.org_url, self.api_version);
        typed(ContinuationPages::new(&self.fetch, url))
    }

    pub fn list_repositories(&self, project_id: &str) -> impl Iterator<Item = Result<Repository>> + '_ {
        let url = format!(
            "{}/{}/_apis/git/repositories?api-version={}",
            self.org_url,
            urlencoding::encode(project_id),
            self.api_version
        );
        typed(ContinuationPages::new(&self.fetch, url))
    }

    /// Recursive blob listing of `branch`; folders, non-blobs and pathless entries are dropped.
    pub fn list_files(
        &self,
        project_id: &str,
        repo_id: &str,
        branch: &str,
    ) -> impl Iterator<Item = Result<FileItem>> + '_ {
        let base = format!(
            "{}?recursionLevel=Full&includeContentMetadata=true",
            self.repo_url(project_id, repo_id, "items")
        );
        let url = with_query(&base, "versionDescriptor.version", branch);
        let url = with_query(&url, "api-version", &self.api_version);
        typed::<TreeEntry, _>(ContinuationPages::new(&self.fetch, url))
            .filter_map(|entry| match entry {
                Ok(entry) => entry.into_file().map(Ok),
                Err(e) => Some(Err(e)),
            })
    }

    pub fn list_commits_since(
        &self,
        project_id: &str,
        repo_id: &str,
        branch: &str,
        since: DateTime<Utc>,
    ) -> impl Iterator<Item = Result<Commit>> + '_ {
        let base = self.repo_url(project_id, repo_id, "commits");
        let url = with_query(&base, "searchCriteria.itemVersion.version", branch);
        let url = with_query(
            &url,
            "searchCriteria.fromDate",
            &since.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        let url = with_query(&url, "api-version", &self.api_version);
        typed(OffsetPages::new(&self.fetch, url, COMMIT_PAGE_SIZE))
    }

    /// Change records of a single commit.
    pub fn commit_changes(&self, project_id: &str, repo_id: &str, commit_id: &str) -> Result<Vec<ChangeRecord>> {
        let url = format!(
            "{}/{}/changes?api-version={}",
            self.repo_url(project_id, repo_id, "commits"),
            urlencoding::encode(commit_id),
            self.api_version
        );
        let page = self.fetch.fetch(&url)?;
        let changes = match page.body.get("changes") {
            Some(Value::Array(changes)) => changes.clone(),
            _ => Vec::new(),
        };
        Ok(changes
            .into_iter()
            .filter_map(|c| serde_json::from_value::<RawChange>(c).ok())
            .filter_map(|c| c.into_record(commit_id))
            .collect())
    }

    /// Paths added by `commit_ids`, plus edited or renamed ones unless `created_only`.
    /// Costs one request per commit.
    pub fn list_changed_paths(
        &self,
        project_id: &str,
        repo_id: &str,
        commit_ids: &[String],
        created_only: bool,
    ) -> Result<HashSet<String>> {
        let mut paths = PathSet::default();
        for commit_id in commit_ids {
            for change in self.commit_changes(project_id, repo_id, commit_id)? {
                paths.record(&change);
            }
        }
        Ok(paths.select(created_only))
    }

    fn repo_url(&self, project_id: &str, repo_id: &str, resource: &str) -> String {
        format!(
            "{}/{}/_apis/git/repositories/{}/{}",
            self.org_url,
            urlencoding::encode(project_id),
            urlencoding::encode(repo_id),
            resource
        )
    }
}

/// Decodes raw items, skipping any that do not match the schema.
fn typed<T, I>(items: I) -> impl Iterator<Item = Result<T>>
where
    T: DeserializeOwned,
    I: Iterator<Item = Result<Value>>,
{
    items.filter_map(|item| match item {
        Ok(value) => match serde_json::from_value::<T>(value) {
            Ok(parsed) => Some(Ok(parsed)),
            Err(e) => {
                debug!("skipping malformed item: {}", e);
                None
            }
        },
        Err(e) => Some(Err(e)),
    })
}
