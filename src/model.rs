use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

pub const REPO_HEADERS: [&str; 5] = ["project", "repository", "default_branch", "language", "bytes"];
pub const TENANT_HEADERS: [&str; 3] = ["language", "bytes", "percent_all_files"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    /// Branch name with any `refs/heads/` prefix removed; `None` for empty repositories.
    pub fn branch_name(&self) -> Option<&str> {
        self.default_branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| b.strip_prefix("refs/heads/").unwrap_or(b))
    }
}

/// Raw entry of a recursive items listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub git_object_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn into_file(self) -> Option<FileItem> {
        if self.is_folder || self.git_object_type.as_deref() != Some("blob") {
            return None;
        }
        let path = self.path?;
        Some(FileItem {
            path,
            size: self.size.unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub commit_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Edit,
    Rename,
    Delete,
    Other,
}

impl ChangeKind {
    /// Parses a `changeType` value. Combined values such as `"edit, rename"`
    /// resolve to their strongest component.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        let parts: Vec<&str> = lower.split(',').map(str::trim).collect();
        if parts.contains(&"add") {
            ChangeKind::Add
        } else if parts.contains(&"delete") {
            ChangeKind::Delete
        } else if parts.contains(&"edit") {
            ChangeKind::Edit
        } else if parts.contains(&"rename") {
            ChangeKind::Rename
        } else {
            ChangeKind::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub commit_id: String,
    pub kind: ChangeKind,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChange {
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub item: Option<RawChangeItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChangeItem {
    #[serde(default)]
    pub path: Option<String>,
}

impl RawChange {
    pub fn into_record(self, commit_id: &str) -> Option<ChangeRecord> {
        let path = self.item?.path.filter(|p| !p.is_empty())?;
        let kind = ChangeKind::parse(self.change_type.as_deref().unwrap_or(""));
        Some(ChangeRecord {
            commit_id: commit_id.to_string(),
            kind,
            path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRow {
    pub project: String,
    pub repository: String,
    pub default_branch: String,
    pub language: String,
    pub bytes: u64,
}

impl RepoRow {
    pub fn placeholder(project: &str, repository: &str, default_branch: &str) -> Self {
        Self {
            project: project.to_string(),
            repository: repository.to_string(),
            default_branch: default_branch.to_string(),
            language: String::new(),
            bytes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRow {
    pub language: String,
    pub bytes: u64,
    pub percent_all_files: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeShare {
    pub language: String,
    pub bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRepo {
    pub project: String,
    pub repository: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub organization: String,
    pub since: Option<DateTime<Utc>>,
    pub created_only: bool,
    pub repositories: Vec<RepoRow>,
    pub languages: Vec<TenantRow>,
    pub code_only: Vec<CodeShare>,
    pub skipped: Vec<SkippedRepo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tree_entry_keeps_only_blobs_with_paths() {
        let blob: TreeEntry = serde_json::from_value(json!({
            "path": "/src/a.py", "gitObjectType": "blob", "size": 12
        }))
        .unwrap();
        assert_eq!(
            blob.into_file(),
            Some(FileItem { path: "/src/a.py".into(), size: 12 })
        );

        let folder: TreeEntry = serde_json::from_value(json!({
            "path": "/src", "isFolder": true, "gitObjectType": "tree"
        }))
        .unwrap();
        assert_eq!(folder.into_file(), None);

        let submodule: TreeEntry = serde_json::from_value(json!({
            "path": "/vendor/lib", "gitObjectType": "commit"
        }))
        .unwrap();
        assert_eq!(submodule.into_file(), None);

        let pathless: TreeEntry =
            serde_json::from_value(json!({ "gitObjectType": "blob", "size": 3 })).unwrap();
        assert_eq!(pathless.into_file(), None);
    }

    #[test]
    fn missing_size_counts_as_zero() {
        let entry: TreeEntry =
            serde_json::from_value(json!({ "path": "/x.rs", "gitObjectType": "blob" })).unwrap();
        assert_eq!(entry.into_file().map(|f| f.size), Some(0));
    }

    #[test]
    fn change_kind_parsing() {
        assert_eq!(ChangeKind::parse("add"), ChangeKind::Add);
        assert_eq!(ChangeKind::parse("Edit"), ChangeKind::Edit);
        assert_eq!(ChangeKind::parse("rename"), ChangeKind::Rename);
        assert_eq!(ChangeKind::parse("edit, rename"), ChangeKind::Edit);
        assert_eq!(ChangeKind::parse("delete, sourceRename"), ChangeKind::Delete);
        assert_eq!(ChangeKind::parse("encoding"), ChangeKind::Other);
        assert_eq!(ChangeKind::parse(""), ChangeKind::Other);
    }

    #[test]
    fn branch_name_strips_heads_prefix() {
        let mut repo = Repository {
            id: "r".into(),
            name: "R".into(),
            default_branch: Some("refs/heads/feature/x".into()),
        };
        assert_eq!(repo.branch_name(), Some("feature/x"));
        repo.default_branch = Some(String::new());
        assert_eq!(repo.branch_name(), None);
        repo.default_branch = None;
        assert_eq!(repo.branch_name(), None);
    }
}
