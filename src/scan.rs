//! Walks projects and repositories, folding file sizes into language tallies.

use crate::api::{DevOpsClient, Fetch};
use crate::error::Result;
use crate::language::classify;
use crate::model::{Project, RepoRow, Repository, SkippedRepo};
use crate::recency::{recent_paths, RecencyFilter};
use crate::tally::{LanguageTally, TenantTally};
use indicatif::ProgressBar;
use tracing::{error, info};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub recency: Option<RecencyFilter>,
    /// Languages kept out of the code-only tally.
    pub excluded: Vec<String>,
}

/// Rows and tally produced by one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoScan {
    pub rows: Vec<RepoRow>,
    pub tally: LanguageTally,
}

#[derive(Debug, Clone, Default)]
pub struct TenantReport {
    pub rows: Vec<RepoRow>,
    pub tenant: TenantTally,
    pub skipped: Vec<SkippedRepo>,
    pub project_count: usize,
    pub repository_count: usize,
}

impl TenantReport {
    /// Folds one repository's result into the report.
    pub fn absorb(&mut self, scan: RepoScan, excluded: &[String]) {
        self.tenant.absorb(&scan.tally, excluded);
        self.rows.extend(scan.rows);
    }
}

pub fn scan_repository<F: Fetch>(
    client: &DevOpsClient<F>,
    project: &Project,
    repo: &Repository,
    options: &ScanOptions,
) -> Result<RepoScan> {
    let Some(branch) = repo.branch_name() else {
        return Ok(RepoScan {
            rows: vec![RepoRow::placeholder(&project.name, &repo.name, "")],
            tally: LanguageTally::new(),
        });
    };
    let default_branch = repo.default_branch.as_deref().unwrap_or(branch);

    let filter = recent_paths(client, &project.id, &repo.id, branch, options.recency.as_ref())?;

    let mut tally = LanguageTally::new();
    for file in client.list_files(&project.id, &repo.id, branch) {
        let file = file?;
        if let Some(paths) = &filter {
            if !paths.contains(&file.path) {
                continue;
            }
        }
        tally.add(classify(&file.path), file.size);
    }

    if tally.total() == 0 {
        return Ok(RepoScan {
            rows: vec![RepoRow::placeholder(&project.name, &repo.name, default_branch)],
            tally: LanguageTally::new(),
        });
    }

    let rows = tally
        .iter()
        .filter(|(_, bytes)| *bytes > 0)
        .map(|(language, bytes)| RepoRow {
            project: project.name.clone(),
            repository: repo.name.clone(),
            default_branch: default_branch.to_string(),
            language: language.to_string(),
            bytes,
        })
        .collect();

    Ok(RepoScan { rows, tally })
}

/// Sequentially scans every repository of every project. A failure inside a
/// project or repository is logged and recorded as skipped; only a failure
/// to list projects aborts the run. Log lines are written with the spinner
/// suspended so they never share its line.
pub fn scan_tenant<F: Fetch>(
    client: &DevOpsClient<F>,
    options: &ScanOptions,
    progress: &ProgressBar,
) -> Result<TenantReport> {
    let mut report = TenantReport::default();

    progress.set_message("Listing projects...");
    let projects = client.list_projects().collect::<Result<Vec<_>>>()?;
    report.project_count = projects.len();
    progress.suspend(|| info!("Found {} projects", projects.len()));

    for project in &projects {
        let repos = match client.list_repositories(&project.id).collect::<Result<Vec<_>>>() {
            Ok(repos) => repos,
            Err(e) => {
                progress.suspend(|| error!("Error listing repositories for {}: {}", project.name, e));
                report.skipped.push(SkippedRepo {
                    project: project.name.clone(),
                    repository: None,
                    error: e.to_string(),
                });
                continue;
            }
        };
        progress.suspend(|| info!("- {}: {} repos", project.name, repos.len()));
        report.repository_count += repos.len();

        for repo in &repos {
            progress.set_message(format!("{}/{}", project.name, repo.name));
            progress.tick();
            match scan_repository(client, project, repo, options) {
                Ok(scan) => report.absorb(scan, &options.excluded),
                Err(e) => {
                    progress.suspend(|| error!("Error scanning {}/{}: {}", project.name, repo.name, e));
                    report.skipped.push(SkippedRepo {
                        project: project.name.clone(),
                        repository: Some(repo.name.clone()),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    progress.finish_and_clear();
    Ok(report)
}
