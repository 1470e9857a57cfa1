use crate::error::Result;
use crate::model::{CodeShare, ScanOutput, REPO_HEADERS, SCHEMA_VERSION, TENANT_HEADERS};
use crate::scan::TenantReport;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const REPO_CSV: &str = "repo_language_stats.csv";
pub const TENANT_CSV: &str = "tenant_language_summary.csv";

/// Writes `rows` under an explicit header line, so an empty row-set still
/// produces a header-only file.
pub fn write_csv<T: Serialize, W: Write>(writer: W, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(headers)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes both CSV files into `out_dir`, creating it if needed.
pub fn write_reports(out_dir: &Path, report: &TenantReport) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)?;

    let repo_path = out_dir.join(REPO_CSV);
    write_csv(std::fs::File::create(&repo_path)?, &REPO_HEADERS, &report.rows)?;

    let tenant_path = out_dir.join(TENANT_CSV);
    write_csv(
        std::fs::File::create(&tenant_path)?,
        &TENANT_HEADERS,
        &report.tenant.tenant_rows(),
    )?;

    Ok((repo_path, tenant_path))
}

pub fn format_code_summary(shares: &[CodeShare]) -> Vec<String> {
    shares
        .iter()
        .map(|s| format!("{:15} {:6.2}%", s.language, s.percent))
        .collect()
}

pub fn print_summary(report: &TenantReport, written: &[PathBuf]) {
    println!("\n{}", style("== Tenant summary (code-only %) ==").bold());
    for line in format_code_summary(&report.tenant.code_shares()) {
        println!("{line}");
    }

    if !report.skipped.is_empty() {
        println!(
            "\n{} {} skipped, see errors above",
            style(report.skipped.len()).red(),
            if report.skipped.len() == 1 { "repository" } else { "repositories" }
        );
    }

    println!("\nWrote:");
    for path in written {
        println!(" - {}", path.display());
    }
}

pub fn scan_output(
    report: &TenantReport,
    organization: &str,
    since: Option<DateTime<Utc>>,
    created_only: bool,
) -> ScanOutput {
    ScanOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        organization: organization.to_string(),
        since,
        created_only,
        repositories: report.rows.clone(),
        languages: report.tenant.tenant_rows(),
        code_only: report.tenant.code_shares(),
        skipped: report.skipped.clone(),
    }
}

pub fn output_json(output: &ScanOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
