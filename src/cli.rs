use crate::api::{DevOpsClient, HttpTransport, DEFAULT_API_VERSION};
use crate::config::{self, ScanConfig, DEFAULT_NON_CODE};
use crate::error::ScanError;
use crate::language::classify;
use crate::recency::RecencyFilter;
use crate::report;
use crate::scan::{scan_tenant, ScanOptions};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "langtally")]
#[command(about = "Language inventory across every repository of an Azure DevOps organization")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    #[arg(long, env = "ADO_ORG_URL", help = "Organization URL, e.g. https://dev.azure.com/acme")]
    pub org_url: Option<String>,

    #[arg(long, env = "ADO_PAT", hide_env_values = true, help = "Personal access token with Code (Read) scope")]
    pub pat: Option<String>,

    #[arg(long, default_value = "out/", help = "Output directory for CSVs")]
    pub out: PathBuf,

    #[arg(long, env = "FILTER_SINCE_DAYS", help = "Only count files changed in the last N days")]
    pub since_days: Option<u32>,

    #[arg(long, env = "FILTER_SINCE_ISO", help = "Only count files changed since this date (YYYY-MM-DD or RFC3339)")]
    pub since_iso: Option<String>,

    #[arg(long, env = "FILTER_CREATED_ONLY", action = ArgAction::SetTrue, value_parser = env_flag, help = "Only count files created inside the window")]
    pub created_only: bool,

    #[arg(long, env = "EXCLUDE_NON_CODE", action = ArgAction::SetTrue, value_parser = env_flag, help = "Leave non-code languages out of the code-only percentages")]
    pub exclude_non_code: bool,

    #[arg(
        long,
        env = "NON_CODE_LANGS",
        value_delimiter = ',',
        default_values_t = DEFAULT_NON_CODE.map(String::from),
        help = "Languages treated as non-code"
    )]
    pub non_code: Vec<String>,

    #[arg(long, env = "RATE_DELAY", default_value = "0", help = "Pause after every API call (seconds or e.g. 50ms)")]
    pub rate_delay: String,

    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, help = "HTTP request timeout")]
    pub timeout: Duration,

    #[arg(long, default_value = DEFAULT_API_VERSION, help = "REST api-version query parameter")]
    pub api_version: String,

    #[arg(long, help = "Print the report as JSON instead of the summary")]
    pub json: bool,
}

/// Environment switches are on only for a case-insensitive `true`.
fn env_flag(value: &str) -> std::result::Result<bool, std::convert::Infallible> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

impl ScanArgs {
    /// Validates arguments into a `ScanConfig` without touching the network.
    pub fn into_config(self) -> crate::error::Result<ScanConfig> {
        let org_url = config::require(self.org_url, "--org-url or ADO_ORG_URL")?;
        let pat = config::require(self.pat, "--pat or ADO_PAT")?;
        let since = config::resolve_since(self.since_iso.as_deref(), self.since_days, Utc::now())?;
        let rate_delay = config::parse_delay(&self.rate_delay)?;

        Ok(ScanConfig {
            org_url,
            pat,
            out_dir: self.out,
            recency: since.map(|since| RecencyFilter {
                since,
                created_only: self.created_only,
            }),
            exclude_non_code: self.exclude_non_code,
            non_code: self.non_code,
            rate_delay,
            timeout: self.timeout,
            api_version: self.api_version,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan every repository and write the language reports
    Scan(ScanArgs),
    /// Print the language each path would be counted as
    Classify {
        #[arg(required = true, help = "Paths to classify")]
        paths: Vec<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        Self::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parses arguments, rejecting `--since-days` together with `--since-iso`
    /// only when both were typed. Environment values act as defaults and are
    /// settled by `config::resolve_since`, where the date wins.
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut command = <Self as CommandFactory>::command();
        let matches = command.try_get_matches_from_mut(args)?;
        if let Some(("scan", scan)) = matches.subcommand() {
            let typed = |id: &str| scan.value_source(id) == Some(ValueSource::CommandLine);
            if typed("since_days") && typed("since_iso") {
                return Err(command.error(
                    ErrorKind::ArgumentConflict,
                    "the argument '--since-days' cannot be used with '--since-iso'",
                ));
            }
        }
        <Self as FromArgMatches>::from_arg_matches(&matches).map_err(|e| e.format(&mut command))
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Scan(args) => {
                let json = args.json;
                let config = args.into_config()?;
                run_scan(&config, json)
            }
            Commands::Classify { paths } => {
                for path in paths {
                    println!("{path}\t{}", classify(&path));
                }
                Ok(())
            }
        }
    }
}

fn run_scan(config: &ScanConfig, json: bool) -> Result<()> {
    let transport = HttpTransport::new(&config.pat, config.timeout, config.rate_delay)
        .context("Failed to build HTTP client")?;
    let client = DevOpsClient::new(transport, &config.org_url).with_api_version(config.api_version.clone());

    let options = ScanOptions {
        recency: config.recency,
        excluded: config.excluded_languages().to_vec(),
    };

    let progress = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let report = scan_tenant(&client, &options, &progress).context("Failed to list projects")?;

    let (repo_csv, tenant_csv) =
        report::write_reports(&config.out_dir, &report).context("Failed to write CSV reports")?;

    if json {
        let since = config.recency.map(|r| r.since);
        let created_only = config.recency.map(|r| r.created_only).unwrap_or(false);
        report::output_json(&report::scan_output(&report, client.org_url(), since, created_only))?;
    } else {
        println!("Found {} projects, {} repositories", report.project_count, report.repository_count);
        report::print_summary(&report, &[repo_csv, tenant_csv]);
    }

    Ok(())
}

/// True when `err` stems from invalid or missing configuration.
pub fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<ScanError>())
        .any(ScanError::is_config)
}
