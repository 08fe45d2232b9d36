use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::paginate;

/// Get the default cache directory for reportbot
/// Uses platform-specific cache directories:
/// - Linux: ~/.cache/reportbot
/// - macOS: ~/Library/Caches/reportbot
/// - Windows: %LOCALAPPDATA%/reportbot
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().map(|p| p.join("reportbot")).unwrap_or_else(|| PathBuf::from(".reportbot"))
}

#[derive(Parser, Debug, Clone)]
#[command(name = "reportbot")]
#[command(about = "Generate paginated chat-ready reports from issue-tracker and source-control exports")]
#[command(version)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: ReportCommand,

    /// Directory for the persisted short-link cache
    /// Default: ~/.cache/reportbot/link-cache (Linux)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// URL-shortening service endpoint (POST); when omitted, cells render
    /// bare counts and only previously cached links are reused
    #[arg(long, global = true, value_name = "URL")]
    pub shorten_api: Option<String>,

    /// Service account recorded against created short links
    #[arg(long, global = true, default_value = "svc.reportbot", value_name = "USER")]
    pub shorten_user: String,

    /// Maximum characters per delivered page, banner and fences included
    #[arg(long, global = true, default_value_t = paginate::MAX_PAGE_CHARS, value_name = "CHARS")]
    pub page_limit: usize,

    /// Print the pages as plain text instead of the JSON envelope
    #[arg(long, global = true)]
    pub plain: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// Tabular bug-count report from a bugzilla CSV export
    Bugzilla(BugzillaArgs),
    /// Issue-list report from a jira JSON export
    Jira(JiraArgs),
    /// Submitted-changes report from perforce change records
    Perforce(PerforceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BugzillaArgs {
    /// Report title shown on the first page
    #[arg(long)]
    pub title: String,

    /// CSV export of the count query ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    pub csv: PathBuf,

    /// Query URL that owns the drill-down links; enables link resolution
    #[arg(long, value_name = "URL")]
    pub scope_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct JiraArgs {
    /// Report title shown on the first page
    #[arg(long)]
    pub title: String,

    /// JSON export of the issue query ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    pub issues: PathBuf,

    /// Comma-separated display columns, e.g. "key,priority,status,summary"
    #[arg(long, default_value = "key,summary")]
    pub fields: String,

    /// Link target for the full query, shown when the list is truncated
    #[arg(long, value_name = "URL")]
    pub query_url: Option<String>,

    /// Issue browse URL prefix, the issue key is appended
    #[arg(long, default_value = "https://jira.example.com/browse", value_name = "URL")]
    pub browse_url: String,

    /// Bug detail URL prefix, the bug id is appended
    #[arg(long, default_value = "https://bugzilla.example.com/show_bug.cgi?id=", value_name = "URL")]
    pub bug_detail_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct PerforceArgs {
    /// Report title shown on the first page
    #[arg(long)]
    pub title: String,

    /// JSON export of the submitted-change records ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    pub records: PathBuf,

    /// Comma-separated branch names, shown in the title block
    #[arg(long)]
    pub branches: String,

    /// Comma-separated user names; the report keeps this order
    #[arg(long)]
    pub users: String,

    /// Check-in window start, epoch seconds
    #[arg(long, value_name = "EPOCH")]
    pub start_time: i64,

    /// Check-in window end, epoch seconds
    #[arg(long, value_name = "EPOCH")]
    pub end_time: i64,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.page_limit < 200 {
            return Err(format!(
                "--page-limit {} is too small to fit a banner, fences, and a table line",
                self.page_limit
            ));
        }

        match &self.command {
            ReportCommand::Jira(args) => {
                if args.fields.split(',').all(|f| f.trim().is_empty()) {
                    return Err("--fields must name at least one display column".to_string());
                }
            }
            ReportCommand::Perforce(args) => {
                if args.end_time < args.start_time {
                    return Err("--end-time is before --start-time".to_string());
                }
                if args.users.split(',').all(|u| u.trim().is_empty()) {
                    return Err("--users must name at least one user".to_string());
                }
            }
            ReportCommand::Bugzilla(_) => {}
        }

        Ok(())
    }
}
