//! Perforce submitted-changes report driver.
//!
//! Input is a JSON array of change records for the reporting window,
//! already itemized upstream. The report groups changes per requested
//! user: the first line of a group carries the user name, the rest are
//! indented continuation lines, newest change first.

use chrono::FixedOffset;
use log::debug;
use serde::Deserialize;

use crate::cli::PerforceArgs;
use crate::config::ReportContext;
use crate::paginate::paginate;
use crate::render::{pad_left, pad_right, truncate_with_padding};
use crate::transport::ReportOutput;

const USER_NAME_MAX_LENGTH: usize = 20;
const SUMMARY_MAX_LENGTH: usize = 80;
const CLN_WIDTH: usize = 10;
const TIME_WIDTH: usize = 22;
const BUG_WIDTH: usize = 16;

/// One submitted change from the export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangeRecord {
    pub cln: u64,
    pub user: String,
    pub time: String,
    #[serde(rename = "bugId")]
    pub bug_id: String,
    pub summary: String,
}

pub fn run(ctx: &ReportContext, args: &PerforceArgs) -> Result<ReportOutput, String> {
    let raw = super::read_input(&args.records)?;
    let records: Vec<ChangeRecord> = serde_json::from_str(&raw)
        .map_err(|e| format!("change export is not a JSON list of records: {}", e))?;

    let users: Vec<&str> =
        args.users.split(',').map(str::trim).filter(|u| !u.is_empty()).collect();
    let branches: Vec<&str> =
        args.branches.split(',').map(str::trim).filter(|b| !b.is_empty()).collect();

    let title = format!(
        "*Title: {}*\nBranch: {}\nCheckin Time(PST): {} --- {}",
        args.title,
        branches.join(" & "),
        format_checkin_time(args.start_time)?,
        format_checkin_time(args.end_time)?,
    );

    let (lines, is_empty) = render_changes(&records, &users);
    let mut pages = paginate(&lines, &ctx.page_options());
    pages[0] = format!("{}\n{}", sanitize(&title), pages[0]);
    Ok(ReportOutput { pages: pages.into_iter().map(|p| sanitize(&p)).collect(), is_empty })
}

/// Perforce reports in UTC-7 regardless of the host timezone.
fn format_checkin_time(epoch: i64) -> Result<String, String> {
    let utc7 = FixedOffset::west_opt(7 * 3600).expect("static offset is in range");
    let time = chrono::DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| format!("epoch {} is out of range", epoch))?;
    Ok(time.with_timezone(&utc7).format("%Y/%m/%d:%H:%M:%S").to_string())
}

/// Quotes break the calling shell's argument passing; strip them.
fn sanitize(text: &str) -> String {
    text.replace(['\'', '"'], "")
}

fn render_changes(records: &[ChangeRecord], users: &[&str]) -> (Vec<String>, bool) {
    let mut grouped: Vec<(&str, Vec<&ChangeRecord>)> = users
        .iter()
        .map(|user| {
            let mut changes: Vec<&ChangeRecord> =
                records.iter().filter(|r| r.user == *user).collect();
            changes.sort_by(|a, b| b.cln.cmp(&a.cln));
            (*user, changes)
        })
        .collect();
    grouped.retain(|(_, changes)| !changes.is_empty());

    let skipped = records.len() - grouped.iter().map(|(_, c)| c.len()).sum::<usize>();
    if skipped > 0 {
        debug!("{} records belong to users outside the report", skipped);
    }

    if grouped.is_empty() {
        return (vec!["No Changes.".to_string()], true);
    }

    // The user column grows to the longest reporting name, capped; names
    // over the cap are clipped with "...".
    let name_width = grouped
        .iter()
        .map(|(user, _)| user.chars().count())
        .max()
        .unwrap_or(0)
        .clamp("User".len(), USER_NAME_MAX_LENGTH);

    let mut lines = Vec::new();
    lines.push(format!(
        "{}  --  {}{}{}{}",
        pad_left("User", name_width),
        pad_right("CLN", CLN_WIDTH),
        pad_right("Time", TIME_WIDTH),
        pad_right("Bug Number", BUG_WIDTH),
        "Summary"
    ));

    for (user, changes) in &grouped {
        for (i, change) in changes.iter().enumerate() {
            let summary = if change.summary.chars().count() < SUMMARY_MAX_LENGTH {
                change.summary.clone()
            } else {
                truncate_with_padding(&change.summary, SUMMARY_MAX_LENGTH).trim_end().to_string()
            };
            let tail = format!(
                "{}{}{}{}",
                pad_right(&change.cln.to_string(), CLN_WIDTH),
                pad_right(&change.time, TIME_WIDTH),
                pad_right(&change.bug_id, BUG_WIDTH),
                summary
            );
            if i == 0 {
                let shown = truncate_with_padding(user, name_width);
                lines.push(format!("{}  --  {}", pad_left(shown.trim_end(), name_width), tail));
            } else {
                lines.push(format!("{}{}", " ".repeat(name_width + 6), tail));
            }
        }
    }
    (lines, false)
}
