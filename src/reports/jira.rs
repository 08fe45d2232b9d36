//! Jira issue-list report driver.
//!
//! Input is a JSON array of flattened issue records, one object per
//! issue with string-valued fields. The report is a list-style table:
//! one line per issue, columns chosen by `--fields`, the issue key (and
//! a non-empty bug id) rendered as links. Free-text columns are held to
//! a fixed width so one rambling summary cannot blow up the layout.

use serde::Deserialize;

use crate::cli::JiraArgs;
use crate::config::ReportContext;
use crate::paginate::paginate;
use crate::render::{display_width, pad_right, truncate_with_padding};
use crate::transport::ReportOutput;

/// Free-text columns are clipped to this many display columns.
pub const SUMMARY_MAX_LENGTH: usize = 60;

/// At most this many issues render; the count line points at the full
/// query for the rest.
pub const MAX_DISPLAY_ISSUES: usize = 50;

/// Display column order and headers. `--fields` selects a subset; the
/// order here wins regardless of the order given on the command line.
const DISPLAY_FIELDS: &[(&str, &str)] = &[
    ("key", "Jira ID"),
    ("issuetype", "Type"),
    ("priority", "Pri"),
    ("status", "Status"),
    ("assignee", "Assignee"),
    ("labels", "Labels"),
    ("project", "Project"),
    ("duedate", "ETA"),
    ("reporter", "Reporter"),
    ("created", "CreatedDate"),
    ("updated", "UpdatedDate"),
    ("components", "Components"),
    ("bugId", "Bug"),
    ("bugStatus", "Bug Status"),
    ("description", "Desc"),
    ("summary", "Summary"),
];

/// One flattened issue record from the export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub issuetype: String,
    pub priority: String,
    pub status: String,
    pub assignee: String,
    pub labels: String,
    pub project: String,
    pub duedate: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
    pub components: String,
    #[serde(rename = "bugId")]
    pub bug_id: String,
    #[serde(rename = "bugStatus")]
    pub bug_status: String,
    pub description: String,
    pub summary: String,
}

impl JiraIssue {
    fn field(&self, name: &str) -> &str {
        match name {
            "id" => &self.id,
            "key" => &self.key,
            "issuetype" => &self.issuetype,
            "priority" => &self.priority,
            "status" => &self.status,
            "assignee" => &self.assignee,
            "labels" => &self.labels,
            "project" => &self.project,
            "duedate" => &self.duedate,
            "reporter" => &self.reporter,
            "created" => &self.created,
            "updated" => &self.updated,
            "components" => &self.components,
            "bugId" => &self.bug_id,
            "bugStatus" => &self.bug_status,
            "description" => &self.description,
            "summary" => &self.summary,
            _ => "",
        }
    }
}

pub fn run(ctx: &ReportContext, args: &JiraArgs) -> Result<ReportOutput, String> {
    let raw = super::read_input(&args.issues)?;
    let issues: Vec<JiraIssue> = serde_json::from_str(&raw)
        .map_err(|e| format!("issue export is not a JSON list of issues: {}", e))?;
    let issues: Vec<JiraIssue> = issues.into_iter().map(sanitize).collect();

    let title = format!("*Title: {}*", args.title);
    if issues.is_empty() {
        return Ok(ReportOutput::single(format!("{}\nNo issues currently.", title), true));
    }

    let fields = select_fields(&args.fields)?;
    let total = issues.len();
    let shown = &issues[..total.min(MAX_DISPLAY_ISSUES)];

    let lines = render_issue_list(shown, &fields, &args.browse_url, &args.bug_detail_url);
    let mut pages = paginate(&lines, &ctx.page_options());
    pages[0] = format!("{}\n{}\n{}", title, count_line(total, args.query_url.as_deref()), pages[0]);
    Ok(ReportOutput { pages, is_empty: false })
}

/// Free text can carry newlines and fence markers that would break the
/// fixed-width block; flatten them before rendering.
fn sanitize(mut issue: JiraIssue) -> JiraIssue {
    for text in [&mut issue.summary, &mut issue.description] {
        *text = text.replace(['\n', '\r'], " ").replace("```", "");
    }
    issue
}

/// Resolve `--fields` against the display table, keeping table order.
fn select_fields(requested: &str) -> Result<Vec<(&'static str, &'static str)>, String> {
    let names: Vec<&str> =
        requested.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();

    for name in &names {
        if !DISPLAY_FIELDS.iter().any(|(field, _)| field == name) {
            let known: Vec<&str> = DISPLAY_FIELDS.iter().map(|(field, _)| *field).collect();
            return Err(format!(
                "unknown display field \"{}\" (known: {})",
                name,
                known.join(", ")
            ));
        }
    }

    Ok(DISPLAY_FIELDS.iter().copied().filter(|(field, _)| names.contains(field)).collect())
}

fn count_line(total: usize, query_url: Option<&str>) -> String {
    let mut line = if total == 1 {
        "One issue found".to_string()
    } else {
        format!("{} issues found", total)
    };
    if total > MAX_DISPLAY_ISSUES {
        line.push_str(&format!(". This report only shows the first {} issues", MAX_DISPLAY_ISSUES));
        if let Some(url) = query_url {
            line.push_str(&format!("; view the rest on <{}|Jira Page>", url));
        }
        line.push('.');
    } else if let Some(url) = query_url {
        line.push_str(&format!(" on <{}|Jira Page>.", url));
    } else {
        line.push('.');
    }
    line
}

fn render_issue_list(
    issues: &[JiraIssue],
    fields: &[(&str, &str)],
    browse_url: &str,
    bug_detail_url: &str,
) -> Vec<String> {
    // Column width: fixed for free text, content-driven otherwise.
    let widths: Vec<usize> = fields
        .iter()
        .map(|(field, header)| {
            if matches!(*field, "summary" | "description") {
                SUMMARY_MAX_LENGTH
            } else {
                issues
                    .iter()
                    .map(|issue| display_width(issue.field(field)))
                    .chain(std::iter::once(display_width(header)))
                    .max()
                    .unwrap_or(0)
            }
        })
        .collect();

    let browse_base = browse_url.trim_end_matches('/');

    let mut lines = Vec::with_capacity(issues.len() + 1);
    let header: String = fields
        .iter()
        .zip(&widths)
        .map(|((_, header), width)| pad_right(header, *width))
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(header.trim_end().to_string());

    for issue in issues {
        let mut cells = Vec::with_capacity(fields.len());
        for ((field, _), width) in fields.iter().zip(&widths) {
            let value = issue.field(field);
            let cell = match *field {
                // Linked cells pad past the column width by exactly the
                // invisible markup, keeping the visible columns aligned.
                "key" => {
                    let url = format!("{}/{}", browse_base, value);
                    pad_right(&format!("<{}|{}>", url, value), width + display_width(&url) + 3)
                }
                "bugId" if !value.is_empty() => {
                    let url = format!("{}{}", bug_detail_url, value);
                    pad_right(&format!("<{}|{}>", url, value), width + display_width(&url) + 3)
                }
                "summary" | "description" => truncate_with_padding(value, *width),
                _ => pad_right(value, *width),
            };
            cells.push(cell);
        }
        lines.push(cells.join(" ").trim_end().to_string());
    }
    lines
}
