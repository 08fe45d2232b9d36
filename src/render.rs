/// Table renderer - turns a normalized table into aligned text lines
///
/// This module handles all rendering concerns for count tables:
/// - derivation of the per-cell link-cache key from the axis names
/// - display-width-aware padding and truncation (wide Unicode labels)
/// - link markup (`<url|count>`) with the column padding widened so the
///   *visible* columns still align inside a fixed-width code block
///
/// It accepts a `NormalizedTable` plus an already-resolved link mapping;
/// fencing and pagination are the caller's job.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::NormalizedTable;

lazy_static! {
    // Axis name as it appears in an export header -> query parameter name.
    static ref AXIS_PARAMS: HashMap<&'static str, &'static str> = [
        ("Assignee", "assigned_to"),
        ("Category", "category"),
        ("Component", "component"),
        ("Guest OS", "guest_op_sys"),
        ("Hardware", "rep_platform"),
        ("Host OS", "host_op_sys"),
        ("Priority", "priority"),
        ("Product", "product"),
        ("QA Contact", "qa_contact"),
        ("Reporter", "reporter"),
        ("Resolution", "resolution"),
        ("Severity", "bug_severity"),
        ("Status", "bug_status"),
        ("Votes", "votes"),
    ]
    .iter()
    .copied()
    .collect();
}

/// Query parameter name for an axis. Unknown axis names fall back to the
/// lower-cased name with spaces replaced by underscores.
pub fn axis_param(axis: &str) -> String {
    match AXIS_PARAMS.get(axis) {
        Some(param) => (*param).to_string(),
        None => axis.to_lowercase().replace(' ', "_"),
    }
}

/// Link-cache key derivation for one table.
///
/// A key is the query-string fragment that narrows the report's scope
/// query down to one row, one column, or one cell. The synthetic `Total`
/// row/column is special-cased: `Total` against `Total` is the bare key
/// `"Total"` (the scope itself), `Total` against a data label uses the
/// other axis's form alone.
#[derive(Debug, Clone)]
pub struct CellKeys {
    row_param: String,
    column_param: String,
    multi_prefix: String,
}

impl CellKeys {
    /// Build the key derivation for `table`, optionally scoped to one
    /// multi-axis partition (`(axis, value)`).
    pub fn new(table: &NormalizedTable, multi: Option<(&str, &str)>) -> Self {
        CellKeys {
            row_param: axis_param(&table.axes.row),
            column_param: table.axes.column.as_deref().map(axis_param).unwrap_or_default(),
            multi_prefix: multi
                .map(|(axis, value)| format!("{}={}&", axis_param(axis), value))
                .unwrap_or_default(),
        }
    }

    pub fn key(
        &self,
        row_label: &str,
        row_is_total: bool,
        column_label: &str,
        column_is_total: bool,
    ) -> String {
        if row_is_total && column_is_total {
            return "Total".to_string();
        }
        if row_is_total {
            return format!("{}{}={}", self.multi_prefix, self.column_param, column_label);
        }
        if column_is_total {
            return format!("{}{}={}", self.multi_prefix, self.row_param, row_label);
        }
        format!(
            "{}{}={}&{}={}",
            self.multi_prefix, self.row_param, row_label, self.column_param, column_label
        )
    }
}

/// Collect the link-cache key of every nonzero cell, including the
/// synthetic totals. Zero cells render as a placeholder and never link.
pub fn collect_link_keys(
    table: &NormalizedTable,
    keys: &CellKeys,
    simple: bool,
    into: &mut BTreeSet<String>,
) {
    for row in &table.rows {
        if simple {
            into.insert(keys.key(&row.label, false, "", true));
            continue;
        }
        for (c, count) in row.counts.iter().enumerate() {
            if *count > 0 {
                into.insert(keys.key(&row.label, false, &table.columns[c], false));
            }
        }
        if row.total > 0 {
            into.insert(keys.key(&row.label, false, "Total", true));
        }
    }
    if !simple {
        for (c, total) in table.column_totals.iter().enumerate() {
            if *total > 0 {
                into.insert(keys.key("Total", true, &table.columns[c], false));
            }
        }
    }
    if table.grand_total > 0 {
        into.insert("Total".to_string());
    }
}

/// Render one table into aligned lines: a header line, one line per
/// retained row, and the `Total` row last.
///
/// `simple` renders the two-column list form (label, count) used for
/// one-axis tables; otherwise the full grid with a `Total` column.
pub fn render_table(
    table: &NormalizedTable,
    keys: &CellKeys,
    links: &BTreeMap<String, String>,
    simple: bool,
) -> Vec<String> {
    // (label, is_total) of every rendered count column.
    let columns: Vec<(String, bool)> = if simple {
        vec![(table.columns[0].clone(), true)]
    } else {
        table
            .columns
            .iter()
            .map(|c| (c.clone(), false))
            .chain(std::iter::once(("Total".to_string(), true)))
            .collect()
    };

    // (label, is_total, counts) of every rendered row, Total last.
    let mut rows: Vec<(&str, bool, Vec<u64>)> = table
        .rows
        .iter()
        .map(|row| {
            let mut counts = row.counts.clone();
            if !simple {
                counts.push(row.total);
            }
            (row.label.as_str(), false, counts)
        })
        .collect();
    let mut total_counts = table.column_totals.clone();
    if !simple {
        total_counts.push(table.grand_total);
    }
    rows.push(("Total", true, total_counts));

    let header = table.axes.header();
    let label_width = rows
        .iter()
        .map(|(label, _, _)| display_width(label))
        .chain(std::iter::once(display_width(&header)))
        .max()
        .unwrap_or(0);

    // Visible column width: the widest of the header and the bare counts.
    // Link markup is invisible in the transport, so it pads on top.
    let visible: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(c, (label, _))| {
            rows.iter()
                .map(|(_, _, counts)| display_width(&bare_cell(counts[c])))
                .chain(std::iter::once(display_width(label)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut line = format!("{}   ", pad_right(&header, label_width));
    for (c, (label, _)) in columns.iter().enumerate() {
        line.push_str(&pad_left(label, visible[c]));
        line.push_str("  ");
    }
    lines.push(line.trim_end().to_string());

    for (label, row_is_total, counts) in &rows {
        let mut line = format!("{}   ", pad_right(label, label_width));
        for (c, (column_label, column_is_total)) in columns.iter().enumerate() {
            let count = counts[c];
            let bare = bare_cell(count);
            let key = keys.key(label, *row_is_total, column_label, *column_is_total);
            let link = links.get(&key).map(String::as_str).filter(|url| !url.is_empty());
            let (text, extra) = match link {
                Some(url) if count > 0 => {
                    (format!("<{}|{}>", url, count), display_width(url) + 3)
                }
                _ => (bare, 0),
            };
            line.push_str(&pad_left(&text, visible[c] + extra));
            line.push_str("  ");
        }
        lines.push(line.trim_end().to_string());
    }

    lines
}

fn bare_cell(count: u64) -> String {
    if count == 0 { "-".to_string() } else { count.to_string() }
}

//
// Text formatting utilities
//

/// Display width of a string, accounting for wide Unicode characters.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Left-pad to `width` display columns. Wider strings pass through.
pub fn pad_left(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width { s.to_string() } else { format!("{}{}", " ".repeat(width - w), s) }
}

/// Right-pad to `width` display columns. Wider strings pass through.
pub fn pad_right(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width { s.to_string() } else { format!("{}{}", s, " ".repeat(width - w)) }
}

/// Truncate to `width` display columns with a `...` marker, then pad to
/// exactly `width`.
pub fn truncate_with_padding(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w <= width {
        return pad_right(s, width);
    }

    let target = if width >= 3 { width - 3 } else { width };
    let mut result = String::new();
    let mut current = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(1);
        if current + cw > target {
            break;
        }
        result.push(c);
        current += cw;
    }
    if width >= 3 {
        result.push_str("...");
        current += 3;
    }
    pad_right(&result, width.max(current))
}

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;
