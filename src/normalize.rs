/// Tabular data normalizer
///
/// This module turns a raw CSV export of a count query into the normalized
/// table model:
/// - parses the delimited text (quoted fields, doubled quotes, CRLF)
/// - detects the table shape from the header cell (simple / two-axis /
///   multi-axis) and partitions multi-axis exports at their split markers
/// - coerces every count cell to a non-negative integer, rejecting the
///   whole export on the first malformed cell
/// - computes the synthetic totals, drops zero-total rows, and sorts the
///   retained rows by total descending (stable)
///
/// Fetching the export is the caller's problem; this module only assumes
/// the bytes are already on disk or in memory.
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::types::{AxisNames, MultiPartition, NormalizedTable, ReportTable, TableRow};

lazy_static! {
    // Split marker of a multi-axis export, one per sub-table:
    //   Product: "vSAN""Component" / "Priority"
    static ref SPLIT_MARKER: Regex = Regex::new(r#"^(.*): "(.*)""(.*)" / "(.*)"$"#).unwrap();
}

/// Normalize a raw CSV export into one of the three table shapes.
///
/// Structural problems (malformed counts, ragged rows, missing split
/// markers) fail the whole report with a descriptive message; re-reading
/// the same bytes would not help, so nothing here retries.
pub fn normalize(raw: &str) -> Result<ReportTable, String> {
    let rows: Vec<Vec<String>> = parse_csv(raw)
        .into_iter()
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
        .collect();

    if rows.is_empty() {
        return Err("export is empty: no header row found".to_string());
    }

    let header_cell = rows[0].first().cloned().unwrap_or_default();
    if header_cell.contains('/') && header_cell.contains(':') {
        split_multi_axis(&rows)
    } else {
        single_table(&rows, &header_cell)
    }
}

/// Minimal CSV reader: comma-separated, `"`-quoted fields with doubled
/// quotes as escapes, tolerant of CRLF and a missing final newline.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn single_table(rows: &[Vec<String>], header_cell: &str) -> Result<ReportTable, String> {
    let columns: Vec<String> = rows[0][1..].iter().map(|c| c.trim().to_string()).collect();
    if columns.is_empty() {
        return Err(format!("export header \"{}\" has no count columns", header_cell));
    }
    let grid = &rows[1..];

    if header_cell.contains('/') {
        let (row_axis, column_axis) = split_axis_names(header_cell);
        let axes = AxisNames { row: row_axis, column: Some(column_axis) };
        Ok(ReportTable::TwoAxis(build_table(axes, columns, grid)?))
    } else {
        let axes = AxisNames { row: header_cell.trim().to_string(), column: None };
        let table = build_table(axes, columns, grid)?;
        if table.columns.len() == 1 {
            // One count column: the Total column would duplicate it.
            Ok(ReportTable::Simple(table))
        } else {
            Ok(ReportTable::TwoAxis(table))
        }
    }
}

fn split_multi_axis(rows: &[Vec<String>]) -> Result<ReportTable, String> {
    struct Marker {
        index: usize,
        multi_axis: String,
        multi_value: String,
        row_axis: String,
        column_axis: String,
    }

    let mut markers: Vec<Marker> = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let cell = row.first().map(String::as_str).unwrap_or("");
        if let Some(caps) = SPLIT_MARKER.captures(cell) {
            markers.push(Marker {
                index,
                multi_axis: caps[1].trim().to_string(),
                multi_value: caps[2].trim().to_string(),
                row_axis: caps[3].trim().to_string(),
                column_axis: caps[4].trim().to_string(),
            });
        }
    }

    if markers.first().map(|m| m.index) != Some(0) {
        return Err(format!(
            "multi-axis export does not start with a split marker line (header: \"{}\")",
            rows[0].first().map(String::as_str).unwrap_or("")
        ));
    }

    // The column labels ride on the first marker line; later markers leave
    // their remaining cells blank.
    let columns: Vec<String> = rows[0][1..].iter().map(|c| c.trim().to_string()).collect();
    if columns.is_empty() {
        return Err("multi-axis export header has no count columns".to_string());
    }

    debug!("multi-axis export with {} partitions", markers.len());

    let mut partitions = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|next| next.index).unwrap_or(rows.len());
        let grid = &rows[marker.index + 1..end];
        let axes =
            AxisNames { row: marker.row_axis.clone(), column: Some(marker.column_axis.clone()) };
        let table = build_table(axes, columns.clone(), grid)?;
        partitions.push(MultiPartition {
            label: format!("{}: {}", marker.multi_axis, marker.multi_value),
            axis: marker.multi_axis.clone(),
            value: marker.multi_value.clone(),
            table,
        });
    }
    Ok(ReportTable::MultiAxis(partitions))
}

/// Split a `"Vertical / Horizontal"` header into trimmed axis names.
fn split_axis_names(header: &str) -> (String, String) {
    let (row, column) = header.split_once('/').unwrap_or((header, ""));
    (clean_axis(row), clean_axis(column))
}

fn clean_axis(name: &str) -> String {
    name.replace('"', "").trim().to_string()
}

/// Coerce a parsed grid into a `NormalizedTable`: counts, totals,
/// zero-row filtering, and the descending stable sort.
fn build_table(
    axes: AxisNames,
    columns: Vec<String>,
    grid: &[Vec<String>],
) -> Result<NormalizedTable, String> {
    let mut labels: Vec<String> = Vec::new();
    let mut data: Vec<Vec<u64>> = Vec::new();

    for raw in grid {
        let label = raw.first().map(|c| c.trim().to_string()).unwrap_or_default();
        if raw.len() != columns.len() + 1 {
            return Err(format!(
                "row \"{}\" has {} cells, expected {} (one label plus {} counts)",
                label,
                raw.len(),
                columns.len() + 1,
                columns.len()
            ));
        }
        let mut counts = Vec::with_capacity(columns.len());
        for (i, cell) in raw[1..].iter().enumerate() {
            let count = cell.trim().parse::<u64>().map_err(|_| {
                format!(
                    "malformed count \"{}\" at row \"{}\", column \"{}\"",
                    cell.trim(),
                    label,
                    columns[i]
                )
            })?;
            counts.push(count);
        }
        labels.push(label);
        data.push(counts);
    }

    let (axes, columns, labels, data) = maybe_transpose(axes, columns, labels, data);

    // Totals are computed over every row, before zero-row filtering.
    let mut column_totals = vec![0u64; columns.len()];
    let mut rows: Vec<TableRow> = Vec::with_capacity(labels.len());
    for (label, counts) in labels.into_iter().zip(data.into_iter()) {
        for (total, count) in column_totals.iter_mut().zip(counts.iter()) {
            *total += count;
        }
        let total = counts.iter().sum();
        rows.push(TableRow { label, counts, total });
    }
    let grand_total = column_totals.iter().sum();

    rows.retain(|row| row.total > 0);
    // Vec::sort_by is stable: ties keep the export's original row order.
    rows.sort_by(|a, b| b.total.cmp(&a.total));

    Ok(NormalizedTable { axes, columns, rows, column_totals, grand_total })
}

/// Transpose a two-axis grid that is much wider than it is tall, so the
/// rendered table stays narrower than the transport's line budget allows.
fn maybe_transpose(
    axes: AxisNames,
    columns: Vec<String>,
    labels: Vec<String>,
    data: Vec<Vec<u64>>,
) -> (AxisNames, Vec<String>, Vec<String>, Vec<Vec<u64>>) {
    let Some(column_axis) = axes.column.clone() else {
        return (axes, columns, labels, data);
    };
    if labels.is_empty() || columns.len() <= 2 * labels.len() {
        return (axes, columns, labels, data);
    }

    debug!("transposing {}x{} grid to keep the table narrow", labels.len(), columns.len());

    let mut transposed = vec![vec![0u64; labels.len()]; columns.len()];
    for (r, row) in data.iter().enumerate() {
        for (c, count) in row.iter().enumerate() {
            transposed[c][r] = *count;
        }
    }
    let axes = AxisNames { row: column_axis, column: Some(axes.row) };
    (axes, labels, columns, transposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_handles_quotes_and_crlf() {
        let rows = parse_csv("a,\"b,c\",\"d\"\"e\"\r\n1,2,3\n");
        assert_eq!(rows, vec![vec!["a", "b,c", "d\"e"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn simple_table_drops_zero_rows_and_sorts_descending() {
        let csv = "Component,Number of bugs\nStorage,12\nNetwork,0\nCompute,45\n";
        let ReportTable::Simple(table) = normalize(csv).unwrap() else {
            panic!("expected a simple table");
        };
        let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Compute", "Storage"]);
        assert_eq!(table.rows[0].total, 45);
        assert_eq!(table.rows[1].total, 12);
        assert_eq!(table.column_totals, vec![57]);
        assert_eq!(table.grand_total, 57);
    }

    #[test]
    fn two_axis_totals_are_computed_before_filtering() {
        let csv = "Component / Priority,P0,P1\nvsan,1,2\nesx,0,0\nnet,3,0\n";
        let ReportTable::TwoAxis(table) = normalize(csv).unwrap() else {
            panic!("expected a two-axis table");
        };
        assert_eq!(table.axes.row, "Component");
        assert_eq!(table.axes.column.as_deref(), Some("Priority"));
        // esx is dropped but still contributed (zero) to the totals.
        assert_eq!(table.column_totals, vec![4, 2]);
        assert_eq!(table.grand_total, 6);
        let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["vsan", "net"]);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let csv = "Component / Priority,P0,P1\nalpha,1,2\nbeta,2,1\ngamma,4,0\n";
        let ReportTable::TwoAxis(table) = normalize(csv).unwrap() else {
            panic!("expected a two-axis table");
        };
        // alpha and beta tie at 3; the export order breaks the tie.
        let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["gamma", "alpha", "beta"]);
        for pair in table.rows.windows(2) {
            assert!(pair[0].total >= pair[1].total);
        }
    }

    #[test]
    fn malformed_count_is_a_hard_error() {
        let csv = "Component,Number of bugs\nStorage,12\nNetwork,n/a\n";
        let err = normalize(csv).unwrap_err();
        assert!(err.contains("n/a"), "unexpected message: {}", err);
        assert!(err.contains("Network"), "unexpected message: {}", err);
    }

    #[test]
    fn ragged_row_is_a_hard_error() {
        let csv = "Component / Priority,P0,P1\nvsan,1\n";
        let err = normalize(csv).unwrap_err();
        assert!(err.contains("vsan"), "unexpected message: {}", err);
    }

    #[test]
    fn empty_export_is_a_hard_error() {
        assert!(normalize("").is_err());
        assert!(normalize("\n\n").is_err());
    }

    #[test]
    fn multi_axis_export_partitions_at_split_markers() {
        let csv = concat!(
            "\"Product: \"\"vSAN\"\"\"\"Component\"\" / \"\"Priority\"\"\",P0,P1\n",
            "clom,1,0\n",
            "dom,0,0\n",
            "\"Product: \"\"ESX\"\"\"\"Component\"\" / \"\"Priority\"\"\",,\n",
            "vmfs,2,2\n",
        );
        let ReportTable::MultiAxis(parts) = normalize(csv).unwrap() else {
            panic!("expected a multi-axis table");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].label, "Product: vSAN");
        assert_eq!(parts[0].axis, "Product");
        assert_eq!(parts[0].value, "vSAN");
        assert_eq!(parts[0].table.axes.row, "Component");
        assert_eq!(parts[0].table.axes.column.as_deref(), Some("Priority"));
        assert_eq!(parts[0].table.rows.len(), 1); // dom dropped
        assert_eq!(parts[1].label, "Product: ESX");
        assert_eq!(parts[1].table.rows[0].total, 4);
    }

    #[test]
    fn wide_grid_is_transposed_and_axes_swap() {
        let csv = "Component / Priority,P0,P1,P2,P3,P4\nvsan,1,2,3,4,5\nesx,1,1,1,1,1\n";
        let ReportTable::TwoAxis(table) = normalize(csv).unwrap() else {
            panic!("expected a two-axis table");
        };
        // 5 columns > 2 * 2 rows, so the table flips.
        assert_eq!(table.axes.row, "Priority");
        assert_eq!(table.axes.column.as_deref(), Some("Component"));
        assert_eq!(table.columns, vec!["vsan", "esx"]);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.grand_total, 20);
        // P4 has the largest row total after the flip.
        assert_eq!(table.rows[0].label, "P4");
        assert_eq!(table.rows[0].counts, vec![5, 1]);
    }

    #[test]
    fn narrow_grid_is_not_transposed() {
        let csv = "Component / Priority,P0,P1\nvsan,1,2\nesx,3,4\n";
        let ReportTable::TwoAxis(table) = normalize(csv).unwrap() else {
            panic!("expected a two-axis table");
        };
        assert_eq!(table.axes.row, "Component");
    }

    #[test]
    fn all_rows_filtered_leaves_an_empty_table() {
        let csv = "Component,Number of bugs\nStorage,0\nNetwork,0\n";
        let table = normalize(csv).unwrap();
        assert!(table.is_empty());
    }
}
