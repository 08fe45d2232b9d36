/// Core data structures for normalized report tables
///
/// This module defines the table model produced by the normalizer and
/// consumed by the renderer: row/column labels, per-cell counts, and the
/// synthetic totals that every report table carries.

/// Semantic names of the table axes, as they appear in the export header.
///
/// `column` is `None` for one-axis count tables ("simple" tables), where
/// the only data column is the count itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisNames {
    pub row: String,
    pub column: Option<String>,
}

impl AxisNames {
    /// Header text for the label column: `"Component/Priority"` for a
    /// two-axis table, the bare row axis name otherwise.
    pub fn header(&self) -> String {
        match &self.column {
            Some(column) => format!("{}/{}", self.row, column),
            None => self.row.clone(),
        }
    }
}

/// One retained data row: its category label, the per-column counts, and
/// the row total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub counts: Vec<u64>,
    pub total: u64,
}

/// A normalized count table.
///
/// `rows` holds only the retained data rows (zero-total rows dropped,
/// sorted by total descending, original order preserved on ties). The
/// synthetic `Total` row is not stored as a row: `column_totals` and
/// `grand_total` are computed over *all* rows before filtering, and the
/// renderer appends the `Total` row from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub axes: AxisNames,
    /// Data column labels, without the synthetic `Total` column.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Per-column sums over all rows, computed before zero-row filtering.
    pub column_totals: Vec<u64>,
    pub grand_total: u64,
}

impl NormalizedTable {
    /// True when no data row survived zero-total filtering.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One sub-table of a multi-axis export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPartition {
    /// Display label, e.g. `"Product: vSAN"`.
    pub label: String,
    /// Axis name of the third dimension, e.g. `"Product"`.
    pub axis: String,
    /// This partition's value on that axis, e.g. `"vSAN"`.
    pub value: String,
    pub table: NormalizedTable,
}

/// The three table shapes an export can normalize into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTable {
    /// One count column; the `Total` column is dropped after sorting.
    Simple(NormalizedTable),
    /// Row axis and column axis, named `"Vertical/Horizontal"` in the header.
    TwoAxis(NormalizedTable),
    /// Several two-axis sub-tables, one per value of a third axis.
    MultiAxis(Vec<MultiPartition>),
}

impl ReportTable {
    /// True when every partition lost all of its rows to filtering.
    pub fn is_empty(&self) -> bool {
        match self {
            ReportTable::Simple(t) | ReportTable::TwoAxis(t) => t.is_empty(),
            ReportTable::MultiAxis(parts) => parts.iter().all(|p| p.table.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<TableRow>) -> NormalizedTable {
        NormalizedTable {
            axes: AxisNames { row: "Component".to_string(), column: None },
            columns: vec!["Number of bugs".to_string()],
            column_totals: vec![rows.iter().map(|r| r.total).sum()],
            grand_total: rows.iter().map(|r| r.total).sum(),
            rows,
        }
    }

    #[test]
    fn axis_header_joins_two_axes() {
        let axes = AxisNames { row: "Component".to_string(), column: Some("Priority".to_string()) };
        assert_eq!(axes.header(), "Component/Priority");
    }

    #[test]
    fn axis_header_single_axis() {
        let axes = AxisNames { row: "Component".to_string(), column: None };
        assert_eq!(axes.header(), "Component");
    }

    #[test]
    fn empty_table_after_filtering() {
        assert!(table(vec![]).is_empty());
        assert!(!table(vec![TableRow { label: "vsan".to_string(), counts: vec![3], total: 3 }]).is_empty());
    }

    #[test]
    fn multi_axis_empty_only_when_all_partitions_empty() {
        let empty = MultiPartition {
            label: "Product: a".to_string(),
            axis: "Product".to_string(),
            value: "a".to_string(),
            table: table(vec![]),
        };
        let full = MultiPartition {
            label: "Product: b".to_string(),
            axis: "Product".to_string(),
            value: "b".to_string(),
            table: table(vec![TableRow { label: "x".to_string(), counts: vec![1], total: 1 }]),
        };
        assert!(ReportTable::MultiAxis(vec![empty.clone()]).is_empty());
        assert!(!ReportTable::MultiAxis(vec![empty, full]).is_empty());
    }
}
