//! Per-source report drivers.
//!
//! Each driver consumes an already-fetched export (CSV or JSON file, or
//! stdin), runs it through the normalize / link / render / paginate
//! pipeline, and returns the transport-ready `ReportOutput`. Fetching,
//! scraping, and login against the live systems happen upstream.

pub mod bugzilla;
pub mod jira;
pub mod perforce;

use std::fs;
use std::io::Read;
use std::path::Path;

/// Read an export file; `-` reads stdin.
pub(crate) fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("cannot read export from stdin: {}", e))?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
    }
}
