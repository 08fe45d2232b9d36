//! Output envelope for the messaging transport.
//!
//! The scheduler that invokes a report run reads stdout and forwards it
//! to the chat transport. The contract is a single JSON object holding
//! the ordered page list and an `isEmpty` flag (so the caller can route
//! empty reports differently); `--plain` swaps in a human-readable dump.

use serde_json::json;

/// Final result of one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutput {
    pub pages: Vec<String>,
    pub is_empty: bool,
}

impl ReportOutput {
    /// A one-page report, e.g. a "no data" message.
    pub fn single(page: String, is_empty: bool) -> Self {
        ReportOutput { pages: vec![page], is_empty }
    }

    /// The JSON envelope the scheduler consumes.
    pub fn to_json(&self) -> String {
        json!({
            "messages": self.pages,
            "isEmpty": self.is_empty,
        })
        .to_string()
    }

    /// Plain-text rendering for a human running the tool by hand.
    pub fn to_plain(&self) -> String {
        self.pages.join("\n\n")
    }
}
