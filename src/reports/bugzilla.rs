//! Bugzilla tabular report driver.
//!
//! Input is the CSV export of a count query: one-axis, two-axis, or a
//! multi-axis export carrying one sub-table per value of a third axis.
//! When a scope URL is given, every nonzero cell gets a drill-down link
//! resolved through the persisted short-link cache; the long URL for a
//! key is the scope query narrowed by that key's parameters.

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::cli::BugzillaArgs;
use crate::config::ReportContext;
use crate::normalize::normalize;
use crate::paginate::paginate;
use crate::render::{CellKeys, collect_link_keys, render_table};
use crate::transport::ReportOutput;
use crate::types::ReportTable;

pub fn run(ctx: &ReportContext, args: &BugzillaArgs) -> Result<ReportOutput, String> {
    let raw = super::read_input(&args.csv)?;
    let table = normalize(&raw)?;
    let title = format!("*Title: {}*", args.title);

    if table.is_empty() {
        return Ok(ReportOutput::single(format!("{}\nNo bugs currently.", title), true));
    }

    let links = match &args.scope_url {
        Some(scope) => resolve_table_links(ctx, scope, &table),
        None => BTreeMap::new(),
    };

    let lines = render_report(&table, &links);
    let mut pages = paginate(&lines, &ctx.page_options());
    pages[0] = format!("{}\n{}", title, pages[0]);
    Ok(ReportOutput { pages, is_empty: false })
}

/// Render every partition of the table, with its label line when the
/// export is multi-axis. Partitions emptied by zero-row filtering are
/// skipped entirely.
fn render_report(table: &ReportTable, links: &BTreeMap<String, String>) -> Vec<String> {
    let mut lines = Vec::new();
    match table {
        ReportTable::Simple(t) => {
            lines.extend(render_table(t, &CellKeys::new(t, None), links, true));
        }
        ReportTable::TwoAxis(t) => {
            lines.extend(render_table(t, &CellKeys::new(t, None), links, false));
        }
        ReportTable::MultiAxis(parts) => {
            for part in parts {
                if part.table.is_empty() {
                    continue;
                }
                let keys = CellKeys::new(&part.table, Some((&part.axis, &part.value)));
                lines.push(part.label.clone());
                lines.extend(render_table(&part.table, &keys, links, false));
            }
        }
    }
    lines
}

/// Collect every categorical key the rendered table can link, build the
/// long drill-down URL for each, and resolve them through the cache.
///
/// The key `"Total"` is the scope query itself; every other key narrows
/// the scope by its own parameters.
fn resolve_table_links(
    ctx: &ReportContext,
    scope: &str,
    table: &ReportTable,
) -> BTreeMap<String, String> {
    let mut keys = BTreeSet::new();
    match table {
        ReportTable::Simple(t) => {
            collect_link_keys(t, &CellKeys::new(t, None), true, &mut keys);
        }
        ReportTable::TwoAxis(t) => {
            collect_link_keys(t, &CellKeys::new(t, None), false, &mut keys);
        }
        ReportTable::MultiAxis(parts) => {
            for part in parts {
                let cell_keys = CellKeys::new(&part.table, Some((&part.axis, &part.value)));
                collect_link_keys(&part.table, &cell_keys, false, &mut keys);
            }
        }
    }

    let wanted: BTreeMap<String, String> = keys
        .into_iter()
        .map(|key| {
            let long_url =
                if key == "Total" { scope.to_string() } else { format!("{}&{}", scope, key) };
            (key, long_url)
        })
        .collect();

    info!("resolving {} drill-down links for the report scope", wanted.len());
    ctx.resolve_links(scope, &wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliArgs, ReportCommand};
    use crate::config::build_context;
    use std::io::Write;
    use std::path::PathBuf;

    fn context(cache_dir: PathBuf) -> ReportContext {
        let args = CliArgs {
            command: ReportCommand::Bugzilla(BugzillaArgs {
                title: "unused".to_string(),
                csv: PathBuf::from("-"),
                scope_url: None,
            }),
            cache_dir: Some(cache_dir),
            shorten_api: None,
            shorten_user: "svc.reportbot".to_string(),
            page_limit: 3900,
            plain: false,
        };
        build_context(&args).unwrap()
    }

    fn write_export(dir: &tempfile::TempDir, csv: &str) -> PathBuf {
        let path = dir.path().join("export.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(csv.as_bytes()).unwrap();
        path
    }

    #[test]
    fn tabular_report_renders_inside_a_fence_with_title() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = write_export(&dir, "Component,Number of bugs\nStorage,12\nNetwork,0\nCompute,45\n");
        let args = BugzillaArgs { title: "daily bugs".to_string(), csv, scope_url: None };

        let out = run(&context(dir.path().join("cache")), &args).unwrap();
        assert!(!out.is_empty);
        assert_eq!(out.pages.len(), 1);
        let page = &out.pages[0];
        assert!(page.starts_with("*Title: daily bugs*\n```\n"));
        assert!(page.contains("Compute"));
        assert!(page.contains("45"));
        // Zero-total rows never reach the rendered output.
        assert!(!page.contains("Network"));
    }

    #[test]
    fn empty_export_reports_no_bugs() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = write_export(&dir, "Component,Number of bugs\nStorage,0\n");
        let args = BugzillaArgs { title: "daily bugs".to_string(), csv, scope_url: None };

        let out = run(&context(dir.path().join("cache")), &args).unwrap();
        assert!(out.is_empty);
        assert_eq!(out.pages, vec!["*Title: daily bugs*\nNo bugs currently.".to_string()]);
    }

    #[test]
    fn malformed_export_fails_the_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = write_export(&dir, "Component,Number of bugs\nStorage,many\n");
        let args = BugzillaArgs { title: "daily bugs".to_string(), csv, scope_url: None };

        let err = run(&context(dir.path().join("cache")), &args).unwrap_err();
        assert!(err.contains("many"), "unexpected error: {}", err);
    }

    #[test]
    fn multi_axis_report_carries_partition_labels() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = write_export(
            &dir,
            concat!(
                "\"Product: \"\"vSAN\"\"\"\"Component\"\" / \"\"Priority\"\"\",P0,P1\n",
                "clom,1,0\n",
                "\"Product: \"\"ESX\"\"\"\"Component\"\" / \"\"Priority\"\"\",,\n",
                "vmfs,2,2\n",
            ),
        );
        let args = BugzillaArgs { title: "by product".to_string(), csv, scope_url: None };

        let out = run(&context(dir.path().join("cache")), &args).unwrap();
        let page = &out.pages[0];
        assert!(page.contains("Product: vSAN"));
        assert!(page.contains("Product: ESX"));
    }

    #[test]
    fn scope_url_persists_keys_even_without_a_shortener() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let csv = write_export(&dir, "Component,Number of bugs\nStorage,2\n");
        let args = BugzillaArgs {
            title: "daily bugs".to_string(),
            csv,
            scope_url: Some("https://bugzilla.example.com/report.cgi?x=1".to_string()),
        };

        let out = run(&context(cache_dir.clone()), &args).unwrap();
        // No shortener endpoint: bare counts, but the keys were cached.
        assert!(!out.pages[0].contains('<'));
        let entries: Vec<_> = std::fs::read_dir(&cache_dir).unwrap().collect();
        assert!(!entries.is_empty(), "cache directory should hold the scope file");
    }
}
