//! Per-host summary table for run completion

use std::collections::BTreeMap;

use crate::event::HostStats;

#[cfg(feature = "summary-table")]
pub const HEADERS: [&str; 5] = ["Host", "Ok", "Changed", "Unreachable", "Failures"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub host: String,
    pub stats: HostStats,
}

/// One row per host, sorted by host name
pub fn summary_rows(hosts: &BTreeMap<String, HostStats>) -> Vec<SummaryRow> {
    hosts
        .iter()
        .map(|(host, stats)| SummaryRow {
            host: host.clone(),
            stats: *stats,
        })
        .collect()
}

/// Proof that table rendering was compiled in.
///
/// Only obtainable through [`TableRenderer::detect`]; without the
/// `summary-table` feature the type is uninhabited.
pub struct TableRenderer {
    #[cfg(not(feature = "summary-table"))]
    never: std::convert::Infallible,
}

impl TableRenderer {
    #[cfg(feature = "summary-table")]
    pub fn detect() -> Option<Self> {
        Some(Self {})
    }

    #[cfg(not(feature = "summary-table"))]
    pub fn detect() -> Option<Self> {
        None
    }

    #[cfg(feature = "summary-table")]
    pub fn render(&self, rows: &[SummaryRow]) -> String {
        use comfy_table::{Table, presets::ASCII_FULL};

        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        table.set_header(HEADERS);

        for row in rows {
            table.add_row(vec![
                row.host.clone(),
                row.stats.ok.to_string(),
                row.stats.changed.to_string(),
                row.stats.unreachable.to_string(),
                row.stats.failures.to_string(),
            ]);
        }

        table.to_string()
    }

    #[cfg(not(feature = "summary-table"))]
    pub fn render(&self, _rows: &[SummaryRow]) -> String {
        let never = self.never;
        match never {}
    }
}

#[cfg(all(test, feature = "summary-table"))]
mod tests {
    use super::*;

    fn hosts() -> BTreeMap<String, HostStats> {
        BTreeMap::from([
            (
                "web2".to_string(),
                HostStats {
                    ok: 4,
                    changed: 1,
                    ..HostStats::default()
                },
            ),
            (
                "db1".to_string(),
                HostStats {
                    ok: 2,
                    failures: 1,
                    ..HostStats::default()
                },
            ),
        ])
    }

    #[test]
    fn test_rows_sorted_by_host() {
        let rows = summary_rows(&hosts());
        let names: Vec<&str> = rows.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(names, vec!["db1", "web2"]);
        assert_eq!(rows[0].stats.failures, 1);
    }

    #[test]
    fn test_render_includes_headers_and_hosts() {
        let renderer = TableRenderer::detect().expect("summary-table feature enabled");
        let table = renderer.render(&summary_rows(&hosts()));

        for header in HEADERS {
            assert!(table.contains(header), "missing header {header}");
        }
        let lines: Vec<&str> = table.lines().collect();
        let db_pos = lines.iter().position(|l| l.contains("db1")).expect("db1 row");
        let web_pos = lines.iter().position(|l| l.contains("web2")).expect("web2 row");
        assert!(db_pos < web_pos);

        let cells: Vec<&str> = lines[db_pos].split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
        assert_eq!(cells, vec!["db1", "2", "0", "0", "1"]);
    }

    #[test]
    fn test_render_empty_run() {
        let renderer = TableRenderer::detect().expect("summary-table feature enabled");
        let table = renderer.render(&[]);
        assert!(table.contains("Host"));
    }
}
