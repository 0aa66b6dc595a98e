use super::{
    MetricName,
    MetricStatistics,
    ServerName,
};
use comfy_table::{
    presets,
    Attribute,
    Cell,
    CellAlignment,
    Color,
    ContentArrangement,
    Table,
};
use serde::{
    ser::SerializeMap,
    Serialize,
    Serializer,
};
use std::collections::BTreeMap;

/// Statistics of all metrics of one server, keyed by [`crate::metrics::MetricPath::last_segment`].
///
/// Two metric paths with the same last segment share a key. The walker inserts in discovery order, so the later path
/// wins and the earlier statistics are dropped.
pub type ServerStatistics = BTreeMap<MetricName, MetricStatistics>;

/// One server's part of the [`Report`]. Serializes as `{ "<server>": { "<metric>": {...}, ... } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntry {
    pub server: ServerName,
    pub statistics: ServerStatistics,
}

impl Serialize for ServerEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.server, &self.statistics)?;
        map.end()
    }
}

/// Final output of a run: one entry per server that survived metric discovery, in server discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<ServerEntry>,
}

impl Report {
    /// Shape already-resolved per-server results into a report. Order is taken as given.
    pub fn assemble(servers: impl IntoIterator<Item = (ServerName, ServerStatistics)>) -> Self {
        Self {
            entries: servers
                .into_iter()
                .map(|(server, statistics)| ServerEntry { server, statistics })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[ServerEntry] {
        &self.entries
    }

    pub fn get(&self, server: &str) -> Option<&ServerStatistics> {
        self.entries
            .iter()
            .find(|entry| entry.server == server)
            .map(|entry| &entry.statistics)
    }

    pub fn metric_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.statistics.len()).sum()
    }

    /// Indented JSON, two spaces per level.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Terminal rendering, one table per server.
    pub fn format_table(&self) -> String {
        if self.entries.is_empty() {
            return "No servers reported any statistics.\n".to_string();
        }

        let mut output = String::new();
        for entry in &self.entries {
            let mut table = Table::new();
            table
                .load_preset(presets::UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new(format!("🖥️  {}", entry.server))
                        .add_attribute(Attribute::Bold)
                        .fg(Color::Cyan),
                    Cell::new("Count").add_attribute(Attribute::Bold),
                    Cell::new("Sum").add_attribute(Attribute::Bold),
                    Cell::new("Average").add_attribute(Attribute::Bold),
                    Cell::new("Minimum").add_attribute(Attribute::Bold),
                    Cell::new("Maximum").add_attribute(Attribute::Bold),
                    Cell::new("Std Dev").add_attribute(Attribute::Bold),
                ]);

            if entry.statistics.is_empty() {
                table.add_row(vec![Cell::new("no metrics with data").fg(Color::Yellow)]);
            }

            for (metric, stats) in &entry.statistics {
                table.add_row(vec![
                    Cell::new(metric),
                    Cell::new(stats.count).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.3}", stats.sum)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.3}", stats.average)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.3}", stats.minimum)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.3}", stats.maximum)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:.3}", stats.standard_deviation)).set_alignment(CellAlignment::Right),
                ]);
            }

            output.push_str(&format!("\n{table}\n"));
        }
        output
    }
}
