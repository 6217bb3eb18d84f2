//! Config command implementation

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;
use velomap_core::config::ConfigSource;

use super::RunContext;
use crate::output::OutputWriter;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    value: String,
    source: ConfigSource,
}

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let entries: BTreeMap<String, ConfigEntry> = ctx
        .config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
        .collect();

    if output.is_json() {
        return output.result(&entries);
    }

    output.section("Effective configuration");
    output.table(
        entries
            .into_iter()
            .map(|(key, entry)| ConfigRow {
                key,
                value: entry.value,
                source: format!("{:?}", entry.source),
            })
            .collect(),
    );

    Ok(())
}
