//! Status command implementation

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use velomap_core::models::Crs;

use super::RunContext;
use crate::output::OutputWriter;

#[derive(Debug, Serialize, Tabled)]
struct DatasetRow {
    #[tabled(rename = "Dataset")]
    dataset: String,
    #[tabled(rename = "Features")]
    features: usize,
    #[tabled(rename = "CRS")]
    crs: String,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    data_dir: String,
    snapshot_day: String,
    fetched_at: String,
    metric_crs: String,
    datasets: Vec<DatasetRow>,
}

fn crs_label(crs: Option<&Crs>) -> String {
    crs.map(Crs::label).unwrap_or_else(|| "untagged".to_string())
}

pub async fn execute(ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;

    let crs_of = |dataset: &str| -> String {
        match dataset {
            "stations" => crs_label(base.stations.crs()),
            "city" => crs_label(base.city.crs()),
            "canton" => crs_label(base.canton.crs()),
            "districts" => crs_label(base.districts.crs()),
            "rivers" => crs_label(base.rivers.crs()),
            "free_bikes" => crs_label(base.free_bikes.crs()),
            _ => "-".to_string(),
        }
    };
    let datasets: Vec<DatasetRow> = base
        .summary()
        .into_iter()
        .map(|(dataset, features)| DatasetRow {
            dataset: dataset.to_string(),
            features,
            crs: crs_of(dataset),
        })
        .collect();

    let status = StatusOutput {
        data_dir: ctx.config.data_dir.value.display().to_string(),
        snapshot_day: base.snapshot_day.to_string(),
        fetched_at: base.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        metric_crs: ctx.metric_crs()?.label(),
        datasets,
    };

    if output.is_json() {
        return output.result(status);
    }

    output.section("Snapshot");
    output.kv("Data directory", &status.data_dir);
    output.kv("Station day", &status.snapshot_day);
    output.kv("Fetched at", &status.fetched_at);
    output.kv("Metric CRS", &status.metric_crs);
    output.table(status.datasets);

    Ok(())
}
