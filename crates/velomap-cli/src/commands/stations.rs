//! Stations command implementation

use anyhow::Result;
use tabled::Tabled;
use velomap_geo::pipeline::StationRow;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::StationsArgs;
use crate::output::OutputWriter;

#[derive(Tabled)]
pub struct StationTableRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Lat")]
    pub lat: String,
    #[tabled(rename = "Lon")]
    pub lon: String,
}

impl From<&StationRow> for StationTableRow {
    fn from(row: &StationRow) -> Self {
        Self {
            id: row.station_id.clone(),
            name: row.name.clone(),
            lat: format!("{:.5}", row.lat),
            lon: format!("{:.5}", row.lon),
        }
    }
}

pub async fn execute(args: StationsArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;
    let result = ctx.run(&base, FeatureRequest::Stations { inside_city: !args.all })?;

    let FeatureOutput::Stations { stations, layer } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    let scope = if args.all { "in the snapshot" } else { "inside the city" };
    output.section(format!("{} stations {}", stations.len(), scope));
    output.table(stations.iter().map(StationTableRow::from).collect());

    Ok(())
}
