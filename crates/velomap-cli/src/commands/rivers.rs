//! Rivers command implementation

use anyhow::Result;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::stations::StationTableRow;
use super::{unexpected_output, write_layer, RunContext};
use crate::cli::RiversArgs;
use crate::output::OutputWriter;

pub async fn execute(args: RiversArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;
    let max_distance_m = args.distance.unwrap_or(ctx.config.river_distance_m.value);
    let result = ctx.run(&base, FeatureRequest::RiverProximity { max_distance_m })?;

    let FeatureOutput::RiverProximity { stations, layer, .. } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section(format!(
        "{} of {} stations within {} m of a river",
        stations.len(),
        base.stations.len(),
        max_distance_m
    ));
    output.table(stations.iter().map(StationTableRow::from).collect());

    Ok(())
}
