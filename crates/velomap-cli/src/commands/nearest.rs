//! Nearest command implementation

use anyhow::Result;
use tabled::Tabled;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::NearestArgs;
use crate::output::OutputWriter;

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Distance")]
    distance: String,
}

pub async fn execute(args: NearestArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;
    let k = args.k.unwrap_or(ctx.config.nearest_k.value);
    let result = ctx.run(&base, FeatureRequest::Nearest { lat: args.lat, lon: args.lon, k })?;

    let FeatureOutput::Nearest { ranked, layer, .. } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section(format!("{} nearest stations to {}, {}", ranked.len(), args.lat, args.lon));
    output.table(
        ranked
            .iter()
            .map(|r| RankRow {
                rank: r.rank,
                id: r.station.station_id.clone(),
                name: r.station.name.clone(),
                distance: format!("{:.0} m", r.distance_m),
            })
            .collect(),
    );

    Ok(())
}
