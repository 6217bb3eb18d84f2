//! Free bikes command implementation

use anyhow::Result;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::LayerArgs;
use crate::output::OutputWriter;

pub async fn execute(args: LayerArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;
    let result = ctx.run(&base, FeatureRequest::FreeBikes)?;

    let FeatureOutput::FreeBikes { total, available, layer } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section("Free bikes");
    output.kv("Total", total);
    output.kv("Available", available);
    output.kv("Reserved or disabled", total - available);

    Ok(())
}
