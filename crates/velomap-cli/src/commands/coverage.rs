//! Coverage command implementation

use anyhow::Result;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::CoverageArgs;
use crate::output::OutputWriter;

pub async fn execute(args: CoverageArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;
    let radius_m = args.radius.unwrap_or(ctx.config.coverage_radius_m.value);
    let result = ctx.run(&base, FeatureRequest::Coverage { radius_m })?;

    let FeatureOutput::Coverage { summary, layer } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section(format!("Coverage within {} m of a station", summary.radius_m));
    output.kv("Covered area", format!("{:.3} km²", summary.area_m2 / 1e6));
    output.kv("City area", format!("{:.3} km²", summary.city_area_m2 / 1e6));
    output.kv("Coverage", format!("{:.1} %", summary.ratio * 100.0));
    output.kv("Metric CRS", ctx.metric_crs()?.label());

    Ok(())
}
