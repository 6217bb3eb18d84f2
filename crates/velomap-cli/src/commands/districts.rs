//! Districts command implementation

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;
use velomap_core::models::{Crs, DemographicCategory};
use velomap_geo::aggregate::demographic_overlay;
use velomap_geo::layers::choropleth_layer;
use velomap_geo::{reproject, FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::DistrictsArgs;
use crate::output::{opt_number, OutputWriter};

#[derive(Tabled)]
struct DistrictRow {
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Stations")]
    stations: usize,
    #[tabled(rename = "Residents")]
    residents: String,
    #[tabled(rename = "Stations / 1000")]
    per_thousand: String,
}

#[derive(Tabled)]
struct OverlayRow {
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn execute(args: DistrictsArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;

    if let Some(category) = args.category {
        let values = demographic_overlay(&base.districts, category);
        let layer =
            choropleth_layer(&reproject(&base.districts, &Crs::wgs84())?, category.as_str(), &values)?;
        write_layer(args.layer.geojson.as_deref(), &layer, output)?;

        if output.is_json() {
            return output.result(json!({
                "category": category.as_str(),
                "values": values,
                "layer": layer,
            }));
        }

        let decimals = if category == DemographicCategory::DensityPerHectare { 1 } else { 0 };
        output.section(format!("{} per district", category.as_str()));
        output.table(
            values
                .iter()
                .map(|(district, value)| OverlayRow {
                    district: district.clone(),
                    value: opt_number(*value, decimals),
                })
                .collect(),
        );
        return Ok(());
    }

    let result = ctx.run(&base, FeatureRequest::DistrictCounts)?;
    let FeatureOutput::DistrictCounts { districts, layer } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section("Stations per district");
    output.table(
        districts
            .iter()
            .map(|d| DistrictRow {
                district: d.district.clone(),
                stations: d.station_count,
                residents: opt_number(
                    d.demographics.as_ref().and_then(|x| x.total).map(|t| t as f64),
                    0,
                ),
                per_thousand: opt_number(d.stations_per_1000_residents, 2),
            })
            .collect(),
    );

    Ok(())
}
