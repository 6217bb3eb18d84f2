//! Availability command implementation

use anyhow::Result;
use serde_json::json;
use tabled::Tabled;
use velomap_geo::aggregate::station_hourly_profile;
use velomap_geo::{FeatureOutput, FeatureRequest};

use super::{unexpected_output, write_layer, RunContext};
use crate::cli::AvailabilityArgs;
use crate::output::{opt_number, OutputWriter};

#[derive(Tabled)]
struct DistrictAvailabilityRow {
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Stations")]
    stations: usize,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Avg bikes")]
    average: String,
}

#[derive(Tabled)]
struct HourRow {
    #[tabled(rename = "Hour")]
    hour: String,
    #[tabled(rename = "Avg bikes")]
    average: String,
}

pub async fn execute(args: AvailabilityArgs, ctx: &RunContext, output: &OutputWriter) -> Result<()> {
    let base = ctx.snapshot().await?;

    if let Some(station_id) = &args.station {
        let profile = station_hourly_profile(&base.availability, station_id);
        if profile.iter().all(Option::is_none) {
            output.warning(format!("No availability records for station {}", station_id));
        }

        if output.is_json() {
            return output.result(json!({ "station_id": station_id, "profile": profile }));
        }

        output.section(format!("Hourly availability of {}", station_id));
        output.table(
            profile
                .iter()
                .enumerate()
                .map(|(hour, average)| HourRow {
                    hour: format!("{:02}:00", hour),
                    average: opt_number(*average, 1),
                })
                .collect(),
        );
        return Ok(());
    }

    let result = ctx.run(&base, FeatureRequest::DistrictAvailability { hour: args.hour })?;
    let FeatureOutput::DistrictAvailability { hour, districts, layer } = &result.output else {
        return Err(unexpected_output());
    };
    write_layer(args.layer.geojson.as_deref(), layer, output)?;

    if output.is_json() {
        return output.result(&result);
    }

    output.section(format!("Average bikes available at {:02}:00", hour));
    output.table(
        districts
            .iter()
            .map(|d| DistrictAvailabilityRow {
                district: d.district.clone(),
                stations: d.station_count,
                records: d.record_count,
                average: opt_number(d.average_bikes, 1),
            })
            .collect(),
    );

    let without_data = districts.iter().filter(|d| d.average_bikes.is_none()).count();
    if without_data > 0 {
        output.info(format!("{} districts have no availability data at this hour", without_data));
    }

    Ok(())
}
