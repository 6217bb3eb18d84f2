//! Command implementations

mod availability;
mod bikes;
mod config;
mod coverage;
mod districts;
mod nearest;
mod rivers;
mod stations;
mod status;
mod trip;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use geojson::FeatureCollection;
use velomap_core::config::LayeredConfig;
use velomap_core::models::{BaseCollections, Crs, SessionState};
use velomap_geo::{FeatureRequest, Pipeline, PipelineOutput};
use velomap_store::{DirectorySource, GeometryStore, StoreOptions};

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let ctx = RunContext { config: load_config(&cli)?, day: cli.day };

    match cli.command {
        Commands::Stations(args) => stations::execute(args, &ctx, &output).await,
        Commands::Districts(args) => districts::execute(args, &ctx, &output).await,
        Commands::Coverage(args) => coverage::execute(args, &ctx, &output).await,
        Commands::Nearest(args) => nearest::execute(args, &ctx, &output).await,
        Commands::Rivers(args) => rivers::execute(args, &ctx, &output).await,
        Commands::Availability(args) => availability::execute(args, &ctx, &output).await,
        Commands::Bikes(args) => bikes::execute(args, &ctx, &output).await,
        Commands::Trip(args) => trip::execute(args, &ctx, &output).await,
        Commands::Status => status::execute(&ctx, &output).await,
        Commands::Config => config::execute(&ctx, &output),
    }
}

/// Everything a command needs besides its own arguments
pub struct RunContext {
    pub config: LayeredConfig,
    pub day: Option<NaiveDate>,
}

impl RunContext {
    /// Load the base collections from the data directory
    pub async fn snapshot(&self) -> Result<Arc<BaseCollections>> {
        let mut options = StoreOptions::from_config(&self.config);
        if let Some(day) = self.day {
            options = options.with_day(day);
        }

        let data_dir = &self.config.data_dir.value;
        let store = GeometryStore::new(DirectorySource::new(data_dir), options);
        store
            .snapshot()
            .await
            .with_context(|| format!("Failed to load datasets from {}", data_dir.display()))
    }

    pub fn metric_crs(&self) -> Result<Crs> {
        let epsg = self.config.metric_crs.value;
        Crs::from_epsg(epsg).with_context(|| format!("Unsupported metric CRS EPSG:{}", epsg))
    }

    /// Fresh session seeded with the configured defaults
    pub fn session(&self) -> SessionState {
        SessionState {
            radius_m: self.config.coverage_radius_m.value,
            k: self.config.nearest_k.value,
            river_distance_m: self.config.river_distance_m.value,
            ..Default::default()
        }
    }

    /// Run one request against `base`
    pub fn run(&self, base: &BaseCollections, request: FeatureRequest) -> Result<PipelineOutput> {
        let pipeline = Pipeline::new(base, self.metric_crs()?)?
            .with_quadrant_segments(self.config.buffer_quadrant_segments.value);
        Ok(pipeline.run(self.session(), request)?)
    }
}

/// Write a map layer when the user asked for one
pub fn write_layer(
    path: Option<&Path>,
    layer: &FeatureCollection,
    output: &OutputWriter,
) -> Result<()> {
    if let Some(path) = path {
        let json = serde_json::to_string_pretty(layer)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write layer to {}", path.display()))?;
        output.success(format!("Wrote {} features to {}", layer.features.len(), path.display()));
    }
    Ok(())
}

/// Bail out on a pipeline output of the wrong kind
fn unexpected_output() -> anyhow::Error {
    anyhow::anyhow!("Pipeline returned an unexpected output kind")
}
