//! velomap geo - CRS normalization and the spatial derivations
//!
//! This crate holds the synchronous analytics engine: reprojection, spatial
//! joins, coverage, nearest-station search, district aggregates and the
//! request pipeline that turns them into display-ready layers.

pub mod aggregate;
pub mod coverage;
pub mod layers;
pub mod nearest;
pub mod pipeline;
pub mod profile;
pub mod spatial;
pub mod transform;
pub mod validation;

pub use coverage::{coverage, CoverageResult};
pub use nearest::{nearest, NearestQuery, RankedStation};
pub use pipeline::{FeatureOutput, FeatureRequest, Pipeline, PipelineOutput};
pub use transform::reproject;
