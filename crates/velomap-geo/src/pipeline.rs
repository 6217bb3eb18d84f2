//! Request pipeline: normalize the base collections, run one derivation and
//! hand back display-ready output together with the updated session state.

use std::collections::{BTreeMap, HashSet};

use geojson::FeatureCollection;
use serde::Serialize;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{
    BaseCollections, Crs, GeoCollection, Georeferenced, QueryPoint, SessionState, Station,
};

use crate::aggregate::{district_overview, join_station_availability_to_district};
use crate::aggregate::{DistrictAvailability, DistrictOverview};
use crate::coverage::{coverage_with_resolution, CoverageSummary, DEFAULT_QUADRANT_SEGMENTS};
use crate::layers::{choropleth_layer, coverage_layer, feature_layer, nearest_layer};
use crate::nearest::nearest;
use crate::spatial::{filter_by_proximity_to_lines, filter_within_boundary};
use crate::transform::{proj_definition, reproject};

/// One dashboard interaction
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureRequest {
    Stations { inside_city: bool },
    DistrictCounts,
    Coverage { radius_m: f64 },
    Nearest { lat: f64, lon: f64, k: usize },
    RiverProximity { max_distance_m: f64 },
    DistrictAvailability { hour: u8 },
    FreeBikes,
}

/// Station as shown in lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRow {
    pub station_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<&Station> for StationRow {
    fn from(station: &Station) -> Self {
        Self {
            station_id: station.id.to_string(),
            name: station.name.clone(),
            lat: station.latitude(),
            lon: station.longitude(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestRow {
    pub rank: usize,
    #[serde(flatten)]
    pub station: StationRow,
    pub distance_m: f64,
}

/// Display-ready result of a request: WGS 84 layers, scalars and lists
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureOutput {
    Stations {
        stations: Vec<StationRow>,
        layer: FeatureCollection,
    },
    DistrictCounts {
        districts: Vec<DistrictOverview>,
        layer: FeatureCollection,
    },
    Coverage {
        summary: CoverageSummary,
        layer: FeatureCollection,
    },
    Nearest {
        lat: f64,
        lon: f64,
        ranked: Vec<NearestRow>,
        layer: FeatureCollection,
    },
    RiverProximity {
        max_distance_m: f64,
        stations: Vec<StationRow>,
        layer: FeatureCollection,
    },
    DistrictAvailability {
        hour: u8,
        districts: Vec<DistrictAvailability>,
        layer: FeatureCollection,
    },
    FreeBikes {
        total: usize,
        available: usize,
        layer: FeatureCollection,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub state: SessionState,
    pub output: FeatureOutput,
}

/// Runs requests against one snapshot of base collections
pub struct Pipeline<'a> {
    base: &'a BaseCollections,
    metric_crs: Crs,
    quadrant_segments: u32,
}

impl<'a> Pipeline<'a> {
    /// `metric_crs` is where every measurement happens and must be projected
    pub fn new(base: &'a BaseCollections, metric_crs: Crs) -> Result<Self> {
        if metric_crs.is_geographic() {
            return Err(VelomapError::CrsMismatch {
                expected: "a projected CRS in meters".to_string(),
                found: metric_crs.label(),
            });
        }
        proj_definition(&metric_crs)?;

        Ok(Self { base, metric_crs, quadrant_segments: DEFAULT_QUADRANT_SEGMENTS })
    }

    pub fn with_quadrant_segments(mut self, quadrant_segments: u32) -> Self {
        self.quadrant_segments = quadrant_segments;
        self
    }

    pub fn metric_crs(&self) -> &Crs {
        &self.metric_crs
    }

    /// Run one request; the returned state reflects the request's parameters
    pub fn run(&self, mut state: SessionState, request: FeatureRequest) -> Result<PipelineOutput> {
        tracing::debug!("Session {:?}: {:?}", state.session_id, request);

        let output = match request {
            FeatureRequest::Stations { inside_city } => {
                let output = self.stations(inside_city)?;
                state.inside_city = inside_city;
                output
            }
            FeatureRequest::DistrictCounts => self.district_counts()?,
            FeatureRequest::Coverage { radius_m } => {
                let output = self.coverage(radius_m)?;
                state.radius_m = radius_m;
                output
            }
            FeatureRequest::Nearest { lat, lon, k } => {
                let output = self.nearest(lat, lon, k)?;
                state.k = k;
                state.focus(lat, lon);
                output
            }
            FeatureRequest::RiverProximity { max_distance_m } => {
                let output = self.river_proximity(max_distance_m)?;
                state.river_distance_m = max_distance_m;
                output
            }
            FeatureRequest::DistrictAvailability { hour } => {
                let output = self.district_availability(hour)?;
                state.hour = hour;
                output
            }
            FeatureRequest::FreeBikes => self.free_bikes()?,
        };

        Ok(PipelineOutput { state, output })
    }

    fn metric<T: Georeferenced>(&self, collection: &GeoCollection<T>) -> Result<GeoCollection<T>> {
        reproject(collection, &self.metric_crs)
    }

    fn display<T: Georeferenced>(&self, collection: &GeoCollection<T>) -> Result<GeoCollection<T>> {
        reproject(collection, &Crs::wgs84())
    }

    /// Display stations whose ids appear in `selected`
    fn select_stations(&self, selected: &GeoCollection<Station>) -> Result<GeoCollection<Station>> {
        let ids: HashSet<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        Ok(self.display(&self.base.stations)?.filtered(|s| ids.contains(s.id.as_str())))
    }

    fn stations(&self, inside_city: bool) -> Result<FeatureOutput> {
        let stations = if inside_city {
            let inside = filter_within_boundary(
                &self.metric(&self.base.stations)?,
                &self.metric(&self.base.city)?,
            )?;
            self.select_stations(&inside)?
        } else {
            self.display(&self.base.stations)?
        };

        Ok(FeatureOutput::Stations {
            stations: stations.iter().map(StationRow::from).collect(),
            layer: feature_layer(&stations)?,
        })
    }

    fn district_counts(&self) -> Result<FeatureOutput> {
        let districts = district_overview(
            &self.metric(&self.base.districts)?,
            &self.metric(&self.base.stations)?,
        )?;

        let values: BTreeMap<String, Option<f64>> = districts
            .iter()
            .map(|d| (d.district.clone(), Some(d.station_count as f64)))
            .collect();
        let layer = choropleth_layer(&self.display(&self.base.districts)?, "station_count", &values)?;

        Ok(FeatureOutput::DistrictCounts { districts, layer })
    }

    fn coverage(&self, radius_m: f64) -> Result<FeatureOutput> {
        let result = coverage_with_resolution(
            &self.metric(&self.base.stations)?,
            radius_m,
            &self.metric(&self.base.city)?,
            self.quadrant_segments,
        )?;

        Ok(FeatureOutput::Coverage { summary: result.summary(), layer: coverage_layer(&result)? })
    }

    fn nearest(&self, lat: f64, lon: f64, k: usize) -> Result<FeatureOutput> {
        let query = QueryPoint::from_lat_lon(lat, lon)?;
        let stations = self.display(&self.base.stations)?;
        let result = nearest(&query, &stations, k, &self.metric_crs)?;

        let ranked = result
            .ranked
            .iter()
            .enumerate()
            .map(|(idx, r)| NearestRow {
                rank: idx + 1,
                station: StationRow::from(&r.station),
                distance_m: r.distance_m,
            })
            .collect();

        Ok(FeatureOutput::Nearest {
            lat,
            lon,
            ranked,
            layer: nearest_layer(&result, &Crs::wgs84())?,
        })
    }

    fn river_proximity(&self, max_distance_m: f64) -> Result<FeatureOutput> {
        let near = filter_by_proximity_to_lines(
            &self.metric(&self.base.stations)?,
            &self.metric(&self.base.rivers)?,
            max_distance_m,
        )?;
        let stations = self.select_stations(&near)?;

        Ok(FeatureOutput::RiverProximity {
            max_distance_m,
            stations: stations.iter().map(StationRow::from).collect(),
            layer: feature_layer(&stations)?,
        })
    }

    fn district_availability(&self, hour: u8) -> Result<FeatureOutput> {
        let joined = join_station_availability_to_district(
            &self.metric(&self.base.districts)?,
            &self.metric(&self.base.stations)?,
            &self.base.availability,
            hour,
        )?;

        let values: BTreeMap<String, Option<f64>> =
            joined.iter().map(|(name, d)| (name.clone(), d.average_bikes)).collect();
        let layer = choropleth_layer(&self.display(&self.base.districts)?, "average_bikes", &values)?;

        Ok(FeatureOutput::DistrictAvailability {
            hour,
            districts: joined.into_values().collect(),
            layer,
        })
    }

    fn free_bikes(&self) -> Result<FeatureOutput> {
        let bikes = self.display(&self.base.free_bikes)?;
        let available = bikes.iter().filter(|b| b.is_available()).count();

        Ok(FeatureOutput::FreeBikes { total: bikes.len(), available, layer: feature_layer(&bikes)? })
    }
}
