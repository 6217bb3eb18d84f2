//! GeoJSON layers handed to the map front end.
//!
//! Layers are always emitted in WGS 84; a collection in any other CRS is
//! refused instead of leaking projected coordinates into the map.

use std::collections::BTreeMap;

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{
    Boundary, Crs, FreeBike, GeoCollection, Identified, PointFeature, RiverSegment, Station,
};

use crate::coverage::CoverageResult;
use crate::nearest::NearestQuery;

/// A record that can be rendered as a GeoJSON feature
pub trait LayerFeature: Identified {
    fn geometry(&self) -> Value;
    fn properties(&self) -> JsonObject;
}

impl LayerFeature for Station {
    fn geometry(&self) -> Value {
        Value::from(&self.location)
    }

    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("station_id".to_string(), json!(self.id.as_str()));
        props.insert("name".to_string(), json!(self.name));
        props
    }
}

impl LayerFeature for FreeBike {
    fn geometry(&self) -> Value {
        Value::from(&self.location)
    }

    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("bike_id".to_string(), json!(self.bike_id));
        props.insert("is_reserved".to_string(), json!(self.is_reserved));
        props.insert("is_disabled".to_string(), json!(self.is_disabled));
        props.insert("available".to_string(), json!(self.is_available()));
        props
    }
}

impl LayerFeature for Boundary {
    fn geometry(&self) -> Value {
        Value::from(&self.geometry)
    }

    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("name".to_string(), json!(self.name));
        props.insert("kind".to_string(), json!(self.kind.as_str()));
        if let Some(demographics) = &self.demographics {
            if let Ok(serde_json::Value::Object(values)) = serde_json::to_value(demographics) {
                props.extend(values);
            }
        }
        props
    }
}

impl LayerFeature for RiverSegment {
    fn geometry(&self) -> Value {
        Value::from(&self.geometry)
    }

    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("river_id".to_string(), json!(self.id));
        props.insert("name".to_string(), json!(self.name));
        props
    }
}

fn require_wgs84(crs: Option<&Crs>, layer: &str) -> Result<()> {
    let crs = crs.ok_or_else(|| VelomapError::UnknownCrs {
        context: format!("layer '{}' has no CRS tag", layer),
    })?;
    if !crs.is_geographic() {
        return Err(VelomapError::CrsMismatch {
            expected: Crs::wgs84().label(),
            found: format!("{} for layer '{}'", crs.label(), layer),
        });
    }
    Ok(())
}

fn to_feature(id: &str, geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: Some(Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// One feature per record of a WGS 84 collection
pub fn feature_layer<T: LayerFeature>(layer: &GeoCollection<T>) -> Result<FeatureCollection> {
    require_wgs84(layer.crs(), &layer.name)?;

    Ok(collection(
        layer
            .iter()
            .map(|f| to_feature(f.feature_id(), f.geometry(), f.properties()))
            .collect(),
    ))
}

/// The coverage footprint as a single feature carrying the summary values
pub fn coverage_layer(result: &CoverageResult) -> Result<FeatureCollection> {
    let footprint = result.footprint_in(&Crs::wgs84())?;

    let mut props = JsonObject::new();
    props.insert("radius_m".to_string(), json!(result.radius_m));
    props.insert("area_m2".to_string(), json!(result.area_m2));
    props.insert("city_area_m2".to_string(), json!(result.city_area_m2));
    props.insert("ratio".to_string(), json!(result.ratio));

    Ok(collection(vec![to_feature("coverage", Value::from(&footprint), props)]))
}

/// Ranked stations plus the query point.
///
/// `crs` is the CRS the ranked records are in.
pub fn nearest_layer<P: LayerFeature + PointFeature>(
    result: &NearestQuery<P>,
    crs: &Crs,
) -> Result<FeatureCollection> {
    require_wgs84(Some(crs), "nearest")?;
    require_wgs84(Some(&result.query.crs), "nearest query")?;

    let mut features: Vec<Feature> = result
        .ranked
        .iter()
        .enumerate()
        .map(|(idx, ranked)| {
            let mut props = ranked.station.properties();
            props.insert("rank".to_string(), json!(idx + 1));
            props.insert("distance_m".to_string(), json!(ranked.distance_m));
            to_feature(ranked.station.feature_id(), ranked.station.geometry(), props)
        })
        .collect();

    let mut props = JsonObject::new();
    props.insert("role".to_string(), json!("query"));
    features.push(to_feature("query", Value::from(&result.query.point()), props));

    Ok(collection(features))
}

/// District polygons with one numeric property for choropleth colouring.
///
/// Districts without a value get `null`, which the map renders as "no data".
pub fn choropleth_layer(
    districts: &GeoCollection<Boundary>,
    property: &str,
    values: &BTreeMap<String, Option<f64>>,
) -> Result<FeatureCollection> {
    require_wgs84(districts.crs(), &districts.name)?;

    Ok(collection(
        districts
            .iter()
            .map(|d| {
                let mut props = d.properties();
                let value = values.get(&d.name).copied().flatten();
                props.insert(property.to_string(), json!(value));
                to_feature(d.feature_id(), d.geometry(), props)
            })
            .collect(),
    ))
}
