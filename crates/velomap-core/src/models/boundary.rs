use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::geometry::{CoordMap, Georeferenced, Identified, PolygonFeature};
use crate::error::{Result, VelomapError};

/// Administrative level of a boundary polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    City,
    Canton,
    District,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKind::City => "city",
            BoundaryKind::Canton => "canton",
            BoundaryKind::District => "district",
        }
    }
}

/// Resident statistics published per district ("Quartier")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(alias = "quartier_id")]
    pub district_id: Option<String>,
    pub total: Option<u64>,
    #[serde(alias = "z0_19")]
    pub age_0_19: Option<u64>,
    #[serde(alias = "z20_64")]
    pub age_20_64: Option<u64>,
    #[serde(alias = "u65")]
    pub age_65_plus: Option<u64>,
    #[serde(alias = "auslaender")]
    pub foreign_residents: Option<u64>,
    #[serde(alias = "diche_per_ha")]
    pub density_per_ha: Option<f64>,
}

/// Demographic value selectable for district overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemographicCategory {
    Total,
    Age0To19,
    Age20To64,
    Age65Plus,
    ForeignResidents,
    DensityPerHectare,
}

impl DemographicCategory {
    pub const ALL: [DemographicCategory; 6] = [
        DemographicCategory::Total,
        DemographicCategory::Age0To19,
        DemographicCategory::Age20To64,
        DemographicCategory::Age65Plus,
        DemographicCategory::ForeignResidents,
        DemographicCategory::DensityPerHectare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemographicCategory::Total => "total",
            DemographicCategory::Age0To19 => "age_0_19",
            DemographicCategory::Age20To64 => "age_20_64",
            DemographicCategory::Age65Plus => "age_65_plus",
            DemographicCategory::ForeignResidents => "foreign_residents",
            DemographicCategory::DensityPerHectare => "density_per_ha",
        }
    }
}

impl std::str::FromStr for DemographicCategory {
    type Err = VelomapError;

    fn from_str(s: &str) -> Result<Self> {
        DemographicCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                VelomapError::invalid_parameter("category", format!("unknown category '{}'", s))
            })
    }
}

impl Demographics {
    /// Value for one category, if it was published
    pub fn value(&self, category: DemographicCategory) -> Option<f64> {
        match category {
            DemographicCategory::Total => self.total.map(|v| v as f64),
            DemographicCategory::Age0To19 => self.age_0_19.map(|v| v as f64),
            DemographicCategory::Age20To64 => self.age_20_64.map(|v| v as f64),
            DemographicCategory::Age65Plus => self.age_65_plus.map(|v| v as f64),
            DemographicCategory::ForeignResidents => self.foreign_residents.map(|v| v as f64),
            DemographicCategory::DensityPerHectare => self.density_per_ha,
        }
    }
}

/// City, canton or district polygon
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub name: String,
    pub kind: BoundaryKind,
    pub geometry: MultiPolygon<f64>,
    pub demographics: Option<Demographics>,
}

impl Boundary {
    pub fn new(name: impl Into<String>, kind: BoundaryKind, geometry: MultiPolygon<f64>) -> Self {
        Self { name: name.into(), kind, geometry, demographics: None }
    }

    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = Some(demographics);
        self
    }

    /// Look up a demographic value, distinguishing "not published" from zero
    pub fn demographic(&self, category: DemographicCategory) -> Result<f64> {
        self.demographics
            .as_ref()
            .and_then(|d| d.value(category))
            .ok_or_else(|| {
                VelomapError::no_data(format!("{} in {}", category.as_str(), self.name))
            })
    }
}

impl Identified for Boundary {
    fn feature_id(&self) -> &str {
        &self.name
    }
}

impl Georeferenced for Boundary {
    fn try_map_coords(&self, f: CoordMap<'_>) -> Result<Self> {
        Ok(Self { geometry: self.geometry.try_map_coords(f)?, ..self.clone() })
    }
}

impl PolygonFeature for Boundary {
    fn polygon(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}
