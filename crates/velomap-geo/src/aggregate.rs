//! Per-district aggregates of station availability and demographics.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use velomap_core::error::{Result, VelomapError};
use velomap_core::models::{
    BikeAvailabilityRecord, Boundary, DemographicCategory, Demographics, GeoCollection,
    PointFeature, PolygonFeature,
};

use crate::spatial::{assign_to_polygons, count_points_in_polygons};

/// Availability of one district at one hour of the day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictAvailability {
    pub district: String,
    /// Stations strictly inside the district
    pub station_count: usize,
    /// Availability records at the requested hour for those stations
    pub record_count: usize,
    /// None when the district has no stations or no records at that hour
    pub average_bikes: Option<f64>,
}

fn check_hour(hour: u8) -> Result<()> {
    if hour > 23 {
        return Err(VelomapError::invalid_parameter(
            "hour",
            format!("hour of day must be 0-23, got {}", hour),
        ));
    }
    Ok(())
}

/// Average bikes available per district at `hour`
pub fn join_station_availability_to_district<D: PolygonFeature, P: PointFeature>(
    districts: &GeoCollection<D>,
    stations: &GeoCollection<P>,
    records: &[BikeAvailabilityRecord],
    hour: u8,
) -> Result<BTreeMap<String, DistrictAvailability>> {
    check_hour(hour)?;

    let mut result: BTreeMap<String, DistrictAvailability> = districts
        .iter()
        .map(|d| {
            let name = d.feature_id().to_string();
            let entry = DistrictAvailability {
                district: name.clone(),
                station_count: 0,
                record_count: 0,
                average_bikes: None,
            };
            (name, entry)
        })
        .collect();

    let mut owner: HashMap<String, String> = HashMap::new();
    for (station_id, district) in assign_to_polygons(stations, districts)? {
        if let Some(district) = district {
            if let Some(entry) = result.get_mut(&district) {
                entry.station_count += 1;
            }
            owner.insert(station_id, district);
        }
    }

    let mut sums: HashMap<&str, f64> = HashMap::new();
    for record in records.iter().filter(|r| r.hour == hour) {
        let Some(district) = owner.get(record.station_id.as_str()) else {
            continue;
        };
        if let Some(entry) = result.get_mut(district) {
            entry.record_count += 1;
            *sums.entry(district.as_str()).or_insert(0.0) += record.avg_bikes_available;
        }
    }

    for entry in result.values_mut() {
        if entry.record_count > 0 {
            let sum = sums.get(entry.district.as_str()).copied().unwrap_or(0.0);
            entry.average_bikes = Some(sum / entry.record_count as f64);
        }
    }

    tracing::debug!(
        "Joined {} records at hour {} to {} districts",
        records.len(),
        hour,
        result.len()
    );

    Ok(result)
}

/// Average bikes in one district at `hour`.
///
/// An undefined aggregate is `NoDataForCategory`, never zero.
pub fn district_average_at_hour<D: PolygonFeature, P: PointFeature>(
    district: &str,
    districts: &GeoCollection<D>,
    stations: &GeoCollection<P>,
    records: &[BikeAvailabilityRecord],
    hour: u8,
) -> Result<f64> {
    let joined = join_station_availability_to_district(districts, stations, records, hour)?;
    let entry = joined.get(district).ok_or_else(|| {
        VelomapError::invalid_parameter("district", format!("unknown district '{}'", district))
    })?;

    entry.average_bikes.ok_or_else(|| {
        VelomapError::no_data(format!("average bikes in {} at hour {}", district, hour))
    })
}

/// Mean availability of one station for each hour of the day
pub fn station_hourly_profile(
    records: &[BikeAvailabilityRecord],
    station_id: &str,
) -> [Option<f64>; 24] {
    let mut sums = [0.0f64; 24];
    let mut counts = [0usize; 24];

    for record in records.iter().filter(|r| r.station_id.as_str() == station_id) {
        let hour = usize::from(record.hour);
        if hour >= 24 {
            tracing::warn!("Ignoring record for {} with hour {}", station_id, record.hour);
            continue;
        }
        sums[hour] += record.avg_bikes_available;
        counts[hour] += 1;
    }

    let mut profile = [None; 24];
    for hour in 0..24 {
        if counts[hour] > 0 {
            profile[hour] = Some(sums[hour] / counts[hour] as f64);
        }
    }
    profile
}

/// Station count and resident statistics of one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictOverview {
    pub district: String,
    pub station_count: usize,
    pub demographics: Option<Demographics>,
    pub stations_per_1000_residents: Option<f64>,
}

/// Station counts joined with the demographics of every district
pub fn district_overview<P: PointFeature>(
    districts: &GeoCollection<Boundary>,
    stations: &GeoCollection<P>,
) -> Result<Vec<DistrictOverview>> {
    let counts = count_points_in_polygons(stations, districts)?;

    Ok(districts
        .iter()
        .map(|d| {
            let station_count = counts.get(&d.name).copied().unwrap_or(0);
            let stations_per_1000_residents = d
                .demographic(DemographicCategory::Total)
                .ok()
                .filter(|total| *total > 0.0)
                .map(|total| station_count as f64 * 1000.0 / total);
            DistrictOverview {
                district: d.name.clone(),
                station_count,
                demographics: d.demographics.clone(),
                stations_per_1000_residents,
            }
        })
        .collect())
}

/// One demographic value of a district
pub fn demographic_value(boundary: &Boundary, category: DemographicCategory) -> Result<f64> {
    boundary.demographic(category)
}

/// Values of `category` for all districts; unpublished values stay None
pub fn demographic_overlay(
    districts: &GeoCollection<Boundary>,
    category: DemographicCategory,
) -> BTreeMap<String, Option<f64>> {
    districts
        .iter()
        .map(|d| (d.name.clone(), demographic_value(d, category).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use velomap_core::models::{BoundaryKind, Crs, Station};

    fn district(name: &str, x0: f64) -> Boundary {
        let poly = polygon![
            (x: x0, y: 0.0),
            (x: x0 + 10.0, y: 0.0),
            (x: x0 + 10.0, y: 10.0),
            (x: x0, y: 10.0),
        ];
        Boundary::new(name, BoundaryKind::District, MultiPolygon::new(vec![poly]))
    }

    fn fixture() -> (GeoCollection<Boundary>, GeoCollection<Station>, Vec<BikeAvailabilityRecord>) {
        let districts = GeoCollection::new(
            "districts",
            Crs::lv95(),
            vec![district("Altstadt", 0.0), district("Tribschen", 20.0), district("Wesemlin", 40.0)],
        );
        let stations = GeoCollection::new(
            "stations",
            Crs::lv95(),
            vec![
                Station::at("s1", "one", 2.0, 2.0),
                Station::at("s2", "two", 8.0, 8.0),
                Station::at("s3", "three", 25.0, 5.0),
            ],
        );
        let records = vec![
            BikeAvailabilityRecord::new("s1", 14, 2.0),
            BikeAvailabilityRecord::new("s2", 14, 4.0),
            BikeAvailabilityRecord::new("s1", 8, 10.0),
            BikeAvailabilityRecord::new("s3", 8, 1.0),
        ];
        (districts, stations, records)
    }

    #[test]
    fn test_average_per_district() {
        let (districts, stations, records) = fixture();
        let joined =
            join_station_availability_to_district(&districts, &stations, &records, 14).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined["Altstadt"].average_bikes, Some(3.0));
        assert_eq!(joined["Altstadt"].station_count, 2);
        // Station but no record at this hour
        assert_eq!(joined["Tribschen"].station_count, 1);
        assert_eq!(joined["Tribschen"].average_bikes, None);
        assert_eq!(joined["Wesemlin"].average_bikes, None);
    }

    #[test]
    fn test_district_without_stations_is_no_data() {
        let (districts, stations, records) = fixture();
        let err = district_average_at_hour("Wesemlin", &districts, &stations, &records, 14)
            .unwrap_err();
        assert!(matches!(err, VelomapError::NoDataForCategory { .. }));

        let value =
            district_average_at_hour("Tribschen", &districts, &stations, &records, 8).unwrap();
        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_unknown_district_and_bad_hour() {
        let (districts, stations, records) = fixture();
        assert!(matches!(
            district_average_at_hour("Atlantis", &districts, &stations, &records, 8),
            Err(VelomapError::InvalidParameter { .. })
        ));
        assert!(matches!(
            join_station_availability_to_district(&districts, &stations, &records, 24),
            Err(VelomapError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_station_hourly_profile() {
        let records = vec![
            BikeAvailabilityRecord::new("s1", 7, 2.0),
            BikeAvailabilityRecord::new("s1", 7, 4.0),
            BikeAvailabilityRecord::new("s1", 23, 1.5),
            BikeAvailabilityRecord::new("s2", 7, 9.0),
        ];
        let profile = station_hourly_profile(&records, "s1");

        assert_eq!(profile[7], Some(3.0));
        assert_eq!(profile[23], Some(1.5));
        assert_eq!(profile[0], None);
        assert_eq!(profile.iter().filter(|v| v.is_some()).count(), 2);
    }

    #[test]
    fn test_district_overview() {
        let (districts, stations, _) = fixture();
        let mut districts = districts;
        districts.features[0] = districts.features[0].clone().with_demographics(Demographics {
            total: Some(4000),
            ..Default::default()
        });

        let overview = district_overview(&districts, &stations).unwrap();

        assert_eq!(overview.len(), 3);
        assert_eq!(overview[0].district, "Altstadt");
        assert_eq!(overview[0].station_count, 2);
        assert_eq!(overview[0].stations_per_1000_residents, Some(0.5));
        assert_eq!(overview[1].stations_per_1000_residents, None);
    }

    #[test]
    fn test_demographic_overlay() {
        let (mut districts, _, _) = fixture();
        districts.features[1] = districts.features[1].clone().with_demographics(Demographics {
            density_per_ha: Some(48.2),
            ..Default::default()
        });

        let overlay = demographic_overlay(&districts, DemographicCategory::DensityPerHectare);
        assert_eq!(overlay["Tribschen"], Some(48.2));
        assert_eq!(overlay["Altstadt"], None);
    }
}
