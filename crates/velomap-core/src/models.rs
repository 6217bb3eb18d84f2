pub mod boundary;
pub mod geometry;
pub mod river;
pub mod session;
pub mod snapshot;
pub mod station;

pub use boundary::{Boundary, BoundaryKind, DemographicCategory, Demographics};
pub use geometry::{
    CoordMap, Crs, GeoCollection, Georeferenced, Identified, LineFeature, PointFeature,
    PolygonFeature, QueryPoint,
};
pub use river::RiverSegment;
pub use session::{MapView, SessionId, SessionState};
pub use snapshot::BaseCollections;
pub use station::{BikeAvailabilityRecord, FreeBike, Station, StationId};
