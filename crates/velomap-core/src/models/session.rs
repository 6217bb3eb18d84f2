use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a dashboard session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Map viewport owned by the presentation layer between interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    /// Last map click or geolocation reading as (lat, lon)
    pub last_query: Option<(f64, f64)>,
}

impl Default for MapView {
    fn default() -> Self {
        // Lucerne main station
        Self { center_lat: 47.0502, center_lon: 8.3102, zoom: 13, last_query: None }
    }
}

/// Request-scoped state handed into the pipeline and returned with its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub view: MapView,
    pub radius_m: f64,
    pub k: usize,
    pub hour: u8,
    pub river_distance_m: f64,
    /// Restrict the station layer to the city boundary
    pub inside_city: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: SessionId::new(),
            view: MapView::default(),
            radius_m: 300.0,
            k: 5,
            hour: 8,
            river_distance_m: 100.0,
            inside_city: true,
        }
    }
}

impl SessionState {
    /// Record a query location and center the map on it
    pub fn focus(&mut self, lat: f64, lon: f64) {
        self.view.last_query = Some((lat, lon));
        self.view.center_lat = lat;
        self.view.center_lon = lon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_records_query_and_recenters() {
        let mut state = SessionState::default();
        state.focus(47.06, 8.30);

        assert_eq!(state.view.last_query, Some((47.06, 8.30)));
        assert_eq!(state.view.center_lat, 47.06);
        assert_eq!(state.view.center_lon, 8.30);
        assert_eq!(state.view.zoom, 13);
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(SessionState::default().session_id, SessionState::default().session_id);
    }
}
