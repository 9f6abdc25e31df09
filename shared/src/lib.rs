use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A named pin, as displayed on the map and stored with a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub location: LatLng,
    #[serde(default = "default_stopover")]
    pub stopover: bool,
}

impl RouteWaypoint {
    pub fn stopover(location: LatLng) -> Self {
        Self {
            location,
            stopover: true,
        }
    }
}

/// Body of `POST /map`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRouteRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub overview_path: Vec<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub waypoints: Vec<RouteWaypoint>,
    /// Kilometres.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub elevation_gain: f64,
    #[serde(default)]
    pub elevation_loss: f64,
}

/// A persisted route as returned by `GET /map` and `POST /map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoute {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub overview_path: Vec<LatLng>,
    pub encoded_polyline: String,
    pub markers: Vec<Marker>,
    pub waypoints: Vec<RouteWaypoint>,
    pub distance: f64,
    pub duration: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

pub fn default_stopover() -> bool {
    true
}
