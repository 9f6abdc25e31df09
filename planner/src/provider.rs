//! Capabilities consumed from the external routing, geocoding and elevation
//! providers. [`crate::google::GoogleMapsClient`] implements all three.

use std::future::Future;

use serde::{Deserialize, Serialize};
use shared::LatLng;

use crate::error::ProviderError;

/// Elevation API limit on points per request path.
pub const MAX_ELEVATION_PATH: usize = 512;
/// Elevation API limit on samples per request.
pub const MAX_ELEVATION_SAMPLES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub distance_meters: f64,
    #[serde(default)]
    pub duration_seconds: f64,
}

/// A walking path between two points as produced by the routing provider, or
/// by the renderer after the user dragged it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directions {
    pub path: Vec<LatLng>,
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub via_points: Vec<LatLng>,
}

impl Directions {
    pub fn distance_meters(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_meters).sum()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.legs.iter().map(|leg| leg.duration_seconds).sum()
    }
}

pub trait DirectionsService: Send + Sync {
    /// Walking directions from `origin` to `destination`, in that order, with
    /// no waypoint optimisation.
    fn walking_segment(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> impl Future<Output = Result<Directions, ProviderError>> + Send;
}

pub trait GeocodingService: Send + Sync {
    fn geocode(&self, query: &str) -> impl Future<Output = Result<LatLng, ProviderError>> + Send;
}

pub trait ElevationService: Send + Sync {
    /// Elevations in metres for `samples` equidistant points along `path`.
    /// `path` holds at most [`MAX_ELEVATION_PATH`] points and `samples` is at
    /// most [`MAX_ELEVATION_SAMPLES`].
    fn elevation_along_path(
        &self,
        path: &[LatLng],
        samples: usize,
    ) -> impl Future<Output = Result<Vec<f64>, ProviderError>> + Send;
}

/// Everything the planner needs from a maps provider.
pub trait MapsProvider:
    DirectionsService + GeocodingService + ElevationService + Send + Sync + 'static
{
}

impl<T> MapsProvider for T where
    T: DirectionsService + GeocodingService + ElevationService + Send + Sync + 'static
{
}
