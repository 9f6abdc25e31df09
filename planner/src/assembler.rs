use geo_types::Coord;
use shared::{LatLng, RouteWaypoint, SaveRouteRequest};

use crate::error::ValidationError;
use crate::metrics::{concatenated_path, RouteMetrics};
use crate::segments::SegmentStore;
use crate::waypoints::Waypoint;

const POLYLINE_PRECISION: u32 = 5;

/// Builds the create-route payload from the current session state.
///
/// Runs synchronously on save and uses whatever metrics are current; it does
/// not wait for an in-flight elevation pass.
pub fn assemble(
    waypoints: &[Waypoint],
    segments: &SegmentStore,
    metrics: &RouteMetrics,
    name: &str,
    description: &str,
) -> Result<SaveRouteRequest, ValidationError> {
    if waypoints.len() < 2 {
        return Err(ValidationError::NotEnoughWaypoints(waypoints.len()));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }

    let overview_path = concatenated_path(segments.all());
    let duration = segments
        .all()
        .iter()
        .map(|segment| segment.duration_seconds())
        .sum::<f64>()
        .round();

    Ok(SaveRouteRequest {
        name: name.to_string(),
        description: description.trim().to_string(),
        encoded_polyline: encode_path(&overview_path),
        overview_path,
        markers: waypoints.iter().map(Waypoint::to_marker).collect(),
        waypoints: stopovers(waypoints, segments),
        distance: metrics.total_distance_km,
        duration,
        elevation_gain: metrics.elevation_gain_m as f64,
        elevation_loss: metrics.elevation_loss_m as f64,
    })
}

/// Intermediate waypoints followed by each segment's dragged via-points.
/// The first and last waypoints are the route's origin and destination and
/// are not repeated here.
fn stopovers(waypoints: &[Waypoint], segments: &SegmentStore) -> Vec<RouteWaypoint> {
    let mut out = Vec::new();
    for i in 0..waypoints.len() - 1 {
        if i > 0 {
            out.push(RouteWaypoint::stopover(waypoints[i].location));
        }
        if let Some(segment) = segments.find(i, i + 1) {
            out.extend(segment.via_points.iter().copied().map(RouteWaypoint::stopover));
        }
    }
    out
}

fn encode_path(path: &[LatLng]) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let coords = path.iter().map(|p| Coord { x: p.lng, y: p.lat });
    match polyline::encode_coordinates(coords, POLYLINE_PRECISION) {
        Ok(encoded) => Some(encoded),
        Err(err) => {
            tracing::warn!("failed to encode overview path: {err}");
            None
        }
    }
}
