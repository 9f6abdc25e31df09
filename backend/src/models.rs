use shared::{LatLng, Marker, RouteWaypoint, SaveRouteRequest};

use crate::database::DatabaseError;

/// A create-route payload that passed validation, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
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
}

impl TryFrom<SaveRouteRequest> for NewRoute {
    type Error = DatabaseError;

    fn try_from(req: SaveRouteRequest) -> Result<Self, Self::Error> {
        let name = req.name.trim();
        if name.is_empty() {
            return invalid("name is required");
        }

        for (field, value) in [
            ("distance", req.distance),
            ("duration", req.duration),
            ("elevationGain", req.elevation_gain),
            ("elevationLoss", req.elevation_loss),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{field} must be a non-negative number"));
            }
        }

        check_coordinates("overviewPath", req.overview_path.iter().copied())?;
        check_coordinates(
            "markers",
            req.markers.iter().map(|m| LatLng::new(m.lat, m.lng)),
        )?;
        check_coordinates("waypoints", req.waypoints.iter().map(|w| w.location))?;

        Ok(Self {
            name: name.to_string(),
            description: req.description.trim().to_string(),
            overview_path: req.overview_path,
            encoded_polyline: req.encoded_polyline.unwrap_or_default(),
            markers: req.markers,
            waypoints: req.waypoints,
            distance: req.distance,
            duration: req.duration,
            elevation_gain: req.elevation_gain,
            elevation_loss: req.elevation_loss,
        })
    }
}

fn check_coordinates(
    field: &str,
    points: impl Iterator<Item = LatLng>,
) -> Result<(), DatabaseError> {
    for (index, point) in points.enumerate() {
        if !point.is_valid() {
            return invalid(format!("{field}[{index}] is not a valid coordinate"));
        }
    }
    Ok(())
}

fn invalid<T>(message: impl Into<String>) -> Result<T, DatabaseError> {
    Err(DatabaseError::InvalidData(message.into()))
}
