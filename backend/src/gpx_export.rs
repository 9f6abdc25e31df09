use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::{LatLng, Marker, SavedRoute};

use crate::error::RouteError;

const CREATOR: &str = "walking-routes";

/// GPX 1.1 document with the overview path as a single track and every
/// marker as a named waypoint.
pub fn route_to_gpx(route: &SavedRoute) -> Result<String, RouteError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };
    gpx.waypoints = route.markers.iter().map(marker_to_waypoint).collect();

    let mut track = Track {
        name: Some(route.name.clone()),
        description: (!route.description.is_empty()).then(|| route.description.clone()),
        ..Default::default()
    };
    let mut segment = TrackSegment::new();
    segment.points = route.overview_path.iter().map(to_waypoint).collect();
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// `route-42-lakeshore-loop.gpx`
pub fn file_name(route: &SavedRoute) -> String {
    let slug: String = route
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        format!("route-{}.gpx", route.id)
    } else {
        format!("route-{}-{slug}.gpx", route.id)
    }
}

fn to_waypoint(point: &LatLng) -> Waypoint {
    Waypoint::new(Point::new(point.lng, point.lat))
}

fn marker_to_waypoint(marker: &Marker) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(marker.lng, marker.lat));
    if !marker.name.is_empty() {
        waypoint.name = Some(marker.name.clone());
    }
    waypoint
}
