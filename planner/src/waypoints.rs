use shared::{LatLng, Marker};

/// A user-placed point. Its identity is its position in the [`WaypointList`].
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub location: LatLng,
}

impl Waypoint {
    pub fn to_marker(&self) -> Marker {
        Marker {
            lat: self.location.lat,
            lng: self.location.lng,
            name: self.name.clone(),
        }
    }
}

/// Ordered waypoints; grows at the tail, shrinks from the tail or all at once.
#[derive(Debug, Default)]
pub struct WaypointList {
    points: Vec<Waypoint>,
    // Running count of placed points, only reset by `clear`.
    placed: usize,
}

impl WaypointList {
    /// Appends a point, naming it `Waypoint {n}` when `name` is `None`.
    pub fn append(&mut self, location: LatLng, name: Option<String>) -> &Waypoint {
        self.placed += 1;
        let name = name.unwrap_or_else(|| format!("Waypoint {}", self.placed));
        self.points.push(Waypoint { name, location });
        &self.points[self.points.len() - 1]
    }

    /// Drops the tail entry; `None` when the list was already empty.
    pub fn remove_last(&mut self) -> Option<Waypoint> {
        self.points.pop()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.placed = 0;
    }

    pub fn sequence(&self) -> &[Waypoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
