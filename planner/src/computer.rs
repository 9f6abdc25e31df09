use shared::LatLng;

use crate::waypoints::Waypoint;

/// A walking-segment request for a fixed pair of waypoint positions.
///
/// Indices and generation are captured when the request is issued; the
/// response is matched against them, never against current list state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRequest {
    pub generation: u64,
    pub origin_index: usize,
    pub destination_index: usize,
    pub origin: LatLng,
    pub destination: LatLng,
}

/// Decides when a segment must be requested and whether a response is still
/// current.
///
/// The generation is bumped every time the waypoint list shrinks. A response
/// whose request carries an older generation is stale and must be dropped.
#[derive(Debug, Default)]
pub struct SegmentComputer {
    generation: u64,
    pending: Vec<SegmentRequest>,
}

impl SegmentComputer {
    /// Reacts to a waypoint list mutation.
    ///
    /// Only net growth to two or more entries issues a request, always for the
    /// last two entries. Shrinking invalidates everything in flight and never
    /// issues a request.
    pub fn on_waypoints_changed(
        &mut self,
        sequence: &[Waypoint],
        previous_len: usize,
    ) -> Option<SegmentRequest> {
        let len = sequence.len();
        if len < previous_len {
            self.invalidate();
            return None;
        }
        if len == previous_len || len < 2 {
            return None;
        }

        let origin_index = len - 2;
        let destination_index = len - 1;
        let request = SegmentRequest {
            generation: self.generation,
            origin_index,
            destination_index,
            origin: sequence[origin_index].location,
            destination: sequence[destination_index].location,
        };
        self.pending.push(request);
        Some(request)
    }

    /// Settles `request`. Returns `true` when its response may be applied.
    pub fn resolve(&mut self, request: &SegmentRequest) -> bool {
        self.pending.retain(|pending| pending != request);
        request.generation == self.generation
    }

    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Requests issued in the current generation that have not resolved yet.
    pub fn pending(&self) -> &[SegmentRequest] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoints(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint {
                name: format!("Waypoint {}", i + 1),
                location: LatLng::new(43.0 + i as f64 * 0.01, -79.0),
            })
            .collect()
    }

    #[test]
    fn first_point_issues_nothing() {
        let mut computer = SegmentComputer::default();
        assert!(computer.on_waypoints_changed(&waypoints(1), 0).is_none());
    }

    #[test]
    fn growth_requests_last_two_points() {
        let mut computer = SegmentComputer::default();
        let list = waypoints(3);
        let request = computer.on_waypoints_changed(&list, 2).unwrap();

        assert_eq!(request.origin_index, 1);
        assert_eq!(request.destination_index, 2);
        assert_eq!(request.origin, list[1].location);
        assert_eq!(request.destination, list[2].location);
        assert_eq!(computer.pending().len(), 1);
    }

    #[test]
    fn shrink_never_requests_and_bumps_generation() {
        let mut computer = SegmentComputer::default();
        let before = computer.generation();

        assert!(computer.on_waypoints_changed(&waypoints(2), 3).is_none());
        assert_eq!(computer.generation(), before + 1);
    }

    #[test]
    fn unchanged_length_is_ignored() {
        let mut computer = SegmentComputer::default();
        assert!(computer.on_waypoints_changed(&waypoints(2), 2).is_none());
        assert_eq!(computer.generation(), 0);
    }

    #[test]
    fn responses_from_older_generation_are_stale() {
        let mut computer = SegmentComputer::default();
        let request = computer.on_waypoints_changed(&waypoints(2), 1).unwrap();

        computer.on_waypoints_changed(&waypoints(1), 2);

        assert!(!computer.resolve(&request));
        assert!(computer.pending().is_empty());
    }

    #[test]
    fn current_response_is_accepted_once_resolved() {
        let mut computer = SegmentComputer::default();
        let request = computer.on_waypoints_changed(&waypoints(2), 1).unwrap();

        assert!(computer.resolve(&request));
        assert!(computer.pending().is_empty());
    }
}
