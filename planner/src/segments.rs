use shared::LatLng;

use crate::computer::SegmentRequest;
use crate::provider::{Directions, Leg};
use crate::render::{HandleId, RenderHandle};

/// The computed walking path between two fixed waypoint positions.
#[derive(Debug)]
pub struct Segment {
    pub origin_index: usize,
    pub destination_index: usize,
    pub path: Vec<LatLng>,
    pub legs: Vec<Leg>,
    pub via_points: Vec<LatLng>,
    handle: RenderHandle,
}

impl Segment {
    pub fn new(request: &SegmentRequest, directions: Directions, handle: RenderHandle) -> Self {
        Self {
            origin_index: request.origin_index,
            destination_index: request.destination_index,
            path: directions.path,
            legs: directions.legs,
            via_points: directions.via_points,
            handle,
        }
    }

    pub fn handle(&self) -> HandleId {
        self.handle.id()
    }

    pub fn distance_meters(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_meters).sum()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.legs.iter().map(|leg| leg.duration_seconds).sum()
    }
}

/// Authoritative set of computed segments, ordered by origin index.
///
/// Every mutation bumps [`SegmentStore::revision`] exactly once and reports
/// whether it changed anything; the caller turns that into one metrics pass.
/// Removed segments release their render handle as they are dropped.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    revision: u64,
}

impl SegmentStore {
    /// Adds a completed segment, replacing any segment for the same pair.
    /// Responses can complete out of order, so the segment is placed by
    /// origin index rather than blindly appended.
    pub fn insert(&mut self, segment: Segment) {
        let key = (segment.origin_index, segment.destination_index);
        match self
            .segments
            .binary_search_by_key(&key, |s| (s.origin_index, s.destination_index))
        {
            Ok(existing) => self.segments[existing] = segment,
            Err(position) => self.segments.insert(position, segment),
        }
        self.revision += 1;
    }

    /// Drops the most recent segment. Returns `false` when empty.
    pub fn remove_last(&mut self) -> bool {
        match self.segments.pop() {
            Some(removed) => {
                tracing::debug!(
                    "removed segment {}->{} ({})",
                    removed.origin_index,
                    removed.destination_index,
                    removed.handle()
                );
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.revision += 1;
    }

    /// Replaces the geometry of the segment drawn under `handle`.
    pub fn update_in_place(&mut self, handle: HandleId, directions: Directions) -> bool {
        let Some(segment) = self.segments.iter_mut().find(|s| s.handle() == handle) else {
            return false;
        };
        segment.path = directions.path;
        segment.legs = directions.legs;
        segment.via_points = directions.via_points;
        self.revision += 1;
        true
    }

    pub fn all(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn find(&self, origin_index: usize, destination_index: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| s.origin_index == origin_index && s.destination_index == destination_index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::render::{MapRenderer, PathStyle, RecordingRenderer};

    fn fixture() -> (Arc<RecordingRenderer>, Arc<dyn MapRenderer>) {
        let recorder = Arc::new(RecordingRenderer::default());
        let renderer: Arc<dyn MapRenderer> = recorder.clone();
        (recorder, renderer)
    }

    fn segment(renderer: &Arc<dyn MapRenderer>, origin: usize, meters: f64) -> Segment {
        let request = SegmentRequest {
            generation: 0,
            origin_index: origin,
            destination_index: origin + 1,
            origin: LatLng::new(0.0, origin as f64),
            destination: LatLng::new(0.0, origin as f64 + 1.0),
        };
        let directions = Directions {
            path: vec![request.origin, request.destination],
            legs: vec![Leg {
                distance_meters: meters,
                duration_seconds: meters / 1.4,
            }],
            via_points: Vec::new(),
        };
        let handle = RenderHandle::path(renderer, &directions.path, PathStyle::Segment);
        Segment::new(&request, directions, handle)
    }

    #[test]
    fn out_of_order_inserts_keep_origin_order() {
        let (_, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 1, 200.0));
        store.insert(segment(&renderer, 0, 100.0));

        let origins: Vec<usize> = store.all().iter().map(|s| s.origin_index).collect();
        assert_eq!(origins, vec![0, 1]);
    }

    #[test]
    fn duplicate_pair_replaces_and_releases_previous() {
        let (recorder, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 0, 100.0));
        let first = store.all()[0].handle();
        store.insert(segment(&renderer, 0, 150.0));

        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].distance_meters(), 150.0);
        assert!(recorder.released().contains(&first));
    }

    #[test]
    fn remove_last_releases_handle() {
        let (recorder, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 0, 100.0));
        store.insert(segment(&renderer, 1, 100.0));
        let tail = store.all()[1].handle();

        assert!(store.remove_last());
        assert_eq!(recorder.released(), vec![tail]);
        assert_eq!(recorder.live_paths(PathStyle::Segment), 1);
    }

    #[test]
    fn remove_last_on_empty_is_noop() {
        let mut store = SegmentStore::default();
        assert!(!store.remove_last());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let (recorder, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 0, 100.0));
        store.insert(segment(&renderer, 1, 100.0));
        store.clear();

        assert!(store.is_empty());
        assert_eq!(recorder.released().len(), 2);
        assert_eq!(recorder.live_paths(PathStyle::Segment), 0);
    }

    #[test]
    fn update_in_place_matches_by_handle() {
        let (_, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 0, 100.0));
        store.insert(segment(&renderer, 1, 100.0));
        let handle = store.all()[1].handle();
        let revision = store.revision();

        let via = LatLng::new(0.5, 1.5);
        let dragged = Directions {
            path: vec![LatLng::new(0.0, 1.0), via, LatLng::new(0.0, 2.0)],
            legs: vec![Leg {
                distance_meters: 180.0,
                duration_seconds: 130.0,
            }],
            via_points: vec![via],
        };

        assert!(store.update_in_place(handle, dragged));
        assert_eq!(store.revision(), revision + 1);
        let updated = store.find(1, 2).unwrap();
        assert_eq!(updated.via_points, vec![via]);
        assert_eq!(updated.distance_meters(), 180.0);
        assert_eq!(store.find(0, 1).unwrap().distance_meters(), 100.0);
    }

    #[test]
    fn update_for_released_handle_is_ignored() {
        let (_, renderer) = fixture();
        let mut store = SegmentStore::default();
        store.insert(segment(&renderer, 0, 100.0));
        let handle = store.all()[0].handle();
        store.remove_last();

        assert!(!store.update_in_place(handle, Directions::default()));
    }
}
