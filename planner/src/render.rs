//! Map-rendering boundary.
//!
//! The planner never talks to a map widget directly: it is handed an
//! `Arc<dyn MapRenderer>` and owns whatever it draws through [`RenderHandle`]s.
//! Dropping a handle detaches the visual and unsubscribes from its edit events,
//! so a discarded segment or marker cannot leak listeners.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use shared::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// A draggable walking segment; user drags come back as `Msg::SegmentEdited`.
    Segment,
    /// The read-only overview of a saved route.
    Overview,
}

/// Draws on the map on behalf of the planner.
///
/// Edits flow the other way through the runtime's message queue: when the user
/// drags a [`PathStyle::Segment`] path, the embedder recomputes its directions
/// and sends `Msg::SegmentEdited { handle, directions }` through the
/// [`MsgSender`](crate::runtime::MsgSender) it got from `Runtime::new`, using
/// the id this renderer returned for that path. Edits for an id that has
/// already been released are ignored.
pub trait MapRenderer: Send + Sync {
    fn place_marker(&self, at: LatLng, label: &str) -> HandleId;

    /// Draws `points`. For [`PathStyle::Segment`] the renderer subscribes to user
    /// edits of the drawn path and reports them tagged with the returned id.
    fn render_path(&self, points: &[LatLng], style: PathStyle) -> HandleId;

    /// Detaches the visual behind `handle` and drops its edit subscription.
    fn release(&self, handle: HandleId);

    fn pan_to(&self, _at: LatLng) {}
}

/// Owns one drawn object. Released exactly once, on drop.
pub struct RenderHandle {
    id: HandleId,
    renderer: Arc<dyn MapRenderer>,
}

impl RenderHandle {
    pub fn marker(renderer: &Arc<dyn MapRenderer>, at: LatLng, label: &str) -> Self {
        Self {
            id: renderer.place_marker(at, label),
            renderer: Arc::clone(renderer),
        }
    }

    pub fn path(renderer: &Arc<dyn MapRenderer>, points: &[LatLng], style: PathStyle) -> Self {
        Self {
            id: renderer.render_path(points, style),
            renderer: Arc::clone(renderer),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.renderer.release(self.id);
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RenderHandle").field(&self.id).finish()
    }
}

/// Headless renderer: allocates ids and logs what a map would draw.
#[derive(Default)]
pub struct TracingRenderer {
    next_id: AtomicU64,
}

impl TracingRenderer {
    fn allocate(&self) -> HandleId {
        HandleId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl MapRenderer for TracingRenderer {
    fn place_marker(&self, at: LatLng, label: &str) -> HandleId {
        let id = self.allocate();
        tracing::debug!("marker {id} '{label}' at ({:.5}, {:.5})", at.lat, at.lng);
        id
    }

    fn render_path(&self, points: &[LatLng], style: PathStyle) -> HandleId {
        let id = self.allocate();
        tracing::debug!("path {id} ({style:?}) with {} points", points.len());
        id
    }

    fn release(&self, handle: HandleId) {
        tracing::debug!("released {handle}");
    }

    fn pan_to(&self, at: LatLng) {
        tracing::debug!("pan to ({:.5}, {:.5})", at.lat, at.lng);
    }
}

/// What a [`RecordingRenderer`] currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawn {
    Marker { at: LatLng, label: String },
    Path { points: Vec<LatLng>, style: PathStyle },
}

/// In-memory renderer that remembers live objects; used by tests and by
/// embedders that redraw from a snapshot.
#[derive(Default)]
pub struct RecordingRenderer {
    next_id: AtomicU64,
    live: Mutex<Vec<(HandleId, Drawn)>>,
    released: Mutex<Vec<HandleId>>,
}

impl RecordingRenderer {
    pub fn live(&self) -> Vec<(HandleId, Drawn)> {
        self.live.lock().map(|live| live.clone()).unwrap_or_default()
    }

    pub fn live_paths(&self, style: PathStyle) -> usize {
        self.live()
            .iter()
            .filter(|(_, drawn)| matches!(drawn, Drawn::Path { style: s, .. } if *s == style))
            .count()
    }

    pub fn live_markers(&self) -> Vec<String> {
        self.live()
            .into_iter()
            .filter_map(|(_, drawn)| match drawn {
                Drawn::Marker { label, .. } => Some(label),
                Drawn::Path { .. } => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<HandleId> {
        self.released
            .lock()
            .map(|released| released.clone())
            .unwrap_or_default()
    }

    fn record(&self, drawn: Drawn) -> HandleId {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        if let Ok(mut live) = self.live.lock() {
            live.push((id, drawn));
        }
        id
    }
}

impl MapRenderer for RecordingRenderer {
    fn place_marker(&self, at: LatLng, label: &str) -> HandleId {
        self.record(Drawn::Marker {
            at,
            label: label.to_string(),
        })
    }

    fn render_path(&self, points: &[LatLng], style: PathStyle) -> HandleId {
        self.record(Drawn::Path {
            points: points.to_vec(),
            style,
        })
    }

    fn release(&self, handle: HandleId) {
        if let Ok(mut live) = self.live.lock() {
            live.retain(|(id, _)| *id != handle);
        }
        if let Ok(mut released) = self.released.lock() {
            released.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_handle_releases_it_once() {
        let recorder = Arc::new(RecordingRenderer::default());
        let renderer: Arc<dyn MapRenderer> = recorder.clone();

        let handle = RenderHandle::path(
            &renderer,
            &[LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.001)],
            PathStyle::Segment,
        );
        let id = handle.id();
        assert_eq!(recorder.live_paths(PathStyle::Segment), 1);

        drop(handle);
        assert_eq!(recorder.live_paths(PathStyle::Segment), 0);
        assert_eq!(recorder.released(), vec![id]);
    }

    #[test]
    fn handles_get_distinct_ids() {
        let renderer: Arc<dyn MapRenderer> = Arc::new(TracingRenderer::default());
        let a = RenderHandle::marker(&renderer, LatLng::new(1.0, 1.0), "Waypoint 1");
        let b = RenderHandle::marker(&renderer, LatLng::new(1.0, 1.0), "Waypoint 2");
        assert_ne!(a.id(), b.id());
    }
}
