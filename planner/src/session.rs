//! The planning session as a message-driven state machine.
//!
//! `update` is synchronous: it mutates the [`Model`] and records the
//! asynchronous work it needs as [`Cmd`]s in [`Orders`]. Whatever performs a
//! command (see [`crate::runtime::Runtime`]) feeds its outcome back as a
//! [`Msg`], so every state transition happens inside `update`, one message at
//! a time.

use std::sync::Arc;

use shared::{LatLng, SaveRouteRequest, SavedRoute};

use crate::assembler::assemble;
use crate::computer::{SegmentComputer, SegmentRequest};
use crate::error::{PersistenceError, ProviderError};
use crate::metrics::{ElevationRequest, ElevationTotals, MetricsAggregator, RouteMetrics};
use crate::provider::Directions;
use crate::render::{HandleId, MapRenderer, PathStyle, RenderHandle};
use crate::segments::{Segment, SegmentStore};
use crate::waypoints::{Waypoint, WaypointList};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RouteLibrary {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<SavedRoute>),
    Failed(String),
}

pub struct Model {
    renderer: Arc<dyn MapRenderer>,
    waypoints: WaypointList,
    // One marker per waypoint, same order.
    markers: Vec<RenderHandle>,
    computer: SegmentComputer,
    segments: SegmentStore,
    aggregator: MetricsAggregator,
    // Bumped on every waypoint or segment change.
    revision: u64,
    // Revision the in-flight save was assembled from.
    saving: Option<u64>,
    last_error: Option<String>,
    last_saved: Option<SavedRoute>,
    saved_overview: Option<RenderHandle>,
    library: RouteLibrary,
}

impl Model {
    pub fn new(renderer: Arc<dyn MapRenderer>) -> Self {
        Self {
            renderer,
            waypoints: WaypointList::default(),
            markers: Vec::new(),
            computer: SegmentComputer::default(),
            segments: SegmentStore::default(),
            aggregator: MetricsAggregator::default(),
            revision: 0,
            saving: None,
            last_error: None,
            last_saved: None,
            saved_overview: None,
            library: RouteLibrary::default(),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.waypoints.sequence()
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub fn metrics(&self) -> RouteMetrics {
        self.aggregator.metrics()
    }

    pub fn pending_segments(&self) -> &[SegmentRequest] {
        self.computer.pending()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved(&self) -> Option<&SavedRoute> {
        self.last_saved.as_ref()
    }

    pub fn library(&self) -> &RouteLibrary {
        &self.library
    }
}

#[derive(Debug)]
pub enum Msg {
    MapClicked { lat: f64, lng: f64 },
    PlaceSearched(String),
    PlaceFound {
        query: String,
        result: Result<LatLng, ProviderError>,
    },
    Undo,
    Clear,
    SegmentComputed {
        request: SegmentRequest,
        result: Result<Directions, ProviderError>,
    },
    /// The user dragged the segment drawn under `handle`.
    SegmentEdited {
        handle: HandleId,
        directions: Directions,
    },
    /// `totals` is `None` when the provider returned no elevation at all.
    ElevationComputed {
        generation: u64,
        totals: Option<ElevationTotals>,
    },
    Save { name: String, description: String },
    RouteSaved(Result<SavedRoute, PersistenceError>),
    LoadRoutes,
    RoutesLoaded(Result<Vec<SavedRoute>, PersistenceError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    ComputeSegment(SegmentRequest),
    Geocode(String),
    FetchElevation(ElevationRequest),
    CreateRoute(SaveRouteRequest),
    ListRoutes,
}

/// Effects requested by one `update` call, in issue order.
#[derive(Debug, Default)]
pub struct Orders {
    cmds: Vec<Cmd>,
}

impl Orders {
    pub fn perform(&mut self, cmd: Cmd) {
        self.cmds.push(cmd);
    }

    pub fn cmds(&self) -> &[Cmd] {
        &self.cmds
    }

    pub fn take(&mut self) -> Vec<Cmd> {
        std::mem::take(&mut self.cmds)
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut Orders) {
    match msg {
        Msg::MapClicked { lat, lng } => {
            let location = LatLng::new(lat, lng);
            if !location.is_valid() {
                tracing::warn!("ignoring click outside valid coordinates ({lat}, {lng})");
                return;
            }
            append_waypoint(model, orders, location, None);
        }
        Msg::PlaceSearched(query) => {
            let query = query.trim();
            if query.is_empty() {
                return;
            }
            orders.perform(Cmd::Geocode(query.to_string()));
        }
        Msg::PlaceFound { query, result } => match result {
            Ok(location) => {
                reset_session(model, orders);
                append_waypoint(model, orders, location, Some(query));
                model.renderer.pan_to(location);
            }
            Err(err) => {
                tracing::warn!("geocoding '{query}' failed: {err}");
                model.last_error = Some(format!("could not find '{query}': {err}"));
            }
        },
        Msg::Undo => undo(model, orders),
        Msg::Clear => reset_session(model, orders),
        Msg::SegmentComputed { request, result } => {
            if !model.computer.resolve(&request) {
                tracing::debug!(
                    "dropping stale segment {}->{} (generation {} < {})",
                    request.origin_index,
                    request.destination_index,
                    request.generation,
                    model.computer.generation()
                );
                return;
            }
            match result {
                Ok(directions) => {
                    let handle =
                        RenderHandle::path(&model.renderer, &directions.path, PathStyle::Segment);
                    model
                        .segments
                        .insert(Segment::new(&request, directions, handle));
                    segments_changed(model, orders);
                }
                Err(err) => {
                    tracing::warn!(
                        "walking segment {}->{} failed: {err}",
                        request.origin_index,
                        request.destination_index
                    );
                    model.last_error = Some(format!("could not compute walking segment: {err}"));
                }
            }
        }
        Msg::SegmentEdited { handle, directions } => {
            if model.segments.update_in_place(handle, directions) {
                segments_changed(model, orders);
            } else {
                tracing::debug!("edit for released segment {handle} ignored");
            }
        }
        Msg::ElevationComputed {
            generation,
            totals: None,
        } => {
            tracing::debug!("elevation pass {generation} returned nothing, keeping previous totals");
        }
        Msg::ElevationComputed {
            generation,
            totals: Some(totals),
        } => {
            if !model.aggregator.publish(generation, totals) {
                tracing::debug!(
                    "dropping elevation result for generation {generation}, current is {}",
                    model.aggregator.generation()
                );
            }
        }
        Msg::Save { name, description } => {
            if model.saving.is_some() {
                return;
            }
            let metrics = model.aggregator.metrics();
            match assemble(
                model.waypoints.sequence(),
                &model.segments,
                &metrics,
                &name,
                &description,
            ) {
                Ok(request) => {
                    model.saving = Some(model.revision);
                    model.last_error = None;
                    orders.perform(Cmd::CreateRoute(request));
                }
                Err(err) => {
                    tracing::warn!("save rejected: {err}");
                    model.last_error = Some(err.to_string());
                }
            }
        }
        Msg::RouteSaved(result) => {
            let saved_revision = model.saving.take();
            match result {
                Ok(route) => {
                    model.saved_overview = Some(RenderHandle::path(
                        &model.renderer,
                        &route.overview_path,
                        PathStyle::Overview,
                    ));
                    if let RouteLibrary::Loaded(routes) = &mut model.library {
                        routes.insert(0, route.clone());
                    }
                    model.last_saved = Some(route);
                    if saved_revision == Some(model.revision) {
                        reset_session(model, orders);
                    } else {
                        tracing::debug!("route edited while saving, keeping the session");
                    }
                }
                Err(err) => {
                    tracing::error!("saving route failed: {err}");
                    model.last_error = Some(format!("failed to save route: {err}"));
                }
            }
        }
        Msg::LoadRoutes => {
            model.library = RouteLibrary::Loading;
            orders.perform(Cmd::ListRoutes);
        }
        Msg::RoutesLoaded(result) => {
            model.library = match result {
                Ok(routes) => RouteLibrary::Loaded(routes),
                Err(err) => {
                    tracing::warn!("loading saved routes failed: {err}");
                    RouteLibrary::Failed(err.to_string())
                }
            };
        }
    }
}

fn append_waypoint(model: &mut Model, orders: &mut Orders, location: LatLng, name: Option<String>) {
    let previous_len = model.waypoints.len();
    model.revision += 1;
    let waypoint = model.waypoints.append(location, name);
    model.markers.push(RenderHandle::marker(
        &model.renderer,
        waypoint.location,
        &waypoint.name,
    ));

    if let Some(request) = model
        .computer
        .on_waypoints_changed(model.waypoints.sequence(), previous_len)
    {
        orders.perform(Cmd::ComputeSegment(request));
    }
}

fn undo(model: &mut Model, orders: &mut Orders) {
    let previous_len = model.waypoints.len();
    if model.waypoints.remove_last().is_none() {
        return;
    }
    model.revision += 1;
    model.markers.pop();
    model
        .computer
        .on_waypoints_changed(model.waypoints.sequence(), previous_len);

    let old_tail = previous_len - 1;
    let changed = if model.waypoints.len() < 2 {
        let had_segments = !model.segments.is_empty();
        if had_segments {
            model.segments.clear();
        }
        had_segments
    } else if model
        .segments
        .last()
        .is_some_and(|segment| segment.destination_index == old_tail)
    {
        model.segments.remove_last()
    } else {
        false
    };

    if changed {
        segments_changed(model, orders);
    }
}

fn reset_session(model: &mut Model, orders: &mut Orders) {
    model.waypoints.clear();
    model.markers.clear();
    model.computer.invalidate();
    model.segments.clear();
    segments_changed(model, orders);
}

fn segments_changed(model: &mut Model, orders: &mut Orders) {
    model.revision += 1;
    if let Some(request) = model.aggregator.on_segments_changed(model.segments.all()) {
        orders.perform(Cmd::FetchElevation(request));
    }
}
