use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::metrics::fetch_elevation_totals;
use crate::persistence::RouteApi;
use crate::provider::MapsProvider;
use crate::render::MapRenderer;
use crate::session::{update, Cmd, Model, Msg, Orders};

/// Feeds external input (clicks, drags, saves) into a running [`Runtime`].
#[derive(Clone)]
pub struct MsgSender(mpsc::UnboundedSender<Msg>);

impl MsgSender {
    /// Queues `msg`. Returns `false` once the runtime is gone.
    pub fn send(&self, msg: Msg) -> bool {
        self.0.send(msg).is_ok()
    }
}

/// Owns the session model and performs its commands.
///
/// Commands run concurrently as tokio tasks, but their results come back as
/// messages that are applied strictly one at a time, so `update` never sees
/// interleaved mutations.
pub struct Runtime<P, S> {
    model: Model,
    provider: Arc<P>,
    routes: Arc<S>,
    tasks: JoinSet<Msg>,
    inbox: mpsc::UnboundedReceiver<Msg>,
}

impl<P, S> Runtime<P, S>
where
    P: MapsProvider,
    S: RouteApi,
{
    pub fn new(renderer: Arc<dyn MapRenderer>, provider: Arc<P>, routes: Arc<S>) -> (Self, MsgSender) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let runtime = Self {
            model: Model::new(renderer),
            provider,
            routes,
            tasks: JoinSet::new(),
            inbox,
        };
        (runtime, MsgSender(tx))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Commands started but not yet turned back into messages.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Applies `msg` and starts every command it produced.
    pub fn dispatch(&mut self, msg: Msg) {
        let mut orders = Orders::default();
        update(msg, &mut self.model, &mut orders);
        for cmd in orders.take() {
            self.perform(cmd);
        }
    }

    fn perform(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::ComputeSegment(request) => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(async move {
                    let result = provider
                        .walking_segment(request.origin, request.destination)
                        .await;
                    Msg::SegmentComputed { request, result }
                });
            }
            Cmd::Geocode(query) => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(async move {
                    let result = provider.geocode(&query).await;
                    Msg::PlaceFound { query, result }
                });
            }
            Cmd::FetchElevation(request) => {
                let provider = Arc::clone(&self.provider);
                self.tasks.spawn(async move {
                    let totals = fetch_elevation_totals(provider.as_ref(), &request.path).await;
                    Msg::ElevationComputed {
                        generation: request.generation,
                        totals,
                    }
                });
            }
            Cmd::CreateRoute(request) => {
                let routes = Arc::clone(&self.routes);
                self.tasks
                    .spawn(async move { Msg::RouteSaved(routes.create_route(request).await) });
            }
            Cmd::ListRoutes => {
                let routes = Arc::clone(&self.routes);
                self.tasks
                    .spawn(async move { Msg::RoutesLoaded(routes.list_routes().await) });
            }
        }
    }

    fn complete(&mut self, joined: Result<Msg, JoinError>) {
        match joined {
            Ok(msg) => self.dispatch(msg),
            Err(err) => tracing::error!("planner task failed: {err}"),
        }
    }

    /// Processes queued input and command results until nothing is left in
    /// flight.
    pub async fn settle(&mut self) {
        loop {
            if let Ok(msg) = self.inbox.try_recv() {
                self.dispatch(msg);
                continue;
            }
            match self.tasks.join_next().await {
                Some(joined) => self.complete(joined),
                None => return,
            }
        }
    }

    /// Runs until every [`MsgSender`] is dropped and all commands finished,
    /// then hands back the final model.
    pub async fn run(mut self) -> Model {
        loop {
            tokio::select! {
                Some(msg) = self.inbox.recv() => self.dispatch(msg),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.complete(joined)
                }
                else => break,
            }
        }
        self.model
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use shared::{LatLng, SaveRouteRequest, SavedRoute};

    use super::*;
    use crate::error::{PersistenceError, ProviderError};
    use crate::provider::{
        Directions, DirectionsService, ElevationService, GeocodingService, Leg,
    };
    use crate::render::RecordingRenderer;
    use crate::session::RouteLibrary;

    /// Straight-line directions, 100 m per segment, and a rising profile.
    #[derive(Default)]
    struct StraightLines {
        segment_calls: Mutex<usize>,
    }

    impl DirectionsService for StraightLines {
        async fn walking_segment(
            &self,
            origin: LatLng,
            destination: LatLng,
        ) -> Result<Directions, ProviderError> {
            *self.segment_calls.lock().unwrap() += 1;
            Ok(Directions {
                path: vec![origin, destination],
                legs: vec![Leg {
                    distance_meters: 100.0,
                    duration_seconds: 72.0,
                }],
                via_points: Vec::new(),
            })
        }
    }

    impl GeocodingService for StraightLines {
        async fn geocode(&self, query: &str) -> Result<LatLng, ProviderError> {
            match query {
                "Union Station" => Ok(LatLng::new(43.6453, -79.3806)),
                _ => Err(ProviderError::NoResult),
            }
        }
    }

    impl ElevationService for StraightLines {
        async fn elevation_along_path(
            &self,
            path: &[LatLng],
            samples: usize,
        ) -> Result<Vec<f64>, ProviderError> {
            assert!(samples <= path.len());
            Ok((0..samples).map(|i| 100.0 + i as f64 * 2.0).collect())
        }
    }

    #[derive(Default)]
    struct InMemoryRoutes {
        saved: Mutex<Vec<SavedRoute>>,
    }

    impl RouteApi for InMemoryRoutes {
        async fn create_route(&self, request: SaveRouteRequest) -> Result<SavedRoute, PersistenceError> {
            let mut saved = self.saved.lock().unwrap();
            let route = SavedRoute {
                id: saved.len() as i64 + 1,
                name: request.name,
                description: request.description,
                overview_path: request.overview_path,
                encoded_polyline: request.encoded_polyline.unwrap_or_default(),
                markers: request.markers,
                waypoints: request.waypoints,
                distance: request.distance,
                duration: request.duration,
                elevation_gain: request.elevation_gain,
                elevation_loss: request.elevation_loss,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            saved.push(route.clone());
            Ok(route)
        }

        async fn list_routes(&self) -> Result<Vec<SavedRoute>, PersistenceError> {
            Ok(self.saved.lock().unwrap().iter().rev().cloned().collect())
        }
    }

    fn runtime() -> (
        Runtime<StraightLines, InMemoryRoutes>,
        MsgSender,
        Arc<StraightLines>,
        Arc<InMemoryRoutes>,
    ) {
        let renderer: Arc<dyn MapRenderer> = Arc::new(RecordingRenderer::default());
        let provider = Arc::new(StraightLines::default());
        let routes = Arc::new(InMemoryRoutes::default());
        let (runtime, sender) = Runtime::new(renderer, provider.clone(), routes.clone());
        (runtime, sender, provider, routes)
    }

    #[tokio::test]
    async fn clicks_become_segments_and_metrics() {
        let (mut runtime, _sender, provider, _) = runtime();
        for (lat, lng) in [(43.640, -79.380), (43.641, -79.381), (43.642, -79.382)] {
            runtime.dispatch(Msg::MapClicked { lat, lng });
        }
        assert_eq!(runtime.in_flight(), 2);

        runtime.settle().await;

        let model = runtime.model();
        assert_eq!(model.segments().len(), 2);
        assert_eq!(*provider.segment_calls.lock().unwrap(), 2);
        assert_eq!(model.metrics().total_distance_km, 0.2);
        // Four path points, four samples rising 2 m each.
        assert_eq!(model.metrics().elevation_gain_m, 6);
        assert_eq!(model.metrics().elevation_loss_m, 0);
    }

    #[tokio::test]
    async fn undo_before_response_drops_the_segment() {
        let (mut runtime, _sender, _, _) = runtime();
        runtime.dispatch(Msg::MapClicked { lat: 43.640, lng: -79.380 });
        runtime.dispatch(Msg::MapClicked { lat: 43.641, lng: -79.381 });
        runtime.dispatch(Msg::Undo);

        runtime.settle().await;

        assert!(runtime.model().segments().is_empty());
        assert_eq!(runtime.model().waypoints().len(), 1);
    }

    #[tokio::test]
    async fn save_then_list() {
        let (mut runtime, sender, _, routes) = runtime();
        sender.send(Msg::PlaceSearched("Union Station".into()));
        runtime.settle().await;
        sender.send(Msg::MapClicked { lat: 43.6426, lng: -79.3871 });
        runtime.settle().await;
        sender.send(Msg::Save {
            name: "To the tower".into(),
            description: String::new(),
        });
        sender.send(Msg::LoadRoutes);
        runtime.settle().await;

        let model = runtime.model();
        let saved = model.last_saved().expect("route saved");
        assert_eq!(saved.name, "To the tower");
        assert_eq!(saved.markers[0].name, "Union Station");
        assert_eq!(saved.duration, 72.0);
        assert!(model.waypoints().is_empty());
        assert_eq!(routes.saved.lock().unwrap().len(), 1);
        assert!(matches!(model.library(), RouteLibrary::Loaded(list) if list.len() == 1));
    }

    #[tokio::test]
    async fn run_stops_when_senders_are_gone() {
        let (runtime, sender, _, _) = runtime();
        let handle = tokio::spawn(runtime.run());

        sender.send(Msg::MapClicked { lat: 43.640, lng: -79.380 });
        sender.send(Msg::MapClicked { lat: 43.641, lng: -79.381 });
        drop(sender);

        let model = handle.await.unwrap();
        assert_eq!(model.waypoints().len(), 2);
        assert_eq!(model.segments().len(), 1);
    }
}
