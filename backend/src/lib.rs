pub mod database;
pub mod error;
pub mod gpx_export;
pub mod models;
pub mod saved_routes_handlers;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::database::RouteRepository;
use crate::saved_routes_handlers::{create_route, get_route, get_route_gpx, list_routes};

pub fn create_router<R: RouteRepository>(repo: Arc<R>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/map", get(list_routes::<R>).post(create_route::<R>))
        .route("/map/:id", get(get_route::<R>))
        .route("/map/:id/gpx", get(get_route_gpx::<R>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(repo)
}
