// Handlers for the saved routes API (/map).

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::{ApiError, SaveRouteRequest, SavedRoute};

use crate::database::{DatabaseError, RouteRepository};
use crate::gpx_export::{file_name, route_to_gpx};
use crate::models::NewRoute;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// POST /map - Validate and store a new route
pub async fn create_route<R: RouteRepository>(
    State(repo): State<Arc<R>>,
    payload: Result<Json<SaveRouteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SavedRoute>)> {
    let Json(request) = payload.map_err(json_rejection_to_api_error)?;
    let route = NewRoute::try_from(request).map_err(db_error_to_api_error)?;

    repo.save_route(route)
        .await
        .map(|saved| (StatusCode::CREATED, Json(saved)))
        .map_err(db_error_to_api_error)
}

/// GET /map - List all saved routes, newest first
pub async fn list_routes<R: RouteRepository>(
    State(repo): State<Arc<R>>,
) -> ApiResult<Json<Vec<SavedRoute>>> {
    repo.list_routes()
        .await
        .map(Json)
        .map_err(db_error_to_api_error)
}

/// GET /map/:id - Get a specific route
pub async fn get_route<R: RouteRepository>(
    State(repo): State<Arc<R>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SavedRoute>> {
    repo.get_route(id)
        .await
        .map(Json)
        .map_err(db_error_to_api_error)
}

/// GET /map/:id/gpx - Download a route as GPX
pub async fn get_route_gpx<R: RouteRepository>(
    State(repo): State<Arc<R>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let route = repo.get_route(id).await.map_err(db_error_to_api_error)?;
    let body = route_to_gpx(&route).map_err(|err| {
        tracing::error!("GPX export of route {id} failed: {err}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/gpx+xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name(&route)),
            ),
        ],
        body,
    ))
}

/// Convert DatabaseError to API error response
fn db_error_to_api_error(err: DatabaseError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match err {
        DatabaseError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            format!("Route with ID {} not found", id),
        ),
        DatabaseError::InvalidData(msg) => (StatusCode::BAD_REQUEST, msg),
        DatabaseError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        DatabaseError::ConnectionError(e) => {
            tracing::error!("database error: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Database connection error: {}", e),
            )
        }
    };

    api_error(status, message)
}

/// Every body rejection (syntax, data or content type) is reported as 400.
fn json_rejection_to_api_error(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    api_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn api_error(status: StatusCode, message: String) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { message }))
}
