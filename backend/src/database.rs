// PostgreSQL storage for saved routes.
// Geometry and marker lists are stored as JSONB, metrics as plain columns.

use std::future::Future;

use chrono::{DateTime, Utc};
use shared::{LatLng, Marker, RouteWaypoint, SavedRoute};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::models::NewRoute;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Route not found: {0}")]
    NotFound(i64),

    #[error("Invalid route data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Storage for saved routes. Routes are created once and only read after.
pub trait RouteRepository: Send + Sync + 'static {
    fn save_route(
        &self,
        route: NewRoute,
    ) -> impl Future<Output = Result<SavedRoute, DatabaseError>> + Send;

    /// All routes, newest first.
    fn list_routes(&self) -> impl Future<Output = Result<Vec<SavedRoute>, DatabaseError>> + Send;

    fn get_route(&self, id: i64) -> impl Future<Output = Result<SavedRoute, DatabaseError>> + Send;
}

#[derive(Debug, FromRow)]
struct RouteRow {
    id: i64,
    name: String,
    description: String,
    overview_path: Json<Vec<LatLng>>,
    encoded_polyline: String,
    markers: Json<Vec<Marker>>,
    waypoints: Json<Vec<RouteWaypoint>>,
    distance: f64,
    duration: f64,
    elevation_gain: f64,
    elevation_loss: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RouteRow> for SavedRoute {
    fn from(row: RouteRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            overview_path: row.overview_path.0,
            encoded_polyline: row.encoded_polyline,
            markers: row.markers.0,
            waypoints: row.waypoints.0,
            distance: row.distance,
            duration: row.duration,
            elevation_gain: row.elevation_gain,
            elevation_loss: row.elevation_loss,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create new database connection pool
    ///
    /// # Errors
    /// Returns DatabaseError if the URL is not a PostgreSQL URL or the
    /// connection fails
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(DatabaseError::ConfigError(
                "DATABASE_URL must be a postgres:// URL".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        // sqlx::query() runs a single statement; the migration file holds several.
        let mut conn = self.pool.acquire().await?;
        let migration_sql = include_str!("../migrations/20250301_create_routes.sql");
        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

impl RouteRepository for Database {
    async fn save_route(&self, route: NewRoute) -> Result<SavedRoute, DatabaseError> {
        let row = sqlx::query_as::<_, RouteRow>(
            r#"
            INSERT INTO routes (
                name, description, overview_path, encoded_polyline, markers, waypoints,
                distance, duration, elevation_gain, elevation_loss
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&route.name)
        .bind(&route.description)
        .bind(Json(&route.overview_path))
        .bind(&route.encoded_polyline)
        .bind(Json(&route.markers))
        .bind(Json(&route.waypoints))
        .bind(route.distance)
        .bind(route.duration)
        .bind(route.elevation_gain)
        .bind(route.elevation_loss)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Route saved: {} (ID: {})", row.name, row.id);
        Ok(row.into())
    }

    async fn list_routes(&self) -> Result<Vec<SavedRoute>, DatabaseError> {
        let rows = sqlx::query_as::<_, RouteRow>(
            "SELECT * FROM routes ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Retrieved {} routes", rows.len());
        Ok(rows.into_iter().map(SavedRoute::from).collect())
    }

    async fn get_route(&self, id: i64) -> Result<SavedRoute, DatabaseError> {
        sqlx::query_as::<_, RouteRow>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SavedRoute::from)
            .ok_or(DatabaseError::NotFound(id))
    }
}
