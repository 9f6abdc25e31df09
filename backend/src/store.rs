use chrono::Utc;
use shared::SavedRoute;
use tokio::sync::RwLock;

use crate::database::{DatabaseError, RouteRepository};
use crate::models::NewRoute;

/// Process-local repository, used when no database is configured.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    routes: RwLock<Vec<SavedRoute>>,
}

impl RouteRepository for MemoryStore {
    async fn save_route(&self, route: NewRoute) -> Result<SavedRoute, DatabaseError> {
        let mut routes = self.routes.write().await;
        let now = Utc::now();
        let saved = SavedRoute {
            id: routes.last().map_or(1, |last| last.id + 1),
            name: route.name,
            description: route.description,
            overview_path: route.overview_path,
            encoded_polyline: route.encoded_polyline,
            markers: route.markers,
            waypoints: route.waypoints,
            distance: route.distance,
            duration: route.duration,
            elevation_gain: route.elevation_gain,
            elevation_loss: route.elevation_loss,
            created_at: now,
            updated_at: now,
        };
        routes.push(saved.clone());
        tracing::info!("Route saved: {} (ID: {})", saved.name, saved.id);
        Ok(saved)
    }

    async fn list_routes(&self) -> Result<Vec<SavedRoute>, DatabaseError> {
        Ok(self.routes.read().await.iter().rev().cloned().collect())
    }

    async fn get_route(&self, id: i64) -> Result<SavedRoute, DatabaseError> {
        self.routes
            .read()
            .await
            .iter()
            .find(|route| route.id == id)
            .cloned()
            .ok_or(DatabaseError::NotFound(id))
    }
}
