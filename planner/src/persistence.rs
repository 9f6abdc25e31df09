//! Client side of the routes API (`POST /map`, `GET /map`).

use std::future::Future;

use reqwest::StatusCode;
use shared::{ApiError, SaveRouteRequest, SavedRoute};

use crate::error::PersistenceError;

pub trait RouteApi: Send + Sync + 'static {
    fn create_route(
        &self,
        request: SaveRouteRequest,
    ) -> impl Future<Output = Result<SavedRoute, PersistenceError>> + Send;

    fn list_routes(&self) -> impl Future<Output = Result<Vec<SavedRoute>, PersistenceError>> + Send;
}

pub struct HttpRouteApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRouteApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/map", base_url.trim_end_matches('/')),
        }
    }
}

impl RouteApi for HttpRouteApi {
    async fn create_route(&self, request: SaveRouteRequest) -> Result<SavedRoute, PersistenceError> {
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let response = ensure_success(response).await?;
        let saved: SavedRoute = response.json().await?;
        tracing::info!("route '{}' saved with id {}", saved.name, saved.id);
        Ok(saved)
    }

    async fn list_routes(&self) -> Result<Vec<SavedRoute>, PersistenceError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PersistenceError::Rejected {
        status: status.as_u16(),
        message: rejection_message(status, &body),
    })
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(error) => error.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
