use thiserror::Error;

/// Rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least 2 waypoints are required to save a route, got {0}")]
    NotEnoughWaypoints(usize),
    #[error("route name is required")]
    MissingName,
}

/// Routing, geocoding or elevation call failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned status {status}{detail}", detail = suffix(.message))]
    Status {
        status: String,
        message: Option<String>,
    },
    #[error("provider returned no result")]
    NoResult,
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Create/list call against the routes API failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("routes API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("routes API rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}
