use std::env;

use crate::error::ConfigError;

pub const DEFAULT_MAPS_API_BASE: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_ROUTES_API_URL: &str = "http://localhost:3500";

/// Endpoints and credentials for the maps provider and the routes API.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub maps_api_key: String,
    pub maps_api_base: String,
    pub routes_api_url: String,
}

impl PlannerConfig {
    /// Reads `MAPS_API_KEY` (required), `MAPS_API_BASE` and `ROUTES_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`PlannerConfig::from_env`] but resolves each variable through
    /// `lookup`, so callers can layer command-line values over the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            maps_api_key: non_empty("MAPS_API_KEY").ok_or(ConfigError::MissingVar("MAPS_API_KEY"))?,
            maps_api_base: non_empty("MAPS_API_BASE")
                .unwrap_or_else(|| DEFAULT_MAPS_API_BASE.to_string()),
            routes_api_url: non_empty("ROUTES_API_URL")
                .unwrap_or_else(|| DEFAULT_ROUTES_API_URL.to_string()),
        })
    }
}
