//! Google Maps web-service client: walking directions, geocoding and
//! elevation along a path.

use geo_types::Coord;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::LatLng;

use crate::config::PlannerConfig;
use crate::error::ProviderError;
use crate::provider::{Directions, DirectionsService, ElevationService, GeocodingService, Leg};

const POLYLINE_PRECISION: u32 = 5;

pub struct GoogleMapsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(&config.maps_api_base, &config.maps_api_key)
    }

    async fn get<T>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, ProviderError>
    where
        T: DeserializeOwned + Envelope,
    {
        let url = format!("{}/{endpoint}/json", self.base_url);
        let response: T = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_status(response.status(), response.error_message())?;
        Ok(response)
    }
}

impl DirectionsService for GoogleMapsClient {
    async fn walking_segment(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<Directions, ProviderError> {
        let response: DirectionsResponse = self
            .get(
                "directions",
                &[
                    ("origin", format_lat_lng(origin)),
                    ("destination", format_lat_lng(destination)),
                    ("mode", "walking".to_string()),
                ],
            )
            .await?;
        response.into_directions()
    }
}

impl GeocodingService for GoogleMapsClient {
    async fn geocode(&self, query: &str) -> Result<LatLng, ProviderError> {
        let response: GeocodeResponse = self
            .get("geocode", &[("address", query.to_string())])
            .await?;
        response
            .results
            .into_iter()
            .next()
            .map(|result| result.geometry.location)
            .ok_or(ProviderError::NoResult)
    }
}

impl ElevationService for GoogleMapsClient {
    async fn elevation_along_path(
        &self,
        path: &[LatLng],
        samples: usize,
    ) -> Result<Vec<f64>, ProviderError> {
        let encoded = encode_polyline(path)?;
        let response: ElevationResponse = self
            .get(
                "elevation",
                &[
                    ("path", format!("enc:{encoded}")),
                    ("samples", samples.to_string()),
                ],
            )
            .await?;
        Ok(response.results.into_iter().map(|r| r.elevation).collect())
    }
}

trait Envelope {
    fn status(&self) -> &str;
    fn error_message(&self) -> Option<&str>;
}

macro_rules! envelope {
    ($($ty:ty),*) => {
        $(impl Envelope for $ty {
            fn status(&self) -> &str {
                &self.status
            }
            fn error_message(&self) -> Option<&str> {
                self.error_message.as_deref()
            }
        })*
    };
}

envelope!(DirectionsResponse, GeocodeResponse, ElevationResponse);

fn check_status(status: &str, message: Option<&str>) -> Result<(), ProviderError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" | "NOT_FOUND" => Err(ProviderError::NoResult),
        other => Err(ProviderError::Status {
            status: other.to_string(),
            message: message.map(str::to_string),
        }),
    }
}

fn format_lat_lng(point: LatLng) -> String {
    format!("{},{}", point.lat, point.lng)
}

fn encode_polyline(path: &[LatLng]) -> Result<String, ProviderError> {
    polyline::encode_coordinates(
        path.iter().map(|p| Coord { x: p.lng, y: p.lat }),
        POLYLINE_PRECISION,
    )
    .map_err(|err| ProviderError::InvalidGeometry(err.to_string()))
}

fn decode_polyline(encoded: &str) -> Result<Vec<LatLng>, ProviderError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|err| ProviderError::InvalidGeometry(err.to_string()))?;
    Ok(line.0.into_iter().map(|c| LatLng::new(c.y, c.x)).collect())
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    #[serde(default)]
    duration: Option<TextValue>,
    #[serde(default)]
    via_waypoint: Vec<ViaWaypoint>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ViaWaypoint {
    location: LatLng,
}

impl DirectionsResponse {
    fn into_directions(self) -> Result<Directions, ProviderError> {
        let route = self.routes.into_iter().next().ok_or(ProviderError::NoResult)?;
        let path = decode_polyline(&route.overview_polyline.points)?;

        let mut legs = Vec::with_capacity(route.legs.len());
        let mut via_points = Vec::new();
        for leg in route.legs {
            legs.push(Leg {
                distance_meters: leg.distance.value,
                duration_seconds: leg.duration.map(|d| d.value).unwrap_or_default(),
            });
            via_points.extend(leg.via_waypoint.into_iter().map(|via| via.location));
        }

        Ok(Directions {
            path,
            legs,
            via_points,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}
