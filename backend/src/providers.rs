//! Driving-directions providers.
//!
//! Each provider is one strategy behind [`RouteProvider`]; the engine tries
//! them in order. Both shipped providers answer with GeoJSON geometry in
//! (longitude, latitude) order, which [`lonlat_to_path`] converts once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::{Coordinate, RouteInfo};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {source}")]
    Http {
        provider: &'static str,
        source: reqwest::Error,
    },
    #[error("{provider} returned status {status}")]
    Status {
        provider: &'static str,
        status: StatusCode,
    },
    #[error("{provider} response could not be parsed: {source}")]
    Parse {
        provider: &'static str,
        source: serde_json::Error,
    },
    #[error("{provider} response did not contain a route")]
    MissingRoute { provider: &'static str },
    #[error("{provider} returned unusable geometry: {reason}")]
    Geometry {
        provider: &'static str,
        reason: String,
    },
}

/// One way of obtaining a road-following route between two points.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteInfo, ProviderError>;
}

pub fn http_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

/// Converts provider `[lon, lat]` pairs into `(lat, lon)` coordinates.
pub fn lonlat_to_path(points: &[Vec<f64>]) -> Result<Vec<Coordinate>, String> {
    if points.len() < 2 {
        return Err(format!("expected at least 2 points, got {}", points.len()));
    }
    points
        .iter()
        .enumerate()
        .map(|(idx, pair)| match pair.as_slice() {
            [lon, lat, ..] => {
                let coord = Coordinate {
                    lat: *lat,
                    lon: *lon,
                };
                if coord.is_valid() {
                    Ok(coord)
                } else {
                    Err(format!("point {idx} out of range: [{lon}, {lat}]"))
                }
            }
            _ => Err(format!("point {idx} has {} ordinates", pair.len())),
        })
        .collect()
}

fn build_route(
    provider: &'static str,
    distance: f64,
    duration: f64,
    geometry: &LineGeometry,
) -> Result<RouteInfo, ProviderError> {
    if !(distance.is_finite() && distance >= 0.0 && duration.is_finite() && duration >= 0.0) {
        return Err(ProviderError::Geometry {
            provider,
            reason: format!("distance {distance} / duration {duration} not usable"),
        });
    }
    let path = lonlat_to_path(&geometry.coordinates)
        .map_err(|reason| ProviderError::Geometry { provider, reason })?;
    Ok(RouteInfo {
        distance_meters: distance,
        duration_seconds: duration,
        path,
    })
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status { provider, status });
    }

    let text = response
        .text()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    serde_json::from_str(&text).map_err(|source| {
        tracing::debug!(provider, "unparseable body: {text}");
        ProviderError::Parse { provider, source }
    })
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<Vec<f64>>,
}

// --- OpenRouteService (primary) ---

#[derive(Debug, Deserialize)]
struct OrsResponse {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsFeature {
    geometry: LineGeometry,
    properties: OrsProperties,
}

#[derive(Debug, Deserialize)]
struct OrsProperties {
    #[serde(default)]
    segments: Vec<OrsSegment>,
}

#[derive(Debug, Deserialize)]
struct OrsSegment {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

pub struct OpenRouteServiceProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenRouteServiceProvider {
    pub const NAME: &'static str = "openrouteservice";

    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl RouteProvider for OpenRouteServiceProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteInfo, ProviderError> {
        let url = format!(
            "{}/v2/directions/driving-car",
            self.base_url.trim_end_matches('/')
        );
        let mut query = vec![
            ("start", format!("{},{}", start.lon, start.lat)),
            ("end", format!("{},{}", end.lon, end.lat)),
        ];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }

        tracing::debug!(
            "[{}] directions ({:.5},{:.5}) -> ({:.5},{:.5})",
            Self::NAME,
            start.lat,
            start.lon,
            end.lat,
            end.lon
        );
        let request = self
            .client
            .get(&url)
            .query(&query)
            .header(
                reqwest::header::ACCEPT,
                "application/json, application/geo+json",
            );
        let body: OrsResponse = fetch_json(Self::NAME, request).await?;

        let feature = body
            .features
            .first()
            .ok_or(ProviderError::MissingRoute { provider: Self::NAME })?;
        let segment = feature
            .properties
            .segments
            .first()
            .ok_or(ProviderError::MissingRoute { provider: Self::NAME })?;

        build_route(
            Self::NAME,
            segment.distance,
            segment.duration,
            &feature.geometry,
        )
    }
}

// --- OSRM (fallback) ---

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: LineGeometry,
    distance: f64,
    duration: f64,
}

pub struct OsrmProvider {
    client: Client,
    base_url: String,
}

impl OsrmProvider {
    pub const NAME: &'static str = "osrm";

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RouteProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteInfo, ProviderError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            start.lon,
            start.lat,
            end.lon,
            end.lat
        );
        tracing::debug!("[{}] GET {url}", Self::NAME);

        let request = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")]);
        let body: OsrmResponse = fetch_json(Self::NAME, request).await?;

        let route = body
            .routes
            .first()
            .ok_or(ProviderError::MissingRoute { provider: Self::NAME })?;

        build_route(Self::NAME, route.distance, route.duration, &route.geometry)
    }
}
