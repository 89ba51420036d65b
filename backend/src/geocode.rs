//! Forward geocoding of free-text addresses.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::{Coordinate, NamedPoint};

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("address is empty")]
    EmptyAddress,
    #[error("no location found for {0:?}")]
    NotFound(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Resolves `address` and labels the point with the trimmed address text.
pub async fn resolve_point(
    geocoder: &dyn Geocoder,
    address: &str,
) -> Result<NamedPoint, GeocodeError> {
    let coord = geocoder.resolve(address).await?;
    Ok(NamedPoint::from_address(coord, address))
}

#[derive(Debug, Deserialize)]
struct Candidate {
    lat: String,
    lon: String,
}

impl Candidate {
    fn coordinate(&self) -> Option<Coordinate> {
        let coord = Coordinate {
            lat: self.lat.trim().parse().ok()?,
            lon: self.lon.trim().parse().ok()?,
        };
        coord.is_valid().then_some(coord)
    }
}

/// Nominatim-style `search?format=json` geocoder.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, String> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {status}"));
        }
        response
            .json::<Vec<Candidate>>()
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }

        let candidates = match self.search(query).await {
            Ok(candidates) => candidates,
            Err(reason) => {
                tracing::warn!("geocoding {query:?} failed: {reason}");
                return Err(GeocodeError::NotFound(query.to_string()));
            }
        };

        let Some(candidate) = candidates.first() else {
            tracing::debug!("geocoding {query:?} returned no candidates");
            return Err(GeocodeError::NotFound(query.to_string()));
        };

        candidate.coordinate().ok_or_else(|| {
            tracing::warn!(
                "geocoding {query:?} returned unusable coordinates ({}, {})",
                candidate.lat,
                candidate.lon
            );
            GeocodeError::NotFound(query.to_string())
        })
    }
}
