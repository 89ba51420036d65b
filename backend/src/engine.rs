use std::sync::Arc;

use reqwest::Client;

use crate::{
    config::Config,
    error::RouteError,
    gpx_export::encode_route_as_gpx,
    models::{Coordinate, ProviderOutcome, RouteInfo, RouteResponse},
    providers::{OpenRouteServiceProvider, OsrmProvider, RouteProvider},
    routing::{route_metadata, straight_line_route, validate_coordinate},
    segments::segment,
};

/// Ordered provider chain with a straight-line last resort.
///
/// The first provider is the primary; any later provider that answers makes
/// the outcome [`ProviderOutcome::FallbackSucceeded`]. When every provider
/// fails the route degrades to [`straight_line_route`], so a route is always
/// produced for valid coordinates.
#[derive(Clone)]
pub struct RouteEngine {
    providers: Vec<Arc<dyn RouteProvider>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub info: RouteInfo,
    pub outcome: ProviderOutcome,
}

impl RouteEngine {
    pub fn new(providers: Vec<Arc<dyn RouteProvider>>) -> Self {
        Self { providers }
    }

    /// OpenRouteService first, then OSRM, both on `client`.
    pub fn with_client(client: Client, config: &Config) -> Self {
        if config.ors_api_key.is_none() {
            tracing::warn!("ORS_API_KEY not set; primary routing provider may reject requests");
        }
        let primary: Arc<dyn RouteProvider> = Arc::new(OpenRouteServiceProvider::new(
            client.clone(),
            config.ors_url.clone(),
            config.ors_api_key.clone(),
        ));
        let fallback: Arc<dyn RouteProvider> =
            Arc::new(OsrmProvider::new(client, config.osrm_url.clone()));
        Self::new(vec![primary, fallback])
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn route(&self, start: Coordinate, end: Coordinate) -> Result<PlannedRoute, RouteError> {
        let start = validate_coordinate(start)?;
        let end = validate_coordinate(end)?;

        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.attempt_route(start, end).await {
                Ok(info) => {
                    let outcome = if idx == 0 {
                        ProviderOutcome::PrimarySucceeded
                    } else {
                        ProviderOutcome::FallbackSucceeded
                    };
                    tracing::debug!(
                        "route via {}: {:.0} m, {} points",
                        provider.name(),
                        info.distance_meters,
                        info.path.len()
                    );
                    return Ok(PlannedRoute { info, outcome });
                }
                Err(err) => {
                    tracing::warn!("routing provider {} failed: {err}", provider.name());
                }
            }
        }

        tracing::warn!("all routing providers failed, using straight-line estimate");
        Ok(PlannedRoute {
            info: straight_line_route(start, end),
            outcome: ProviderOutcome::BothFailed,
        })
    }
}

impl PlannedRoute {
    pub fn into_response(self, max_segments: usize) -> Result<RouteResponse, RouteError> {
        let segments = segment(&self.info.path, max_segments, self.outcome.color_tag());
        let gpx_base64 = encode_route_as_gpx(&self.info.path, self.outcome)?;
        let metadata = route_metadata(&self.info.path);

        Ok(RouteResponse {
            route: self.info,
            outcome: self.outcome,
            segments,
            gpx_base64,
            metadata,
        })
    }
}
