pub use shared::{
    ApiError, ColorTag, Coordinate, GeocodeRequest, NamedPoint, PlanRequest, ProviderOutcome,
    RouteBounds, RouteInfo, RouteMetadata, RouteRequest, RouteResponse, RouteSegment, Slot,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRequest {
    pub slot: Slot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TapRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRequest {
    pub slot: Slot,
    pub address: String,
}
