use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Which endpoint of the route a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Start,
    End,
}

impl Slot {
    pub fn label(self) -> &'static str {
        match self {
            Slot::Start => "Start",
            Slot::End => "End",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub coord: Coordinate,
    pub label: String,
}

impl NamedPoint {
    pub fn from_address(coord: Coordinate, address: &str) -> Self {
        Self {
            coord,
            label: address.trim().to_string(),
        }
    }

    /// Point created by tapping the map, e.g. `Start (37.8199, -122.4783)`.
    pub fn tapped(slot: Slot, coord: Coordinate) -> Self {
        Self {
            coord,
            label: format!("{} ({:.4}, {:.4})", slot.label(), coord.lat, coord.lon),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderOutcome {
    PrimarySucceeded,
    FallbackSucceeded,
    BothFailed,
}

impl ProviderOutcome {
    /// Only a fully degraded route is drawn differently.
    pub fn color_tag(self) -> ColorTag {
        match self {
            ProviderOutcome::PrimarySucceeded | ProviderOutcome::FallbackSucceeded => {
                ColorTag::Primary
            }
            ProviderOutcome::BothFailed => ColorTag::Fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: Coordinate,
    pub end: Coordinate,
    pub color_tag: ColorTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_segments: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub start_address: String,
    pub end_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMetadata {
    pub point_count: usize,
    pub bounds: RouteBounds,
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub route: RouteInfo,
    pub outcome: ProviderOutcome,
    pub segments: Vec<RouteSegment>,
    pub gpx_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RouteMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
