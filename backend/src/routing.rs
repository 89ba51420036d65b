use crate::error::RouteError;
use crate::models::{Coordinate, RouteBounds, RouteInfo, RouteMetadata};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Number of equal steps in the synthetic straight-line path (21 points).
pub const FALLBACK_STEPS: usize = 20;
/// Average speed assumed when estimating the duration of a straight line.
pub const FALLBACK_SPEED_KMH: f64 = 50.0;

pub fn validate_coordinate(coord: Coordinate) -> Result<Coordinate, RouteError> {
    if coord.is_valid() {
        Ok(coord)
    } else {
        Err(RouteError::InvalidCoordinate {
            lat: coord.lat,
            lon: coord.lon,
        })
    }
}

/// Linear interpolation from `start` to `end`; the endpoints are copied
/// verbatim so the path starts and ends exactly on the inputs.
pub fn straight_line_path(start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
    let mut path = Vec::with_capacity(FALLBACK_STEPS + 1);
    path.push(start);
    for i in 1..FALLBACK_STEPS {
        let t = i as f64 / FALLBACK_STEPS as f64;
        path.push(start.interpolate(end, t));
    }
    path.push(end);
    path
}

/// Route used when every provider failed.
pub fn straight_line_route(start: Coordinate, end: Coordinate) -> RouteInfo {
    let distance_km = haversine_km(start, end);
    RouteInfo {
        distance_meters: distance_km * 1000.0,
        duration_seconds: distance_km / FALLBACK_SPEED_KMH * 3600.0,
        path: straight_line_path(start, end),
    }
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn route_metadata(path: &[Coordinate]) -> Option<RouteMetadata> {
    let start = *path.first()?;
    let end = *path.last()?;
    let bounds = path.iter().fold(
        RouteBounds {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        },
        |acc, c| RouteBounds {
            min_lat: acc.min_lat.min(c.lat),
            max_lat: acc.max_lat.max(c.lat),
            min_lon: acc.min_lon.min(c.lon),
            max_lon: acc.max_lon.max(c.lon),
        },
    );

    Some(RouteMetadata {
        point_count: path.len(),
        bounds,
        start,
        end,
    })
}
