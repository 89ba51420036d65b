use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::RouteError;
use crate::models::{Coordinate, ProviderOutcome};

const CREATOR: &str = "awas";

/// Encodes the route as a single-track GPX 1.1 document, base64 encoded.
pub fn encode_route_as_gpx(
    path: &[Coordinate],
    outcome: ProviderOutcome,
) -> Result<String, RouteError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(CREATOR.into()),
        description: Some(track_description(outcome).into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    segment.points.extend(path.iter().map(to_waypoint));
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn track_description(outcome: ProviderOutcome) -> &'static str {
    match outcome {
        ProviderOutcome::PrimarySucceeded => "driving route (primary provider)",
        ProviderOutcome::FallbackSucceeded => "driving route (fallback provider)",
        ProviderOutcome::BothFailed => "straight-line estimate",
    }
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}
