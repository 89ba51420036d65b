//! Built-in demonstration feed and distance filtering.

use serde::{Deserialize, Serialize};

use crate::models::Coordinate;
use crate::routing::haversine_km;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demonstration {
    pub id: u32,
    pub name: String,
    pub cause: String,
    pub date: String,
    pub time: String,
    pub coord: Coordinate,
    pub attendees: u32,
    pub security_level: SecurityLevel,
    pub description: String,
    pub motives: String,
    pub campaigns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyDemonstration {
    #[serde(flatten)]
    pub demonstration: Demonstration,
    pub distance_km: f64,
}

struct FeedEntry {
    name: &'static str,
    cause: &'static str,
    date: &'static str,
    time: &'static str,
    lat: f64,
    lon: f64,
    attendees: u32,
    security_level: SecurityLevel,
    description: &'static str,
    motives: &'static str,
    campaigns: &'static [&'static str],
}

const FEED: [FeedEntry; 4] = [
    FeedEntry {
        name: "Climate Action Rally",
        cause: "Environmental Justice",
        date: "2024-01-15",
        time: "14:00",
        lat: 40.7589,
        lon: -73.9851,
        attendees: 250,
        security_level: SecurityLevel::Medium,
        description: "Join us for a peaceful demonstration calling for immediate climate action and environmental justice.",
        motives: "Raise awareness for climate change and demand policy action.",
        campaigns: &["Green New Deal", "Fridays for Future"],
    },
    FeedEntry {
        name: "Workers Rights March",
        cause: "Labor Rights",
        date: "2024-01-18",
        time: "10:00",
        lat: 40.7505,
        lon: -73.9934,
        attendees: 180,
        security_level: SecurityLevel::High,
        description: "Standing together for fair wages, safe working conditions, and workers' dignity.",
        motives: "Demand fair wages and safe working conditions.",
        campaigns: &["Fight for $15", "Unionize Now"],
    },
    FeedEntry {
        name: "Housing Justice Demonstration",
        cause: "Housing Rights",
        date: "2024-01-20",
        time: "16:00",
        lat: 40.7614,
        lon: -73.9776,
        attendees: 320,
        security_level: SecurityLevel::Low,
        description: "Demanding affordable housing and tenant protections for all community members.",
        motives: "Advocate for affordable housing and tenant protections.",
        campaigns: &["Rent Control", "Homes for All"],
    },
    FeedEntry {
        name: "Education Funding Rally",
        cause: "Education",
        date: "2024-01-22",
        time: "11:00",
        lat: 40.7282,
        lon: -73.9942,
        attendees: 150,
        security_level: SecurityLevel::Medium,
        description: "Advocating for increased education funding and resources for public schools.",
        motives: "Increase funding for public education.",
        campaigns: &["Fund Our Schools", "Teachers United"],
    },
];

pub fn all() -> Vec<Demonstration> {
    FEED.iter()
        .enumerate()
        .map(|(idx, entry)| Demonstration {
            id: idx as u32 + 1,
            name: entry.name.to_string(),
            cause: entry.cause.to_string(),
            date: entry.date.to_string(),
            time: entry.time.to_string(),
            coord: Coordinate::new(entry.lat, entry.lon),
            attendees: entry.attendees,
            security_level: entry.security_level,
            description: entry.description.to_string(),
            motives: entry.motives.to_string(),
            campaigns: entry.campaigns.iter().map(|c| c.to_string()).collect(),
        })
        .collect()
}

/// Demonstrations within `radius_km` of `center`, nearest first.
pub fn nearby(center: Coordinate, radius_km: f64) -> Vec<NearbyDemonstration> {
    let mut found: Vec<NearbyDemonstration> = all()
        .into_iter()
        .map(|demonstration| NearbyDemonstration {
            distance_km: haversine_km(center, demonstration.coord),
            demonstration,
        })
        .filter(|d| d.distance_km <= radius_km)
        .collect();
    found.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    found
}
