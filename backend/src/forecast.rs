//! Safety forecast built from current weather and traffic flow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::geocode::Geocoder;
use crate::models::Coordinate;

/// Used when the profile has no location or it cannot be resolved (Jakarta).
pub const DEFAULT_LOCATION: Coordinate = Coordinate {
    lat: -6.1751,
    lon: 106.8650,
};
pub const DEFAULT_LOCATION_LABEL: &str = "Unknown";
const DEFAULT_TEMPERATURE_C: f64 = 22.0;
const BASE_RISK: i32 = 3;

const BASE_RECOMMENDATIONS: [&str; 3] = [
    "Stay hydrated and wear appropriate clothing",
    "Keep emergency contacts readily available",
    "Plan multiple exit routes from event areas",
];

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("{0} API key not configured")]
    MissingKey(&'static str),
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        source: reqwest::Error,
    },
    #[error("{service} returned status {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficDensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub condition: WeatherCondition,
    pub temperature_c: f64,
    pub description: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    pub density: TrafficDensity,
    pub description: String,
    /// Slowdown relative to free flow on a 0..=10 scale.
    pub avg_delay: i32,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyForecast {
    pub location: String,
    pub coord: Coordinate,
    pub weather: WeatherReport,
    pub traffic: TrafficReport,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl WeatherReport {
    fn unavailable() -> Self {
        Self {
            condition: WeatherCondition::Sunny,
            temperature_c: DEFAULT_TEMPERATURE_C,
            description: "Weather data not available".to_string(),
            available: false,
        }
    }
}

impl TrafficReport {
    fn unavailable() -> Self {
        Self {
            density: TrafficDensity::Medium,
            description: "Traffic data not available".to_string(),
            avg_delay: 0,
            available: false,
        }
    }
}

pub fn classify_weather(main: &str) -> WeatherCondition {
    let main = main.to_lowercase();
    if main.contains("cloud") {
        WeatherCondition::Cloudy
    } else if main.contains("rain") {
        WeatherCondition::Rainy
    } else if main.contains("storm") {
        WeatherCondition::Stormy
    } else {
        WeatherCondition::Sunny
    }
}

pub fn traffic_from_speeds(current_kmh: f64, free_flow_kmh: f64) -> TrafficReport {
    if !(free_flow_kmh > 0.0 && current_kmh.is_finite()) {
        return TrafficReport::unavailable();
    }
    let avg_delay = (((free_flow_kmh - current_kmh) / free_flow_kmh) * 10.0)
        .round()
        .clamp(0.0, 10.0) as i32;
    let density = match avg_delay {
        d if d <= 2 => TrafficDensity::Low,
        d if d <= 6 => TrafficDensity::Medium,
        _ => TrafficDensity::High,
    };
    TrafficReport {
        density,
        description: format!(
            "Current speed: {current_kmh} km/h, Free flow: {free_flow_kmh} km/h, Delay: {avg_delay} min"
        ),
        avg_delay,
        available: true,
    }
}

/// 1..=10, starting from a baseline of 3.
pub fn risk_score(weather: &WeatherReport, traffic: &TrafficReport) -> u8 {
    let weather_risk = match weather.condition {
        WeatherCondition::Sunny | WeatherCondition::Cloudy => 0,
        WeatherCondition::Rainy => 1,
        WeatherCondition::Stormy => 3,
    };
    let heat_risk = if weather.available && (weather.temperature_c >= 35.0 || weather.temperature_c <= 0.0) {
        1
    } else {
        0
    };
    let traffic_risk = match (traffic.available, traffic.density) {
        (false, _) | (true, TrafficDensity::Low) => 0,
        (true, TrafficDensity::Medium) => 1,
        (true, TrafficDensity::High) => 2,
    };
    (BASE_RISK + weather_risk + heat_risk + traffic_risk).clamp(1, 10) as u8
}

pub fn risk_level(score: u8) -> RiskLevel {
    match score {
        0..=3 => RiskLevel::Low,
        4..=6 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }
}

pub fn recommendations(weather: &WeatherReport, traffic: &TrafficReport) -> Vec<String> {
    let mut tips: Vec<String> = BASE_RECOMMENDATIONS.iter().map(|t| t.to_string()).collect();
    match weather.condition {
        WeatherCondition::Rainy => tips.push("Bring waterproof gear".to_string()),
        WeatherCondition::Stormy => {
            tips.push("Severe weather expected; consider staying indoors".to_string())
        }
        _ => {}
    }
    if weather.available && weather.temperature_c >= 35.0 {
        tips.push("Extreme heat: seek shade and carry extra water".to_string());
    }
    if traffic.available && traffic.density == TrafficDensity::High {
        tips.push("Heavy traffic: allow extra travel time".to_string());
    }
    tips
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherEntry>,
    main: Option<WeatherMain>,
}

#[derive(Debug, Deserialize)]
struct WeatherEntry {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct TrafficResponse {
    #[serde(rename = "flowSegmentData")]
    flow_segment_data: Option<FlowSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegment {
    current_speed: f64,
    free_flow_speed: f64,
}

pub struct ForecastClient {
    client: Client,
    geocoder: Arc<dyn Geocoder>,
    weather_url: String,
    weather_key: Option<String>,
    traffic_url: String,
    traffic_key: Option<String>,
}

impl ForecastClient {
    pub fn new(
        client: Client,
        geocoder: Arc<dyn Geocoder>,
        weather_url: impl Into<String>,
        weather_key: Option<String>,
        traffic_url: impl Into<String>,
        traffic_key: Option<String>,
    ) -> Self {
        Self {
            client,
            geocoder,
            weather_url: weather_url.into(),
            weather_key,
            traffic_url: traffic_url.into(),
            traffic_key,
        }
    }

    /// Never fails: each missing input degrades to its "not available" value.
    pub async fn forecast(&self, location: Option<&str>) -> SafetyForecast {
        let (coord, label) = self.locate(location).await;

        let (weather, traffic) = tokio::join!(self.weather(coord), self.traffic(coord));
        let weather = weather.unwrap_or_else(|err| {
            tracing::warn!("weather unavailable: {err}");
            WeatherReport::unavailable()
        });
        let traffic = traffic.unwrap_or_else(|err| {
            tracing::warn!("traffic unavailable: {err}");
            TrafficReport::unavailable()
        });

        let risk_score = risk_score(&weather, &traffic);
        SafetyForecast {
            location: label,
            coord,
            recommendations: recommendations(&weather, &traffic),
            risk_level: risk_level(risk_score),
            risk_score,
            weather,
            traffic,
            last_updated: Utc::now(),
        }
    }

    async fn locate(&self, location: Option<&str>) -> (Coordinate, String) {
        let Some(location) = location else {
            return (DEFAULT_LOCATION, DEFAULT_LOCATION_LABEL.to_string());
        };
        match self.geocoder.resolve(location).await {
            Ok(coord) => (coord, location.to_string()),
            Err(err) => {
                tracing::warn!("forecast location fallback to default: {err}");
                (DEFAULT_LOCATION, DEFAULT_LOCATION_LABEL.to_string())
            }
        }
    }

    async fn weather(&self, coord: Coordinate) -> Result<WeatherReport, ForecastError> {
        const SERVICE: &str = "weather";
        let key = self
            .weather_key
            .as_deref()
            .ok_or(ForecastError::MissingKey(SERVICE))?;
        let url = format!("{}/data/2.5/weather", self.weather_url.trim_end_matches('/'));
        let (lat, lon) = (coord.lat.to_string(), coord.lon.to_string());
        let request = self.client.get(&url).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", key),
            ("units", "metric"),
        ]);
        let body: WeatherResponse = get_json(SERVICE, request).await?;

        let entry = body.weather.first();
        Ok(WeatherReport {
            condition: classify_weather(entry.map(|e| e.main.as_str()).unwrap_or_default()),
            temperature_c: body.main.map(|m| m.temp).unwrap_or(DEFAULT_TEMPERATURE_C),
            description: entry
                .map(|e| e.description.clone())
                .unwrap_or_else(|| "No data".to_string()),
            available: true,
        })
    }

    async fn traffic(&self, coord: Coordinate) -> Result<TrafficReport, ForecastError> {
        const SERVICE: &str = "traffic";
        let key = self
            .traffic_key
            .as_deref()
            .ok_or(ForecastError::MissingKey(SERVICE))?;
        let url = format!(
            "{}/traffic/services/4/flowSegmentData/absolute/10/json",
            self.traffic_url.trim_end_matches('/')
        );
        let point = format!("{},{}", coord.lat, coord.lon);
        let body: TrafficResponse = get_json(
            SERVICE,
            self.client
                .get(&url)
                .query(&[("point", point.as_str()), ("key", key)]),
        )
        .await?;

        Ok(match body.flow_segment_data {
            Some(flow) => traffic_from_speeds(flow.current_speed, flow.free_flow_speed),
            None => TrafficReport::unavailable(),
        })
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, ForecastError> {
    let response = request
        .send()
        .await
        .map_err(|source| ForecastError::Http { service, source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ForecastError::Status { service, status });
    }
    response
        .json()
        .await
        .map_err(|source| ForecastError::Http { service, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(condition: WeatherCondition, temperature_c: f64) -> WeatherReport {
        WeatherReport {
            condition,
            temperature_c,
            description: String::new(),
            available: true,
        }
    }

    #[test]
    fn weather_mapping_follows_keyword_order() {
        assert_eq!(classify_weather("Clouds"), WeatherCondition::Cloudy);
        assert_eq!(classify_weather("Rain"), WeatherCondition::Rainy);
        assert_eq!(classify_weather("Thunderstorm"), WeatherCondition::Stormy);
        assert_eq!(classify_weather("Clear"), WeatherCondition::Sunny);
        assert_eq!(classify_weather("Mist"), WeatherCondition::Sunny);
        assert_eq!(classify_weather(""), WeatherCondition::Sunny);
    }

    #[test]
    fn traffic_thresholds() {
        assert_eq!(traffic_from_speeds(50.0, 50.0).density, TrafficDensity::Low);
        // 25% slower rounds to 3
        let medium = traffic_from_speeds(37.5, 50.0);
        assert_eq!(medium.avg_delay, 3);
        assert_eq!(medium.density, TrafficDensity::Medium);
        // 60% slower
        assert_eq!(traffic_from_speeds(20.0, 50.0).density, TrafficDensity::Medium);
        // 70% slower
        let high = traffic_from_speeds(15.0, 50.0);
        assert_eq!(high.avg_delay, 7);
        assert_eq!(high.density, TrafficDensity::High);
        assert!(high.description.contains("Delay: 7 min"));
    }

    #[test]
    fn traffic_without_free_flow_is_unavailable() {
        let report = traffic_from_speeds(10.0, 0.0);
        assert!(!report.available);
        assert_eq!(report.density, TrafficDensity::Medium);
        assert_eq!(report.description, "Traffic data not available");
    }

    #[test]
    fn risk_banding() {
        assert_eq!(risk_level(1), RiskLevel::Low);
        assert_eq!(risk_level(3), RiskLevel::Low);
        assert_eq!(risk_level(4), RiskLevel::Medium);
        assert_eq!(risk_level(6), RiskLevel::Medium);
        assert_eq!(risk_level(7), RiskLevel::High);
        assert_eq!(risk_level(10).label(), "High Risk");
    }

    #[test]
    fn calm_conditions_keep_baseline_risk() {
        let score = risk_score(
            &weather(WeatherCondition::Sunny, 25.0),
            &traffic_from_speeds(50.0, 50.0),
        );
        assert_eq!(score, 3);
    }

    #[test]
    fn storm_and_jams_raise_risk() {
        let stormy = weather(WeatherCondition::Stormy, 36.0);
        let jammed = traffic_from_speeds(5.0, 50.0);
        let score = risk_score(&stormy, &jammed);
        assert_eq!(score, 9);
        assert_eq!(risk_level(score), RiskLevel::High);

        let tips = recommendations(&stormy, &jammed);
        assert_eq!(&tips[..3], &BASE_RECOMMENDATIONS.map(String::from)[..]);
        assert_eq!(tips.len(), 6);
    }

    #[test]
    fn unavailable_inputs_add_no_risk() {
        let score = risk_score(&WeatherReport::unavailable(), &TrafficReport::unavailable());
        assert_eq!(score, 3);
        assert_eq!(
            recommendations(&WeatherReport::unavailable(), &TrafficReport::unavailable()).len(),
            3
        );
    }
}
