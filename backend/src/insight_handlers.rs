// Handlers for the outward-facing lookups: forecast, assistant, the
// demonstration feed and news reports.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::assistant::{ActionPlanRequest, AssistantAnswer};
use crate::demonstrations::{self, NearbyDemonstration};
use crate::error::{ApiFailure, IntoApiFailure, api_failure};
use crate::forecast::SafetyForecast;
use crate::models::Coordinate;
use crate::records::UserProfile;
use crate::reports::{CityReports, DEFAULT_REPORT_LIMIT, parse_keywords};
use crate::routing::validate_coordinate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionPlanResponse {
    pub plan: String,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    pub city: String,
    #[serde(default)]
    pub keywords: String,
    pub limit: Option<usize>,
}

/// GET /api/forecast - forecast for the profile location
pub async fn forecast(State(state): State<AppState>) -> Result<Json<SafetyForecast>, ApiFailure> {
    let profile = state
        .store
        .load::<UserProfile>()
        .map_err(IntoApiFailure::into_api_failure)?;
    let forecast = state.forecast.forecast(profile.location()).await;
    Ok(Json(forecast))
}

/// POST /api/assistant
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AssistantAnswer>, ApiFailure> {
    state
        .assistant
        .ask(&req.question)
        .await
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}

/// POST /api/action-plan
pub async fn action_plan(
    State(state): State<AppState>,
    Json(req): Json<ActionPlanRequest>,
) -> Result<Json<ActionPlanResponse>, ApiFailure> {
    state
        .assistant
        .action_plan(&req)
        .await
        .map(|plan| Json(ActionPlanResponse { plan }))
        .map_err(IntoApiFailure::into_api_failure)
}

/// GET /api/demonstrations?lat&lon&radius_km - radius defaults to the
/// profile's alert radius
pub async fn demonstrations(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyDemonstration>>, ApiFailure> {
    let center = validate_coordinate(Coordinate::new(query.lat, query.lon))
        .map_err(IntoApiFailure::into_api_failure)?;
    let radius_km = match query.radius_km {
        Some(radius) if radius.is_finite() && radius >= 0.0 => radius,
        Some(radius) => {
            return Err(api_failure(
                StatusCode::BAD_REQUEST,
                format!("invalid radius {radius}"),
            ));
        }
        None => state
            .store
            .load::<UserProfile>()
            .map_err(IntoApiFailure::into_api_failure)?
            .alert_radius_km as f64,
    };
    Ok(Json(demonstrations::nearby(center, radius_km)))
}

/// GET /api/demonstrations/reports?city&keywords&limit - recent news coverage
pub async fn city_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<CityReports>, ApiFailure> {
    let keywords = parse_keywords(&query.keywords);
    let limit = query.limit.unwrap_or(DEFAULT_REPORT_LIMIT);
    state
        .reports
        .city_reports(&query.city, &keywords, limit)
        .await
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}
