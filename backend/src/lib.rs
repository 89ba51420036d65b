pub mod assistant;
pub mod config;
pub mod demonstrations;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod gpx_export;
pub mod insight_handlers;
pub mod models;
pub mod providers;
pub mod records;
pub mod records_handlers;
pub mod reports;
pub mod routing;
pub mod segments;
pub mod session;
pub mod session_handlers;
pub mod store;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::assistant::AssistantClient;
use crate::config::Config;
use crate::engine::RouteEngine;
use crate::error::{ApiFailure, IntoApiFailure};
use crate::forecast::ForecastClient;
use crate::geocode::{Geocoder, NominatimGeocoder, resolve_point};
use crate::models::{GeocodeRequest, NamedPoint, PlanRequest, RouteRequest, RouteResponse};
use crate::providers::http_client;
use crate::reports::ReportsClient;
use crate::session::MapSession;
use crate::store::{FileStore, KeyValueStore, Scoped};

pub type SharedStore = Arc<Scoped<Box<dyn KeyValueStore>>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RouteEngine>,
    pub geocoder: Arc<dyn Geocoder>,
    pub session: Arc<Mutex<MapSession>>,
    pub store: SharedStore,
    pub forecast: Arc<ForecastClient>,
    pub assistant: Arc<AssistantClient>,
    pub reports: Arc<ReportsClient>,
    pub max_segments: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to open store: {0}")]
    Store(#[from] store::StoreError),
}

impl AppState {
    /// Wires every service from configuration, using the on-disk store.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store: Box<dyn KeyValueStore> = Box::new(FileStore::open(&config.store_dir)?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: &Config, store: Box<dyn KeyValueStore>) -> Result<Self, StartupError> {
        let client = http_client(config.provider_timeout, &config.user_agent)?;
        let engine = RouteEngine::with_client(client.clone(), config);
        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimGeocoder::new(
            client.clone(),
            config.geocoder_url.clone(),
        ));
        let forecast = ForecastClient::new(
            client.clone(),
            geocoder.clone(),
            config.weather_url.clone(),
            config.weather_api_key.clone(),
            config.traffic_url.clone(),
            config.traffic_api_key.clone(),
        );
        let search_credentials = config
            .search_api_key
            .clone()
            .zip(config.search_engine_id.clone());
        let reports = ReportsClient::new(
            client.clone(),
            config.news_url.clone(),
            config.news_api_key.clone(),
        );
        let assistant = AssistantClient::new(
            client,
            config.search_url.clone(),
            search_credentials,
            config.chat_url.clone(),
            config.chat_api_key.clone(),
            config.chat_model.clone(),
        );

        Ok(Self {
            engine: Arc::new(engine),
            geocoder,
            session: Arc::new(Mutex::new(MapSession::new())),
            store: Arc::new(Scoped::new(store, config.store_scope.clone())),
            forecast: Arc::new(forecast),
            assistant: Arc::new(assistant),
            reports: Arc::new(reports),
            max_segments: config.max_segments,
        })
    }

    /// The lock is only ever held for synchronous state changes.
    pub fn session(&self) -> MutexGuard<'_, MapSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/geocode", post(geocode_handler))
        .route("/api/route", post(route_handler))
        .route("/api/plan", post(plan_handler))
        .route("/api/session", get(session_handlers::snapshot))
        .route("/api/session/select", post(session_handlers::select))
        .route("/api/session/tap", post(session_handlers::tap))
        .route("/api/session/address", post(session_handlers::address))
        .route(
            "/api/profile",
            get(records_handlers::get_profile)
                .put(records_handlers::put_profile)
                .delete(records_handlers::delete_profile),
        )
        .route("/api/checklist", get(records_handlers::get_checklist))
        .route(
            "/api/checklist/:id/toggle",
            post(records_handlers::toggle_checklist_item),
        )
        .route("/api/checklist/reset", post(records_handlers::reset_checklist))
        .route(
            "/api/community",
            get(records_handlers::list_community).post(records_handlers::add_community_member),
        )
        .route(
            "/api/community/:id",
            delete(records_handlers::remove_community_member),
        )
        .route("/api/notifications", get(records_handlers::list_notifications))
        .route(
            "/api/notifications/dismiss-all",
            post(records_handlers::dismiss_all_notifications),
        )
        .route(
            "/api/notifications/:id/dismiss",
            post(records_handlers::dismiss_notification),
        )
        .route("/api/forecast", get(insight_handlers::forecast))
        .route("/api/assistant", post(insight_handlers::ask))
        .route("/api/action-plan", post(insight_handlers::action_plan))
        .route("/api/demonstrations", get(insight_handlers::demonstrations))
        .route(
            "/api/demonstrations/reports",
            get(insight_handlers::city_reports),
        )
        .layer(cors)
        .with_state(state)
}

/// Installs the fmt subscriber, honouring `RUST_LOG` when set.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn health() -> &'static str {
    "ok"
}

async fn geocode_handler(
    State(state): State<AppState>,
    Json(req): Json<GeocodeRequest>,
) -> Result<Json<NamedPoint>, ApiFailure> {
    resolve_point(state.geocoder.as_ref(), &req.address)
        .await
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiFailure> {
    let max_segments = req.max_segments.unwrap_or(state.max_segments);
    let planned = state
        .engine
        .route(req.start, req.end)
        .await
        .map_err(IntoApiFailure::into_api_failure)?;
    planned
        .into_response(max_segments)
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}

async fn plan_handler(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<RouteResponse>, ApiFailure> {
    let geocoder = state.geocoder.as_ref();
    let (start, end) = tokio::join!(
        resolve_point(geocoder, &req.start_address),
        resolve_point(geocoder, &req.end_address)
    );
    let start = start.map_err(IntoApiFailure::into_api_failure)?;
    let end = end.map_err(IntoApiFailure::into_api_failure)?;
    tracing::info!("planning route {:?} -> {:?}", start.label, end.label);

    let planned = state
        .engine
        .route(start.coord, end.coord)
        .await
        .map_err(IntoApiFailure::into_api_failure)?;
    planned
        .into_response(state.max_segments)
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}
