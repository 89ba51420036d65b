use axum::{Json, http::StatusCode};
use thiserror::Error;

use crate::assistant::AssistantError;
use crate::geocode::GeocodeError;
use crate::models::ApiError;
use crate::records::RecordsError;
use crate::reports::ReportsError;
use crate::session::SessionError;
use crate::store::RecordError;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

pub type ApiFailure = (StatusCode, Json<ApiError>);

pub fn api_failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ApiError {
            message: message.into(),
        }),
    )
}

/// Maps a module error onto the HTTP status it is reported with.
pub trait IntoApiFailure {
    fn into_api_failure(self) -> ApiFailure;
}

impl IntoApiFailure for RouteError {
    fn into_api_failure(self) -> ApiFailure {
        let status = match self {
            RouteError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
            RouteError::Gpx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_failure(status, self.to_string())
    }
}

impl IntoApiFailure for GeocodeError {
    fn into_api_failure(self) -> ApiFailure {
        let status = match self {
            GeocodeError::EmptyAddress => StatusCode::BAD_REQUEST,
            GeocodeError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        api_failure(status, self.to_string())
    }
}

impl IntoApiFailure for SessionError {
    fn into_api_failure(self) -> ApiFailure {
        let status = match self {
            SessionError::NotSelecting => StatusCode::BAD_REQUEST,
            SessionError::SlotBusy(_) => StatusCode::CONFLICT,
        };
        api_failure(status, self.to_string())
    }
}

impl IntoApiFailure for RecordError {
    fn into_api_failure(self) -> ApiFailure {
        let status = match self {
            RecordError::Invalid { .. } => StatusCode::BAD_REQUEST,
            RecordError::Store(_) | RecordError::Corrupt { .. } | RecordError::Encode(_) => {
                tracing::error!("record store failure: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        api_failure(status, self.to_string())
    }
}

impl IntoApiFailure for RecordsError {
    fn into_api_failure(self) -> ApiFailure {
        match self {
            RecordsError::Record(err) => err.into_api_failure(),
            RecordsError::UnknownItem(_) | RecordsError::UnknownMember(_) => {
                api_failure(StatusCode::NOT_FOUND, self.to_string())
            }
            RecordsError::MissingName | RecordsError::UnknownRelationship(_) => {
                api_failure(StatusCode::BAD_REQUEST, self.to_string())
            }
        }
    }
}

impl IntoApiFailure for AssistantError {
    fn into_api_failure(self) -> ApiFailure {
        let status = match self {
            AssistantError::EmptyQuestion => StatusCode::BAD_REQUEST,
            AssistantError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AssistantError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        api_failure(status, self.to_string())
    }
}

impl IntoApiFailure for ReportsError {
    fn into_api_failure(self) -> ApiFailure {
        match self {
            ReportsError::EmptyCity => api_failure(StatusCode::BAD_REQUEST, self.to_string()),
        }
    }
}
