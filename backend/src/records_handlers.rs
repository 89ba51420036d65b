// Handlers for the locally persisted records: profile, checklist,
// community contacts and notification dismissals.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ApiFailure, IntoApiFailure};
use crate::records::{
    Checklist, ChecklistItem, CommunityList, CommunityMember, DismissedNotifications,
    Notification, Progress, RecordsError, UserProfile, notification_feed, notification_ids,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ChecklistView {
    pub items: Vec<ChecklistItem>,
    pub progress: Progress,
}

impl From<&Checklist> for ChecklistView {
    fn from(checklist: &Checklist) -> Self {
        Self {
            items: checklist.items().to_vec(),
            progress: checklist.progress(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewMemberRequest {
    pub name: String,
    pub relationship: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, ApiFailure> {
    state
        .store
        .load::<UserProfile>()
        .map(Json)
        .map_err(IntoApiFailure::into_api_failure)
}

/// PUT /api/profile - replace the profile (validated)
pub async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, ApiFailure> {
    state
        .store
        .save(&profile)
        .map_err(IntoApiFailure::into_api_failure)?;
    tracing::info!("profile saved (alert radius {} km)", profile.alert_radius_km);
    Ok(Json(profile))
}

/// DELETE /api/profile - reset to defaults
pub async fn delete_profile(State(state): State<AppState>) -> Result<StatusCode, ApiFailure> {
    state
        .store
        .clear::<UserProfile>()
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(IntoApiFailure::into_api_failure)
}

/// GET /api/checklist
pub async fn get_checklist(State(state): State<AppState>) -> Result<Json<ChecklistView>, ApiFailure> {
    state
        .store
        .load::<Checklist>()
        .map(|checklist| Json(ChecklistView::from(&checklist)))
        .map_err(IntoApiFailure::into_api_failure)
}

/// POST /api/checklist/:id/toggle
pub async fn toggle_checklist_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChecklistView>, ApiFailure> {
    let (checklist, completed) = state
        .store
        .update::<Checklist, _, RecordsError>(|checklist| checklist.toggle(&id))
        .map_err(IntoApiFailure::into_api_failure)?;
    tracing::debug!("checklist item {id} completed={completed}");
    Ok(Json(ChecklistView::from(&checklist)))
}

/// POST /api/checklist/reset
pub async fn reset_checklist(State(state): State<AppState>) -> Result<Json<ChecklistView>, ApiFailure> {
    let (checklist, ()) = state
        .store
        .update::<Checklist, _, RecordsError>(|checklist| {
            checklist.reset();
            Ok(())
        })
        .map_err(IntoApiFailure::into_api_failure)?;
    Ok(Json(ChecklistView::from(&checklist)))
}

/// GET /api/community
pub async fn list_community(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommunityMember>>, ApiFailure> {
    state
        .store
        .load::<CommunityList>()
        .map(|list| Json(list.members().to_vec()))
        .map_err(IntoApiFailure::into_api_failure)
}

/// POST /api/community - add a member
pub async fn add_community_member(
    State(state): State<AppState>,
    Json(req): Json<NewMemberRequest>,
) -> Result<(StatusCode, Json<CommunityMember>), ApiFailure> {
    let (_, member) = state
        .store
        .update::<CommunityList, _, RecordsError>(|list| {
            list.add(&req.name, &req.relationship, req.location.as_deref())
        })
        .map_err(IntoApiFailure::into_api_failure)?;
    tracing::info!("community member added: {}", member.id);
    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /api/community/:id
pub async fn remove_community_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiFailure> {
    state
        .store
        .update::<CommunityList, _, RecordsError>(|list| list.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(IntoApiFailure::into_api_failure)
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, ApiFailure> {
    let dismissed = state
        .store
        .load::<DismissedNotifications>()
        .map_err(IntoApiFailure::into_api_failure)?;
    Ok(Json(notification_feed(Utc::now(), &dismissed)))
}

/// POST /api/notifications/:id/dismiss
pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Notification>>, ApiFailure> {
    let (dismissed, _) = state
        .store
        .update::<DismissedNotifications, _, RecordsError>(|d| d.dismiss(&id))
        .map_err(IntoApiFailure::into_api_failure)?;
    Ok(Json(notification_feed(Utc::now(), &dismissed)))
}

/// POST /api/notifications/dismiss-all
pub async fn dismiss_all_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, ApiFailure> {
    let (dismissed, ()) = state
        .store
        .update::<DismissedNotifications, _, RecordsError>(|d| {
            d.dismiss_all(notification_ids());
            Ok(())
        })
        .map_err(IntoApiFailure::into_api_failure)?;
    Ok(Json(notification_feed(Utc::now(), &dismissed)))
}
