// Handlers for the map screen session: point selection, taps and address
// lookups. Each endpoint change that completes the pair recomputes the route;
// the session drops results superseded by a newer request.

use axum::{Json, extract::State};

use crate::error::{ApiFailure, IntoApiFailure};
use crate::geocode::resolve_point;
use crate::models::{AddressRequest, Coordinate, NamedPoint, SelectRequest, Slot, TapRequest};
use crate::routing::validate_coordinate;
use crate::session::{RouteTicket, SessionError, SessionSnapshot};
use crate::AppState;

/// GET /api/session
pub async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session().snapshot())
}

/// POST /api/session/select - enter point-selection mode for a slot
pub async fn select(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session();
    session.select(req.slot);
    Json(session.snapshot())
}

/// POST /api/session/tap - place the selected point
pub async fn tap(
    State(state): State<AppState>,
    Json(req): Json<TapRequest>,
) -> Result<Json<SessionSnapshot>, ApiFailure> {
    let coord = validate_coordinate(Coordinate::new(req.lat, req.lon))
        .map_err(IntoApiFailure::into_api_failure)?;

    let ticket = {
        let mut session = state.session();
        session.tap(coord).map_err(IntoApiFailure::into_api_failure)?
    };
    if let Some(ticket) = ticket {
        run_ticket(&state, ticket).await?;
    }
    Ok(Json(state.session().snapshot()))
}

/// POST /api/session/address - geocode an address into a slot
pub async fn address(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<SessionSnapshot>, ApiFailure> {
    let pending =
        PendingSlot::begin(&state, req.slot).map_err(IntoApiFailure::into_api_failure)?;

    let resolved = resolve_point(state.geocoder.as_ref(), &req.address).await;

    let (ticket, failure) = match resolved {
        Ok(point) => (pending.finish(Some(point)), None),
        Err(err) => (pending.finish(None), Some(err)),
    };
    if let Some(err) = failure {
        return Err(err.into_api_failure());
    }
    if let Some(ticket) = ticket {
        run_ticket(&state, ticket).await?;
    }
    Ok(Json(state.session().snapshot()))
}

/// Marks a slot's lookup as outstanding. Dropping it unfinished, as happens
/// when the client goes away mid-request, releases the slot.
struct PendingSlot<'a> {
    state: &'a AppState,
    slot: Slot,
    finished: bool,
}

impl<'a> PendingSlot<'a> {
    fn begin(state: &'a AppState, slot: Slot) -> Result<Self, SessionError> {
        state.session().begin_geocode(slot)?;
        Ok(Self {
            state,
            slot,
            finished: false,
        })
    }

    fn finish(mut self, point: Option<NamedPoint>) -> Option<RouteTicket> {
        self.finished = true;
        let state = self.state;
        state.session().finish_geocode(self.slot, point)
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("lookup for {:?} abandoned", self.slot);
            self.state.session().finish_geocode(self.slot, None);
        }
    }
}

async fn run_ticket(state: &AppState, ticket: RouteTicket) -> Result<(), ApiFailure> {
    let planned = state
        .engine
        .route(ticket.start, ticket.end)
        .await
        .map_err(IntoApiFailure::into_api_failure)?;
    let response = planned
        .into_response(state.max_segments)
        .map_err(IntoApiFailure::into_api_failure)?;

    if !state.session().complete(ticket.token, response) {
        tracing::debug!("route for token {} superseded", ticket.token);
    }
    Ok(())
}
