//! Map screen state: route endpoints, point selection, and the request
//! token that keeps only the newest route.

use serde::Serialize;

use crate::models::{Coordinate, NamedPoint, RouteResponse, Slot};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("map is not in point-selection mode")]
    NotSelecting,
    #[error("a lookup for the {} point is already in progress", .0.label().to_lowercase())]
    SlotBusy(Slot),
}

/// Work order for one route computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub token: u64,
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub start: Option<NamedPoint>,
    pub end: Option<NamedPoint>,
    pub selecting: Option<Slot>,
    pub start_pending: bool,
    pub end_pending: bool,
    pub route_pending: bool,
    pub latest_token: u64,
    pub route: Option<RouteResponse>,
}

#[derive(Debug, Default)]
pub struct MapSession {
    start: Option<NamedPoint>,
    end: Option<NamedPoint>,
    selecting: Option<Slot>,
    start_pending: bool,
    end_pending: bool,
    latest_token: u64,
    applied_token: u64,
    route: Option<RouteResponse>,
}

impl MapSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, slot: Slot) {
        self.selecting = Some(slot);
    }

    /// Places the slot being selected at `coord` and leaves selection mode.
    pub fn tap(&mut self, coord: Coordinate) -> Result<Option<RouteTicket>, SessionError> {
        let slot = self.selecting.take().ok_or(SessionError::NotSelecting)?;
        Ok(self.set_point(slot, NamedPoint::tapped(slot, coord)))
    }

    pub fn begin_geocode(&mut self, slot: Slot) -> Result<(), SessionError> {
        let pending = self.pending_mut(slot);
        if *pending {
            return Err(SessionError::SlotBusy(slot));
        }
        *pending = true;
        Ok(())
    }

    /// Ends the lookup for `slot`; a failed lookup leaves the point unchanged.
    pub fn finish_geocode(&mut self, slot: Slot, point: Option<NamedPoint>) -> Option<RouteTicket> {
        *self.pending_mut(slot) = false;
        point.and_then(|point| self.set_point(slot, point))
    }

    /// Replaces the point in `slot`; issues a ticket once both points exist.
    pub fn set_point(&mut self, slot: Slot, point: NamedPoint) -> Option<RouteTicket> {
        match slot {
            Slot::Start => self.start = Some(point),
            Slot::End => self.end = Some(point),
        }
        self.issue_ticket()
    }

    /// Applies `response` only if `token` is the latest one issued.
    pub fn complete(&mut self, token: u64, response: RouteResponse) -> bool {
        if token != self.latest_token {
            tracing::debug!(
                "discarding stale route response (token {token}, latest {})",
                self.latest_token
            );
            return false;
        }
        self.route = Some(response);
        self.applied_token = token;
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            start: self.start.clone(),
            end: self.end.clone(),
            selecting: self.selecting,
            start_pending: self.start_pending,
            end_pending: self.end_pending,
            route_pending: self.applied_token != self.latest_token,
            latest_token: self.latest_token,
            route: self.route.clone(),
        }
    }

    fn issue_ticket(&mut self) -> Option<RouteTicket> {
        let (start, end) = match (&self.start, &self.end) {
            (Some(start), Some(end)) => (start.coord, end.coord),
            _ => return None,
        };
        self.latest_token += 1;
        Some(RouteTicket {
            token: self.latest_token,
            start,
            end,
        })
    }

    fn pending_mut(&mut self, slot: Slot) -> &mut bool {
        match slot {
            Slot::Start => &mut self.start_pending,
            Slot::End => &mut self.end_pending,
        }
    }
}
