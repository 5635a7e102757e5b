//! Sequencing of overlapping route requests.
//!
//! Every request takes a ticket from a monotonically increasing counter.
//! When its response arrives the ticket is compared with the latest one
//! issued; only the latest may touch the map. [`RouteService::clear_map`]
//! also advances the counter, so anything still in flight becomes stale.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use log::{debug, info, warn};

use super::client::RouteBackend;
use super::error::{RouteError, RouteResult};
use super::model::{RouteRequest, RouteSummary, RouteType};
use crate::map::{Coordinate, InfoContent, MapWidget, OverlayHandle, OverlayRegistry};

/// Issues sequence numbers and tells stale ones from the current one.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: Cell<u64>,
}

impl Sequencer {
    pub fn issue(&self) -> u64 {
        let next = self.latest.get() + 1;
        self.latest.set(next);
        next
    }

    /// Makes every number issued so far stale.
    pub fn invalidate(&self) {
        self.issue();
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest.get() == sequence
    }

    pub fn latest(&self) -> u64 {
        self.latest.get()
    }
}

/// A request that has been issued and is waiting for its response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    sequence: u64,
    request: RouteRequest,
}

impl RouteTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }
}

/// What became of one `draw_route` call.
#[derive(Debug)]
#[must_use]
pub enum DrawOutcome {
    /// The call was the latest one; its result is reflected on the map.
    Completed(RouteResult),
    /// A newer request or a clear happened first; the result was dropped.
    Superseded,
}

impl DrawOutcome {
    pub fn is_superseded(&self) -> bool {
        matches!(self, DrawOutcome::Superseded)
    }

    pub fn result(&self) -> Option<&RouteResult> {
        match self {
            DrawOutcome::Completed(result) => Some(result),
            DrawOutcome::Superseded => None,
        }
    }

    pub fn into_result(self) -> Option<RouteResult> {
        match self {
            DrawOutcome::Completed(result) => Some(result),
            DrawOutcome::Superseded => None,
        }
    }
}

/// Draws routes from `backend` onto one map.
///
/// Runs on the UI thread: no method holds a borrow across the awaited
/// response, so `draw_route` and `clear_map` may be called again while an
/// earlier `draw_route` is still pending.
pub struct RouteService<B> {
    backend: B,
    registry: RefCell<OverlayRegistry>,
    sequencer: Sequencer,
}

impl<B: RouteBackend> RouteService<B> {
    pub fn new(widget: Rc<dyn MapWidget>, backend: B) -> Self {
        Self {
            backend,
            registry: RefCell::new(OverlayRegistry::new(widget)),
            sequencer: Sequencer::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> Ref<'_, OverlayRegistry> {
        self.registry.borrow()
    }

    /// Fetches a route and draws it, unless a newer request got there first.
    pub async fn draw_route(
        &self,
        start: Option<Coordinate>,
        goal: Option<Coordinate>,
        route_type: RouteType,
    ) -> DrawOutcome {
        let ticket = match self.begin(start, goal, route_type) {
            Ok(ticket) => ticket,
            Err(err) => return DrawOutcome::Completed(Err(err)),
        };
        let fetched = self.backend.fetch_route(ticket.request()).await;
        self.complete(ticket, fetched)
    }

    /// First half of [`draw_route`](Self::draw_route): validates, takes a
    /// ticket and clears the previous overlays. The caller runs
    /// `backend().fetch_route(ticket.request())` wherever it likes and
    /// passes the result to [`complete`](Self::complete).
    pub fn begin(
        &self,
        start: Option<Coordinate>,
        goal: Option<Coordinate>,
        route_type: RouteType,
    ) -> Result<RouteTicket, RouteError> {
        let (Some(start), Some(goal)) = (start, goal) else {
            // Still the newest request: whatever is in flight must not land.
            self.sequencer.invalidate();
            return Err(RouteError::MissingCoordinates);
        };

        let sequence = self.sequencer.issue();
        self.registry.borrow_mut().clear();
        info!("Issued {} route request #{} from {} to {}", route_type, sequence, start, goal);

        Ok(RouteTicket {
            sequence,
            request: RouteRequest {
                start,
                goal,
                route_type,
            },
        })
    }

    /// Second half of [`draw_route`](Self::draw_route): applies `fetched`
    /// if `ticket` is still the latest, drops it silently otherwise.
    pub fn complete(&self, ticket: RouteTicket, fetched: RouteResult) -> DrawOutcome {
        if !self.sequencer.is_current(ticket.sequence) {
            debug!(
                "Dropping result of route request #{}; latest is #{}",
                ticket.sequence,
                self.sequencer.latest()
            );
            return DrawOutcome::Superseded;
        }

        let result = fetched.and_then(|summary| self.apply(&ticket.request, summary));
        if let Err(err) = &result {
            warn!("Route request #{} failed: {:?}", ticket.sequence, err);
        }
        DrawOutcome::Completed(result)
    }

    fn apply(&self, request: &RouteRequest, summary: RouteSummary) -> RouteResult {
        let mut registry = self.registry.borrow_mut();

        let mut installed = registry.install_route(request.start, request.goal, &summary.path);
        if installed.is_ok() && request.route_type == RouteType::Safe {
            installed = registry
                .install_annotations(&summary.nearby_cctvs, &summary.nearby_stores)
                .map(|_| ());
        }

        if let Err(err) = installed {
            registry.clear();
            return Err(err.into());
        }
        Ok(summary)
    }

    /// Removes every overlay and invalidates any request still in flight.
    pub fn clear_map(&self) {
        self.sequencer.invalidate();
        self.registry.borrow_mut().clear();
    }

    /// Whether `ticket` would still be applied by [`complete`](Self::complete).
    pub fn is_current(&self, ticket: &RouteTicket) -> bool {
        self.sequencer.is_current(ticket.sequence)
    }

    /// Opens a popup on one of the drawn markers, closing any other popup.
    pub fn open_info(&self, marker: OverlayHandle, content: InfoContent) -> RouteResult<OverlayHandle> {
        Ok(self.registry.borrow_mut().open_info(marker, content)?)
    }
}
