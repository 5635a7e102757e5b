//! Zoom-dependent sizing of the start and goal markers.

use std::cell::Cell;
use std::rc::Rc;

use log::warn;

use super::widget::{IconImage, ListenerToken, MapWidget, MarkerIcon, OverlayHandle};

/// Icon edge length at [`REFERENCE_ZOOM`].
pub const BASE_MARKER_SIZE: f64 = 48.0;
pub const REFERENCE_ZOOM: f64 = 12.0;
const MIN_SCALE: f64 = 0.5;
const MAX_SCALE: f64 = 2.0;

/// Endpoint icon size in pixels for the given zoom level.
pub fn marker_size(zoom: f64) -> u32 {
    let scale = if zoom.is_finite() {
        (zoom / REFERENCE_ZOOM).clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    };
    (BASE_MARKER_SIZE * scale).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Goal,
}

impl Endpoint {
    pub fn icon_url(&self) -> &'static str {
        match self {
            Endpoint::Start => "/images/start.png",
            Endpoint::Goal => "/images/goal.png",
        }
    }

    pub fn icon(&self, size: u32) -> MarkerIcon {
        MarkerIcon::centered(IconImage::Url(self.icon_url().to_string()), size)
    }
}

/// Re-applies size and anchor to both endpoint markers.
pub fn rescale_endpoints(widget: &dyn MapWidget, start: OverlayHandle, goal: OverlayHandle, zoom: f64) {
    let size = marker_size(zoom);
    for (marker, endpoint) in [(start, Endpoint::Start), (goal, Endpoint::Goal)] {
        if let Err(err) = widget.set_marker_icon(marker, endpoint.icon(size)) {
            warn!("Failed to resize {:?} marker {}: {}", endpoint, marker, err);
        }
    }
}

/// A live zoom subscription for one pair of endpoint markers.
///
/// Detaching both unsubscribes and disarms the listener, so a zoom event
/// already being dispatched cannot reach markers that were just released.
#[derive(Debug)]
pub struct ZoomScaler {
    token: ListenerToken,
    armed: Rc<Cell<bool>>,
}

impl ZoomScaler {
    pub fn attach(widget: &Rc<dyn MapWidget>, start: OverlayHandle, goal: OverlayHandle) -> Self {
        let armed = Rc::new(Cell::new(true));
        let listener_armed = Rc::clone(&armed);
        let weak = Rc::downgrade(widget);

        let token = widget.on_zoom_changed(Rc::new(move |zoom| {
            if !listener_armed.get() {
                return;
            }
            if let Some(widget) = weak.upgrade() {
                rescale_endpoints(widget.as_ref(), start, goal, zoom);
            }
        }));

        Self { token, armed }
    }

    pub fn token(&self) -> ListenerToken {
        self.token
    }

    pub fn detach(self, widget: &dyn MapWidget) {
        self.armed.set(false);
        widget.remove_listener(self.token);
    }
}
