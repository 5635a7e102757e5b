//! Capability surface of the interactive map the overlays are drawn on.
//!
//! The map itself (tiles, camera, input) belongs to the host. Everything in
//! this crate reaches it only through [`MapWidget`], so the same registry
//! drives the desktop canvas and the recording double used in tests.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use super::geo::{Coordinate, GeoBounds};

/// Opaque reference to one rendered object (marker, polyline or info window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(u64);

impl OverlayHandle {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OverlayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Returned when a listener is attached; hand it back to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

impl ListenerToken {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// What a marker icon looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum IconImage {
    /// Bitmap served by the host, e.g. `/images/start.png`.
    Url(String),
    /// Filled circle with a short centered label.
    Badge { fill: Rgb, label: String, label_color: Rgb },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub image: IconImage,
    /// Square icon edge length in pixels.
    pub size: u32,
    /// Pixel offset of the icon point that sits on the marker position.
    pub anchor: (f32, f32),
}

impl MarkerIcon {
    /// Square icon anchored at its center.
    pub fn centered(image: IconImage, size: u32) -> Self {
        let half = size as f32 / 2.0;
        Self {
            image,
            size,
            anchor: (half, half),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    pub color: Rgb,
    pub weight: f32,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            color: Rgb(0x53, 0x47, 0xAA),
            weight: 5.0,
        }
    }
}

/// Text shown in an info window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoContent {
    pub title: String,
    pub lines: Vec<String>,
}

pub type ZoomListener = Rc<dyn Fn(f64)>;
pub type ClickListener = Rc<dyn Fn()>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("unknown overlay {0}")]
    UnknownOverlay(OverlayHandle),
    #[error("{0} is not a marker")]
    NotAMarker(OverlayHandle),
    #[error("{0} is not an info window")]
    NotAnInfoWindow(OverlayHandle),
    #[error("map widget rejected the overlay: {0}")]
    Rejected(String),
}

/// Operations the overlay layer needs from the map widget.
///
/// Methods take `&self`: implementations keep their own interior state and
/// must not hold a borrow of it while invoking listeners, since listeners
/// call back into the widget.
pub trait MapWidget {
    fn create_marker(&self, position: Coordinate, icon: MarkerIcon) -> Result<OverlayHandle, MapError>;

    fn set_marker_icon(&self, marker: OverlayHandle, icon: MarkerIcon) -> Result<(), MapError>;

    fn create_polyline(&self, path: &[Coordinate], style: PolylineStyle) -> Result<OverlayHandle, MapError>;

    fn create_info_window(&self, content: InfoContent) -> Result<OverlayHandle, MapError>;

    /// Shows `window` attached to `marker`.
    fn open_info_window(&self, window: OverlayHandle, marker: OverlayHandle) -> Result<(), MapError>;

    /// Hides `window`. Closing a closed or unknown window is a no-op.
    fn close_info_window(&self, window: OverlayHandle);

    /// Takes the overlay off the map and releases its handle.
    fn remove_overlay(&self, handle: OverlayHandle);

    fn fit_bounds(&self, bounds: GeoBounds);

    fn on_zoom_changed(&self, listener: ZoomListener) -> ListenerToken;

    fn on_marker_click(&self, marker: OverlayHandle, listener: ClickListener) -> Result<ListenerToken, MapError>;

    fn remove_listener(&self, token: ListenerToken);

    fn zoom(&self) -> f64;
}
