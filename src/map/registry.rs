//! Ownership of everything the route layer has drawn on the map.
//!
//! The registry is the only place that creates or destroys overlays. One
//! draw cycle is `clear` → `install_route` → optionally
//! `install_annotations`; `clear` (or dropping the registry) releases every
//! handle and listener the cycle produced.

use std::rc::Rc;

use log::{debug, warn};
use thiserror::Error;

use super::annotation::Annotation;
use super::geo::{Coordinate, GeoBounds};
use super::info_window::InfoWindowManager;
use super::scaling::{marker_size, Endpoint, ZoomScaler};
use super::widget::{InfoContent, ListenerToken, MapError, MapWidget, OverlayHandle, PolylineStyle};
use crate::route::{CctvInfo, StoreInfo};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OverlayError {
    #[error("a route is already drawn; clear the map before installing another")]
    RouteAlreadyInstalled,
    #[error("annotations need an installed route")]
    NoRouteInstalled,
    #[error(transparent)]
    Map(#[from] MapError),
}

pub struct OverlayRegistry {
    widget: Rc<dyn MapWidget>,
    /// Start then goal, pushed as they are created.
    endpoints: Vec<OverlayHandle>,
    polyline: Option<OverlayHandle>,
    scaler: Option<ZoomScaler>,
    annotation_markers: Vec<OverlayHandle>,
    info_windows: Vec<OverlayHandle>,
    /// Popup opened through `open_info`; replaced on the next call.
    host_window: Option<OverlayHandle>,
    click_listeners: Vec<ListenerToken>,
    info: Rc<InfoWindowManager>,
}

impl OverlayRegistry {
    pub fn new(widget: Rc<dyn MapWidget>) -> Self {
        Self {
            widget,
            endpoints: Vec::new(),
            polyline: None,
            scaler: None,
            annotation_markers: Vec::new(),
            info_windows: Vec::new(),
            host_window: None,
            click_listeners: Vec::new(),
            info: Rc::new(InfoWindowManager::new()),
        }
    }

    pub fn widget(&self) -> &Rc<dyn MapWidget> {
        &self.widget
    }

    /// Removes and releases every tracked overlay and listener.
    ///
    /// Safe to call at any time; with nothing tracked it does nothing.
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        let widget = self.widget.as_ref();

        if let Some(scaler) = self.scaler.take() {
            scaler.detach(widget);
        }
        for token in self.click_listeners.drain(..) {
            widget.remove_listener(token);
        }
        self.info.close(widget);
        for window in self.info_windows.drain(..).chain(self.host_window.take()) {
            widget.remove_overlay(window);
        }
        for marker in self.annotation_markers.drain(..) {
            widget.remove_overlay(marker);
        }
        if let Some(polyline) = self.polyline.take() {
            widget.remove_overlay(polyline);
        }
        for marker in self.endpoints.drain(..) {
            widget.remove_overlay(marker);
        }
        debug!("Cleared route overlays");
    }

    /// Draws the start and goal markers and, for a non-empty path, one
    /// polyline through every point in order, then fits the view to the path.
    ///
    /// On error the overlays created so far stay tracked; the caller is
    /// expected to [`clear`](Self::clear) before reporting it.
    pub fn install_route(
        &mut self,
        start: Coordinate,
        goal: Coordinate,
        path: &[Coordinate],
    ) -> Result<(), OverlayError> {
        if self.has_route() {
            return Err(OverlayError::RouteAlreadyInstalled);
        }

        let size = marker_size(self.widget.zoom());
        let start_marker = self.widget.create_marker(start, Endpoint::Start.icon(size))?;
        self.endpoints.push(start_marker);
        let goal_marker = self.widget.create_marker(goal, Endpoint::Goal.icon(size))?;
        self.endpoints.push(goal_marker);

        self.scaler = Some(ZoomScaler::attach(&self.widget, start_marker, goal_marker));

        if let Some(bounds) = GeoBounds::covering(path) {
            self.polyline = Some(self.widget.create_polyline(path, PolylineStyle::default())?);
            self.widget.fit_bounds(bounds);
        }

        debug!("Installed route with {} path points", path.len());
        Ok(())
    }

    /// Pins one marker per CCTV and store, each opening its own popup on
    /// click. Returns how many markers were added.
    pub fn install_annotations(&mut self, cctvs: &[CctvInfo], stores: &[StoreInfo]) -> Result<usize, OverlayError> {
        if !self.has_route() {
            return Err(OverlayError::NoRouteInstalled);
        }

        let before = self.annotation_markers.len();
        for cctv in cctvs {
            self.install_annotation(cctv)?;
        }
        for store in stores {
            self.install_annotation(store)?;
        }

        let added = self.annotation_markers.len() - before;
        debug!("Installed {} annotation markers", added);
        Ok(added)
    }

    fn install_annotation(&mut self, annotation: &dyn Annotation) -> Result<(), OverlayError> {
        let marker = self.widget.create_marker(annotation.position(), annotation.icon())?;
        self.annotation_markers.push(marker);
        let window = self.widget.create_info_window(annotation.info())?;
        self.info_windows.push(window);

        let weak = Rc::downgrade(&self.widget);
        let info = Rc::clone(&self.info);
        let token = self.widget.on_marker_click(
            marker,
            Rc::new(move || {
                if let Some(widget) = weak.upgrade() {
                    if let Err(err) = info.open(widget.as_ref(), window, marker) {
                        warn!("Failed to open info window {}: {}", window, err);
                    }
                }
            }),
        )?;
        self.click_listeners.push(token);
        Ok(())
    }

    /// Opens a popup with `content` on `marker`, closing any other popup.
    ///
    /// Only the latest of these popups is kept; the previous one is removed.
    pub fn open_info(&mut self, marker: OverlayHandle, content: InfoContent) -> Result<OverlayHandle, OverlayError> {
        let window = self.widget.create_info_window(content)?;
        let previous = self.host_window.replace(window);
        let opened = self.info.open(self.widget.as_ref(), window, marker);
        if let Some(previous) = previous {
            self.widget.remove_overlay(previous);
        }
        opened?;
        Ok(window)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
            && self.polyline.is_none()
            && self.scaler.is_none()
            && self.annotation_markers.is_empty()
            && self.info_windows.is_empty()
            && self.host_window.is_none()
            && self.click_listeners.is_empty()
            && self.info.current().is_none()
    }

    pub fn has_route(&self) -> bool {
        self.endpoints.len() == 2
    }

    /// `(start, goal)` markers of the installed route.
    pub fn endpoint_markers(&self) -> Option<(OverlayHandle, OverlayHandle)> {
        match self.endpoints.as_slice() {
            [start, goal] => Some((*start, *goal)),
            _ => None,
        }
    }

    pub fn polyline(&self) -> Option<OverlayHandle> {
        self.polyline
    }

    pub fn annotation_markers(&self) -> &[OverlayHandle] {
        &self.annotation_markers
    }

    pub fn open_info_window(&self) -> Option<OverlayHandle> {
        self.info.current()
    }

    /// Number of overlay handles currently owned.
    pub fn overlay_count(&self) -> usize {
        self.endpoints.len()
            + usize::from(self.polyline.is_some())
            + self.annotation_markers.len()
            + self.info_windows.len()
            + usize::from(self.host_window.is_some())
    }
}

impl Drop for OverlayRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::testing::RecordingMap;

    fn registry(zoom: f64) -> (Rc<RecordingMap>, OverlayRegistry) {
        let map = Rc::new(RecordingMap::new(zoom));
        let registry = OverlayRegistry::new(map.clone());
        (map, registry)
    }

    fn path() -> Vec<Coordinate> {
        vec![
            Coordinate::new(37.50, 127.03),
            Coordinate::new(37.51, 127.04),
            Coordinate::new(37.51, 127.04),
            Coordinate::new(37.52, 127.02),
        ]
    }

    fn cctv(lat: f64) -> CctvInfo {
        CctvInfo {
            coordinate: Coordinate::new(lat, 127.0),
            camera_count: Some(2),
            purpose: None,
            address: None,
        }
    }

    fn store(lat: f64) -> StoreInfo {
        StoreInfo {
            coordinate: Coordinate::new(lat, 127.0),
            name: None,
            address: None,
            distance: None,
        }
    }

    #[test]
    fn install_route_draws_endpoints_and_one_polyline_in_order() {
        let (map, mut registry) = registry(12.0);
        let start = Coordinate::new(37.50, 127.03);
        let goal = Coordinate::new(37.52, 127.02);
        registry.install_route(start, goal, &path()).unwrap();

        assert_eq!(map.marker_count(), 2);
        assert_eq!(map.polyline_paths(), vec![path()]);
        assert_eq!(map.fitted_bounds().len(), 1);
        assert_eq!(registry.overlay_count(), 3);

        let (start_marker, goal_marker) = registry.endpoint_markers().unwrap();
        assert_eq!(map.marker_position(start_marker), Some(start));
        assert_eq!(map.marker_position(goal_marker), Some(goal));
        assert_eq!(map.marker_icon(start_marker).unwrap().size, 48);
    }

    #[test]
    fn empty_path_draws_markers_only() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0), &[])
            .unwrap();
        assert_eq!(map.marker_count(), 2);
        assert!(map.polyline_paths().is_empty());
        assert!(map.fitted_bounds().is_empty());
        assert!(registry.polyline().is_none());
    }

    #[test]
    fn second_install_without_clear_is_rejected() {
        let (_map, mut registry) = registry(12.0);
        let a = Coordinate::new(0.0, 0.0);
        registry.install_route(a, a, &[]).unwrap();
        assert_eq!(registry.install_route(a, a, &[]), Err(OverlayError::RouteAlreadyInstalled));
    }

    #[test]
    fn annotations_require_a_route() {
        let (map, mut registry) = registry(12.0);
        assert_eq!(
            registry.install_annotations(&[cctv(37.0)], &[]),
            Err(OverlayError::NoRouteInstalled)
        );
        assert_eq!(map.marker_count(), 0);
    }

    #[test]
    fn clear_releases_everything_and_is_idempotent() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &path())
            .unwrap();
        let added = registry
            .install_annotations(&[cctv(37.1), cctv(37.2)], &[store(37.3)])
            .unwrap();
        assert_eq!(added, 3);
        map.click(registry.annotation_markers()[0]);
        assert_eq!(map.open_windows().len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(map.live_overlay_count(), 0);
        assert_eq!(map.listener_count(), 0);
        assert!(map.open_windows().is_empty());

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(map.live_overlay_count(), 0);
        assert_eq!(map.removed_unknown(), 0);
    }

    #[test]
    fn clicking_markers_keeps_a_single_popup_open() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &[])
            .unwrap();
        registry.install_annotations(&[cctv(37.1)], &[store(37.2)]).unwrap();
        let markers = registry.annotation_markers().to_vec();

        map.click(markers[0]);
        let first = registry.open_info_window().unwrap();
        map.click(markers[1]);
        let second = registry.open_info_window().unwrap();

        assert_ne!(first, second);
        assert_eq!(map.open_windows(), vec![second]);
        assert_eq!(map.window_anchor(second), Some(markers[1]));
    }

    #[test]
    fn open_info_shares_the_singleton_with_annotation_popups() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &[])
            .unwrap();
        registry.install_annotations(&[cctv(37.1)], &[]).unwrap();
        map.click(registry.annotation_markers()[0]);

        let (start, _) = registry.endpoint_markers().unwrap();
        let window = registry
            .open_info(
                start,
                InfoContent {
                    title: "출발".into(),
                    lines: vec![],
                },
            )
            .unwrap();
        assert_eq!(map.open_windows(), vec![window]);
    }

    #[test]
    fn repeated_open_info_keeps_one_host_popup() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &[])
            .unwrap();
        let (start, goal) = registry.endpoint_markers().unwrap();
        let baseline = registry.overlay_count();

        let first = registry.open_info(start, InfoContent::default()).unwrap();
        let second = registry.open_info(goal, InfoContent::default()).unwrap();
        let third = registry.open_info(start, InfoContent::default()).unwrap();

        assert_eq!(registry.overlay_count(), baseline + 1);
        assert_eq!(map.live_overlay_count(), baseline + 1);
        assert_eq!(map.window_content(first), None);
        assert_eq!(map.window_content(second), None);
        assert_eq!(map.open_windows(), vec![third]);
        assert_eq!(map.window_anchor(third), Some(start));

        registry.clear();
        assert_eq!(map.live_overlay_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn zoom_after_clear_never_touches_released_markers() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &path())
            .unwrap();
        let (start, goal) = registry.endpoint_markers().unwrap();
        map.set_zoom(24.0);
        assert_eq!(map.marker_icon(start).unwrap().size, 96);
        assert_eq!(map.marker_icon(goal).unwrap().size, 96);

        registry.clear();
        map.set_zoom(6.0);
        assert_eq!(map.icon_updates_on_unknown(), 0);
    }

    #[test]
    fn failure_mid_install_is_fully_recoverable_by_clear() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &[])
            .unwrap();
        map.fail_creations_after(3);
        let err = registry
            .install_annotations(&[cctv(37.1), cctv(37.2), cctv(37.3)], &[])
            .unwrap_err();
        assert!(matches!(err, OverlayError::Map(MapError::Rejected(_))));

        registry.clear();
        assert_eq!(map.live_overlay_count(), 0);
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn dropping_the_registry_releases_its_overlays() {
        let (map, mut registry) = registry(12.0);
        registry
            .install_route(Coordinate::new(37.5, 127.0), Coordinate::new(37.6, 127.1), &path())
            .unwrap();
        drop(registry);
        assert_eq!(map.live_overlay_count(), 0);
        assert_eq!(map.listener_count(), 0);
    }
}
