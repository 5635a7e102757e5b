//! In-memory [`MapWidget`] that records what was drawn.

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::geo::{Coordinate, GeoBounds};
use super::widget::{
    ClickListener, InfoContent, ListenerToken, MapError, MapWidget, MarkerIcon, OverlayHandle, PolylineStyle,
    ZoomListener,
};

#[derive(Default)]
struct State {
    next_id: u64,
    zoom: f64,
    markers: BTreeMap<OverlayHandle, (Coordinate, MarkerIcon)>,
    polylines: BTreeMap<OverlayHandle, Vec<Coordinate>>,
    windows: BTreeMap<OverlayHandle, (InfoContent, Option<OverlayHandle>)>,
    zoom_listeners: Vec<(ListenerToken, ZoomListener)>,
    click_listeners: Vec<(ListenerToken, OverlayHandle, ClickListener)>,
    fitted: Vec<GeoBounds>,
    creations_left: Option<usize>,
    removed_unknown: usize,
    icon_updates_on_unknown: usize,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_creation(&mut self) -> Result<(), MapError> {
        match self.creations_left.as_mut() {
            Some(0) => Err(MapError::Rejected("creation limit reached".into())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

pub(crate) struct RecordingMap {
    state: RefCell<State>,
}

impl RecordingMap {
    pub fn new(zoom: f64) -> Self {
        Self {
            state: RefCell::new(State {
                zoom,
                ..Default::default()
            }),
        }
    }

    /// Changes the zoom level and notifies zoom listeners.
    pub fn set_zoom(&self, zoom: f64) {
        let listeners: Vec<ZoomListener> = {
            let mut state = self.state.borrow_mut();
            state.zoom = zoom;
            state.zoom_listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(zoom);
        }
    }

    /// Simulates a click on `marker`.
    pub fn click(&self, marker: OverlayHandle) {
        let listeners: Vec<ClickListener> = self
            .state
            .borrow()
            .click_listeners
            .iter()
            .filter(|(_, m, _)| *m == marker)
            .map(|(_, _, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Lets `n` more overlays be created, then rejects every creation.
    pub fn fail_creations_after(&self, n: usize) {
        self.state.borrow_mut().creations_left = Some(n);
    }

    pub fn marker_count(&self) -> usize {
        self.state.borrow().markers.len()
    }

    pub fn marker_icon(&self, marker: OverlayHandle) -> Option<MarkerIcon> {
        self.state.borrow().markers.get(&marker).map(|(_, icon)| icon.clone())
    }

    pub fn marker_position(&self, marker: OverlayHandle) -> Option<Coordinate> {
        self.state.borrow().markers.get(&marker).map(|(pos, _)| *pos)
    }

    pub fn markers_with_icon_size(&self, size: u32) -> usize {
        self.state.borrow().markers.values().filter(|(_, icon)| icon.size == size).count()
    }

    pub fn polyline_paths(&self) -> Vec<Vec<Coordinate>> {
        self.state.borrow().polylines.values().cloned().collect()
    }

    pub fn open_windows(&self) -> Vec<OverlayHandle> {
        self.state
            .borrow()
            .windows
            .iter()
            .filter(|(_, (_, anchor))| anchor.is_some())
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn window_anchor(&self, window: OverlayHandle) -> Option<OverlayHandle> {
        self.state.borrow().windows.get(&window).and_then(|(_, anchor)| *anchor)
    }

    pub fn window_content(&self, window: OverlayHandle) -> Option<InfoContent> {
        self.state.borrow().windows.get(&window).map(|(content, _)| content.clone())
    }

    pub fn fitted_bounds(&self) -> Vec<GeoBounds> {
        self.state.borrow().fitted.clone()
    }

    pub fn live_overlay_count(&self) -> usize {
        let state = self.state.borrow();
        state.markers.len() + state.polylines.len() + state.windows.len()
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state.borrow();
        state.zoom_listeners.len() + state.click_listeners.len()
    }

    pub fn removed_unknown(&self) -> usize {
        self.state.borrow().removed_unknown
    }

    pub fn icon_updates_on_unknown(&self) -> usize {
        self.state.borrow().icon_updates_on_unknown
    }
}

impl MapWidget for RecordingMap {
    fn create_marker(&self, position: Coordinate, icon: MarkerIcon) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        state.check_creation()?;
        let handle = OverlayHandle::from_raw(state.next_id());
        state.markers.insert(handle, (position, icon));
        Ok(handle)
    }

    fn set_marker_icon(&self, marker: OverlayHandle, icon: MarkerIcon) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        match state.markers.get_mut(&marker) {
            Some(entry) => {
                entry.1 = icon;
                Ok(())
            }
            None => {
                state.icon_updates_on_unknown += 1;
                Err(MapError::UnknownOverlay(marker))
            }
        }
    }

    fn create_polyline(&self, path: &[Coordinate], _style: PolylineStyle) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        state.check_creation()?;
        let handle = OverlayHandle::from_raw(state.next_id());
        state.polylines.insert(handle, path.to_vec());
        Ok(handle)
    }

    fn create_info_window(&self, content: InfoContent) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        state.check_creation()?;
        let handle = OverlayHandle::from_raw(state.next_id());
        state.windows.insert(handle, (content, None));
        Ok(handle)
    }

    fn open_info_window(&self, window: OverlayHandle, marker: OverlayHandle) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        if !state.markers.contains_key(&marker) {
            return Err(MapError::NotAMarker(marker));
        }
        match state.windows.get_mut(&window) {
            Some(entry) => {
                entry.1 = Some(marker);
                Ok(())
            }
            None => Err(MapError::NotAnInfoWindow(window)),
        }
    }

    fn close_info_window(&self, window: OverlayHandle) {
        if let Some(entry) = self.state.borrow_mut().windows.get_mut(&window) {
            entry.1 = None;
        }
    }

    fn remove_overlay(&self, handle: OverlayHandle) {
        let mut state = self.state.borrow_mut();
        let removed = state.markers.remove(&handle).is_some()
            || state.polylines.remove(&handle).is_some()
            || state.windows.remove(&handle).is_some();
        if !removed {
            state.removed_unknown += 1;
        }
    }

    fn fit_bounds(&self, bounds: GeoBounds) {
        self.state.borrow_mut().fitted.push(bounds);
    }

    fn on_zoom_changed(&self, listener: ZoomListener) -> ListenerToken {
        let mut state = self.state.borrow_mut();
        let token = ListenerToken::from_raw(state.next_id());
        state.zoom_listeners.push((token, listener));
        token
    }

    fn on_marker_click(&self, marker: OverlayHandle, listener: ClickListener) -> Result<ListenerToken, MapError> {
        let mut state = self.state.borrow_mut();
        if !state.markers.contains_key(&marker) {
            return Err(MapError::NotAMarker(marker));
        }
        let token = ListenerToken::from_raw(state.next_id());
        state.click_listeners.push((token, marker, listener));
        Ok(token)
    }

    fn remove_listener(&self, token: ListenerToken) {
        let mut state = self.state.borrow_mut();
        state.zoom_listeners.retain(|(t, _)| *t != token);
        state.click_listeners.retain(|(t, _, _)| *t != token);
    }

    fn zoom(&self) -> f64 {
        self.state.borrow().zoom
    }
}
