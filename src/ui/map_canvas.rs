use std::cell::RefCell;
use std::collections::BTreeMap;

use egui::{Align2, Color32, FontId, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2};

use saferoute::map::{
    ClickListener, Coordinate, GeoBounds, IconImage, InfoContent, ListenerToken, MapError, MapWidget, MarkerIcon,
    OverlayHandle, PolylineStyle, Rgb, ZoomListener,
};

const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 20.0;
const SINGLE_POINT_ZOOM: f64 = 17.0;
const FIT_PADDING: f32 = 48.0;
const INFO_WIDTH: f32 = 220.0;

struct Marker {
    position: Coordinate,
    icon: MarkerIcon,
}

struct Polyline {
    path: Vec<Coordinate>,
    style: PolylineStyle,
}

struct InfoWindow {
    content: InfoContent,
    anchor: Option<OverlayHandle>,
}

struct CanvasState {
    next_id: u64,
    center: Coordinate,
    zoom: f64,
    viewport: Vec2,
    markers: BTreeMap<OverlayHandle, Marker>,
    polylines: BTreeMap<OverlayHandle, Polyline>,
    windows: BTreeMap<OverlayHandle, InfoWindow>,
    zoom_listeners: Vec<(ListenerToken, ZoomListener)>,
    click_listeners: Vec<(ListenerToken, OverlayHandle, ClickListener)>,
}

impl CanvasState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn scale(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn project(&self, rect: Rect, point: Coordinate) -> Pos2 {
        let (x, y) = point.to_world();
        let (cx, cy) = self.center.to_world();
        let scale = self.scale();
        rect.center() + Vec2::new(((x - cx) * scale) as f32, ((y - cy) * scale) as f32)
    }

    fn icon_rect(&self, rect: Rect, marker: &Marker) -> Rect {
        let at = self.project(rect, marker.position);
        let min = at - Vec2::new(marker.icon.anchor.0, marker.icon.anchor.1);
        Rect::from_min_size(min, Vec2::splat(marker.icon.size as f32))
    }
}

/// Pannable, zoomable Web Mercator canvas that draws route overlays.
pub struct MapCanvas {
    state: RefCell<CanvasState>,
}

impl MapCanvas {
    pub fn new(center: Coordinate, zoom: f64) -> Self {
        Self {
            state: RefCell::new(CanvasState {
                next_id: 0,
                center,
                zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
                viewport: Vec2::new(800.0, 600.0),
                markers: BTreeMap::new(),
                polylines: BTreeMap::new(),
                windows: BTreeMap::new(),
                zoom_listeners: Vec::new(),
                click_listeners: Vec::new(),
            }),
        }
    }

    pub fn show(&self, ui: &mut Ui, size: Vec2) -> Response {
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        let painter = ui.painter().with_clip_rect(rect);
        painter.rect(rect, 0.0, Color32::from_rgb(36, 40, 48), Stroke::new(1.0, Color32::from_gray(70)));

        let mut new_zoom = None;
        {
            let mut state = self.state.borrow_mut();
            state.viewport = rect.size();

            if response.dragged() {
                let delta = response.drag_delta();
                let scale = state.scale();
                let (cx, cy) = state.center.to_world();
                let x = (cx - delta.x as f64 / scale).rem_euclid(1.0);
                let y = (cy - delta.y as f64 / scale).clamp(0.0, 1.0);
                state.center = Coordinate::from_world(x, y);
            }

            if response.hovered() {
                let scroll = ui.input(|i| i.smooth_scroll_delta).y;
                if scroll.abs() > f32::EPSILON {
                    // Normalize scroll further using tanh
                    let step = (scroll / 10.0).tanh() as f64;
                    let zoom = (state.zoom + step).clamp(MIN_ZOOM, MAX_ZOOM);
                    if (zoom - state.zoom).abs() > f64::EPSILON {
                        state.zoom = zoom;
                        new_zoom = Some(zoom);
                    }
                }
            }
        }
        if let Some(zoom) = new_zoom {
            self.notify_zoom(zoom);
        }

        if response.clicked() {
            if let Some(marker) = response.interact_pointer_pos().and_then(|pos| self.marker_at(rect, pos)) {
                self.notify_click(marker);
            }
        }

        self.paint(&painter, rect);
        response
    }

    fn marker_at(&self, rect: Rect, pos: Pos2) -> Option<OverlayHandle> {
        let state = self.state.borrow();
        // Later markers are drawn on top, so they win.
        state
            .markers
            .iter()
            .rev()
            .find(|(_, marker)| state.icon_rect(rect, marker).contains(pos))
            .map(|(handle, _)| *handle)
    }

    fn notify_zoom(&self, zoom: f64) {
        let listeners: Vec<ZoomListener> = self
            .state
            .borrow()
            .zoom_listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(zoom);
        }
    }

    fn notify_click(&self, marker: OverlayHandle) {
        let listeners: Vec<ClickListener> = self
            .state
            .borrow()
            .click_listeners
            .iter()
            .filter(|(_, target, _)| *target == marker)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect) {
        let state = self.state.borrow();

        for polyline in state.polylines.values() {
            let points: Vec<Pos2> = polyline.path.iter().map(|p| state.project(rect, *p)).collect();
            painter.add(Shape::line(
                points,
                Stroke::new(polyline.style.weight, color(polyline.style.color)),
            ));
        }

        for marker in state.markers.values() {
            paint_marker(painter, state.icon_rect(rect, marker), &marker.icon);
        }

        for window in state.windows.values() {
            let Some(anchor) = window.anchor.and_then(|handle| state.markers.get(&handle)) else {
                continue;
            };
            let icon = state.icon_rect(rect, anchor);
            paint_info_window(painter, icon.center_top(), &window.content);
        }
    }
}

fn color(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

fn paint_marker(painter: &egui::Painter, icon_rect: Rect, icon: &MarkerIcon) {
    let radius = icon_rect.width() / 2.0;
    let (fill, label, label_color) = match &icon.image {
        IconImage::Badge {
            fill,
            label,
            label_color,
        } => (color(*fill), label.as_str(), color(*label_color)),
        IconImage::Url(url) if url.contains("start") => (Color32::from_rgb(45, 180, 0), "출발", Color32::WHITE),
        IconImage::Url(url) if url.contains("goal") => (Color32::from_rgb(220, 60, 60), "도착", Color32::WHITE),
        IconImage::Url(_) => (Color32::GRAY, "", Color32::WHITE),
    };

    painter.circle(icon_rect.center(), radius, fill, Stroke::new(2.0, Color32::WHITE));
    if !label.is_empty() {
        painter.text(
            icon_rect.center(),
            Align2::CENTER_CENTER,
            label,
            FontId::proportional((radius * 0.7).max(9.0)),
            label_color,
        );
    }
}

fn paint_info_window(painter: &egui::Painter, tip: Pos2, content: &InfoContent) {
    let height = 34.0 + 18.0 * content.lines.len() as f32;
    let frame = Rect::from_min_size(tip - Vec2::new(INFO_WIDTH / 2.0, height + 8.0), Vec2::new(INFO_WIDTH, height));
    painter.rect(frame, 8.0, Color32::WHITE, Stroke::new(1.0, Color32::from_gray(180)));

    let text = Color32::from_gray(30);
    let mut cursor = frame.min + Vec2::new(10.0, 8.0);
    painter.text(cursor, Align2::LEFT_TOP, &content.title, FontId::proportional(15.0), text);
    cursor.y += 22.0;
    for line in &content.lines {
        painter.text(cursor, Align2::LEFT_TOP, line, FontId::proportional(13.0), Color32::from_gray(90));
        cursor.y += 18.0;
    }
}

impl MapWidget for MapCanvas {
    fn create_marker(&self, position: Coordinate, icon: MarkerIcon) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        let handle = OverlayHandle::from_raw(state.next_id());
        state.markers.insert(handle, Marker { position, icon });
        Ok(handle)
    }

    fn set_marker_icon(&self, marker: OverlayHandle, icon: MarkerIcon) -> Result<(), MapError> {
        match self.state.borrow_mut().markers.get_mut(&marker) {
            Some(entry) => {
                entry.icon = icon;
                Ok(())
            }
            None => Err(MapError::UnknownOverlay(marker)),
        }
    }

    fn create_polyline(&self, path: &[Coordinate], style: PolylineStyle) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        let handle = OverlayHandle::from_raw(state.next_id());
        state.polylines.insert(
            handle,
            Polyline {
                path: path.to_vec(),
                style,
            },
        );
        Ok(handle)
    }

    fn create_info_window(&self, content: InfoContent) -> Result<OverlayHandle, MapError> {
        let mut state = self.state.borrow_mut();
        let handle = OverlayHandle::from_raw(state.next_id());
        state.windows.insert(handle, InfoWindow { content, anchor: None });
        Ok(handle)
    }

    fn open_info_window(&self, window: OverlayHandle, marker: OverlayHandle) -> Result<(), MapError> {
        let mut state = self.state.borrow_mut();
        if !state.markers.contains_key(&marker) {
            return Err(MapError::NotAMarker(marker));
        }
        let entry = state.windows.get_mut(&window).ok_or(MapError::NotAnInfoWindow(window))?;
        entry.anchor = Some(marker);
        Ok(())
    }

    fn close_info_window(&self, window: OverlayHandle) {
        if let Some(entry) = self.state.borrow_mut().windows.get_mut(&window) {
            entry.anchor = None;
        }
    }

    fn remove_overlay(&self, handle: OverlayHandle) {
        let mut state = self.state.borrow_mut();
        if state.markers.remove(&handle).is_some() {
            state.click_listeners.retain(|(_, marker, _)| *marker != handle);
            return;
        }
        if state.polylines.remove(&handle).is_none() {
            state.windows.remove(&handle);
        }
    }

    fn fit_bounds(&self, bounds: GeoBounds) {
        let zoom = {
            let mut state = self.state.borrow_mut();
            let (west, north) = Coordinate::new(bounds.north(), bounds.west()).to_world();
            let (east, south) = Coordinate::new(bounds.south(), bounds.east()).to_world();
            state.center = Coordinate::from_world((west + east) / 2.0, (north + south) / 2.0);

            let width = ((state.viewport.x - FIT_PADDING).max(1.0)) as f64;
            let height = ((state.viewport.y - FIT_PADDING).max(1.0)) as f64;
            let span_x = (east - west).abs() * TILE_SIZE;
            let span_y = (south - north).abs() * TILE_SIZE;
            let zoom = if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
                SINGLE_POINT_ZOOM
            } else {
                (width / span_x).min(height / span_y).log2()
            };

            let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
            if (zoom - state.zoom).abs() <= f64::EPSILON {
                return;
            }
            state.zoom = zoom;
            zoom
        };
        self.notify_zoom(zoom);
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
