use std::rc::Rc;

use eframe::egui;
use egui::{Color32, RichText, Style};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use saferoute::map::{Coordinate, MapWidget};
use saferoute::route::{DrawOutcome, RouteBackend, RouteResult, RouteTicket};
use saferoute::{RouteClient, RouteService, RouteType};

use super::map_canvas::MapCanvas;

const INITIAL_CENTER: Coordinate = Coordinate {
    latitude: 37.5665,
    longitude: 126.9780,
};
const INITIAL_ZOOM: f64 = 12.0;

/// The part of the window that survives a restart.
#[derive(Deserialize, Serialize)]
#[serde(default)]
struct RouteForm {
    start: String,
    goal: String,
    route_type: RouteType,
}

impl Default for RouteForm {
    fn default() -> Self {
        Self {
            start: "37.4979,127.0276".to_string(),
            goal: "37.5045,127.0490".to_string(),
            route_type: RouteType::Normal,
        }
    }
}

pub struct MyApp {
    form: RouteForm,
    canvas: Rc<MapCanvas>,
    service: RouteService<RouteClient>,
    in_flight: Option<RouteTicket>,
    outcome: Option<RouteResult>,
    receiver: mpsc::UnboundedReceiver<(RouteTicket, RouteResult)>,
    sender: mpsc::UnboundedSender<(RouteTicket, RouteResult)>,
    runtime: tokio::runtime::Runtime,
}

impl eframe::App for MyApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.form);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process completed requests
        while let Ok((ticket, result)) = self.receiver.try_recv() {
            match self.service.complete(ticket, result) {
                DrawOutcome::Completed(result) => {
                    self.in_flight = None;
                    self.outcome = Some(result);
                }
                DrawOutcome::Superseded => {}
            }
        }

        egui::SidePanel::left("route_panel")
            .resizable(false)
            .exact_width(320.0)
            .show(ctx, |ui| self.side_panel(ui, ctx));

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_size();
            self.canvas.show(ui, size);
        });
    }
}

impl MyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, client: RouteClient) -> std::io::Result<Self> {
        cc.egui_ctx.set_style(Self::get_dark_theme_style(&cc.egui_ctx));
        let form = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("route-fetcher")
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::unbounded_channel();

        let canvas = Rc::new(MapCanvas::new(INITIAL_CENTER, INITIAL_ZOOM));
        let widget: Rc<dyn MapWidget> = canvas.clone();

        Ok(Self {
            form,
            canvas,
            service: RouteService::new(widget, client),
            in_flight: None,
            outcome: None,
            receiver,
            sender,
            runtime,
        })
    }

    fn side_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("SafeRoute");
        ui.add_space(8.0);

        coordinate_field(ui, "출발지", &mut self.form.start);
        coordinate_field(ui, "도착지", &mut self.form.goal);

        ui.add_space(4.0);
        let mut route_type = self.form.route_type;
        ui.horizontal(|ui| {
            for candidate in [RouteType::Normal, RouteType::Safe] {
                ui.selectable_value(&mut route_type, candidate, candidate.label());
            }
        });
        let toggled = route_type != self.form.route_type;
        self.form.route_type = route_type;

        ui.add_space(4.0);
        let mut search = toggled && redraws_on_toggle(self.outcome.is_some(), self.in_flight.is_some());
        ui.horizontal(|ui| {
            search |= ui.button("경로 검색").clicked();
            if ui.button("지우기").clicked() {
                self.service.clear_map();
                self.in_flight = None;
                self.outcome = None;
            }
        });
        if search {
            self.request_route(ctx);
        }

        ui.separator();
        if self.in_flight.is_some_and(|ticket| self.service.is_current(&ticket)) {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("경로를 검색하는 중...");
            });
        }

        match &self.outcome {
            Some(Ok(summary)) => {
                let display = summary.display();
                ui.label(RichText::new(display.title).strong());
                egui::Grid::new("route_summary").num_columns(2).striped(true).show(ui, |ui| {
                    for (label, value) in &display.rows {
                        ui.label(*label);
                        ui.label(value);
                        ui.end_row();
                    }
                });
            }
            Some(Err(err)) => {
                ui.colored_label(Color32::from_rgb(230, 90, 90), err.to_string());
            }
            None => {}
        }
    }

    fn request_route(&mut self, ctx: &egui::Context) {
        let start = self.form.start.parse::<Coordinate>().ok();
        let goal = self.form.goal.parse::<Coordinate>().ok();

        let ticket = match self.service.begin(start, goal, self.form.route_type) {
            Ok(ticket) => ticket,
            Err(err) => {
                self.in_flight = None;
                self.outcome = Some(Err(err));
                return;
            }
        };

        let fetch = self.service.backend().fetch_route(ticket.request());
        let sender = self.sender.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let result = fetch.await;
            if sender.send((ticket, result)).is_err() {
                debug!("Window closed before route #{} arrived", ticket.sequence());
            }
            requester.request_repaint();
        });

        self.in_flight = Some(ticket);
        self.outcome = None;
    }

    pub fn get_dark_theme_style(ctx: &egui::Context) -> Style {
        use egui::{
            style::{Selection, Visuals},
            FontFamily, FontId, Rounding, Stroke, TextStyle,
        };

        let mut style = (*ctx.style()).clone();

        style.text_styles = [
            (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
            (TextStyle::Body, FontId::new(16.0, FontFamily::Proportional)),
            (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
            (TextStyle::Button, FontId::new(16.0, FontFamily::Proportional)),
            (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        ]
        .into();

        let primary_bg_color = Color32::from_rgb(32, 33, 36);

        style.visuals = Visuals::dark();
        style.visuals.override_text_color = Some(Color32::LIGHT_GRAY);
        for widget in [
            &mut style.visuals.widgets.noninteractive,
            &mut style.visuals.widgets.inactive,
        ] {
            widget.bg_fill = primary_bg_color;
            widget.rounding = Rounding::same(4.0);
        }
        style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, Color32::WHITE);

        // Route polyline purple doubles as the accent colour
        style.visuals.selection = Selection {
            bg_fill: Color32::from_rgb(0x53, 0x47, 0xAA),
            stroke: Stroke::new(1.0, Color32::WHITE),
        };

        style.visuals.window_fill = primary_bg_color;
        style.visuals.panel_fill = primary_bg_color;
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);

        style
    }
}

/// A route type switch re-requests whenever a route is shown or still
/// loading; the sequencer drops whichever response is older.
fn redraws_on_toggle(shown: bool, loading: bool) -> bool {
    shown || loading
}

fn coordinate_field(ui: &mut egui::Ui, label: &str, text: &mut String) {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(text).hint_text("위도,경도"));
    if text.trim().is_empty() {
        return;
    }
    if let Err(err) = text.parse::<Coordinate>() {
        ui.colored_label(Color32::from_rgb(230, 160, 60), err.to_string());
    }
}
