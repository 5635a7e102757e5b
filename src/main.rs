#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod ui;

use log::warn;
use saferoute::{RouteClient, ServiceConfig};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = ServiceConfig::from_env().unwrap_or_else(|err| {
        warn!("{}; falling back to the default direction server", err);
        ServiceConfig::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1280.0, 800.0))
            .with_min_inner_size(egui::vec2(640.0, 480.0))
            .with_title("SafeRoute")
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "SafeRoute",
        native_options,
        Box::new(move |cc| {
            let client = RouteClient::new(&config)?;
            Ok(Box::new(ui::my_app::MyApp::new(cc, client)?))
        }),
    )
}
