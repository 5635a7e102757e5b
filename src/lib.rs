#![warn(clippy::all, rust_2018_idioms)]

//! Route overlay synchronization for an interactive map.
//!
//! [`route::RouteService`] fetches walking routes from the direction backend
//! and keeps the overlays drawn on a [`map::MapWidget`] in step with the most
//! recently issued request.

pub mod config;
pub mod map;
pub mod route;

pub use config::ServiceConfig;
pub use map::{Coordinate, MapWidget, OverlayRegistry};
pub use route::{DrawOutcome, RouteClient, RouteError, RouteService, RouteSummary, RouteType};
