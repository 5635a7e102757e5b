pub mod client;
pub mod coordinator;
pub mod error;
pub mod format;
pub mod model;

pub use client::{parse_route_body, server_error_message, RouteBackend, RouteClient};
pub use coordinator::{DrawOutcome, RouteService, RouteTicket, Sequencer};
pub use error::{RouteError, RouteResult, SERVER_FALLBACK_MESSAGE};
pub use format::{format_distance, format_time, RouteDisplay};
pub use model::{CctvInfo, RouteRequest, RouteSummary, RouteType, SafetyInfo, StoreInfo};
