use thiserror::Error;

use crate::map::OverlayError;

/// Message shown when the server fails without a readable reason.
pub const SERVER_FALLBACK_MESSAGE: &str = "경로 검색 실패";

/// Everything that can go wrong between asking for a route and seeing it drawn.
///
/// `Display` is the user-facing message.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("출발지와 도착지를 모두 지정해야 합니다")]
    MissingCoordinates,

    #[error("경로 검색에 실패했습니다")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("경로 응답을 해석할 수 없습니다")]
    Decode(#[from] serde_json::Error),

    #[error("경로를 지도에 표시하지 못했습니다: {0}")]
    Overlay(#[from] OverlayError),
}

pub type RouteResult<T = super::RouteSummary> = std::result::Result<T, RouteError>;
