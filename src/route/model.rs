use std::fmt;

use serde::{Deserialize, Serialize};

use crate::map::Coordinate;

/// Which direction endpoint a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteType {
    #[default]
    Normal,
    Safe,
}

impl RouteType {
    /// Path segment under `/direction/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RouteType::Normal => "normal-direction",
            RouteType::Safe => "safe-direction",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RouteType::Normal => "일반 경로",
            RouteType::Safe => "안전 경로",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteType::Normal => f.write_str("normal"),
            RouteType::Safe => f.write_str("safe"),
        }
    }
}

/// One draw request: where from, where to, and which kind of route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub goal: Coordinate,
    pub route_type: RouteType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SafetyInfo {
    pub grade: String,
    pub coverage_ratio_percent: f64,
}

/// A CCTV installation near the route.
#[derive(Debug, Clone, PartialEq)]
pub struct CctvInfo {
    pub coordinate: Coordinate,
    pub camera_count: Option<u32>,
    pub purpose: Option<String>,
    pub address: Option<String>,
}

/// A convenience store near the route.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub coordinate: Coordinate,
    pub name: Option<String>,
    pub address: Option<String>,
    /// Distance as the backend reported it, unparsed.
    pub distance: Option<String>,
}

/// A computed route as returned by the direction backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteSummary {
    pub route_type: RouteType,
    pub distance_meters: i64,
    pub time_seconds: i64,
    /// Path points in the order received.
    pub path: Vec<Coordinate>,
    pub safety: Option<SafetyInfo>,
    pub nearby_cctvs: Vec<CctvInfo>,
    pub nearby_stores: Vec<StoreInfo>,
}

impl RouteSummary {
    pub fn empty(route_type: RouteType) -> Self {
        Self {
            route_type,
            ..Default::default()
        }
    }

    pub fn cctv_count(&self) -> usize {
        self.nearby_cctvs.len()
    }

    pub fn store_count(&self) -> usize {
        self.nearby_stores.len()
    }
}
