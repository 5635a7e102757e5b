//! Display strings for route summaries.

use super::model::{RouteSummary, RouteType};

/// `"850m"` below one kilometre, `"1.2km"` from there on.
pub fn format_distance(meters: i64) -> String {
    let meters = meters.max(0);
    if meters < 1000 {
        return format!("{}m", meters);
    }
    // Halves round up, like the web client's toFixed(1).
    let tenths = (meters + 50) / 100;
    format!("{}.{}km", tenths / 10, tenths % 10)
}

/// Whole minutes, switching to hours past the hour mark: `"25분"`, `"1시간 2분"`.
pub fn format_time(seconds: i64) -> String {
    let minutes = seconds.max(0) / 60;
    if minutes < 60 {
        return format!("{}분", minutes);
    }
    format!("{}시간 {}분", minutes / 60, minutes % 60)
}

/// Title and labelled rows for a route info panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDisplay {
    pub title: &'static str,
    pub rows: Vec<(&'static str, String)>,
}

impl RouteSummary {
    pub fn display(&self) -> RouteDisplay {
        let title = match self.route_type {
            RouteType::Normal => "도보 경로 정보",
            RouteType::Safe => "안전 경로 정보",
        };
        let mut rows = vec![
            ("총 거리", format_distance(self.distance_meters)),
            ("예상 소요 시간", format_time(self.time_seconds)),
        ];

        if let (RouteType::Safe, Some(safety)) = (self.route_type, &self.safety) {
            rows.push(("경로 안전도", safety.grade.clone()));
            rows.push(("CCTV 수", format!("{}개", self.cctv_count())));
            rows.push(("편의점 수", format!("{}개", self.store_count())));
            rows.push(("안전 커버리지", format!("{}%", safety.coverage_ratio_percent)));
        }

        RouteDisplay { title, rows }
    }
}
