//! HTTP access to the direction backend.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use super::error::{RouteError, RouteResult, SERVER_FALLBACK_MESSAGE};
use super::model::{CctvInfo, RouteRequest, RouteSummary, RouteType, SafetyInfo, StoreInfo};
use crate::config::ServiceConfig;
use crate::map::Coordinate;

/// Source of computed routes.
///
/// The returned future must not borrow `self`, so hosts can run it on any
/// executor and hand the result back to the coordinator later.
pub trait RouteBackend {
    fn fetch_route(&self, request: &RouteRequest) -> BoxFuture<'static, RouteResult>;
}

#[derive(Debug, Clone)]
pub struct RouteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RouteClient {
    pub fn new(config: &ServiceConfig) -> RouteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET {base}/direction/{endpoint}?start=lat,lng&goal=lat,lng`
    pub fn request_url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/direction/{}?start={}&goal={}",
            self.base_url,
            request.route_type.endpoint(),
            request.start.to_query_value(),
            request.goal.to_query_value()
        )
    }

    /// Issues exactly one request and decodes the answer.
    pub async fn fetch(&self, request: &RouteRequest) -> RouteResult {
        let url = self.request_url(request);
        info!("Requesting {} route from {}", request.route_type, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Direction server answered {} with {} bytes", status, body.len());

        if !status.is_success() {
            return Err(RouteError::Server {
                status: status.as_u16(),
                message: server_error_message(&body),
            });
        }

        parse_route_body(request.route_type, &body)
    }
}

impl RouteBackend for RouteClient {
    fn fetch_route(&self, request: &RouteRequest) -> BoxFuture<'static, RouteResult> {
        let client = self.clone();
        let request = *request;
        async move { client.fetch(&request).await }.boxed()
    }
}

/// The `error` field of a failed response, or a generic message.
pub fn server_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(SERVER_FALLBACK_MESSAGE)
        .to_string()
}

/// Decodes a successful direction response.
///
/// A body that is not JSON is an error. JSON with missing or unexpected
/// pieces degrades to whatever could be read, down to an empty route.
pub fn parse_route_body(route_type: RouteType, body: &[u8]) -> RouteResult {
    let response: DirectionResponse = serde_json::from_slice(body)?;

    let data = match response.data {
        Some(data) if response.success => data,
        _ => return Ok(RouteSummary::empty(route_type)),
    };
    let features = data.features.unwrap_or_default();

    let totals = features.first().and_then(|f| f.properties.as_ref());
    let distance_meters = totals.and_then(|p| p.total_distance).unwrap_or(0.0) as i64;
    let time_seconds = totals.and_then(|p| p.total_time).unwrap_or(0.0) as i64;

    Ok(RouteSummary {
        route_type,
        distance_meters,
        time_seconds,
        path: extract_path(&features),
        safety: data.safety.map(|s| SafetyInfo {
            grade: s.grade.unwrap_or_default(),
            coverage_ratio_percent: s.coverage_ratio.unwrap_or(0.0),
        }),
        nearby_cctvs: data
            .nearby_cctvs
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireCctv::into_info)
            .collect(),
        nearby_stores: data
            .nearby_stores
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireStore::into_info)
            .collect(),
    })
}

/// Every `LineString` coordinate list, concatenated in feature order.
fn extract_path(features: &[Feature]) -> Vec<Coordinate> {
    features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter(|geometry| geometry.kind == "LineString")
        .filter_map(|geometry| geometry.coordinates.as_array())
        .flatten()
        .filter_map(|position| {
            let position: Vec<f64> = position.as_array()?.iter().filter_map(Value::as_f64).collect();
            Coordinate::from_lng_lat(&position)
        })
        .collect()
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DirectionResponse {
    success: bool,
    data: Option<DirectionData>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct DirectionData {
    features: Option<Vec<Feature>>,
    safety: Option<WireSafety>,
    #[serde(rename = "nearbyCCTVs")]
    nearby_cctvs: Option<Vec<WireCctv>>,
    nearby_stores: Option<Vec<WireStore>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Feature {
    geometry: Option<Geometry>,
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Value,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Properties {
    total_distance: Option<f64>,
    total_time: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct WireSafety {
    grade: Option<String>,
    coverage_ratio: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct WireCctv {
    latitude: Option<f64>,
    longitude: Option<f64>,
    camera_count: Option<u32>,
    purpose: Option<String>,
    address: Option<String>,
}

impl WireCctv {
    fn into_info(self) -> Option<CctvInfo> {
        Some(CctvInfo {
            coordinate: Coordinate::new(self.latitude?, self.longitude?),
            camera_count: self.camera_count,
            purpose: self.purpose,
            address: self.address,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WireStore {
    latitude: Option<f64>,
    longitude: Option<f64>,
    name: Option<String>,
    address: Option<String>,
    distance: Option<Value>,
}

impl WireStore {
    fn into_info(self) -> Option<StoreInfo> {
        let distance = match self.distance {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(StoreInfo {
            coordinate: Coordinate::new(self.latitude?, self.longitude?),
            name: self.name,
            address: self.address,
            distance,
        })
    }
}
