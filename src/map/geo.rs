use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 position.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate from a GeoJSON position, which is `[lng, lat, ...]`.
    pub fn from_lng_lat(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    /// `"lat,lng"`, the form the direction endpoints expect.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Position in normalized Web Mercator space, both axes in `[0, 1]`.
    pub fn to_world(&self) -> (f64, f64) {
        let lat_rad = self.latitude.clamp(-85.051_128, 85.051_128).to_radians();
        let x = (self.longitude + 180.0) / 360.0;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        (x, y)
    }

    /// Inverse of [`Coordinate::to_world`].
    pub fn from_world(x: f64, y: f64) -> Self {
        let longitude = x * 360.0 - 180.0;
        let latitude = (std::f64::consts::PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
        Self::new(latitude, longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateParseError {
    #[error("expected \"lat,lng\", got {0:?}")]
    Format(String),
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || CoordinateParseError::Format(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(format_err)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| format_err())?;
        let longitude: f64 = lng.trim().parse().map_err(|_| format_err())?;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateParseError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateParseError::Longitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoBounds {
    south: f64, // minimum latitude
    west: f64,  // minimum longitude
    north: f64, // maximum latitude
    east: f64,  // maximum longitude
}

impl GeoBounds {
    pub fn from_point(point: Coordinate) -> Self {
        Self {
            south: point.latitude,
            west: point.longitude,
            north: point.latitude,
            east: point.longitude,
        }
    }

    /// Smallest box covering every point, or `None` for an empty slice.
    pub fn covering(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::from_point(*first);
        for point in rest {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.south = self.south.min(point.latitude);
        self.north = self.north.max(point.latitude);
        self.west = self.west.min(point.longitude);
        self.east = self.east.max(point.longitude);
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        self.south <= point.latitude
            && point.latitude <= self.north
            && self.west <= point.longitude
            && point.longitude <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_lat_lng_text() {
        let c: Coordinate = " 37.5665 , 126.9780 ".parse().unwrap();
        assert_relative_eq!(c.latitude, 37.5665);
        assert_relative_eq!(c.longitude, 126.978);
        assert_eq!(c.to_query_value(), "37.5665,126.978");
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!("37.5".parse::<Coordinate>(), Err(CoordinateParseError::Format(_))));
        assert!(matches!("a,b".parse::<Coordinate>(), Err(CoordinateParseError::Format(_))));
        assert_eq!("91,0".parse::<Coordinate>(), Err(CoordinateParseError::Latitude(91.0)));
        assert_eq!("0,181".parse::<Coordinate>(), Err(CoordinateParseError::Longitude(181.0)));
    }

    #[test]
    fn geojson_positions_are_lng_first() {
        let c = Coordinate::from_lng_lat(&[127.0, 37.0, 12.5]).unwrap();
        assert_eq!(c, Coordinate::new(37.0, 127.0));
        assert!(Coordinate::from_lng_lat(&[127.0]).is_none());
    }

    #[test]
    fn world_projection_round_trips_through_the_origin() {
        let (x, y) = Coordinate::new(0.0, 0.0).to_world();
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(y, 0.5, epsilon = 1e-12);

        let seoul = Coordinate::new(37.5665, 126.978);
        let (x, y) = seoul.to_world();
        let back = Coordinate::from_world(x, y);
        assert_relative_eq!(back.latitude, seoul.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.longitude, seoul.longitude, epsilon = 1e-9);
    }

    #[test]
    fn covering_bounds_extends_over_every_point() {
        assert!(GeoBounds::covering(&[]).is_none());
        let bounds = GeoBounds::covering(&[
            Coordinate::new(1.0, 2.0),
            Coordinate::new(-1.0, 5.0),
            Coordinate::new(0.5, -3.0),
        ])
        .unwrap();
        assert_eq!((bounds.south(), bounds.north()), (-1.0, 1.0));
        assert_eq!((bounds.west(), bounds.east()), (-3.0, 5.0));
        assert!(bounds.contains(Coordinate::new(0.0, 0.0)));
        assert_eq!(bounds.center(), Coordinate::new(0.0, 1.0));
    }
}
