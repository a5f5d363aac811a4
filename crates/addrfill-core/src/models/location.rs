use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AddrfillError, Result};

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AddrfillError::InvalidCoordinate(format!(
                "latitude {lat} out of range"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(AddrfillError::InvalidCoordinate(format!(
                "longitude {lon} out of range"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parse `"LAT,LON"` as typed on the command line.
    pub fn parse(input: &str) -> Result<Self> {
        let (lat, lon) = input
            .split_once(',')
            .ok_or_else(|| AddrfillError::InvalidCoordinate(format!("expected LAT,LON: {input}")))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| AddrfillError::InvalidCoordinate(format!("{lat}: {e}")))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| AddrfillError::InvalidCoordinate(format!("{lon}: {e}")))?;
        Self::new(lat, lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// How a location hint was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintSource {
    Device,
    Fallback,
}

/// Approximate position used to bias search results toward a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationHint {
    pub coordinate: Coordinate,
    pub source: HintSource,
}

impl LocationHint {
    pub fn device(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            source: HintSource::Device,
        }
    }

    pub fn fallback(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            source: HintSource::Fallback,
        }
    }

    /// Box spanning `delta` degrees around the hint on both axes.
    pub fn viewbox(&self, delta: f64) -> ViewBox {
        let Coordinate { lat, lon } = self.coordinate;
        ViewBox {
            min_lon: lon - delta,
            min_lat: lat - delta,
            max_lon: lon + delta,
            max_lat: lat + delta,
        }
    }
}

/// Search bounding box, rendered as `minLon,minLat,maxLon,maxLat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}
