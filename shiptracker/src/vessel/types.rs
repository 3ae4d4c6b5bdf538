//! Vessel report records and errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coord::{CoordError, GeoPosition};
use crate::provider::ProviderError;

/// Errors from the vessel API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VesselError {
    #[error("no VesselFinder API key configured")]
    MissingApiKey,

    #[error("vessel API request failed: {0}")]
    Request(#[from] ProviderError),

    #[error("invalid vessel API response: {0}")]
    Parse(String),

    #[error("vessel API returned no vessels")]
    NoVessel,

    #[error("vessel API response has no AIS record")]
    MissingAis,

    #[error("vessel position is invalid: {0}")]
    InvalidPosition(#[from] CoordError),
}

/// One AIS report for the tracked vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselData {
    pub name: String,
    pub mmsi: String,
    pub imo: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Speed over ground in knots.
    pub speed: f64,
    /// Course over ground in degrees.
    pub course: f64,
    pub heading: Option<String>,
    pub destination: String,
    pub eta: String,
    pub draught: String,
    pub zone: String,
    /// Report time as sent by the API.
    pub timestamp: Option<String>,
    /// AIS source (terrestrial or satellite).
    pub source: String,
}

#[derive(Debug, Deserialize)]
struct VesselRecord {
    #[serde(rename = "AIS")]
    ais: Option<Map<String, Value>>,
}

const UNKNOWN: &str = "Unknown";

impl VesselData {
    /// Parses a VesselFinder `/vessels` response body.
    ///
    /// Uses the first vessel in the array. Numeric fields may arrive as JSON
    /// numbers or strings; missing ones default to zero. `fallback_mmsi` is
    /// used when the record omits its own MMSI.
    pub fn from_api_response(body: &[u8], fallback_mmsi: &str) -> Result<Self, VesselError> {
        let records: Vec<VesselRecord> =
            serde_json::from_slice(body).map_err(|e| VesselError::Parse(e.to_string()))?;
        let record = records.into_iter().next().ok_or(VesselError::NoVessel)?;
        let ais = record
            .ais
            .filter(|ais| !ais.is_empty())
            .ok_or(VesselError::MissingAis)?;

        Ok(Self {
            name: text(&ais, "NAME").unwrap_or_else(|| "Unknown Vessel".to_string()),
            mmsi: text(&ais, "MMSI").unwrap_or_else(|| fallback_mmsi.to_string()),
            imo: text(&ais, "IMO").unwrap_or_else(|| UNKNOWN.to_string()),
            latitude: number(&ais, "LATITUDE"),
            longitude: number(&ais, "LONGITUDE"),
            speed: number(&ais, "SPEED"),
            course: number(&ais, "COURSE"),
            heading: text(&ais, "HEADING"),
            destination: text(&ais, "DESTINATION").unwrap_or_else(|| UNKNOWN.to_string()),
            eta: text(&ais, "ETA").unwrap_or_else(|| UNKNOWN.to_string()),
            draught: text(&ais, "DRAUGHT").unwrap_or_else(|| UNKNOWN.to_string()),
            zone: text(&ais, "ZONE").unwrap_or_else(|| UNKNOWN.to_string()),
            timestamp: text(&ais, "TIMESTAMP"),
            source: text(&ais, "SRC").unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }

    /// A report with only a position, for rendering without the API.
    pub fn at_position(position: GeoPosition, mmsi: &str) -> Self {
        Self {
            name: "Manual Position".to_string(),
            mmsi: mmsi.to_string(),
            imo: UNKNOWN.to_string(),
            latitude: position.latitude(),
            longitude: position.longitude(),
            speed: 0.0,
            course: 0.0,
            heading: None,
            destination: UNKNOWN.to_string(),
            eta: UNKNOWN.to_string(),
            draught: UNKNOWN.to_string(),
            zone: UNKNOWN.to_string(),
            timestamp: None,
            source: UNKNOWN.to_string(),
        }
    }

    /// The reported position, validated.
    pub fn position(&self) -> Result<GeoPosition, CoordError> {
        GeoPosition::new(self.latitude, self.longitude)
    }
}

/// A field as text; numbers are rendered, empty strings and nulls are absent.
fn text(ais: &Map<String, Value>, key: &str) -> Option<String> {
    match ais.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(ais: &Map<String, Value>, key: &str) -> f64 {
    match ais.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
