//! Offline post-processing of a mission `data.csv`.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

use crate::angle::dms_to_decimal;
use crate::error::{LoggerError, Result};

pub const DECIMAL_POSITIONS_FILE: &str = "Longitude&Latitude.csv";
pub const DISTANCE_FILE: &str = "DistanceTravelled.csv";

/// Row as stored on disk. Accepts the logger's header names and the squashed
/// ones (`MagX`, `ISSLatitude`, ...) used by hand-edited copies.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "DateTime")]
    date_time: String,
    #[serde(rename = "Mag X", alias = "MagX")]
    mag_x: f64,
    #[serde(rename = "Mag Y", alias = "MagY")]
    mag_y: f64,
    #[serde(rename = "Mag Z", alias = "MagZ")]
    mag_z: f64,
    #[serde(rename = "Mag Magnitude", alias = "MagMagnitude")]
    mag_magnitude: f64,
    #[serde(rename = "ISS Latitude", alias = "ISSLatitude")]
    latitude: String,
    #[serde(rename = "ISS Longitude", alias = "ISSLongitude")]
    longitude: String,
    #[serde(rename = "ISS Elevation", alias = "ISSElevation")]
    elevation_km: f64,
}

/// One logged cycle, positions in decimal degrees
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
    pub mag_magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_km: f64,
}

impl Sample {
    fn from_raw(raw: RawRow) -> Result<Self> {
        Ok(Self {
            time: parse_timestamp(&raw.date_time)?,
            mag_x: raw.mag_x,
            mag_y: raw.mag_y,
            mag_z: raw.mag_z,
            mag_magnitude: raw.mag_magnitude,
            latitude: dms_to_decimal(&raw.latitude)?,
            longitude: dms_to_decimal(&raw.longitude)?,
            elevation_km: raw.elevation_km,
        })
    }
}

/// Read a mission log. Rows that fail to parse are skipped with a warning.
pub fn load_log(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut samples = Vec::new();
    for (i, result) in rdr.deserialize::<RawRow>().enumerate() {
        match result.map_err(LoggerError::from).and_then(Sample::from_raw) {
            Ok(sample) => samples.push(sample),
            Err(e) => log::warn!("Skipping row {} of {}: {}", i + 1, path.display(), e),
        }
    }
    log::info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Parse the logger's `DateTime` column (also RFC 3339 and `T`-separated forms)
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(LoggerError::InvalidTimestamp(text.to_string()))
}

pub fn decimal_positions(samples: &[Sample]) -> Vec<(f64, f64)> {
    samples.iter().map(|s| (s.latitude, s.longitude)).collect()
}

/// Running great-circle distance along the track in km, starting at 0
pub fn cumulative_distance_km(positions: &[(f64, f64)]) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(positions.len());
    let mut prev: Option<Point<f64>> = None;

    for &(lat, lon) in positions {
        let point = Point::new(lon, lat);
        if let Some(p) = prev {
            total += p.geodesic_distance(&point) / 1000.0;
        }
        out.push(total);
        prev = Some(point);
    }
    out
}

#[derive(Serialize)]
struct PositionRow {
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

#[derive(Serialize)]
struct DistanceRow {
    #[serde(rename = "DistanceTravelled")]
    distance_km: f64,
}

pub fn write_decimal_positions(path: impl AsRef<Path>, positions: &[(f64, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for &(latitude, longitude) in positions {
        writer.serialize(PositionRow { latitude, longitude })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_distance(path: impl AsRef<Path>, distances_km: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for &distance_km in distances_km {
        writer.serialize(DistanceRow { distance_km })?;
    }
    writer.flush()?;
    Ok(())
}
