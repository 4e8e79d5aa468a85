use serde::{Deserialize, Serialize};

/// Raw three-component reading as returned by the sensor board
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelData {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelData {
    pub fn from_raw(raw: Triple, timestamp: f64) -> Self {
        Self { timestamp, x: raw.x, y: raw.y, z: raw.z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagData {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MagData {
    pub fn from_raw(raw: Triple, timestamp: f64) -> Self {
        Self { timestamp, x: raw.x, y: raw.y, z: raw.z }
    }

    /// Field strength, sqrt(x² + y² + z²)
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Sub-satellite point in decimal degrees, elevation above the ellipsoid in km
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_km: f64,
}

/// One LED colour (r, g, b)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);
