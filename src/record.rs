use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::angle::format_dms;
use crate::error::Result;
use crate::integrator::Displacement;
use crate::types::{AccelData, MagData, PositionFix};

/// Column names of the mission data file, in order
pub const HEADER: [&str; 14] = [
    "DateTime",
    "Mag X",
    "Mag Y",
    "Mag Z",
    "Mag Magnitude",
    "Acc X",
    "Acc Y",
    "Acc Z",
    "Displacement X",
    "Displacement Y",
    "Displacement Z",
    "ISS Latitude",
    "ISS Longitude",
    "ISS Elevation",
];

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One row of `data.csv`: one acquisition cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    #[serde(rename = "DateTime")]
    pub date_time: String,
    #[serde(rename = "Mag X")]
    pub mag_x: f64,
    #[serde(rename = "Mag Y")]
    pub mag_y: f64,
    #[serde(rename = "Mag Z")]
    pub mag_z: f64,
    #[serde(rename = "Mag Magnitude")]
    pub mag_magnitude: f64,
    #[serde(rename = "Acc X")]
    pub acc_x: f64,
    #[serde(rename = "Acc Y")]
    pub acc_y: f64,
    #[serde(rename = "Acc Z")]
    pub acc_z: f64,
    #[serde(rename = "Displacement X")]
    pub displacement_x: f64,
    #[serde(rename = "Displacement Y")]
    pub displacement_y: f64,
    #[serde(rename = "Displacement Z")]
    pub displacement_z: f64,
    /// DMS text, e.g. `51deg 30' 26.4"`
    #[serde(rename = "ISS Latitude")]
    pub latitude: String,
    #[serde(rename = "ISS Longitude")]
    pub longitude: String,
    #[serde(rename = "ISS Elevation")]
    pub elevation_km: f64,
}

impl DataRecord {
    pub fn new(
        captured: DateTime<Utc>,
        mag: &MagData,
        accel: &AccelData,
        displacement: &Displacement,
        fix: &PositionFix,
    ) -> Self {
        Self {
            date_time: captured.format(DATETIME_FORMAT).to_string(),
            mag_x: mag.x,
            mag_y: mag.y,
            mag_z: mag.z,
            mag_magnitude: mag.magnitude(),
            acc_x: accel.x,
            acc_y: accel.y,
            acc_z: accel.z,
            displacement_x: displacement.x,
            displacement_y: displacement.y,
            displacement_z: displacement.z,
            latitude: format_dms(fix.latitude),
            longitude: format_dms(fix.longitude),
            elevation_km: fix.elevation_km,
        }
    }
}

/// Append-only CSV sink for `DataRecord`s, flushed after every row
pub struct DataLog {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: u64,
}

impl DataLog {
    /// Truncate `path` and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { path, writer, rows: 0 })
    }

    pub fn append(&mut self, record: &DataRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
