use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LoggerError, Result};

/// Mission time allowance: 178.5 min keeps the run inside the 3 h slot
pub const DEFAULT_RUN_MINUTES: f64 = 178.5;
/// Stop before the 3 GB storage allowance (data + log + program)
pub const DEFAULT_BYTE_BUDGET: u64 = 2_999_990_000;
pub const DEFAULT_DATA_FILE: &str = "data.csv";
pub const DEFAULT_LOG_FILE: &str = "HHorizons.log";
pub const DEFAULT_ROTATION: u16 = 270;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardConfig {
    /// Synthetic readings, no hardware
    Simulated,
    /// External helper program (see `CommandBoard`)
    Command { helper: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub run_minutes: f64,
    pub byte_budget: u64,
    pub output_dir: PathBuf,
    pub data_file: String,
    pub log_file: String,
    pub rotation: u16,
    /// Pause between cycles; 0 polls as fast as the sensors answer
    pub poll_interval_ms: u64,
    pub board: BoardConfig,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            run_minutes: DEFAULT_RUN_MINUTES,
            byte_budget: DEFAULT_BYTE_BUDGET,
            output_dir: PathBuf::from("."),
            data_file: DEFAULT_DATA_FILE.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            rotation: DEFAULT_ROTATION,
            poll_interval_ms: 0,
            board: BoardConfig::Simulated,
        }
    }
}

impl MissionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            LoggerError::InvalidParameters(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.run_minutes.is_finite() && self.run_minutes > 0.0) {
            return Err(LoggerError::InvalidParameters(format!(
                "run_minutes must be positive, got {}",
                self.run_minutes
            )));
        }
        if self.byte_budget == 0 {
            return Err(LoggerError::InvalidParameters("byte_budget must be non-zero".to_string()));
        }
        if self.data_file.is_empty() || self.log_file.is_empty() {
            return Err(LoggerError::InvalidParameters("file names must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn run_limit(&self) -> Duration {
        Duration::milliseconds((self.run_minutes * 60_000.0).round() as i64)
    }

    pub fn deadline(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.run_limit()
    }

    pub fn data_path(&self) -> PathBuf {
        self.output_dir.join(&self.data_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = MissionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.run_limit(), Duration::seconds(10_710));
        assert_eq!(config.data_path(), PathBuf::from("./data.csv"));
        assert_eq!(config.log_path(), PathBuf::from("./HHorizons.log"));
    }

    #[test]
    fn test_deadline() {
        let config = MissionConfig { run_minutes: 0.5, ..MissionConfig::default() };
        let start = Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 0).unwrap();
        assert_eq!(config.deadline(start), Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 30).unwrap());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "run_minutes": 5.0, "board": { "kind": "command", "helper": "sense-helper" } }"#;
        let config: MissionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.run_minutes, 5.0);
        assert_eq!(config.byte_budget, DEFAULT_BYTE_BUDGET);
        assert_eq!(config.board, BoardConfig::Command { helper: "sense-helper".to_string() });
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = MissionConfig { run_minutes: -1.0, ..MissionConfig::default() };
        assert!(config.validate().is_err());
        let config = MissionConfig { byte_budget: 0, ..MissionConfig::default() };
        assert!(config.validate().is_err());
    }
}
