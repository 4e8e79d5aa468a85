use thiserror::Error;

/// Astro logger error types
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Sensor failed: {0}")]
    SensorFailed(String),

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid angle: {0}")]
    InvalidAngle(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Curve fit failed: {0}")]
    Fit(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl LoggerError {
    /// Short name used in log lines, e.g. `SensorFailed: i2c timeout`
    pub fn kind(&self) -> &'static str {
        match self {
            LoggerError::SensorFailed(_) => "SensorFailed",
            LoggerError::PositionUnavailable(_) => "PositionUnavailable",
            LoggerError::Storage(_) => "Storage",
            LoggerError::Csv(_) => "Csv",
            LoggerError::Io(_) => "Io",
            LoggerError::InvalidAngle(_) => "InvalidAngle",
            LoggerError::InvalidTimestamp(_) => "InvalidTimestamp",
            LoggerError::Fit(_) => "Fit",
            LoggerError::Plot(_) => "Plot",
            LoggerError::InvalidParameters(_) => "InvalidParameters",
        }
    }
}

/// Result type for logger and analysis operations
pub type Result<T> = std::result::Result<T, LoggerError>;
