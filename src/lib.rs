//! Astro Pi mission logger: magnetometer/accelerometer acquisition with
//! dead-reckoning displacement, plus offline analysis of the resulting CSV.

pub mod analysis;
pub mod angle;
pub mod config;
pub mod error;
pub mod integrator;
pub mod menu;
pub mod mission;
pub mod plot;
pub mod record;
pub mod sensors;
pub mod spline;
pub mod types;

pub use error::{LoggerError, Result};
pub use integrator::{Axis, AxisIntegratorState, Displacement, DisplacementEstimator};
pub use mission::{Mission, RunSummary, StopReason};
pub use types::{AccelData, MagData, PositionFix, Triple};
