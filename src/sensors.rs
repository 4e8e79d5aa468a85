use std::process::Command;

use chrono::{DateTime, Utc};

use crate::error::{LoggerError, Result};
use crate::types::{PositionFix, Rgb, Triple};

pub const LED_SIZE: u8 = 8;

/// Sense HAT style board: magnetometer, accelerometer and an 8x8 LED matrix
pub trait SenseBoard {
    /// Accelerometer reading in gravities
    fn accelerometer_raw(&mut self) -> Result<Triple>;
    /// Magnetometer reading in microteslas
    fn compass_raw(&mut self) -> Result<Triple>;
    fn set_rotation(&mut self, degrees: u16) -> Result<()>;
    fn show_message(&mut self, text: &str) -> Result<()>;
    fn set_pixel(&mut self, x: u8, y: u8, colour: Rgb) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Supplies the station's position for a given instant
pub trait PositionSource {
    fn coordinates(&mut self, at: DateTime<Utc>) -> Result<PositionFix>;
}

/// Seconds source used to timestamp accelerometer reads. Must not go backwards.
pub trait Clock {
    fn now(&mut self) -> f64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        current_timestamp()
    }
}

pub fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn check_pixel(x: u8, y: u8) -> Result<()> {
    if x >= LED_SIZE || y >= LED_SIZE {
        return Err(LoggerError::InvalidParameters(format!(
            "pixel ({}, {}) outside {}x{} matrix",
            x, y, LED_SIZE, LED_SIZE
        )));
    }
    Ok(())
}

/// Synthetic board for bench runs and tests.
///
/// Readings are slow sinusoids around a 1 g vertical and a ~48 µT field,
/// advanced by one tick per read.
pub struct SimulatedBoard {
    accel_ticks: u64,
    mag_ticks: u64,
    rotation: u16,
    pixels: [[Rgb; LED_SIZE as usize]; LED_SIZE as usize],
    messages: Vec<String>,
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self {
            accel_ticks: 0,
            mag_ticks: 0,
            rotation: 0,
            pixels: [[Rgb::default(); LED_SIZE as usize]; LED_SIZE as usize],
            messages: Vec::new(),
        }
    }

    pub fn pixel(&self, x: u8, y: u8) -> Option<Rgb> {
        self.pixels
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels
            .iter()
            .flatten()
            .filter(|p| **p != Rgb::default())
            .count()
    }

    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SenseBoard for SimulatedBoard {
    fn accelerometer_raw(&mut self) -> Result<Triple> {
        use std::f64::consts::PI;
        let t = self.accel_ticks as f64 * 0.02;
        self.accel_ticks += 1;

        Ok(Triple {
            x: (t * 2.0 * PI).sin() * 0.01,
            y: (t * 2.0 * PI).cos() * 0.008,
            z: 1.0 + (t * PI).sin() * 0.002,
        })
    }

    fn compass_raw(&mut self) -> Result<Triple> {
        let t = self.mag_ticks as f64 * 0.02;
        self.mag_ticks += 1;

        Ok(Triple {
            x: 20.0 + (t * 0.05).sin() * 5.0,
            y: -12.0 + (t * 0.03).cos() * 3.0,
            z: 41.0 + (t * 0.01).sin() * 2.0,
        })
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if degrees % 90 != 0 || degrees >= 360 {
            return Err(LoggerError::InvalidParameters(format!(
                "rotation must be 0, 90, 180 or 270, got {}",
                degrees
            )));
        }
        self.rotation = degrees;
        Ok(())
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        log::debug!("[led] {}", text);
        self.messages.push(text.to_string());
        Ok(())
    }

    fn set_pixel(&mut self, x: u8, y: u8, colour: Rgb) -> Result<()> {
        check_pixel(x, y)?;
        self.pixels[y as usize][x as usize] = colour;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.pixels = [[Rgb::default(); LED_SIZE as usize]; LED_SIZE as usize];
        Ok(())
    }
}

/// Board driven through an external helper program, one invocation per call.
///
/// Reads run `<helper> accel` / `<helper> compass` and expect a line such as
/// `x=0.01, y=-0.02, z=0.99`. LED calls run `<helper> led <action> ...`.
pub struct CommandBoard {
    helper: String,
}

impl CommandBoard {
    pub fn new(helper: impl Into<String>) -> Self {
        Self { helper: helper.into() }
    }

    fn run(&self, args: &[String]) -> Result<String> {
        let output = Command::new(&self.helper)
            .args(args)
            .output()
            .map_err(|e| LoggerError::SensorFailed(format!("{}: {}", self.helper, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LoggerError::SensorFailed(format!(
                "{} {} exited with {}: {}",
                self.helper,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn read_triple(&self, sensor: &str) -> Result<Triple> {
        let text = self.run(&[sensor.to_string()])?;
        parse_xyz_output(&text).ok_or_else(|| {
            LoggerError::SensorFailed(format!("unreadable {} output: {:?}", sensor, text.trim()))
        })
    }

    fn led(&self, action: &str, rest: &[String]) -> Result<()> {
        let mut args = vec!["led".to_string(), action.to_string()];
        args.extend_from_slice(rest);
        self.run(&args).map(|_| ())
    }
}

impl SenseBoard for CommandBoard {
    fn accelerometer_raw(&mut self) -> Result<Triple> {
        self.read_triple("accel")
    }

    fn compass_raw(&mut self) -> Result<Triple> {
        self.read_triple("compass")
    }

    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        self.led("rotation", &[degrees.to_string()])
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        self.led("message", &[text.to_string()])
    }

    fn set_pixel(&mut self, x: u8, y: u8, colour: Rgb) -> Result<()> {
        check_pixel(x, y)?;
        let Rgb(r, g, b) = colour;
        self.led(
            "pixel",
            &[x, y, r, g, b].map(|v| v.to_string()),
        )
    }

    fn clear(&mut self) -> Result<()> {
        self.led("clear", &[])
    }
}

/// Parse `x=.., y=.., z=..` (any order, comma separated). All three must be present.
pub fn parse_xyz_output(output: &str) -> Option<Triple> {
    let mut x = None;
    let mut y = None;
    let mut z = None;

    for part in output.trim().split(',') {
        let part = part.trim();
        if let Some(val_str) = part.strip_prefix("x=") {
            x = Some(val_str.trim().parse().ok()?);
        } else if let Some(val_str) = part.strip_prefix("y=") {
            y = Some(val_str.trim().parse().ok()?);
        } else if let Some(val_str) = part.strip_prefix("z=") {
            z = Some(val_str.trim().parse().ok()?);
        }
    }

    Some(Triple { x: x?, y: y?, z: z? })
}

const EARTH_ROTATION_RAD_S: f64 = 7.292_115_9e-5;

/// Circular-orbit ground track, good to a few degrees over a 3 hour run.
///
/// Argument of latitude advances uniformly from `epoch`; longitude subtracts
/// Earth rotation. Nodal regression and eccentricity are ignored.
#[derive(Clone, Debug)]
pub struct CircularOrbit {
    pub epoch: DateTime<Utc>,
    pub inclination_deg: f64,
    pub period_s: f64,
    pub altitude_km: f64,
    /// Longitude of the ascending node at epoch, Earth-fixed
    pub node_longitude_deg: f64,
    /// Argument of latitude at epoch
    pub phase_deg: f64,
}

impl CircularOrbit {
    /// Nominal ISS orbit starting at the ascending node over 0° longitude
    pub fn iss(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            inclination_deg: 51.64,
            period_s: 92.68 * 60.0,
            altitude_km: 420.0,
            node_longitude_deg: 0.0,
            phase_deg: 0.0,
        }
    }

    pub fn fix_at(&self, at: DateTime<Utc>) -> PositionFix {
        use std::f64::consts::PI;

        let elapsed = (at - self.epoch).num_microseconds().unwrap_or(0) as f64 / 1e6;
        let inc = self.inclination_deg.to_radians();
        let u = self.phase_deg.to_radians() + 2.0 * PI * elapsed / self.period_s;

        let latitude = (inc.sin() * u.sin()).asin().to_degrees();
        let along_node = (inc.cos() * u.sin()).atan2(u.cos());
        let longitude = self.node_longitude_deg
            + (along_node - EARTH_ROTATION_RAD_S * elapsed).to_degrees();

        PositionFix {
            latitude,
            longitude: wrap_longitude(longitude),
            elevation_km: self.altitude_km,
        }
    }
}

impl PositionSource for CircularOrbit {
    fn coordinates(&mut self, at: DateTime<Utc>) -> Result<PositionFix> {
        let fix = self.fix_at(at);
        if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
            return Err(LoggerError::PositionUnavailable(format!(
                "non-finite fix at {}",
                at.to_rfc3339()
            )));
        }
        Ok(fix)
    }
}

/// Wrap to [-180, 180)
pub fn wrap_longitude(lon: f64) -> f64 {
    ((lon + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}
