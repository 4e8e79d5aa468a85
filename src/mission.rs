//! Acquisition loop: poll the board, integrate displacement, append rows
//! until the time or storage allowance runs out.

use std::fs;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::config::MissionConfig;
use crate::error::Result;
use crate::integrator::DisplacementEstimator;
use crate::record::{DataLog, DataRecord};
use crate::sensors::{Clock, PositionSource, SenseBoard, LED_SIZE};
use crate::types::{AccelData, MagData, Rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Deadline,
    DiskBudget,
    CycleLimit,
    Shutdown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub rows_written: u64,
    pub failed_cycles: u64,
    pub stop_reason: StopReason,
    pub config: MissionConfig,
}

impl RunSummary {
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub struct Mission {
    config: MissionConfig,
    board: Box<dyn SenseBoard>,
    position: Box<dyn PositionSource>,
    clock: Box<dyn Clock>,
    estimator: DisplacementEstimator,
    data_log: DataLog,
    program_path: Option<PathBuf>,
    started: DateTime<Utc>,
    failed_cycles: u64,
}

impl Mission {
    /// Greet on the LED matrix, seed the estimator with two accelerometer reads
    /// and write the data file header.
    ///
    /// A failed warm-up read is fatal: there is nothing to integrate from.
    pub fn start(
        config: MissionConfig,
        mut board: Box<dyn SenseBoard>,
        position: Box<dyn PositionSource>,
        mut clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let started = Utc::now();
        log::info!("Mission start {}", started.to_rfc3339());

        if let Err(e) = board.set_rotation(config.rotation) {
            log::error!("{}: {}", e.kind(), e);
        }
        if let Err(e) = board.show_message("Hello World") {
            log::error!("{}: {}", e.kind(), e);
        }

        let first = AccelData::from_raw(board.accelerometer_raw()?, clock.now());
        let second = AccelData::from_raw(board.accelerometer_raw()?, clock.now());
        let estimator = DisplacementEstimator::warm_up(&first, &second);
        log::info!("Estimator warmed up ({:.3}s between reads)", second.timestamp - first.timestamp);

        let data_log = DataLog::create(config.data_path())?;
        log::info!("Header added to {}", data_log.path().display());

        Ok(Self {
            config,
            board,
            position,
            clock,
            estimator,
            data_log,
            program_path: std::env::current_exe().ok(),
            started,
            failed_cycles: 0,
        })
    }

    /// One acquisition cycle. Every fallible read happens before the estimator
    /// is stepped, so a failed cycle leaves the integration history untouched.
    pub fn cycle(&mut self) -> Result<DataRecord> {
        let captured = Utc::now();

        let mag_raw = self.board.compass_raw()?;
        let accel_raw = self.board.accelerometer_raw()?;
        // Stamped right after the accelerometer read, like the warm-up reads
        let timestamp = self.clock.now();
        let mag = MagData::from_raw(mag_raw, timestamp);
        let accel = AccelData::from_raw(accel_raw, timestamp);
        let fix = self.position.coordinates(captured)?;

        let displacement = self.estimator.step(&accel);
        let record = DataRecord::new(captured, &mag, &accel, &displacement, &fix);
        self.data_log.append(&record)?;
        Ok(record)
    }

    /// Light one random pixel in a random colour
    pub fn sparkle(&mut self) {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(0..LED_SIZE);
        let y = rng.gen_range(0..LED_SIZE);
        let colour = Rgb(rng.gen(), rng.gen(), rng.gen());
        match self.board.set_pixel(x, y, colour) {
            Ok(()) => log::debug!("Sparkled ({}, {})", x, y),
            Err(e) => log::error!("{}: {}", e.kind(), e),
        }
    }

    /// Bytes used by the data file, the log file and the program itself.
    ///
    /// Files that do not exist count as zero. Returns `None` when a size could
    /// not be read, in which case the budget check is skipped for this cycle.
    pub fn storage_used(&self) -> Option<u64> {
        let mut paths = vec![self.config.data_path(), self.config.log_path()];
        if let Some(program) = &self.program_path {
            paths.push(program.clone());
        }

        let mut total = 0u64;
        for path in &paths {
            match fs::metadata(path) {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    log::error!("Io: {}: {}", path.display(), e);
                    return None;
                }
            }
        }
        Some(total)
    }

    /// Run cycles until the deadline, the storage budget, the optional cycle
    /// limit, or `shutdown` resolving.
    pub async fn run<F>(mut self, max_cycles: Option<u64>, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let deadline = self.config.deadline(self.started);
        let pause = Duration::from_millis(self.config.poll_interval_ms);
        let mut cycles = 0u64;

        let stop_reason = loop {
            if Utc::now() >= deadline {
                break StopReason::Deadline;
            }
            if let Some(used) = self.storage_used() {
                if used >= self.config.byte_budget {
                    log::warn!("Storage budget reached: {} >= {} bytes", used, self.config.byte_budget);
                    break StopReason::DiskBudget;
                }
            }
            if max_cycles.map(|max| cycles >= max).unwrap_or(false) {
                break StopReason::CycleLimit;
            }

            self.sparkle();
            match self.cycle() {
                Ok(_) => log::info!("Data added (row {})", self.data_log.rows_written()),
                Err(e) => {
                    self.failed_cycles += 1;
                    log::error!("{}: {}", e.kind(), e);
                }
            }
            cycles += 1;

            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Shutdown,
                _ = sleep(pause) => {}
            }
        };

        self.finish(stop_reason)
    }

    fn finish(mut self, stop_reason: StopReason) -> RunSummary {
        if let Err(e) = self.board.show_message("Finished") {
            log::error!("{}: {}", e.kind(), e);
        }
        let finished = Utc::now();
        log::info!("Finish Time {}", finished.to_rfc3339());
        if let Err(e) = self.board.clear() {
            log::error!("{}: {}", e.kind(), e);
        }

        RunSummary {
            started: self.started,
            finished,
            rows_written: self.data_log.rows_written(),
            failed_cycles: self.failed_cycles,
            stop_reason,
            config: self.config,
        }
    }

    pub fn estimator(&self) -> &DisplacementEstimator {
        &self.estimator
    }

    pub fn rows_written(&self) -> u64 {
        self.data_log.rows_written()
    }

    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles
    }
}
