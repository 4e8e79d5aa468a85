use std::path::{Path, PathBuf};

use rerun::{archetypes::Scalar, Points3D, RecordingStreamBuilder};

use crate::analysis::Sample;
use crate::error::{LoggerError, Result};
use crate::spline::SplineFit;

/// Sequence timeline for distance charts, in metres
const DISTANCE_TIMELINE: &str = "distance_m";
const TIME_TIMELINE: &str = "capture_time";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chart {
    MagVsDistance,
    SplineFit,
    ElevationVsTime,
    MagVsTime,
    Mag3d,
}

impl Chart {
    pub fn file_name(self) -> &'static str {
        match self {
            Chart::MagVsDistance => "mag_vs_distance.rrd",
            Chart::SplineFit => "mag_spline_fit.rrd",
            Chart::ElevationVsTime => "elevation_vs_time.rrd",
            Chart::MagVsTime => "mag_vs_time.rrd",
            Chart::Mag3d => "mag_3d.rrd",
        }
    }
}

/// One chart written as a Rerun recording file
pub struct ChartRecorder {
    rec: rerun::RecordingStream,
    path: PathBuf,
}

impl ChartRecorder {
    pub fn new(output_dir: &Path, chart: Chart) -> Result<Self> {
        let path = output_dir.join(chart.file_name());
        let rec = RecordingStreamBuilder::new("astro_analysis")
            .save(&path)
            .map_err(|e| LoggerError::Plot(format!("{}: {}", path.display(), e)))?;
        Ok(Self { rec, path })
    }

    pub fn set_distance_km(&self, distance_km: f64) {
        self.rec
            .set_time_sequence(DISTANCE_TIMELINE, (distance_km * 1000.0).round() as i64);
    }

    pub fn set_time(&self, epoch_secs: f64) {
        self.rec.set_time_seconds(TIME_TIMELINE, epoch_secs);
    }

    pub fn log_scalar(&self, path: &str, value: f64) -> Result<()> {
        self.rec
            .log(path, &Scalar::new(value))
            .map_err(|e| LoggerError::Plot(e.to_string()))
    }

    pub fn log_points(&self, path: &str, points: Vec<[f32; 3]>) -> Result<()> {
        self.rec
            .log(path, &Points3D::new(points))
            .map_err(|e| LoggerError::Plot(e.to_string()))
    }

    /// Flush to disk and return the file written
    pub fn finish(self) -> PathBuf {
        self.rec.flush_blocking();
        self.path
    }
}

fn epoch_secs(sample: &Sample) -> f64 {
    sample.time.timestamp_micros() as f64 / 1e6
}

/// Raw field strength against distance travelled
pub fn mag_vs_distance(output_dir: &Path, samples: &[Sample], distances_km: &[f64]) -> Result<PathBuf> {
    let chart = ChartRecorder::new(output_dir, Chart::MagVsDistance)?;
    for (sample, &d) in samples.iter().zip(distances_km) {
        chart.set_distance_km(d);
        chart.log_scalar("magnetometer/raw_magnitude_uT", sample.mag_magnitude)?;
    }
    Ok(chart.finish())
}

/// Fitted curve sampled at `eval_km`, drawn with the raw series for reference
pub fn spline_fit(
    output_dir: &Path,
    samples: &[Sample],
    distances_km: &[f64],
    fit: &SplineFit,
    eval_km: &[f64],
) -> Result<PathBuf> {
    let chart = ChartRecorder::new(output_dir, Chart::SplineFit)?;
    for (sample, &d) in samples.iter().zip(distances_km) {
        chart.set_distance_km(d);
        chart.log_scalar("magnetometer/raw_magnitude_uT", sample.mag_magnitude)?;
    }
    for &x in eval_km {
        chart.set_distance_km(x);
        chart.log_scalar("magnetometer/fitted_magnitude_uT", fit.evaluate(x))?;
    }
    Ok(chart.finish())
}

pub fn elevation_vs_time(output_dir: &Path, samples: &[Sample]) -> Result<PathBuf> {
    let chart = ChartRecorder::new(output_dir, Chart::ElevationVsTime)?;
    for sample in samples {
        chart.set_time(epoch_secs(sample));
        chart.log_scalar("iss/elevation_km", sample.elevation_km)?;
    }
    Ok(chart.finish())
}

pub fn mag_vs_time(output_dir: &Path, samples: &[Sample]) -> Result<PathBuf> {
    let chart = ChartRecorder::new(output_dir, Chart::MagVsTime)?;
    for sample in samples {
        chart.set_time(epoch_secs(sample));
        chart.log_scalar("magnetometer/raw_magnitude_uT", sample.mag_magnitude)?;
    }
    Ok(chart.finish())
}

/// Every magnetometer vector as one 3D point cloud
pub fn mag_3d(output_dir: &Path, samples: &[Sample]) -> Result<PathBuf> {
    let chart = ChartRecorder::new(output_dir, Chart::Mag3d)?;
    let points = samples
        .iter()
        .map(|s| [s.mag_x as f32, s.mag_y as f32, s.mag_z as f32])
        .collect();
    chart.log_points("magnetometer/xyz", points)?;
    Ok(chart.finish())
}
