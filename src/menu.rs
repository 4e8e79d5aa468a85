//! Menu-driven analysis session over one mission log.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis::{self, Sample, DECIMAL_POSITIONS_FILE, DISTANCE_FILE};
use crate::error::{LoggerError, Result};
use crate::plot;
use crate::spline::{linspace, SplineFit, DEFAULT_DEGREE};

pub const EVAL_POINTS: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MenuChoice {
    /// Raw magnetic field strength against distance travelled
    MagDistance,
    /// Latitude/longitude from DMS to decimal
    DecimalPositions,
    /// Cumulative distance travelled from latitude/longitude
    Distance,
    /// Spline fit of field strength against distance
    Spline,
    /// Elevation against time
    Elevation,
    /// Magnetic field strength against time
    MagTime,
    /// Magnetometer vectors in 3D
    Mag3d,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 8] = [
        MenuChoice::MagDistance,
        MenuChoice::DecimalPositions,
        MenuChoice::Distance,
        MenuChoice::Spline,
        MenuChoice::Elevation,
        MenuChoice::MagTime,
        MenuChoice::Mag3d,
        MenuChoice::Exit,
    ];

    /// Menu number typed by the user, 1-8
    pub fn from_input(input: &str) -> Option<Self> {
        let n: usize = input.trim().parse().ok()?;
        Self::ALL.get(n.checked_sub(1)?).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::MagDistance => "Plot graph of raw magnetic field strength against distance travelled",
            MenuChoice::DecimalPositions => "Format longitude and latitude from degrees to decimal",
            MenuChoice::Distance => "Get distance travelled of the ISS from longitude and latitude",
            MenuChoice::Spline => "Create univariate interpolated spline of raw data and plot graph",
            MenuChoice::Elevation => "Plot graph of elevation against time",
            MenuChoice::MagTime => "Plot magnetic field strength against time",
            MenuChoice::Mag3d => "Plot magnetic field strength in 3D",
            MenuChoice::Exit => "End program",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub csv_path: PathBuf,
    pub output_dir: PathBuf,
    pub spline_degree: usize,
    /// Interior knots for the spline fit; derived from the sample count if unset
    pub spline_knots: Option<usize>,
}

impl AnalysisConfig {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            output_dir: PathBuf::from("."),
            spline_degree: DEFAULT_DEGREE,
            spline_knots: None,
        }
    }
}

pub struct Analysis {
    config: AnalysisConfig,
    samples: Vec<Sample>,
}

impl Analysis {
    pub fn load(config: AnalysisConfig) -> Result<Self> {
        let samples = analysis::load_log(&config.csv_path)?;
        std::fs::create_dir_all(&config.output_dir)?;
        Ok(Self { config, samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn distances_km(&self) -> Vec<f64> {
        analysis::cumulative_distance_km(&analysis::decimal_positions(&self.samples))
    }

    /// Run one menu option and return the file it produced (`None` for Exit)
    pub fn execute(&self, choice: MenuChoice) -> Result<Option<PathBuf>> {
        let out = &self.config.output_dir;
        if choice != MenuChoice::Exit && self.samples.is_empty() {
            return Err(LoggerError::InvalidParameters(format!(
                "no usable rows in {}",
                self.config.csv_path.display()
            )));
        }

        let written = match choice {
            MenuChoice::MagDistance => plot::mag_vs_distance(out, &self.samples, &self.distances_km())?,
            MenuChoice::DecimalPositions => {
                let path = out.join(DECIMAL_POSITIONS_FILE);
                analysis::write_decimal_positions(&path, &analysis::decimal_positions(&self.samples))?;
                path
            }
            MenuChoice::Distance => {
                let path = out.join(DISTANCE_FILE);
                analysis::write_distance(&path, &self.distances_km())?;
                path
            }
            MenuChoice::Spline => {
                let distances = self.distances_km();
                let magnitudes: Vec<f64> = self.samples.iter().map(|s| s.mag_magnitude).collect();
                let degree = self.config.spline_degree;
                let fit = match self.config.spline_knots {
                    Some(knots) => SplineFit::fit(&distances, &magnitudes, degree, knots)?,
                    None => SplineFit::fit_auto(&distances, &magnitudes, degree)?,
                };
                let eval = linspace(fit.lower(), fit.upper(), EVAL_POINTS);
                plot::spline_fit(out, &self.samples, &distances, &fit, &eval)?
            }
            MenuChoice::Elevation => plot::elevation_vs_time(out, &self.samples)?,
            MenuChoice::MagTime => plot::mag_vs_time(out, &self.samples)?,
            MenuChoice::Mag3d => plot::mag_3d(out, &self.samples)?,
            MenuChoice::Exit => return Ok(None),
        };
        log::info!("{:?} -> {}", choice, written.display());
        Ok(Some(written))
    }
}

pub fn print_menu<W: Write>(output: &mut W) -> std::io::Result<()> {
    writeln!(output, "--------------------------------MENU------------------------------------")?;
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        writeln!(output, "{}) {}", i + 1, choice.label())?;
    }
    write!(output, "Enter your choice: ")?;
    output.flush()
}

/// Show the menu until Exit or end of input. A failing option is reported
/// and the menu shown again.
pub fn run_menu<R: BufRead, W: Write>(analysis: &Analysis, mut input: R, mut output: W) -> Result<()> {
    loop {
        print_menu(&mut output)?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        let Some(choice) = MenuChoice::from_input(&line) else {
            writeln!(output, "Unknown option: {}", line.trim())?;
            continue;
        };

        match analysis.execute(choice) {
            Ok(Some(path)) => writeln!(output, "Wrote {}", path.display())?,
            Ok(None) => return Ok(()),
            Err(e) => {
                log::error!("{}: {}", e.kind(), e);
                writeln!(output, "Failed: {}", e)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input() {
        assert_eq!(MenuChoice::from_input("1\n"), Some(MenuChoice::MagDistance));
        assert_eq!(MenuChoice::from_input(" 8 "), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::from_input("0"), None);
        assert_eq!(MenuChoice::from_input("9"), None);
        assert_eq!(MenuChoice::from_input("two"), None);
    }

    #[test]
    fn test_menu_lists_eight_options() {
        let mut buf = Vec::new();
        print_menu(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("1) Plot graph of raw magnetic field strength"));
        assert!(text.contains("8) End program"));
        assert!(text.ends_with("Enter your choice: "));
    }
}
