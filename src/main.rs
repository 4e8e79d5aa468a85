use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};

use astro_logger::config::{BoardConfig, MissionConfig};
use astro_logger::sensors::{CircularOrbit, CommandBoard, SenseBoard, SimulatedBoard, SystemClock};
use astro_logger::Mission;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BoardKind {
    Sim,
    Command,
}

#[derive(Parser, Debug)]
#[command(name = "astro_logger")]
#[command(about = "Astro Pi magnetometer logger with dead-reckoning displacement", long_about = None)]
struct Args {
    /// JSON mission config; flags below are ignored when given
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run length in minutes
    #[arg(long, default_value = "178.5")]
    minutes: f64,

    /// Stop once data + log + program reach this many bytes
    #[arg(long, default_value = "2999990000")]
    byte_budget: u64,

    /// Output directory
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Data file name inside the output directory
    #[arg(long, default_value = "data.csv")]
    data_file: String,

    /// Log file name inside the output directory
    #[arg(long, default_value = "HHorizons.log")]
    log_file: String,

    /// LED matrix rotation in degrees
    #[arg(long, default_value = "270")]
    rotation: u16,

    /// Pause between cycles in milliseconds (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    poll_ms: u64,

    /// Sensor board backend
    #[arg(long, value_enum, default_value = "sim")]
    board: BoardKind,

    /// Helper program for --board command
    #[arg(long, default_value = "sense-helper")]
    helper: String,

    /// Stop after this many cycles (bench runs)
    #[arg(long)]
    max_cycles: Option<u64>,
}

impl Args {
    fn mission_config(&self) -> Result<MissionConfig> {
        if let Some(path) = &self.config {
            return MissionConfig::load(path)
                .with_context(|| format!("loading {}", path.display()));
        }
        let config = MissionConfig {
            run_minutes: self.minutes,
            byte_budget: self.byte_budget,
            output_dir: self.output_dir.clone(),
            data_file: self.data_file.clone(),
            log_file: self.log_file.clone(),
            rotation: self.rotation,
            poll_interval_ms: self.poll_ms,
            board: match self.board {
                BoardKind::Sim => BoardConfig::Simulated,
                BoardKind::Command => BoardConfig::Command { helper: self.helper.clone() },
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(config: &MissionConfig) -> Result<()> {
    let log_path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.mission_config()?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    init_logging(&config)?;

    println!("[{}] Astro Logger Starting", ts_now());
    println!("  Run limit: {} minutes", config.run_minutes);
    println!("  Byte budget: {}", config.byte_budget);
    println!("  Data file: {}", config.data_path().display());
    println!("  Log file: {}", config.log_path().display());
    println!("  Board: {:?}", config.board);

    let board: Box<dyn SenseBoard> = match &config.board {
        BoardConfig::Simulated => Box::new(SimulatedBoard::new()),
        BoardConfig::Command { helper } => Box::new(CommandBoard::new(helper.clone())),
    };
    let orbit = CircularOrbit::iss(Utc::now());
    let summary_path = config.output_dir.join("mission_summary.json");

    let mission = Mission::start(config, board, Box::new(orbit), Box::new(SystemClock))
        .context("starting mission")?;
    println!("[{}] Warm-up complete, logging...", ts_now());

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let summary = mission.run(args.max_cycles, shutdown).await;

    summary
        .save(&summary_path)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    println!("\n=== Mission Summary ===");
    println!("Stop reason: {:?}", summary.stop_reason);
    println!("Rows written: {}", summary.rows_written);
    println!("Failed cycles: {}", summary.failed_cycles);
    println!(
        "Duration: {:.1} s",
        (summary.finished - summary.started).num_milliseconds() as f64 / 1000.0
    );

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
