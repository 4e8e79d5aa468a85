use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use astro_logger::menu::{run_menu, Analysis, AnalysisConfig, MenuChoice};
use astro_logger::spline::DEFAULT_DEGREE;

#[derive(Parser, Debug)]
#[command(name = "analysis")]
#[command(about = "Charts and derived CSVs from an Astro Pi mission log", long_about = None)]
struct Args {
    /// Mission data.csv (prompted for when omitted)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Where charts and derived CSVs are written
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Spline degree
    #[arg(long, default_value_t = DEFAULT_DEGREE)]
    degree: usize,

    /// Interior spline knots (derived from sample count if omitted)
    #[arg(long)]
    knots: Option<usize>,

    /// Run one option and exit instead of showing the menu
    #[arg(long, value_enum)]
    choice: Option<MenuChoice>,
}

fn prompt_for_csv() -> Result<PathBuf> {
    let mut stdout = io::stdout();
    write!(stdout, "Enter location of csv file: ")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let csv_path = match args.csv {
        Some(path) => path,
        None => prompt_for_csv()?,
    };
    let config = AnalysisConfig {
        output_dir: args.output_dir,
        spline_degree: args.degree,
        spline_knots: args.knots,
        ..AnalysisConfig::new(&csv_path)
    };

    let analysis = Analysis::load(config).with_context(|| format!("loading {}", csv_path.display()))?;
    println!("Loaded {} samples from {}", analysis.samples().len(), csv_path.display());

    match args.choice {
        Some(choice) => {
            if let Some(path) = analysis.execute(choice)? {
                println!("Wrote {}", path.display());
            }
        }
        None => run_menu(&analysis, io::stdin().lock(), io::stdout())?,
    }
    Ok(())
}
