use std::path::{Path, PathBuf};

use chrono::{Duration, TimeZone, Utc};

use astro_logger::analysis::{load_log, DECIMAL_POSITIONS_FILE, DISTANCE_FILE};
use astro_logger::integrator::Displacement;
use astro_logger::menu::{run_menu, Analysis, AnalysisConfig, MenuChoice};
use astro_logger::plot::Chart;
use astro_logger::record::{DataLog, DataRecord};
use astro_logger::sensors::CircularOrbit;
use astro_logger::types::{AccelData, MagData};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("astro_pipeline_{}_{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Ten minutes of orbit at 10 s spacing, field strength rising along track
fn write_orbit_log(path: &Path) -> usize {
    let epoch = Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 0).unwrap();
    let orbit = CircularOrbit::iss(epoch);
    let mut log = DataLog::create(path).unwrap();

    let rows = 60;
    for i in 0..rows {
        let at = epoch + Duration::seconds(10 * i as i64);
        let t = i as f64 * 10.0;
        let mag = MagData { timestamp: t, x: 20.0 + i as f64 * 0.1, y: -12.0, z: 41.0 };
        let accel = AccelData { timestamp: t, x: 0.0, y: 0.0, z: 1.0 };
        let record = DataRecord::new(at, &mag, &accel, &Displacement::default(), &orbit.fix_at(at));
        log.append(&record).unwrap();
    }
    rows
}

#[test]
fn test_logger_output_loads_back() {
    let dir = temp_dir("load");
    let csv = dir.join("data.csv");
    let rows = write_orbit_log(&csv);

    let samples = load_log(&csv).unwrap();
    assert_eq!(samples.len(), rows);
    assert!(samples[0].latitude.abs() < 1e-3);
    assert!(samples.iter().all(|s| s.latitude.abs() <= 51.65));
    assert!(samples.windows(2).all(|w| w[1].time > w[0].time));
    assert!(samples.iter().all(|s| s.elevation_km == 420.0));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_derived_csvs() {
    let dir = temp_dir("derived");
    let csv = dir.join("data.csv");
    let rows = write_orbit_log(&csv);

    let config = AnalysisConfig { output_dir: dir.clone(), ..AnalysisConfig::new(&csv) };
    let analysis = Analysis::load(config).unwrap();

    let positions = analysis.execute(MenuChoice::DecimalPositions).unwrap().unwrap();
    assert_eq!(positions, dir.join(DECIMAL_POSITIONS_FILE));
    let text = std::fs::read_to_string(&positions).unwrap();
    assert!(text.starts_with("Latitude,Longitude\n"));
    assert_eq!(text.lines().count(), rows + 1);

    let distance = analysis.execute(MenuChoice::Distance).unwrap().unwrap();
    let mut reader = csv::Reader::from_path(&distance).unwrap();
    let values: Vec<f64> = reader
        .records()
        .map(|r| r.unwrap()[0].parse().unwrap())
        .collect();
    assert_eq!(values.len(), rows);
    assert_eq!(values[0], 0.0);
    assert!(values.windows(2).all(|w| w[1] >= w[0]));
    // Ground track speed is roughly 7 km/s; 590 s of flight
    let total = values[rows - 1];
    assert!(total > 3500.0 && total < 5000.0, "total {}", total);
    assert_eq!(distance, dir.join(DISTANCE_FILE));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_spline_chart_written() {
    let dir = temp_dir("spline");
    let csv = dir.join("data.csv");
    write_orbit_log(&csv);

    let config = AnalysisConfig {
        output_dir: dir.clone(),
        spline_knots: Some(4),
        ..AnalysisConfig::new(&csv)
    };
    let analysis = Analysis::load(config).unwrap();
    let chart = analysis.execute(MenuChoice::Spline).unwrap().unwrap();
    assert!(chart.exists());
    assert!(std::fs::metadata(&chart).unwrap().len() > 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_every_chart_written() {
    let dir = temp_dir("charts");
    let csv = dir.join("data.csv");
    write_orbit_log(&csv);

    let config = AnalysisConfig { output_dir: dir.clone(), ..AnalysisConfig::new(&csv) };
    let analysis = Analysis::load(config).unwrap();

    let charts = [
        (MenuChoice::MagDistance, Chart::MagVsDistance),
        (MenuChoice::Elevation, Chart::ElevationVsTime),
        (MenuChoice::MagTime, Chart::MagVsTime),
        (MenuChoice::Mag3d, Chart::Mag3d),
    ];
    for (choice, chart) in charts {
        let path = analysis.execute(choice).unwrap().unwrap();
        assert_eq!(path, dir.join(chart.file_name()), "{:?}", choice);
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{:?}", choice);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_menu_session() {
    let dir = temp_dir("menu");
    let csv = dir.join("data.csv");
    write_orbit_log(&csv);

    let config = AnalysisConfig { output_dir: dir.clone(), ..AnalysisConfig::new(&csv) };
    let analysis = Analysis::load(config).unwrap();

    let input = "2\nbogus\n3\n8\n2\n";
    let mut output = Vec::new();
    run_menu(&analysis, input.as_bytes(), &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains(&format!("Wrote {}", dir.join(DECIMAL_POSITIONS_FILE).display())));
    assert!(text.contains("Unknown option: bogus"));
    assert!(text.contains(&format!("Wrote {}", dir.join(DISTANCE_FILE).display())));
    // Exit stops before the trailing "2"
    assert_eq!(text.matches("Enter your choice: ").count(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_empty_log_reports_error() {
    let dir = temp_dir("empty");
    let csv = dir.join("data.csv");
    DataLog::create(&csv).unwrap();

    let analysis = Analysis::load(AnalysisConfig { output_dir: dir.clone(), ..AnalysisConfig::new(&csv) }).unwrap();
    assert!(analysis.samples().is_empty());
    assert!(analysis.execute(MenuChoice::Distance).is_err());
    assert_eq!(analysis.execute(MenuChoice::Exit).unwrap(), None);

    let _ = std::fs::remove_dir_all(&dir);
}
