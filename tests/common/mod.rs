//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use res_chronics::catalogue::{FuelKind, NodeCatalogue, NodeCharacteristic};
use res_chronics::config::{GenerationParameters, TrailingSample};
use res_chronics::pattern::{HOURS_PER_YEAR, IrradiancePattern};

/// Clear-sky-like template: half sine between 06:00 and 18:00 every day.
pub fn daily_pattern() -> IrradiancePattern {
    IrradiancePattern::new(daily_pattern_values(), TrailingSample::Keep)
        .expect("template has one year of samples")
}

fn daily_pattern_values() -> Vec<f64> {
    (0..HOURS_PER_YEAR)
        .map(|h| {
            let hour = (h % 24) as f64;
            ((hour - 6.0) * std::f64::consts::PI / 12.0).sin().max(0.0)
        })
        .collect()
}

/// Writes the daily template as a headed single-column CSV, with the
/// trailing wrap-around sample.
pub fn write_pattern(dir: &Path) -> PathBuf {
    let path = dir.join("solar_pattern.csv");
    let mut text = String::from("solar_pattern\n");
    let values = daily_pattern_values();
    for v in values.iter().chain(values.first()) {
        text.push_str(&format!("{v}\n"));
    }
    std::fs::write(&path, text).expect("write pattern");
    path
}

/// One solar node (Pmax 10 at the origin) and one wind node (Pmax 5 at 100,100).
pub fn two_node_catalogue() -> NodeCatalogue {
    NodeCatalogue::new(vec![
        NodeCharacteristic::new("solar_1", FuelKind::Solar, 0.0, 0.0, 10.0, 20.0),
        NodeCharacteristic::new("wind_2", FuelKind::Wind, 100.0, 100.0, 5.0, 63.0),
    ])
    .expect("valid catalogue")
}

/// A mixed catalogue in deliberately scrambled row order.
pub fn mixed_catalogue_rows() -> Vec<NodeCharacteristic> {
    vec![
        NodeCharacteristic::new("wind_10", FuelKind::Wind, 600.0, 200.0, 30.0, 63.0),
        NodeCharacteristic::new("solar_3", FuelKind::Solar, 120.0, 80.0, 12.0, 20.0),
        NodeCharacteristic::new("gas_1", FuelKind::Other("thermal".into()), 50.0, 50.0, 200.0, 142.0),
        NodeCharacteristic::new("wind_9", FuelKind::Wind, 900.0, 900.0, 25.0, 63.0),
        NodeCharacteristic::new("solar_11", FuelKind::Solar, 400.0, 700.0, 8.0, 20.0),
        NodeCharacteristic::new("hydro_2", FuelKind::Other("hydro".into()), 10.0, 990.0, 80.0, 225.0),
    ]
}

pub fn write_catalogue(dir: &Path, rows: &[NodeCharacteristic]) -> PathBuf {
    let path = dir.join("prods_charac.csv");
    let mut text = String::from("name,type,x,y,Pmax,V\n");
    for n in rows {
        text.push_str(&format!(
            "{},{},{},{},{},{}\n",
            n.name,
            n.fuel.label(),
            n.x,
            n.y,
            n.pmax,
            n.voltage
        ));
    }
    std::fs::write(&path, text).expect("write catalogue");
    path
}

/// Baseline parameters: one week at 5 minutes starting 2012-01-01.
pub fn week_params() -> GenerationParameters {
    GenerationParameters::baseline()
}

/// Baseline parameters shortened to `days` at `dt` minutes.
pub fn short_params(days: i64, dt: u32) -> GenerationParameters {
    let mut p = GenerationParameters::baseline();
    p.time.end_date = p.time.start_date + chrono::Duration::days(days);
    p.time.dt = dt;
    p
}

/// Sorted file names of a directory.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Pearson correlation of two equally long series.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let ma = a.iter().sum::<f64>() / n;
    let mb = b.iter().sum::<f64>() / n;
    let (mut cov, mut va, mut vb) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    cov / (va * vb).sqrt()
}
