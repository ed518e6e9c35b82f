use std::path::PathBuf;

use anyhow::{Result, anyhow};

use odi_progressive::dataset;
use odi_progressive::model::{self, DEFAULT_L2, ScoreModel};

const VAL_FRACTION: f64 = 0.10;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let train_path =
        parse_path_arg("--train").unwrap_or_else(|| PathBuf::from("data/progressive_train.csv"));
    let test_path =
        parse_path_arg("--test").unwrap_or_else(|| PathBuf::from("data/progressive_test.csv"));
    let out_path =
        parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("assets/score_model.json"));
    let l2 = parse_f64_arg("--l2").unwrap_or(DEFAULT_L2).max(0.0);

    let train_rows = dataset::read_rows_csv(&train_path)?;
    let test_rows = dataset::read_rows_csv(&test_path)?;
    if train_rows.is_empty() {
        return Err(anyhow!("no training rows in {}", train_path.display()));
    }
    println!(
        "Training on {} rows, holding {} rows for test",
        train_rows.len(),
        test_rows.len()
    );

    // Last slice of the training rows steers early stopping; the test rows
    // stay untouched until the final evaluation.
    let split = val_split_index(train_rows.len());
    let score_model = ScoreModel::fit(&train_rows[..split], &train_rows[split..], l2)?;

    println!(
        "Fit: l2={} train_mae={:.2} val_mae={:.2} ({} train / {} val rows)",
        score_model.l2,
        score_model.train_mae,
        score_model.val_mae,
        score_model.train_samples,
        score_model.val_samples
    );

    if !test_rows.is_empty() {
        let metrics = model::evaluate(&score_model, &test_rows);
        println!(
            "Test: n={} mae={:.2} rmse={:.2} r2={:.3}",
            metrics.samples, metrics.mae, metrics.rmse, metrics.r2
        );
        println!(
            "      within 10 runs: {}  within 20: {}  within 30: {}",
            metrics.within_10, metrics.within_20, metrics.within_30
        );
    }

    score_model.save(&out_path)?;
    println!("Model artifact written: {}", out_path.display());
    Ok(())
}

fn val_split_index(n: usize) -> usize {
    let idx = ((n as f64) * (1.0 - VAL_FRACTION)).round() as usize;
    idx.clamp(1, n)
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&format!("{name}="))
            && !v.trim().is_empty()
        {
            return Some(PathBuf::from(v.trim()));
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next.trim()));
        }
    }
    None
}

fn parse_f64_arg(name: &str) -> Option<f64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<f64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<f64>()
        {
            return Some(v);
        }
    }
    None
}
