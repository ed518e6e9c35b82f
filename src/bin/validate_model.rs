use std::path::PathBuf;

use anyhow::{Result, anyhow};

use odi_progressive::dataset;
use odi_progressive::model::{self, ScoreModel};
use odi_progressive::scanner::CHECKPOINT_BALLS;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let model_path =
        parse_path_arg("--model").unwrap_or_else(|| PathBuf::from("assets/score_model.json"));
    let test_path =
        parse_path_arg("--test").unwrap_or_else(|| PathBuf::from("data/progressive_test.csv"));

    let score_model = ScoreModel::load(&model_path)?;
    let rows = dataset::read_rows_csv(&test_path)?;
    if rows.is_empty() {
        return Err(anyhow!("no test rows in {}", test_path.display()));
    }

    println!("Stage-by-stage validation");
    println!("Model: {}", model_path.display());
    println!("Test rows: {} ({})", rows.len(), test_path.display());
    println!();

    for ball in CHECKPOINT_BALLS {
        let stage_rows: Vec<_> = rows
            .iter()
            .filter(|r| r.ball_number == ball)
            .cloned()
            .collect();
        if stage_rows.is_empty() {
            println!("ball {ball:>3}: no rows");
            continue;
        }
        let metrics = model::evaluate(&score_model, &stage_rows);
        println!(
            "ball {:>3} (over {:>2}) n={:>5} mae={:>6.2} rmse={:>6.2} r2={:>6.3} within20={:>5}",
            ball, ball / 6, metrics.samples, metrics.mae, metrics.rmse, metrics.r2, metrics.within_20
        );
    }

    let overall = model::evaluate(&score_model, &rows);
    println!();
    println!(
        "overall n={} mae={:.2} rmse={:.2} r2={:.3}",
        overall.samples, overall.mae, overall.rmse, overall.r2
    );
    Ok(())
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
