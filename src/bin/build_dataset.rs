use std::path::PathBuf;

use anyhow::{Context, Result};

use odi_progressive::dataset::{
    self, DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION, build_dataset, split_by_match,
};
use odi_progressive::player_db::{self, PlayerDb};
use odi_progressive::scanner::CHECKPOINT_BALLS;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let matches_dir = parse_path_arg("--matches")
        .or_else(|| std::env::var("ODI_MATCHES_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data/matches"));
    let out_dir = parse_path_arg("--out-dir").unwrap_or_else(|| PathBuf::from("data"));
    let venue_out =
        parse_path_arg("--venues-out").unwrap_or_else(|| PathBuf::from("assets/venue_table.json"));
    let test_fraction = parse_f64_arg("--test-fraction")
        .unwrap_or(DEFAULT_TEST_FRACTION)
        .clamp(0.0, 0.5);
    let seed = parse_u64_arg("--seed").unwrap_or(DEFAULT_SPLIT_SEED);

    let db_path = player_db::resolve_db_path(parse_path_arg("--players"));
    let db = PlayerDb::load(&db_path)?;
    println!("Loaded {} players from {}", db.len(), db_path.display());

    let output = build_dataset(&matches_dir, &db)
        .with_context(|| format!("build dataset from {}", matches_dir.display()))?;
    let summary = &output.summary;

    println!("Dataset build complete");
    println!("Corpus: {}", matches_dir.display());
    println!(
        "Matches: {} used, {} skipped ({} files)",
        summary.matches_used, summary.matches_skipped, summary.files_seen
    );
    println!(
        "Venues: {} (global avg {:.1})",
        output.venue_table.venues.len(),
        output.venue_table.global_avg
    );
    if summary.rows_scrubbed > 0 {
        eprintln!(
            "[WARN] scrubbed {} rows with non-finite features",
            summary.rows_scrubbed
        );
    }
    println!("Rows: {}", summary.rows_emitted);
    for (idx, ball) in CHECKPOINT_BALLS.iter().enumerate() {
        println!(
            "  ball {:>3} (over {:>2}): {:>6} rows",
            ball,
            ball / 6,
            summary.checkpoint_counts[idx]
        );
    }

    let (train, test) = split_by_match(output.rows.clone(), test_fraction, seed);
    println!(
        "Split: {} train rows / {} test rows (fraction {:.2}, seed {})",
        train.len(),
        test.len(),
        test_fraction,
        seed
    );

    dataset::write_rows_csv(&out_dir.join("progressive_full_dataset.csv"), &output.rows)?;
    dataset::write_rows_csv(&out_dir.join("progressive_train.csv"), &train)?;
    dataset::write_rows_csv(&out_dir.join("progressive_test.csv"), &test)?;
    output.venue_table.save(&venue_out)?;

    println!("Wrote datasets under {}", out_dir.display());
    println!("Wrote venue table: {}", venue_out.display());
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

fn parse_u64_arg(name: &str) -> Option<u64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<u64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<u64>()
        {
            return Some(v);
        }
    }
    None
}
