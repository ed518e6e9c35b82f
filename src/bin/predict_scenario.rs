use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use odi_progressive::model::ScoreModel;
use odi_progressive::player_db::{self, PlayerDb};
use odi_progressive::serve::{PredictionContext, parse_scenario};
use odi_progressive::venue_table::VenueTable;

// Intentionally simple: load the artifacts, score one scenario file, print
// the result. Meant for quick manual what-if iterations without the service
// in front of it.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let scenario_path =
        positional_arg().unwrap_or_else(|| PathBuf::from("tests/fixtures/scenario.json"));
    let model_path =
        parse_path_arg("--model").unwrap_or_else(|| PathBuf::from("assets/score_model.json"));
    let venues_path =
        parse_path_arg("--venues").unwrap_or_else(|| PathBuf::from("assets/venue_table.json"));
    let db_path = player_db::resolve_db_path(parse_path_arg("--players"));

    let ctx = PredictionContext::new(
        PlayerDb::load(&db_path)?,
        VenueTable::load(&venues_path)?,
        ScoreModel::load(&model_path)?,
    );

    let raw = fs::read_to_string(&scenario_path)
        .with_context(|| format!("read scenario {}", scenario_path.display()))?;
    let request = parse_scenario(&raw)?;

    let row = ctx.build_checkpoint(&request)?;
    let predicted = ctx.model.predict_row(&row);

    println!("Scenario: {}", scenario_path.display());
    println!(
        "State: {}/{} after {} balls (last 10 overs: {} runs, rate {:.2})",
        row.current_score,
        row.wickets_fallen,
        row.balls_bowled,
        row.runs_last_10_overs,
        row.current_run_rate
    );
    println!(
        "Batting: avg {:.2} elite {} depth {}",
        row.team_batting_avg, row.team_elite_batsmen, row.team_batting_depth
    );
    println!(
        "Bowling: economy {:.2} elite {} depth {}",
        row.opp_bowling_economy, row.opp_elite_bowlers, row.opp_bowling_depth
    );
    println!("Venue: {} (avg {:.1})", row.venue, row.venue_avg_score);
    println!("Predicted final score: {predicted}");
    Ok(())
}

fn positional_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        if arg.starts_with("--") {
            // `--flag value` consumes the value too; `--flag=value` does not.
            idx += if arg.contains('=') { 1 } else { 2 };
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
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
