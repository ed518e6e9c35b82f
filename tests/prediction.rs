use std::fs;
use std::path::PathBuf;

use serde_json::json;

use odi_progressive::dataset::{build_dataset, read_rows_csv, write_rows_csv};
use odi_progressive::model::ScoreModel;
use odi_progressive::player_db::PlayerDb;
use odi_progressive::serve::{PredictionContext, ScenarioRequest, parse_scenario};

fn roster(team: &str) -> Vec<String> {
    (1..=11).map(|i| format!("{team} Player {i}")).collect()
}

fn synthetic_match(venue: &str, batting: &str, bowling: &str, balls: usize) -> String {
    let mut overs = Vec::new();
    let mut remaining = balls;
    let mut over_no = 0;
    while remaining > 0 {
        let in_over = remaining.min(6);
        let deliveries: Vec<_> = (0..in_over)
            .map(|_| {
                json!({
                    "batter": format!("{batting} Player 1"),
                    "bowler": format!("{bowling} Player 11"),
                    "non_striker": format!("{batting} Player 2"),
                    "runs": {"batter": 1, "extras": 0, "total": 1}
                })
            })
            .collect();
        overs.push(json!({"over": over_no, "deliveries": deliveries}));
        over_no += 1;
        remaining -= in_over;
    }
    json!({
        "info": {
            "venue": venue,
            "dates": ["2022-07-01"],
            "players": {batting: roster(batting), bowling: roster(bowling)}
        },
        "innings": [{"team": batting, "overs": overs}]
    })
    .to_string()
}

fn corpus_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("odi_progressive_{tag}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create corpus dir");
    dir
}

fn stat_db() -> PlayerDb {
    PlayerDb::from_json(
        r#"{
        "Alphas Player 1": {"role": "Batsman", "batting": {"average": 45.0}},
        "Alphas Player 2": {"role": "All-rounder", "batting": {"average": 33.5},
                            "bowling": {"economy": 5.2}},
        "Betas Player 11": {"role": "Bowler", "bowling": {"economy": 4.4}}
    }"#,
    )
    .expect("inline snapshot should parse")
}

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn adapter_rebuilds_the_exact_training_features() {
    let dir = corpus_dir("parity");
    for idx in 0..12 {
        fs::write(
            dir.join(format!("m{idx:02}.json")),
            synthetic_match("Parity Park", "Alphas", "Betas", 300),
        )
        .unwrap();
    }

    let db = stat_db();
    let output = build_dataset(&dir, &db).expect("build should succeed");
    let model = ScoreModel::fit(&output.rows, &[], 1e-3).expect("fit should succeed");
    let ctx = PredictionContext::new(db, output.venue_table.clone(), model);

    let trained_row = output
        .rows
        .iter()
        .find(|r| r.match_id == 1 && r.ball_number == 180)
        .expect("checkpoint row should exist");

    let request = ScenarioRequest {
        batting_roster: roster("Alphas"),
        bowling_roster: roster("Betas"),
        venue: "Parity Park".to_string(),
        current_score: 180,
        wickets_fallen: 0,
        balls_bowled: 180,
        runs_last_10_overs: 60,
        batting_team: Some("Alphas".to_string()),
        bowling_team: Some("Betas".to_string()),
        batsman_1: Some("Alphas Player 1".to_string()),
        batsman_2: Some("Alphas Player 2".to_string()),
    };

    let served_row = ctx.build_checkpoint(&request).expect("scenario should build");
    assert_eq!(
        served_row.numeric_features(),
        trained_row.numeric_features(),
        "serving features must match the dataset builder exactly"
    );

    // Every training innings finished on 300; the matching state should land
    // right there.
    let predicted = ctx.predict(&request).expect("prediction should succeed");
    assert!(
        (predicted - 300.0).abs() < 1.0,
        "prediction {predicted} should sit at the constant label"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn all_unknown_batting_roster_hits_default_aggregates() {
    let ctx = PredictionContext::new(
        PlayerDb::default(),
        odi_progressive::venue_table::VenueTable::build(Vec::new()),
        ScoreModel {
            version: 1,
            generated_at: "test".to_string(),
            feature_names: Vec::new(),
            feature_means: Vec::new(),
            feature_stds: Vec::new(),
            coeffs: Vec::new(),
            intercept: 250.0,
            l2: 0.0,
            train_mae: 0.0,
            val_mae: 0.0,
            train_samples: 0,
            val_samples: 0,
        },
    );
    let request = ScenarioRequest {
        batting_roster: roster("Nobody"),
        bowling_roster: roster("NobodyElse"),
        venue: "Nowhere".to_string(),
        current_score: 0,
        wickets_fallen: 0,
        balls_bowled: 1,
        runs_last_10_overs: 0,
        batting_team: None,
        bowling_team: None,
        batsman_1: None,
        batsman_2: None,
    };
    let row = ctx.build_checkpoint(&request).unwrap();
    assert_eq!(row.team_batting_avg, 30.0);
    assert_eq!(row.team_elite_batsmen, 0);
    // The batter default sits exactly on the inclusive depth threshold.
    assert_eq!(row.team_batting_depth, 11);
    assert_eq!(row.opp_bowling_economy, 6.0);
    assert_eq!(row.opp_elite_bowlers, 0);
    assert_eq!(row.venue_avg_score, 250.0);
}

#[test]
fn scenario_fixture_parses_and_requires_fields() {
    let raw = read_fixture("scenario.json");
    let request = parse_scenario(&raw).expect("fixture scenario should parse");
    assert_eq!(request.batting_roster.len(), 11);
    assert_eq!(request.balls_bowled, 180);
    assert_eq!(request.batsman_1.as_deref(), Some("KL Rahul"));

    let without_field = raw.replacen("\"balls_bowled\": 180,", "", 1);
    let err = parse_scenario(&without_field).unwrap_err();
    assert!(format!("{err:#}").contains("balls_bowled"));
}

#[test]
fn dataset_csv_roundtrip_through_files() {
    let dir = corpus_dir("csv_roundtrip");
    fs::write(
        dir.join("m.json"),
        synthetic_match("Roundtrip Ground", "Alphas", "Betas", 120),
    )
    .unwrap();

    let output = build_dataset(&dir, &PlayerDb::default()).expect("build should succeed");
    let csv_path = dir.join("rows.csv");
    write_rows_csv(&csv_path, &output.rows).expect("write csv");
    let back = read_rows_csv(&csv_path).expect("read csv");
    assert_eq!(back, output.rows);

    let _ = fs::remove_dir_all(&dir);
}
