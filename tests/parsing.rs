use std::fs;
use std::path::PathBuf;

use odi_progressive::match_log::parse_match_json;
use odi_progressive::scanner::scan_innings;
use odi_progressive::player_db::PlayerDb;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_match_fixture() {
    let raw = read_fixture("match_sample.json");
    let record = parse_match_json(&raw).expect("fixture should parse");

    assert_eq!(record.venue, "Seddon Park, Hamilton");
    assert_eq!(record.city.as_deref(), Some("Hamilton"));
    assert_eq!(record.match_date, "2023-02-10");
    assert_eq!(record.batting_team, "New Zealand");
    assert_eq!(record.bowling_team, "India");
    assert_eq!(record.batting_roster.len(), 11);
    assert_eq!(record.bowling_roster.len(), 11);

    // First innings only: 7 + 6 recorded deliveries, the wide included.
    assert_eq!(record.deliveries.len(), 13);
    assert_eq!(record.final_score(), 18);
    assert_eq!(record.deliveries.iter().map(|d| d.wickets).sum::<u32>(), 1);
}

#[test]
fn fixture_scan_emits_only_ball_one_checkpoint() {
    let raw = read_fixture("match_sample.json");
    let record = parse_match_json(&raw).expect("fixture should parse");
    let rows = scan_innings(&record.deliveries, &PlayerDb::default());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ball_number, 1);
    assert_eq!(rows[0].current_score, 0);
    assert_eq!(rows[0].batsman_1_avg, 0.0);
    assert_eq!(rows[0].batsman_2_avg, 0.0);
}

#[test]
fn null_and_inningsless_documents_do_not_parse() {
    assert!(parse_match_json("null").is_none());
    assert!(parse_match_json(r#"{"info": {"venue": "G", "players": {"A": [], "B": []}}}"#).is_none());
    assert!(parse_match_json(r#"{"innings": []}"#).is_none());
}

#[test]
fn bundled_player_snapshot_loads() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("assets");
    path.push("player_database.json");
    let db = PlayerDb::load(&path).expect("bundled snapshot should load");

    assert!(db.len() >= 10);
    // Stored stats come back verbatim.
    assert_eq!(db.batting_average("V Kohli"), 58.18);
    // Null batting average resolves to the bowler default.
    assert_eq!(db.batting_average("Mohammed Siraj"), 18.0);
    // A zero stored average is treated as missing.
    assert_eq!(db.batting_average("LH Ferguson"), 18.0);
    // Null snapshot entries resolve like unknown players.
    assert_eq!(db.batting_average("FH Allen"), 30.0);
}
