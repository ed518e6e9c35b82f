use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::features::CheckpointRow;
use crate::model::ScoreModel;
use crate::player_db::PlayerDb;
use crate::roster;
use crate::scanner::{INNINGS_BALLS, run_rate};
use crate::venue_table::VenueTable;

pub const ROSTER_SIZE: usize = 11;

/// One live what-if scenario. Missing required fields fail deserialization
/// and reject the request; only the batsman identities are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRequest {
    pub batting_roster: Vec<String>,
    pub bowling_roster: Vec<String>,
    pub venue: String,
    pub current_score: u32,
    pub wickets_fallen: u32,
    pub balls_bowled: u32,
    pub runs_last_10_overs: u32,
    #[serde(default)]
    pub batting_team: Option<String>,
    #[serde(default)]
    pub bowling_team: Option<String>,
    #[serde(default)]
    pub batsman_1: Option<String>,
    #[serde(default)]
    pub batsman_2: Option<String>,
}

/// Everything a prediction needs, loaded once at startup and passed by
/// reference into request handling. All fields are immutable after
/// construction, so concurrent predictions need no locking.
#[derive(Debug, Clone)]
pub struct PredictionContext {
    pub player_db: PlayerDb,
    pub venue_table: VenueTable,
    pub model: ScoreModel,
}

pub fn parse_scenario(raw: &str) -> Result<ScenarioRequest> {
    serde_json::from_str(raw).context("invalid scenario request")
}

impl PredictionContext {
    pub fn new(player_db: PlayerDb, venue_table: VenueTable, model: ScoreModel) -> Self {
        Self {
            player_db,
            venue_table,
            model,
        }
    }

    /// Derive the same feature vector the dataset builder would emit for this
    /// match state: same resolver, same aggregates, same venue lookup, same
    /// batsman-zeroing rules.
    pub fn build_checkpoint(&self, request: &ScenarioRequest) -> Result<CheckpointRow> {
        check_roster_size("batting", &request.batting_roster)?;
        check_roster_size("bowling", &request.bowling_roster)?;

        let batting = roster::batting_aggregates(&request.batting_roster, &self.player_db);
        let bowling = roster::bowling_aggregates(&request.bowling_roster, &self.player_db);
        let venue_avg_score = self.venue_table.lookup(&request.venue);

        let (batsman_1_avg, batsman_2_avg) = match (
            request.balls_bowled,
            request.batsman_1.as_deref(),
            request.batsman_2.as_deref(),
        ) {
            (0 | 1, _, _) => (0.0, 0.0),
            (_, Some(b1), Some(b2)) => (
                self.player_db.batting_average(b1),
                self.player_db.batting_average(b2),
            ),
            _ => (0.0, 0.0),
        };

        Ok(CheckpointRow {
            match_id: 0,
            match_date: "scenario".to_string(),
            batting_team: request.batting_team.clone().unwrap_or_default(),
            bowling_team: request.bowling_team.clone().unwrap_or_default(),
            venue: request.venue.clone(),
            ball_number: request.balls_bowled,
            current_score: request.current_score,
            wickets_fallen: request.wickets_fallen,
            balls_bowled: request.balls_bowled,
            balls_remaining: INNINGS_BALLS.saturating_sub(request.balls_bowled),
            runs_last_10_overs: request.runs_last_10_overs,
            current_run_rate: run_rate(request.current_score, request.balls_bowled),
            team_batting_avg: batting.team_batting_avg,
            team_elite_batsmen: batting.team_elite_batsmen,
            team_batting_depth: batting.team_batting_depth,
            opp_bowling_economy: bowling.opp_bowling_economy,
            opp_elite_bowlers: bowling.opp_elite_bowlers,
            opp_bowling_depth: bowling.opp_bowling_depth,
            venue_avg_score,
            batsman_1_avg,
            batsman_2_avg,
            final_score: 0,
        })
    }

    /// Unrounded predicted final innings score for one scenario. A bad
    /// request fails only this call; the context is untouched.
    pub fn predict(&self, request: &ScenarioRequest) -> Result<f64> {
        let row = self.build_checkpoint(request)?;
        Ok(self.model.predict_row(&row))
    }
}

fn check_roster_size(label: &str, roster: &[String]) -> Result<()> {
    if roster.len() != ROSTER_SIZE {
        return Err(anyhow!(
            "{label} roster must name exactly {ROSTER_SIZE} players, got {}",
            roster.len()
        ));
    }
    Ok(())
}
