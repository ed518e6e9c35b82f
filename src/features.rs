use serde::{Deserialize, Serialize};

use crate::roster::{BattingAggregates, BowlingAggregates};
use crate::scanner::MatchStateRow;

pub const FEATURE_COUNT: usize = 15;

/// Model input columns, in the order the trained artifact expects them.
/// Keep in lockstep with [`CheckpointRow::numeric_features`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "current_score",
    "wickets_fallen",
    "balls_bowled",
    "balls_remaining",
    "runs_last_10_overs",
    "current_run_rate",
    "team_batting_avg",
    "team_elite_batsmen",
    "team_batting_depth",
    "opp_bowling_economy",
    "opp_elite_bowlers",
    "opp_bowling_depth",
    "venue_avg_score",
    "batsman_1_avg",
    "batsman_2_avg",
];

/// One sampled point of an innings: the unit of training data and of a
/// single inference request. The leading metadata fields group rows by match
/// and never reach the model; `venue` is the one categorical passed through
/// for the model's own encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRow {
    pub match_id: u32,
    pub match_date: String,
    pub batting_team: String,
    pub bowling_team: String,
    pub venue: String,
    pub ball_number: u32,
    pub current_score: u32,
    pub wickets_fallen: u32,
    pub balls_bowled: u32,
    pub balls_remaining: u32,
    pub runs_last_10_overs: u32,
    pub current_run_rate: f64,
    pub team_batting_avg: f64,
    pub team_elite_batsmen: u32,
    pub team_batting_depth: u32,
    pub opp_bowling_economy: f64,
    pub opp_elite_bowlers: u32,
    pub opp_bowling_depth: u32,
    pub venue_avg_score: f64,
    pub batsman_1_avg: f64,
    pub batsman_2_avg: f64,
    pub final_score: u32,
}

impl CheckpointRow {
    /// Join one scanner row with the per-match context computed once for the
    /// whole innings.
    pub fn join(
        match_id: u32,
        state: &MatchStateRow,
        batting: &BattingAggregates,
        bowling: &BowlingAggregates,
        venue: &str,
        venue_avg_score: f64,
        match_date: &str,
        batting_team: &str,
        bowling_team: &str,
        final_score: u32,
    ) -> Self {
        Self {
            match_id,
            match_date: match_date.to_string(),
            batting_team: batting_team.to_string(),
            bowling_team: bowling_team.to_string(),
            venue: venue.to_string(),
            ball_number: state.ball_number,
            current_score: state.current_score,
            wickets_fallen: state.wickets_fallen,
            balls_bowled: state.ball_number,
            balls_remaining: state.balls_remaining,
            runs_last_10_overs: state.runs_last_10_overs,
            current_run_rate: state.current_run_rate,
            team_batting_avg: batting.team_batting_avg,
            team_elite_batsmen: batting.team_elite_batsmen,
            team_batting_depth: batting.team_batting_depth,
            opp_bowling_economy: bowling.opp_bowling_economy,
            opp_elite_bowlers: bowling.opp_elite_bowlers,
            opp_bowling_depth: bowling.opp_bowling_depth,
            venue_avg_score,
            batsman_1_avg: state.batsman_1_avg,
            batsman_2_avg: state.batsman_2_avg,
            final_score,
        }
    }

    pub fn numeric_features(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.current_score),
            f64::from(self.wickets_fallen),
            f64::from(self.balls_bowled),
            f64::from(self.balls_remaining),
            f64::from(self.runs_last_10_overs),
            self.current_run_rate,
            self.team_batting_avg,
            f64::from(self.team_elite_batsmen),
            f64::from(self.team_batting_depth),
            self.opp_bowling_economy,
            f64::from(self.opp_elite_bowlers),
            f64::from(self.opp_bowling_depth),
            self.venue_avg_score,
            self.batsman_1_avg,
            self.batsman_2_avg,
        ]
    }

    /// Rows carrying non-finite features (an empty batting roster yields a
    /// NaN mean) are scrubbed before the dataset is written.
    pub fn has_finite_features(&self) -> bool {
        self.numeric_features().iter().all(|v| v.is_finite())
    }
}
