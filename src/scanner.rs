use std::collections::VecDeque;

use crate::match_log::Delivery;
use crate::player_db::PlayerDb;

/// Ball indices at which an in-progress innings is sampled.
pub const CHECKPOINT_BALLS: [u32; 5] = [1, 60, 120, 180, 240];
/// Nominal innings length used for the balls-remaining feature.
pub const INNINGS_BALLS: u32 = 300;
/// Size of the recent-scoring window (ten overs).
pub const RECENT_WINDOW_BALLS: usize = 60;

/// Match-state slice of a checkpoint; roster aggregates and venue strength
/// are joined by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchStateRow {
    pub ball_number: u32,
    pub current_score: u32,
    pub wickets_fallen: u32,
    pub balls_remaining: u32,
    pub runs_last_10_overs: u32,
    pub current_run_rate: f64,
    pub batsman_1_avg: f64,
    pub batsman_2_avg: f64,
}

/// Runs-per-over rate, defined as 0 before the first ball. The serving
/// adapter derives its rate through this same function.
pub fn run_rate(runs: u32, balls: u32) -> f64 {
    if balls == 0 {
        return 0.0;
    }
    f64::from(runs) * 6.0 / f64::from(balls)
}

/// Replay one innings ball by ball and emit a row at each checkpoint.
///
/// The ball index increments on every recorded delivery, extras included —
/// the source format does not mark legal balls, and this counter knowingly
/// does not reconstruct them. Crease occupants follow the latest delivery's
/// batter/non-striker pair; if either is missing, both become unknown until
/// a later delivery names them again. A short innings simply emits fewer
/// than five rows.
pub fn scan_innings(deliveries: &[Delivery], db: &PlayerDb) -> Vec<MatchStateRow> {
    let mut rows = Vec::new();
    let mut ball_number = 0u32;
    let mut cumulative_runs = 0u32;
    let mut cumulative_wickets = 0u32;
    let mut recent: VecDeque<u32> = VecDeque::with_capacity(RECENT_WINDOW_BALLS);
    let mut striker: Option<&str> = None;
    let mut non_striker: Option<&str> = None;

    for delivery in deliveries {
        ball_number += 1;
        cumulative_runs += delivery.runs_total;
        recent.push_back(delivery.runs_total);
        if recent.len() > RECENT_WINDOW_BALLS {
            recent.pop_front();
        }

        if let (Some(batter), Some(partner)) =
            (delivery.batter.as_deref(), delivery.non_striker.as_deref())
        {
            striker = Some(batter);
            non_striker = Some(partner);
        } else {
            striker = None;
            non_striker = None;
        }

        cumulative_wickets += delivery.wickets;

        if !CHECKPOINT_BALLS.contains(&ball_number) {
            continue;
        }

        // No batting history exists at the ball-1 sample, and an unknown
        // crease cannot be resolved; both cases zero the batsman features.
        let (batsman_1_avg, batsman_2_avg) = match (ball_number, striker, non_striker) {
            (1, _, _) => (0.0, 0.0),
            (_, Some(b1), Some(b2)) => (db.batting_average(b1), db.batting_average(b2)),
            _ => (0.0, 0.0),
        };

        rows.push(MatchStateRow {
            ball_number,
            current_score: cumulative_runs,
            wickets_fallen: cumulative_wickets,
            balls_remaining: INNINGS_BALLS - ball_number,
            runs_last_10_overs: recent.iter().sum(),
            current_run_rate: run_rate(cumulative_runs, ball_number),
            batsman_1_avg,
            batsman_2_avg,
        });
    }

    rows
}
