use crate::player_db::PlayerDb;

/// Batting average at or above this counts a player as elite.
pub const ELITE_BATTING_AVG: f64 = 40.0;
/// Batting average at or above this counts toward batting depth.
pub const DEPTH_BATTING_AVG: f64 = 30.0;
/// Bowling economy strictly below this counts a bowler as elite.
pub const ELITE_BOWLING_ECONOMY: f64 = 4.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattingAggregates {
    pub team_batting_avg: f64,
    pub team_elite_batsmen: u32,
    pub team_batting_depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BowlingAggregates {
    pub opp_bowling_economy: f64,
    pub opp_elite_bowlers: u32,
    pub opp_bowling_depth: u32,
}

/// Collapse a batting roster into team-strength scalars. Every member is
/// resolved through the default policy, so specialist bowlers still
/// contribute a (defaulted) average. An empty roster yields a NaN mean; the
/// assembler's null-scrub drops such rows.
pub fn batting_aggregates(roster: &[String], db: &PlayerDb) -> BattingAggregates {
    let mut sum = 0.0;
    let mut elite = 0u32;
    let mut depth = 0u32;
    for name in roster {
        let avg = db.batting_average(name);
        sum += avg;
        if avg >= ELITE_BATTING_AVG {
            elite += 1;
        }
        if avg >= DEPTH_BATTING_AVG {
            depth += 1;
        }
    }
    BattingAggregates {
        team_batting_avg: sum / roster.len() as f64,
        team_elite_batsmen: elite,
        team_batting_depth: depth,
    }
}

/// Collapse an opposition roster into bowling-strength scalars. The depth
/// count is the number of economies considered (the full roster, since every
/// member resolves to something).
pub fn bowling_aggregates(roster: &[String], db: &PlayerDb) -> BowlingAggregates {
    if roster.is_empty() {
        return BowlingAggregates {
            opp_bowling_economy: 5.5,
            opp_elite_bowlers: 0,
            opp_bowling_depth: 0,
        };
    }

    let mut sum = 0.0;
    let mut elite = 0u32;
    for name in roster {
        let econ = db.bowling_economy(name);
        sum += econ;
        if econ < ELITE_BOWLING_ECONOMY {
            elite += 1;
        }
    }
    BowlingAggregates {
        opp_bowling_economy: sum / roster.len() as f64,
        opp_elite_bowlers: elite,
        opp_bowling_depth: roster.len() as u32,
    }
}
