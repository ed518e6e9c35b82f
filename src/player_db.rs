use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLAYER_DB_PATH: &str = "assets/player_database.json";

/// Batting-average fallbacks by role tier.
pub const BOWLER_BATTING_DEFAULT: f64 = 18.0;
pub const ALL_ROUNDER_BATTING_DEFAULT: f64 = 25.0;
pub const BATTER_BATTING_DEFAULT: f64 = 30.0;

/// Bowling-economy fallbacks by role tier.
pub const BOWLER_ECONOMY_DEFAULT: f64 = 5.0;
pub const ALL_ROUNDER_ECONOMY_DEFAULT: f64 = 5.5;
pub const BATTER_ECONOMY_DEFAULT: f64 = 6.0;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BattingStats {
    #[serde(default)]
    pub average: Option<f64>,
    #[serde(default)]
    pub strike_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BowlingStats {
    #[serde(default)]
    pub economy: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerRecord {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub star_rating: Option<f64>,
    #[serde(default)]
    pub total_matches: Option<u32>,
    #[serde(default)]
    pub batting: Option<BattingStats>,
    #[serde(default)]
    pub bowling: Option<BowlingStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleTier {
    Bowler,
    AllRounder,
    Batter,
}

/// Immutable snapshot of player career stats, loaded once at process start.
///
/// Every strength lookup goes through [`PlayerDb::batting_average`] and
/// [`PlayerDb::bowling_economy`]; the dataset builder, the validator and the
/// serving adapter all share this one default policy.
#[derive(Debug, Clone, Default)]
pub struct PlayerDb {
    players: HashMap<String, PlayerRecord>,
}

/// Single hook for future name normalization. Lookups are exact-string today;
/// any canonicalization scheme must change only this function.
pub fn canonical_name(raw: &str) -> &str {
    raw
}

impl PlayerDb {
    pub fn from_records(players: HashMap<String, PlayerRecord>) -> Self {
        Self { players }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        // Snapshot values can be null for retired/unmatched entries.
        let parsed = serde_json::from_str::<HashMap<String, Option<PlayerRecord>>>(raw)
            .context("parse player database json")?;
        let players = parsed
            .into_iter()
            .filter_map(|(name, rec)| rec.map(|r| (name, r)))
            .collect();
        Ok(Self { players })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read player database {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse player database {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.get(canonical_name(name))
    }

    /// Stored positive average verbatim, else the role-tier default.
    /// Absent players and absent/zero/negative stats all land on a default;
    /// this never fails.
    pub fn batting_average(&self, name: &str) -> f64 {
        if let Some(avg) = self.stored_batting_average(name) {
            return avg;
        }
        match self.role_tier(name) {
            RoleTier::Bowler => BOWLER_BATTING_DEFAULT,
            RoleTier::AllRounder => ALL_ROUNDER_BATTING_DEFAULT,
            RoleTier::Batter => BATTER_BATTING_DEFAULT,
        }
    }

    /// Stored positive economy verbatim, else the role-tier default.
    pub fn bowling_economy(&self, name: &str) -> f64 {
        if let Some(econ) = self.stored_bowling_economy(name) {
            return econ;
        }
        match self.role_tier(name) {
            RoleTier::Bowler => BOWLER_ECONOMY_DEFAULT,
            RoleTier::AllRounder => ALL_ROUNDER_ECONOMY_DEFAULT,
            RoleTier::Batter => BATTER_ECONOMY_DEFAULT,
        }
    }

    fn stored_batting_average(&self, name: &str) -> Option<f64> {
        let avg = self.get(name)?.batting.as_ref()?.average?;
        if avg > 0.0 { Some(avg) } else { None }
    }

    fn stored_bowling_economy(&self, name: &str) -> Option<f64> {
        let econ = self.get(name)?.bowling.as_ref()?.economy?;
        if econ > 0.0 { Some(econ) } else { None }
    }

    fn role_tier(&self, name: &str) -> RoleTier {
        let Some(role) = self.get(name).and_then(|r| r.role.as_deref()) else {
            return RoleTier::Batter;
        };
        if role.contains("Bowler") {
            RoleTier::Bowler
        } else if role.contains("All-rounder") {
            RoleTier::AllRounder
        } else {
            // Batsman, Wicketkeeper-Batsman and anything unrecognized.
            RoleTier::Batter
        }
    }
}

/// Explicit path, then `ODI_PLAYER_DB_PATH`, then the bundled snapshot.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(raw) = env::var("ODI_PLAYER_DB_PATH")
        && !raw.trim().is_empty()
    {
        return PathBuf::from(raw.trim());
    }
    PathBuf::from(DEFAULT_PLAYER_DB_PATH)
}
