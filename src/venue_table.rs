use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::player_db::canonical_name;

/// Venues with fewer completed innings than this fall back to the global mean.
pub const MIN_VENUE_SAMPLES: usize = 10;
/// Last-resort mean when the corpus produced no usable innings at all.
pub const EMPTY_CORPUS_AVG: f64 = 250.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenueEntry {
    pub samples: usize,
    pub avg_score: f64,
}

/// Per-venue historical scoring averages, built once per corpus scan and
/// immutable afterwards. Keys are the exact venue strings of the source data;
/// two spellings of the same ground are two entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueTable {
    pub generated_at: String,
    pub global_avg: f64,
    pub venues: HashMap<String, VenueEntry>,
}

impl VenueTable {
    /// Two-pass build over `(venue, final_score)` observations: collect the
    /// per-venue score lists, then average. Low-sample venues keep an entry
    /// whose value is the global mean, so their sample counts survive for
    /// reporting.
    pub fn build<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut by_venue: HashMap<String, Vec<u32>> = HashMap::new();
        for (venue, score) in observations {
            by_venue.entry(venue).or_default().push(score);
        }

        let mut total = 0u64;
        let mut count = 0usize;
        for scores in by_venue.values() {
            for score in scores {
                total += u64::from(*score);
                count += 1;
            }
        }
        let global_avg = if count > 0 {
            total as f64 / count as f64
        } else {
            EMPTY_CORPUS_AVG
        };

        let venues = by_venue
            .into_iter()
            .map(|(venue, scores)| {
                let avg_score = if scores.len() >= MIN_VENUE_SAMPLES {
                    scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
                } else {
                    global_avg
                };
                (
                    venue,
                    VenueEntry {
                        samples: scores.len(),
                        avg_score,
                    },
                )
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            global_avg,
            venues,
        }
    }

    /// Seen venues return their entry; unseen venues fall back to the global
    /// average. Never fails, and repeated lookups agree.
    pub fn lookup(&self, venue: &str) -> f64 {
        self.venues
            .get(canonical_name(venue))
            .map(|entry| entry.avg_score)
            .unwrap_or(self.global_avg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read venue table {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse venue table {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let raw = serde_json::to_string_pretty(self).context("serialize venue table")?;
        fs::write(path, raw).with_context(|| format!("write venue table {}", path.display()))
    }
}
