use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::features::CheckpointRow;
use crate::match_log::{self, MatchRecord};
use crate::player_db::PlayerDb;
use crate::roster;
use crate::scanner::{self, CHECKPOINT_BALLS};
use crate::venue_table::VenueTable;

pub const DEFAULT_TEST_FRACTION: f64 = 0.10;
pub const DEFAULT_SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub files_seen: usize,
    pub matches_used: usize,
    pub matches_skipped: usize,
    pub rows_emitted: usize,
    pub rows_scrubbed: usize,
    pub checkpoint_counts: [usize; CHECKPOINT_BALLS.len()],
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub venue_table: VenueTable,
    pub rows: Vec<CheckpointRow>,
    pub summary: BuildSummary,
}

/// Match files of a corpus directory, sorted so sequential match ids are
/// stable across rebuilds of an unchanged corpus.
pub fn list_match_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read corpus directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context("read corpus directory entry")?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Pass 1: one `(venue, final_score)` observation per parseable match with a
/// non-zero first-innings total.
pub fn build_venue_table(files: &[PathBuf]) -> VenueTable {
    let observations: Vec<(String, u32)> = files
        .par_iter()
        .filter_map(|path| {
            let record = read_match(path)?;
            let score = record.final_score();
            if score == 0 {
                return None;
            }
            Some((record.venue, score))
        })
        .collect();
    VenueTable::build(observations)
}

/// Pass 2 driver: venue table first, then the per-match scan/join. Bad files
/// are skipped, never fatal; only the corpus directory itself being
/// unreadable aborts the build.
pub fn build_dataset(corpus_dir: &Path, db: &PlayerDb) -> Result<BuildOutput> {
    let files = list_match_files(corpus_dir)?;
    let venue_table = build_venue_table(&files);

    let scanned: Vec<Option<Vec<CheckpointRow>>> = files
        .par_iter()
        .map(|path| {
            let record = read_match(path)?;
            scan_match(&record, db, &venue_table, 0)
        })
        .collect();

    let mut summary = BuildSummary {
        files_seen: files.len(),
        ..BuildSummary::default()
    };
    let mut rows = Vec::new();
    let mut next_match_id = 1u32;
    for match_rows in scanned {
        let Some(mut match_rows) = match_rows else {
            summary.matches_skipped += 1;
            continue;
        };
        for row in &mut match_rows {
            row.match_id = next_match_id;
        }
        next_match_id += 1;
        summary.matches_used += 1;
        rows.extend(match_rows);
    }

    let before_scrub = rows.len();
    rows.retain(|row| row.has_finite_features());
    summary.rows_scrubbed = before_scrub - rows.len();
    summary.rows_emitted = rows.len();
    for row in &rows {
        if let Some(idx) = CHECKPOINT_BALLS.iter().position(|b| *b == row.ball_number) {
            summary.checkpoint_counts[idx] += 1;
        }
    }

    Ok(BuildOutput {
        venue_table,
        rows,
        summary,
    })
}

/// Scan one match into its checkpoint rows. None means the whole match is
/// unusable: a zero recorded total marks an unparseable or abandoned innings,
/// not a genuine score.
pub fn scan_match(
    record: &MatchRecord,
    db: &PlayerDb,
    venue_table: &VenueTable,
    match_id: u32,
) -> Option<Vec<CheckpointRow>> {
    let final_score = record.final_score();
    if final_score == 0 {
        return None;
    }

    // Rosters are static for the innings: aggregate once, join per checkpoint.
    let batting = roster::batting_aggregates(&record.batting_roster, db);
    let bowling = roster::bowling_aggregates(&record.bowling_roster, db);
    let venue_avg_score = venue_table.lookup(&record.venue);

    let rows = scanner::scan_innings(&record.deliveries, db)
        .iter()
        .map(|state| {
            CheckpointRow::join(
                match_id,
                state,
                &batting,
                &bowling,
                &record.venue,
                venue_avg_score,
                &record.match_date,
                &record.batting_team,
                &record.bowling_team,
                final_score,
            )
        })
        .collect();
    Some(rows)
}

fn read_match(path: &Path) -> Option<MatchRecord> {
    let raw = fs::read_to_string(path).ok()?;
    match_log::parse_match_json(&raw)
}

/// Hold out a fraction of distinct matches, so every checkpoint of a match
/// lands on the same side of the split.
pub fn split_by_match(
    rows: Vec<CheckpointRow>,
    test_fraction: f64,
    seed: u64,
) -> (Vec<CheckpointRow>, Vec<CheckpointRow>) {
    let mut match_ids: Vec<u32> = Vec::new();
    let mut seen = HashSet::new();
    for row in &rows {
        if seen.insert(row.match_id) {
            match_ids.push(row.match_id);
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    match_ids.shuffle(&mut rng);
    let n_test = ((match_ids.len() as f64) * test_fraction).ceil() as usize;
    let test_ids: HashSet<u32> = match_ids.into_iter().take(n_test).collect();

    let mut train = Vec::new();
    let mut test = Vec::new();
    for row in rows {
        if test_ids.contains(&row.match_id) {
            test.push(row);
        } else {
            train.push(row);
        }
    }
    (train, test)
}

pub fn write_rows_csv(path: &Path, rows: &[CheckpointRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

pub fn read_rows_csv(path: &Path) -> Result<Vec<CheckpointRow>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.with_context(|| format!("decode row from {}", path.display()))?);
    }
    Ok(rows)
}
