use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::features::{CheckpointRow, FEATURE_COUNT, FEATURE_NAMES};

pub const DEFAULT_L2: f64 = 1e-3;
const MAX_ITERS: usize = 4000;
const LR_START: f64 = 0.05;
const IMPROVEMENT_EPS: f64 = 1e-4;

/// Trained final-score regressor. The rest of the system touches it only
/// through [`ScoreModel::fit`], [`ScoreModel::predict`] and the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreModel {
    pub version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_means: Vec<f64>,
    #[serde(default)]
    pub feature_stds: Vec<f64>,
    #[serde(default)]
    pub coeffs: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub l2: f64,
    #[serde(default)]
    pub train_mae: f64,
    #[serde(default)]
    pub val_mae: f64,
    #[serde(default)]
    pub train_samples: usize,
    #[serde(default)]
    pub val_samples: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionMetrics {
    pub samples: usize,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub within_10: usize,
    pub within_20: usize,
    pub within_30: usize,
}

impl ScoreModel {
    /// Ridge fit by gradient descent on standardized features with a centered
    /// target. Coefficients are checkpointed on validation MAE and the best
    /// set wins; an empty validation slice falls back to stopping on train.
    pub fn fit(train: &[CheckpointRow], val: &[CheckpointRow], l2: f64) -> Result<Self> {
        if train.is_empty() {
            return Err(anyhow!("no training rows"));
        }

        let xs: Vec<[f64; FEATURE_COUNT]> = train.iter().map(|r| r.numeric_features()).collect();
        let ys: Vec<f64> = train.iter().map(|r| f64::from(r.final_score)).collect();
        let (means, stds) = feature_norm_stats(&xs);
        let y_mean = ys.iter().sum::<f64>() / ys.len() as f64;

        let std_train: Vec<[f64; FEATURE_COUNT]> =
            xs.iter().map(|x| standardize(x, &means, &stds)).collect();
        let stop_rows = if val.is_empty() { train } else { val };
        let stop_xs: Vec<[f64; FEATURE_COUNT]> = stop_rows
            .iter()
            .map(|r| standardize(&r.numeric_features(), &means, &stds))
            .collect();
        let stop_ys: Vec<f64> = stop_rows.iter().map(|r| f64::from(r.final_score)).collect();

        let mut coeffs = [0.0; FEATURE_COUNT];
        let mut best = coeffs;
        let mut best_val = mae_for_coeffs(&coeffs, y_mean, &stop_xs, &stop_ys);
        let mut no_improve = 0usize;

        for iter in 0..MAX_ITERS {
            let mut grad = [0.0; FEATURE_COUNT];
            for (x, y) in std_train.iter().zip(&ys) {
                let err = y_mean + dot(&coeffs, x) - y;
                for j in 0..FEATURE_COUNT {
                    grad[j] += err * x[j];
                }
            }

            let lr = LR_START / (1.0 + (iter as f64 * 0.003));
            let n = std_train.len() as f64;
            for j in 0..FEATURE_COUNT {
                coeffs[j] -= lr * (grad[j] / n + l2 * coeffs[j]);
            }

            if iter % 20 == 0 || iter + 1 == MAX_ITERS {
                let val_mae = mae_for_coeffs(&coeffs, y_mean, &stop_xs, &stop_ys);
                if val_mae + IMPROVEMENT_EPS < best_val {
                    best_val = val_mae;
                    best = coeffs;
                    no_improve = 0;
                } else {
                    no_improve = no_improve.saturating_add(1);
                    if no_improve >= 20 {
                        break;
                    }
                }
            }
        }

        let train_mae = mae_for_coeffs(&best, y_mean, &std_train, &ys);
        Ok(Self {
            version: 1,
            generated_at: chrono::Utc::now().to_rfc3339(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            feature_means: means.to_vec(),
            feature_stds: stds.to_vec(),
            coeffs: best.to_vec(),
            intercept: y_mean,
            l2,
            train_mae,
            val_mae: best_val,
            train_samples: train.len(),
            val_samples: val.len(),
        })
    }

    /// Unrounded predicted final score for one feature vector.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut out = self.intercept;
        for (idx, coeff) in self.coeffs.iter().enumerate().take(FEATURE_COUNT) {
            let mean = self.feature_means.get(idx).copied().unwrap_or(0.0);
            let std = self.feature_stds.get(idx).copied().unwrap_or(1.0).max(1e-6);
            out += coeff * (features[idx] - mean) / std;
        }
        out
    }

    pub fn predict_row(&self, row: &CheckpointRow) -> f64 {
        self.predict(&row.numeric_features())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read model artifact {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse model artifact {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let raw = serde_json::to_string_pretty(self).context("serialize model artifact")?;
        fs::write(path, raw).with_context(|| format!("write model artifact {}", path.display()))
    }
}

/// Error summary of a prediction set against known finals.
pub fn evaluate(model: &ScoreModel, rows: &[CheckpointRow]) -> RegressionMetrics {
    let preds: Vec<f64> = rows.iter().map(|r| model.predict_row(r)).collect();
    let actuals: Vec<f64> = rows.iter().map(|r| f64::from(r.final_score)).collect();
    evaluate_pairs(&preds, &actuals)
}

pub fn evaluate_pairs(preds: &[f64], actuals: &[f64]) -> RegressionMetrics {
    if preds.is_empty() || preds.len() != actuals.len() {
        return RegressionMetrics::default();
    }

    let n = preds.len() as f64;
    let actual_mean = actuals.iter().sum::<f64>() / n;

    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut ss_tot = 0.0;
    let mut within_10 = 0usize;
    let mut within_20 = 0usize;
    let mut within_30 = 0usize;

    for (pred, actual) in preds.iter().zip(actuals) {
        let err = pred - actual;
        abs_sum += err.abs();
        sq_sum += err * err;
        ss_tot += (actual - actual_mean).powi(2);
        if err.abs() <= 10.0 {
            within_10 += 1;
        }
        if err.abs() <= 20.0 {
            within_20 += 1;
        }
        if err.abs() <= 30.0 {
            within_30 += 1;
        }
    }

    let r2 = if ss_tot > 1e-12 {
        1.0 - sq_sum / ss_tot
    } else {
        0.0
    };

    RegressionMetrics {
        samples: preds.len(),
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        r2,
        within_10,
        within_20,
        within_30,
    }
}

fn feature_norm_stats(xs: &[[f64; FEATURE_COUNT]]) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let mut mean = [0.0; FEATURE_COUNT];
    let mut var = [0.0; FEATURE_COUNT];
    let n = xs.len() as f64;

    for x in xs {
        for i in 0..FEATURE_COUNT {
            mean[i] += x[i];
        }
    }
    for v in &mut mean {
        *v /= n.max(1.0);
    }

    for x in xs {
        for i in 0..FEATURE_COUNT {
            let d = x[i] - mean[i];
            var[i] += d * d;
        }
    }
    for v in &mut var {
        *v = (*v / n.max(1.0)).sqrt().max(1e-6);
    }

    (mean, var)
}

fn standardize(
    x: &[f64; FEATURE_COUNT],
    mean: &[f64; FEATURE_COUNT],
    std: &[f64; FEATURE_COUNT],
) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for i in 0..FEATURE_COUNT {
        out[i] = (x[i] - mean[i]) / std[i].max(1e-6);
    }
    out
}

fn mae_for_coeffs(
    coeffs: &[f64; FEATURE_COUNT],
    intercept: f64,
    xs: &[[f64; FEATURE_COUNT]],
    ys: &[f64],
) -> f64 {
    if xs.is_empty() {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sum += (intercept + dot(coeffs, x) - y).abs();
    }
    sum / xs.len() as f64
}

fn dot(a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
    let mut out = 0.0;
    for i in 0..FEATURE_COUNT {
        out += a[i] * b[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_row(match_id: u32, score: u32, wickets: u32) -> CheckpointRow {
        // Final score rises linearly with the current score and drops with
        // wickets, so a linear fit can recover it almost exactly.
        let final_score = 120 + 2 * score - 10 * wickets;
        CheckpointRow {
            match_id,
            match_date: "2021-03-14".to_string(),
            batting_team: "A".to_string(),
            bowling_team: "B".to_string(),
            venue: "G".to_string(),
            ball_number: 120,
            current_score: score,
            wickets_fallen: wickets,
            balls_bowled: 120,
            balls_remaining: 180,
            runs_last_10_overs: 45,
            current_run_rate: f64::from(score) * 6.0 / 120.0,
            team_batting_avg: 33.0,
            team_elite_batsmen: 2,
            team_batting_depth: 7,
            opp_bowling_economy: 5.2,
            opp_elite_bowlers: 1,
            opp_bowling_depth: 11,
            venue_avg_score: 255.0,
            batsman_1_avg: 31.0,
            batsman_2_avg: 28.0,
            final_score,
        }
    }

    #[test]
    fn fit_recovers_linear_relationship() {
        let mut train = Vec::new();
        for i in 0..200u32 {
            train.push(synthetic_row(i, 40 + (i * 7) % 120, i % 6));
        }
        let val: Vec<CheckpointRow> = (200..240u32)
            .map(|i| synthetic_row(i, 40 + (i * 7) % 120, i % 6))
            .collect();

        let model = ScoreModel::fit(&train, &val, 1e-4).expect("fit should succeed");
        assert!(model.val_mae < 5.0, "val mae too high: {}", model.val_mae);

        let probe = synthetic_row(999, 100, 2);
        let pred = model.predict_row(&probe);
        assert!(
            (pred - f64::from(probe.final_score)).abs() < 10.0,
            "prediction {pred} too far from {}",
            probe.final_score
        );
    }

    #[test]
    fn fit_rejects_empty_training_set() {
        assert!(ScoreModel::fit(&[], &[], DEFAULT_L2).is_err());
    }

    #[test]
    fn artifact_roundtrip_preserves_predictions() {
        let train: Vec<CheckpointRow> = (0..80u32).map(|i| synthetic_row(i, 30 + i, 2)).collect();
        let model = ScoreModel::fit(&train, &[], DEFAULT_L2).unwrap();
        let raw = serde_json::to_string(&model).unwrap();
        let back: ScoreModel = serde_json::from_str(&raw).unwrap();
        let probe = synthetic_row(1, 64, 2);
        assert_eq!(model.predict_row(&probe), back.predict_row(&probe));
    }

    #[test]
    fn perfect_predictions_score_r2_one() {
        let actuals = [250.0, 280.0, 310.0, 220.0];
        let metrics = evaluate_pairs(&actuals, &actuals);
        assert!((metrics.r2 - 1.0).abs() < 1e-12);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.within_10, 4);
    }

    #[test]
    fn constant_actuals_define_r2_as_zero() {
        let metrics = evaluate_pairs(&[250.0, 260.0], &[255.0, 255.0]);
        assert_eq!(metrics.r2, 0.0);
        assert_eq!(metrics.samples, 2);
    }
}
