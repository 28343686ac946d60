use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::{MatchRecord, WinLoss};
use crate::error::ClassifierError;

/// Label order for the confusion matrix rows (actual) and columns (predicted).
pub const LABELS: [WinLoss; 2] = [WinLoss::Win, WinLoss::Loss];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmConfig {
    pub lambda: f64,
    pub epochs: usize,
    pub seed: u64,
    pub train_fraction: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            lambda: 1e-3,
            epochs: 20,
            seed: 0,
            train_fraction: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    /// cells[actual][predicted], indexed by `LABELS`.
    pub cells: [[u32; 2]; 2],
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: WinLoss, predicted: WinLoss) {
        self.cells[label_index(actual)][label_index(predicted)] += 1;
    }

    pub fn get(&self, actual: WinLoss, predicted: WinLoss) -> u32 {
        self.cells[label_index(actual)][label_index(predicted)]
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().flatten().sum()
    }

    pub fn correct(&self) -> u32 {
        self.cells[0][0] + self.cells[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => f64::from(self.correct()) / f64::from(n),
        }
    }
}

fn label_index(label: WinLoss) -> usize {
    match label {
        WinLoss::Win => 0,
        WinLoss::Loss => 1,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifierReport {
    pub train_size: usize,
    pub test_size: usize,
    pub features: usize,
    pub matrix: ConfusionMatrix,
}

impl ClassifierReport {
    pub fn accuracy(&self) -> f64 {
        self.matrix.accuracy()
    }
}

const CONTINUOUS: usize = 4;

/// Min-max scaled continuous columns followed by one-hot categorical columns.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    mins: [f64; CONTINUOUS],
    maxs: [f64; CONTINUOUS],
    vocab: Vec<HashMap<String, usize>>,
    dims: usize,
}

fn continuous_values(r: &MatchRecord) -> [f64; CONTINUOUS] {
    [
        f64::from(r.final_score),
        r.time,
        f64::from(r.actual_crowd),
        f64::from(r.margin),
    ]
}

fn categorical_values(r: &MatchRecord) -> [String; 8] {
    [
        r.team.clone(),
        r.round.label().to_string(),
        r.home_away.label().to_string(),
        r.day.clone(),
        r.venue.clone(),
        r.season.to_string(),
        r.opposition.clone(),
        r.ladder_position.to_string(),
    ]
}

impl FeatureEncoder {
    pub fn fit(records: &[MatchRecord]) -> Self {
        let mut mins = [f64::INFINITY; CONTINUOUS];
        let mut maxs = [f64::NEG_INFINITY; CONTINUOUS];
        let mut vocab: Vec<HashMap<String, usize>> = vec![HashMap::new(); 8];
        let mut dims = CONTINUOUS;

        for r in records {
            for (i, v) in continuous_values(r).into_iter().enumerate() {
                mins[i] = mins[i].min(v);
                maxs[i] = maxs[i].max(v);
            }
            for (column, value) in vocab.iter_mut().zip(categorical_values(r)) {
                if !column.contains_key(&value) {
                    column.insert(value, dims);
                    dims += 1;
                }
            }
        }

        Self {
            mins,
            maxs,
            vocab,
            // Constant bias input.
            dims: dims + 1,
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn encode(&self, r: &MatchRecord) -> Vec<f64> {
        let mut x = vec![0.0; self.dims];
        for (i, v) in continuous_values(r).into_iter().enumerate() {
            let span = self.maxs[i] - self.mins[i];
            x[i] = if span > 0.0 {
                ((v - self.mins[i]) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        for (column, value) in self.vocab.iter().zip(categorical_values(r)) {
            if let Some(&slot) = column.get(&value) {
                x[slot] = 1.0;
            }
        }
        x[self.dims - 1] = 1.0;
        x
    }
}

/// Linear SVM trained with Pegasos (stochastic sub-gradient on the hinge loss).
#[derive(Debug, Clone)]
pub struct LinearSvm {
    weights: Vec<f64>,
}

impl LinearSvm {
    pub fn train(xs: &[Vec<f64>], ys: &[f64], config: &SvmConfig, rng: &mut StdRng) -> Self {
        let dims = xs.first().map_or(0, Vec::len);
        let mut w = vec![0.0; dims];
        let lambda = config.lambda;
        let radius = 1.0 / lambda.sqrt();
        let mut order: Vec<usize> = (0..xs.len()).collect();
        let mut t = 0u64;

        for epoch in 0..config.epochs {
            order.shuffle(rng);
            let mut violations = 0usize;
            for &i in &order {
                t += 1;
                let eta = 1.0 / (lambda * t as f64);
                let score = dot(&w, &xs[i]);
                let shrink = 1.0 - eta * lambda;
                w.iter_mut().for_each(|wj| *wj *= shrink);
                if ys[i] * score < 1.0 {
                    violations += 1;
                    for (wj, xj) in w.iter_mut().zip(&xs[i]) {
                        *wj += eta * ys[i] * xj;
                    }
                }
                let norm = dot(&w, &w).sqrt();
                if norm > radius {
                    let scale = radius / norm;
                    w.iter_mut().for_each(|wj| *wj *= scale);
                }
            }
            debug!(epoch, violations, "svm epoch");
        }

        Self { weights: w }
    }

    pub fn decision(&self, x: &[f64]) -> f64 {
        dot(&self.weights, x)
    }

    pub fn predict(&self, x: &[f64]) -> WinLoss {
        if self.decision(x) >= 0.0 {
            WinLoss::Win
        } else {
            WinLoss::Loss
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn target(label: WinLoss) -> f64 {
    match label {
        WinLoss::Win => 1.0,
        WinLoss::Loss => -1.0,
    }
}

/// Fit the Win/Loss demo model on a seeded train/test split and score it.
pub fn run_win_loss_demo(
    records: &[MatchRecord],
    config: &SvmConfig,
) -> Result<ClassifierReport, ClassifierError> {
    if records.len() < 2 {
        return Err(ClassifierError::NotEnoughData {
            needed: 2,
            got: records.len(),
        });
    }

    let encoder = FeatureEncoder::fit(records);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..records.len()).collect();
    indices.shuffle(&mut rng);

    let n_train = ((records.len() as f64 * config.train_fraction).floor() as usize)
        .clamp(1, records.len() - 1);
    let (train_idx, test_idx) = indices.split_at(n_train);

    let train_x: Vec<Vec<f64>> = train_idx.iter().map(|&i| encoder.encode(&records[i])).collect();
    let train_y: Vec<f64> = train_idx.iter().map(|&i| target(records[i].win_loss)).collect();

    if train_y.iter().all(|y| *y > 0.0) {
        return Err(ClassifierError::SingleClass("Win"));
    }
    if train_y.iter().all(|y| *y < 0.0) {
        return Err(ClassifierError::SingleClass("Loss"));
    }

    info!(
        train = train_idx.len(),
        test = test_idx.len(),
        features = encoder.dims(),
        "training win/loss svm"
    );
    let model = LinearSvm::train(&train_x, &train_y, config, &mut rng);

    let predictions: Vec<(WinLoss, WinLoss)> = test_idx
        .par_iter()
        .map(|&i| {
            let r = &records[i];
            (r.win_loss, model.predict(&encoder.encode(r)))
        })
        .collect();

    let mut matrix = ConfusionMatrix::default();
    for (actual, predicted) in predictions {
        matrix.record(actual, predicted);
    }

    Ok(ClassifierReport {
        train_size: train_idx.len(),
        test_size: test_idx.len(),
        features: encoder.dims(),
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{HomeAway, Round};

    fn game(i: usize) -> MatchRecord {
        let win = i % 2 == 0;
        let size = 10 + (i % 50) as i32;
        let margin = if win { size } else { -size };
        MatchRecord {
            team: "Geelong".to_string(),
            opposition: ["Sydney", "Carlton", "Essendon"][i % 3].to_string(),
            season: 2022,
            round: Round::new(((i % 23) + 1).to_string()),
            day: "Sat".to_string(),
            win_loss: if win { WinLoss::Win } else { WinLoss::Loss },
            margin,
            actual_crowd: 40_000,
            venue: "MCG".to_string(),
            home_away: HomeAway::Home,
            final_score: 80 + margin / 2,
            time: 19.4,
            ladder_position: 4,
        }
    }

    #[test]
    fn encoder_scales_and_one_hots() {
        let records: Vec<MatchRecord> = (0..6).map(game).collect();
        let enc = FeatureEncoder::fit(&records);
        let x = enc.encode(&records[0]);
        assert_eq!(x.len(), enc.dims());
        assert!(x.iter().all(|v| (0.0..=1.0).contains(v)));
        // Constant crowd column scales to zero.
        assert_eq!(x[2], 0.0);
        assert_eq!(x[enc.dims() - 1], 1.0);
        // Eight categorical columns, one hot each.
        let hot = x[CONTINUOUS..enc.dims() - 1].iter().filter(|v| **v == 1.0).count();
        assert_eq!(hot, 8);
    }

    #[test]
    fn separable_results_train_well() {
        let records: Vec<MatchRecord> = (0..120).map(game).collect();
        let report = run_win_loss_demo(&records, &SvmConfig::default()).expect("trains");
        assert_eq!(report.train_size, 96);
        assert_eq!(report.test_size, 24);
        assert_eq!(report.matrix.total() as usize, report.test_size);
        assert!(report.accuracy() >= 0.8, "accuracy {}", report.accuracy());
    }

    #[test]
    fn same_seed_same_matrix() {
        let records: Vec<MatchRecord> = (0..60).map(game).collect();
        let a = run_win_loss_demo(&records, &SvmConfig::default()).unwrap();
        let b = run_win_loss_demo(&records, &SvmConfig::default()).unwrap();
        assert_eq!(a.matrix, b.matrix);
    }

    #[test]
    fn too_little_data_is_an_error() {
        let records = vec![game(0)];
        assert_eq!(
            run_win_loss_demo(&records, &SvmConfig::default()).unwrap_err(),
            ClassifierError::NotEnoughData { needed: 2, got: 1 }
        );
        let all_wins: Vec<MatchRecord> = (0..10).map(|i| game(i * 2)).collect();
        assert_eq!(
            run_win_loss_demo(&all_wins, &SvmConfig::default()).unwrap_err(),
            ClassifierError::SingleClass("Win")
        );
    }

    #[test]
    fn confusion_matrix_counts() {
        let mut m = ConfusionMatrix::default();
        m.record(WinLoss::Win, WinLoss::Win);
        m.record(WinLoss::Win, WinLoss::Loss);
        m.record(WinLoss::Loss, WinLoss::Loss);
        m.record(WinLoss::Loss, WinLoss::Loss);
        assert_eq!(m.get(WinLoss::Win, WinLoss::Loss), 1);
        assert_eq!(m.total(), 4);
        assert_eq!(m.correct(), 3);
        assert!((m.accuracy() - 0.75).abs() < 1e-12);
    }
}
