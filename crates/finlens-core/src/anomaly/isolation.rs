//! Isolation-forest ensemble over a univariate sample.
//!
//! Each tree recursively splits a random sub-sample at a uniformly drawn
//! point between the current min and max. Points that separate from the
//! bulk after few splits have short average path lengths and therefore high
//! anomaly scores. Scores follow Liu, Ting & Zhou (2008):
//! `s(x) = 2^(-E[h(x)] / c(psi))`.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use rand::SeedableRng;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { at: f64, left: Box<Node>, right: Box<Node> },
}

/// A fitted ensemble of isolation trees.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `n_estimators` trees on sub-samples of at most `max_samples`
    /// points, drawn without replacement from a generator seeded by `seed`.
    pub fn fit(values: &[f64], n_estimators: usize, max_samples: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = max_samples.min(values.len()).max(1);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = if values.is_empty() {
            Vec::new()
        } else {
            (0..n_estimators)
                .map(|_| {
                    let sample: Vec<f64> = index::sample(&mut rng, values.len(), sample_size)
                        .into_iter()
                        .map(|i| values[i])
                        .collect();
                    build(&sample, 0, height_limit, &mut rng)
                })
                .collect()
        };

        IsolationForest { trees, sample_size }
    }

    /// Anomaly score in (0, 1]; higher is more anomalous.
    pub fn score(&self, x: f64) -> f64 {
        let norm = average_path_length(self.sample_size);
        if self.trees.is_empty() || norm <= 0.0 {
            return 0.5;
        }
        let mean_path = self.trees.iter().map(|t| path_length(t, x, 0)).sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / norm)
    }

    pub fn scores(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&x| self.score(x)).collect()
    }

    /// Flag the points whose score lies strictly above the
    /// `1 - contamination` quantile of the fitted sample's scores.
    pub fn predict(&self, values: &[f64], contamination: f64) -> Vec<bool> {
        if values.len() < 2 || contamination <= 0.0 {
            return vec![false; values.len()];
        }
        let scores = self.scores(values);
        let cutoff = quantile(&scores, 1.0 - contamination);
        scores.iter().map(|&s| s > cutoff).collect()
    }
}

fn build(sample: &[f64], depth: usize, height_limit: usize, rng: &mut StdRng) -> Node {
    if sample.len() <= 1 || depth >= height_limit {
        return Node::Leaf { size: sample.len() };
    }
    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min >= max {
        return Node::Leaf { size: sample.len() };
    }
    let at = rng.gen_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = sample.iter().partition(|&&v| v < at);
    Node::Split {
        at,
        left: Box::new(build(&left, depth + 1, height_limit, rng)),
        right: Box::new(build(&right, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, x: f64, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split { at, left, right } => {
            if x < *at {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n).
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * (((n - 1.0).ln() + EULER_GAMMA) - (n - 1.0) / n)
        }
    }
}

/// Linear-interpolated quantile, `q` in [0, 1].
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spiked() -> Vec<f64> {
        vec![10.0, 10.5, 9.8, 10.2, 55.0, 10.1, 9.9, 10.3]
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.24).abs() < 0.01, "c(256) = {c256}");
    }

    #[test]
    fn test_outlier_scores_highest() {
        let values = spiked();
        let forest = IsolationForest::fit(&values, 100, 256, 42);
        let scores = forest.scores(&values);
        let top = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(top, Some(4));
    }

    #[test]
    fn test_predict_flags_outlier() {
        let values = spiked();
        let forest = IsolationForest::fit(&values, 100, 256, 42);
        let flags = forest.predict(&values, 0.15);
        assert!(flags[4]);
        assert!(flags.iter().filter(|&&f| f).count() <= 2);
    }

    #[test]
    fn test_same_seed_same_result() {
        let values = spiked();
        let a = IsolationForest::fit(&values, 50, 256, 7).scores(&values);
        let b = IsolationForest::fit(&values, 50, 256, 7).scores(&values);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_sample_flags_nothing() {
        let values = vec![3.0; 6];
        let forest = IsolationForest::fit(&values, 20, 256, 42);
        assert_eq!(forest.predict(&values, 0.15), vec![false; 6]);
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0);
        assert!((quantile(&[0.0, 10.0], 0.85) - 8.5).abs() < 1e-12);
    }
}
