//! Isolation Forest anomaly detection
//!
//! Randomized partitioning trees over the feature matrix. Points that are
//! isolated in few splits get high scores. All randomness comes from one
//! `StdRng` seeded at fit time, so identical input always yields identical
//! trees.

use super::{AnomalyLabel, AnomalyResult, MultivariateDetector};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// A node in an isolation tree
#[derive(Debug, Clone)]
enum IsolationNode {
    /// Internal node with split information
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf node with size (number of samples)
    Leaf { size: usize },
}

/// Single isolation tree
#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    /// Build an isolation tree over the given sample rows
    fn build(data: &Array2<f64>, indices: &[usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let root = Self::build_node(data, indices, 0, max_depth, rng);
        Self { root }
    }

    fn build_node(
        data: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> IsolationNode {
        let n_samples = indices.len();

        if depth >= max_depth || n_samples <= 1 {
            return IsolationNode::Leaf { size: n_samples };
        }

        // Only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|feature| {
                let (min_val, max_val) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| (lo.min(data[[i, feature]]), hi.max(data[[i, feature]])),
                );
                if max_val > min_val {
                    Some((feature, min_val, max_val))
                } else {
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            return IsolationNode::Leaf { size: n_samples };
        }

        let (feature, min_val, max_val) = candidates[rng.gen_range(0..candidates.len())];

        // Convex combination cannot overflow even when max - min would
        let u: f64 = rng.gen();
        let mut threshold = min_val * (1.0 - u) + max_val * u;
        if threshold >= max_val {
            threshold = min_val;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| data[[i, feature]] <= threshold);

        IsolationNode::Internal {
            feature,
            threshold,
            left: Box::new(Self::build_node(data, &left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_node(data, &right, depth + 1, max_depth, rng)),
        }
    }

    /// Compute path length for a single sample
    fn path_length(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;

        loop {
            match node {
                IsolationNode::Leaf { size } => return depth as f64 + average_path_length(*size),
                IsolationNode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100]
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Isolation Forest for anomaly detection
#[derive(Debug, Clone)]
pub struct IsolationForest {
    /// Number of trees in the forest
    pub n_estimators: usize,
    /// Maximum number of samples per tree
    pub max_samples: usize,
    /// Contamination rate (expected proportion of anomalies)
    pub contamination: f64,
    /// Random seed
    pub seed: u64,
    /// Trained trees
    trees: Vec<IsolationTree>,
    /// Rows actually drawn per tree during fit
    sample_size: usize,
    /// Threshold for anomaly detection
    threshold: Option<f64>,
}

impl IsolationForest {
    /// Create a new Isolation Forest
    ///
    /// # Arguments
    /// * `n_estimators` - Number of trees (default: 100)
    /// * `contamination` - Expected anomaly rate
    pub fn new(n_estimators: usize, contamination: f64) -> Self {
        Self {
            n_estimators,
            max_samples: 256,
            contamination,
            seed: 42,
            trees: Vec::new(),
            sample_size: 0,
            threshold: None,
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set max samples per tree
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }

    /// Whether `fit` has produced trees
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Decision threshold learned during fit
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Compute anomaly scores `2^(-E[h(x)] / c(ψ))` for samples
    pub fn score_samples(&self, data: &Array2<f64>) -> Array1<f64> {
        let c = average_path_length(self.sample_size);

        data.rows()
            .into_iter()
            .map(|sample| {
                if self.trees.is_empty() || c <= 0.0 {
                    return 0.5;
                }
                let avg_path_length: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(sample))
                    .sum::<f64>()
                    / self.trees.len() as f64;

                2.0_f64.powf(-avg_path_length / c)
            })
            .collect()
    }
}

impl MultivariateDetector for IsolationForest {
    fn fit(&mut self, data: &Array2<f64>) {
        let n_samples = data.nrows();
        self.trees.clear();
        self.threshold = None;

        if n_samples == 0 {
            self.sample_size = 0;
            return;
        }

        self.sample_size = self.max_samples.min(n_samples);
        let max_depth = (self.sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(self.seed);

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let indices: Vec<usize> = if self.sample_size < n_samples {
                    index::sample(&mut rng, n_samples, self.sample_size).into_vec()
                } else {
                    (0..n_samples).collect()
                };

                IsolationTree::build(data, &indices, max_depth, &mut rng)
            })
            .collect();

        // Roughly `contamination` of the training rows score above this
        let scores = self.score_samples(data).to_vec();
        self.threshold = percentile(&scores, 100.0 * (1.0 - self.contamination));
    }

    fn detect(&self, data: &Array2<f64>) -> AnomalyResult {
        if !self.is_fitted() {
            return AnomalyResult::all_normal(data.nrows());
        }

        let scores = self.score_samples(data);
        let labels: Vec<AnomalyLabel> = match self.threshold {
            Some(threshold) => scores
                .iter()
                .map(|&s| {
                    if s > threshold {
                        AnomalyLabel::Anomalous
                    } else {
                        AnomalyLabel::Normal
                    }
                })
                .collect(),
            None => vec![AnomalyLabel::Normal; data.nrows()],
        };

        AnomalyResult::new(labels, scores.to_vec(), self.threshold)
    }

    fn name(&self) -> &str {
        "IsolationForest"
    }
}
