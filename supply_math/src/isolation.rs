//! Isolation forest anomaly scores
//!
//! Points that are isolated by few random splits are anomalous. Scores follow the
//! usual convention of `-2^(-E[h(x)] / c(psi))`: values close to -1 are anomalies,
//! values around -0.5 are unremarkable. The decision threshold (`offset`) is the
//! `contamination` percentile of the training scores, so a negative decision value
//! marks an outlier.

use crate::stats::percentile;
use crate::{check_matrix, check_row, MathError, Result};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum IsolationNode {
    External {
        size: usize,
    },
    Internal {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<IsolationNode>,
}

impl IsolationTree {
    fn build(x: &[Vec<f64>], sample: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, sample, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        sample: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let node = self.nodes.len();
        self.nodes.push(IsolationNode::External { size: sample.len() });

        if depth >= max_depth || sample.len() <= 1 {
            return node;
        }

        // Try features in random order until one still varies within this node
        let width = x[sample[0]].len();
        let mut features: Vec<usize> = (0..width).collect();
        features.shuffle(rng);

        for feature in features {
            let (lo, hi) = sample.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(x[i][feature]), hi.max(x[i][feature]))
            });
            if hi <= lo {
                continue;
            }

            let threshold = rng.gen_range(lo..hi);
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                sample.into_iter().partition(|&i| x[i][feature] < threshold);

            let left = self.grow(x, left_idx, depth + 1, max_depth, rng);
            let right = self.grow(x, right_idx, depth + 1, max_depth, rng);
            self.nodes[node] = IsolationNode::Internal {
                feature,
                threshold,
                left,
                right,
            };
            return node;
        }

        node
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut current = 0;
        let mut depth = 0.0;
        while let Some(node) = self.nodes.get(current) {
            match node {
                IsolationNode::External { size } => return depth + average_path_length(*size),
                IsolationNode::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
        depth
    }
}

/// Average path length of an unsuccessful binary search tree lookup over `n` points
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

/// Isolation forest configuration and fitted trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    n_features: usize,
    sample_size: usize,
    contamination: f64,
    offset: f64,
}

impl IsolationForest {
    pub const DEFAULT_ESTIMATORS: usize = 100;
    pub const DEFAULT_MAX_SAMPLES: usize = 256;

    /// Fit a forest of `n_estimators` isolation trees.
    ///
    /// `contamination` is the expected share of outliers in the training data and
    /// must lie in `(0, 0.5]`.
    pub fn fit(x: &[Vec<f64>], n_estimators: usize, contamination: f64, seed: u64) -> Result<Self> {
        let n_features = check_matrix(x)?;
        if n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "Isolation forest needs at least one tree".to_string(),
            ));
        }
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(MathError::InvalidInput(format!(
                "Contamination must be in (0, 0.5], got {}",
                contamination
            )));
        }

        let sample_size = x.len().min(Self::DEFAULT_MAX_SAMPLES);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, x.len(), sample_size).into_vec();
                IsolationTree::build(x, sample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            n_features,
            sample_size,
            contamination,
            offset: 0.0,
        };

        let training_scores = x
            .iter()
            .map(|row| forest.score_row(row))
            .collect::<Result<Vec<f64>>>()?;
        forest.offset = percentile(&training_scores, contamination * 100.0)?;

        Ok(forest)
    }

    /// Anomaly score for one row; lower means more anomalous, range `[-1, 0)`
    pub fn score_row(&self, row: &[f64]) -> Result<f64> {
        check_row(row, self.n_features)?;
        if self.trees.is_empty() {
            return Err(MathError::NotFitted("Isolation forest has no trees".to_string()));
        }

        let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        let normaliser = average_path_length(self.sample_size).max(f64::EPSILON);

        Ok(-(2f64.powf(-mean_depth / normaliser)))
    }

    /// Score shifted by the training offset; negative values are outliers
    pub fn decision_row(&self, row: &[f64]) -> Result<f64> {
        Ok(self.score_row(row)? - self.offset)
    }

    /// `true` when the row is classified as an outlier
    pub fn is_outlier(&self, row: &[f64]) -> Result<bool> {
        Ok(self.decision_row(row)? < 0.0)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cluster() -> Vec<Vec<f64>> {
        (0..300)
            .map(|i| {
                let a = ((i * 37) % 100) as f64 / 100.0;
                let b = ((i * 53) % 100) as f64 / 100.0;
                vec![a, b]
            })
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_relative_eq!(average_path_length(1), 0.0);
        assert_relative_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > 9.0 && average_path_length(256) < 11.0);
    }

    #[test]
    fn test_outlier_scores_lower_than_inlier() {
        let data = cluster();
        let forest = IsolationForest::fit(&data, 100, 0.05, 42).unwrap();

        let inlier = forest.score_row(&[0.5, 0.5]).unwrap();
        let outlier = forest.score_row(&[8.0, -6.0]).unwrap();

        assert!(outlier < inlier);
        assert!(forest.is_outlier(&[8.0, -6.0]).unwrap());
        assert!(!forest.is_outlier(&[0.5, 0.5]).unwrap());
        assert!((-1.0..0.0).contains(&outlier));
    }

    #[test]
    fn test_scores_are_deterministic() {
        let data = cluster();
        let a = IsolationForest::fit(&data, 20, 0.1, 3).unwrap();
        let b = IsolationForest::fit(&data, 20, 0.1, 3).unwrap();
        assert_eq!(a.score_row(&[0.2, 0.9]).unwrap(), b.score_row(&[0.2, 0.9]).unwrap());
        assert_eq!(a.offset(), b.offset());
    }

    #[test]
    fn test_invalid_contamination() {
        let data = cluster();
        assert!(IsolationForest::fit(&data, 10, 0.0, 1).is_err());
        assert!(IsolationForest::fit(&data, 10, 0.7, 1).is_err());
    }
}
