//! Regression trees and bagged random forests

use crate::{check_matrix, check_row, MathError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tree node stored in a flat arena; children are indices into `RegressionTree::nodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples that must end up in each child
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// CART regression tree minimising squared error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Fit a tree on the rows selected by `indices` (duplicates allowed for bootstrapping)
    pub fn fit_on(x: &[Vec<f64>], y: &[f64], indices: &[usize], params: TreeParams) -> Result<Self> {
        let n_features = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(
                "Feature rows and targets differ in length".to_string(),
            ));
        }
        if indices.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot grow a tree without samples".to_string(),
            ));
        }

        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
        };
        tree.grow(x, y, indices.to_vec(), 0, &params);
        Ok(tree)
    }

    /// Fit a tree on every row
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: TreeParams) -> Result<Self> {
        let indices: Vec<usize> = (0..x.len()).collect();
        Self::fit_on(x, y, &indices, params)
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let node = self.nodes.len();
        self.nodes.push(Node::Leaf { value: sum / n });

        let depth_exhausted = params.max_depth.map_or(false, |max| depth >= max);
        if depth_exhausted || indices.len() < params.min_samples_split.max(2) {
            return node;
        }

        let Some(split) = best_split(x, y, &indices, self.n_features, params.min_samples_leaf) else {
            return node;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    /// Predict the target for one feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        check_row(row, self.n_features)?;
        let mut current = 0;
        loop {
            match self.nodes.get(current) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    current = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => {
                    return Err(MathError::NotFitted(
                        "Regression tree has no nodes".to_string(),
                    ))
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Find the split with the lowest total squared error, if it improves on the parent
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    n_features: usize,
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;
    let min_leaf = min_samples_leaf.max(1);

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let prev = sorted[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[prev][feature];
            let hi = x[sorted[k]][feature];
            if hi <= lo || k < min_leaf || n - k < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    sse,
                });
            }
        }
    }

    best.filter(|b| parent_sse - b.sse > 1e-12 * parent_sse.abs().max(1.0))
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
    params: TreeParams,
}

impl RandomForestRegressor {
    /// Default number of trees
    pub const DEFAULT_ESTIMATORS: usize = 100;

    /// Fit `n_estimators` trees on bootstrap samples drawn with a seeded RNG
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        n_estimators: usize,
        params: TreeParams,
        seed: u64,
    ) -> Result<Self> {
        check_matrix(x)?;
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(
                "Feature rows and targets differ in length".to_string(),
            ));
        }
        if n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "Random forest needs at least one tree".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(n_estimators);
        for _ in 0..n_estimators {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit_on(x, y, &bootstrap, params)?);
        }

        Ok(Self { trees, params })
    }

    /// Average prediction of all trees for one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(MathError::NotFitted("Random forest has no trees".to_string()));
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict_row(row)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    /// Predict every row
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 10.0 } else { 50.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_tree_learns_step_function() {
        let (x, y) = step_data();
        let tree = RegressionTree::fit(&x, &y, TreeParams::default()).unwrap();

        assert_relative_eq!(tree.predict_row(&[3.0]).unwrap(), 10.0);
        assert_relative_eq!(tree.predict_row(&[35.0]).unwrap(), 50.0);
        // One split suffices: root plus two leaves
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_depth_limit_yields_mean() {
        let (x, y) = step_data();
        let params = TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &y, params).unwrap();
        assert_relative_eq!(tree.predict_row(&[0.0]).unwrap(), 30.0);
    }

    #[test]
    fn test_forest_is_reproducible() {
        let (x, y) = step_data();
        let a = RandomForestRegressor::fit(&x, &y, 10, TreeParams::default(), 7).unwrap();
        let b = RandomForestRegressor::fit(&x, &y, 10, TreeParams::default(), 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_estimators(), 10);

        let low = a.predict_row(&[2.0]).unwrap();
        let high = a.predict_row(&[38.0]).unwrap();
        assert!(low < 20.0);
        assert!(high > 40.0);
    }

    #[test]
    fn test_forest_rejects_zero_trees() {
        let (x, y) = step_data();
        assert!(RandomForestRegressor::fit(&x, &y, 0, TreeParams::default(), 1).is_err());
    }
}
