//! Descriptive statistics and data splitting helpers

use crate::{MathError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use statrs::statistics::Statistics;

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }
    Ok(values.iter().mean())
}

/// Population standard deviation (ddof = 0) of a non-empty slice
pub fn population_std(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the standard deviation of an empty series".to_string(),
        ));
    }
    Ok(values.iter().population_std_dev())
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is expressed in percent and must lie in `[0, 100]`.
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a percentile of an empty series".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Percentile must be between 0 and 100, got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Shuffle `0..len` with a seeded RNG and split it into train and test indices.
///
/// The test share is rounded up, so any non-empty input with a positive ratio
/// yields at least one test index as long as one training index remains.
pub fn train_test_indices(len: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(MathError::InvalidInput(format!(
            "Test ratio must be in [0, 1), got {}",
            test_ratio
        )));
    }
    if len < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 samples to split into train and test sets".to_string(),
        ));
    }

    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((len as f64 * test_ratio).ceil() as usize).min(len - 1);
    let test = indices.split_off(len - test_size);

    Ok((indices, test))
}

/// Extract column `index` from a row-major matrix
pub fn column(rows: &[Vec<f64>], index: usize) -> Vec<f64> {
    rows.iter().map(|row| row[index]).collect()
}
