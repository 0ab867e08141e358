//! Reward computation
//!
//! Exact matches earn a saturated bonus; everything else earns the inverse
//! squared error, which grows without bound as the error shrinks and decays
//! toward zero as it grows.

use crate::error::{ProbeError, Result};

/// Reward for a prediction that equals its label exactly
pub const EXACT_MATCH_REWARD: f64 = 500.0;

/// Scalar reward for one (label, prediction) pair
///
/// The equality branch covers the only point where the division would be
/// by zero.
pub fn reward(label: f64, predicted: f64) -> f64 {
    if predicted == label {
        return EXACT_MATCH_REWARD;
    }

    let error = label - predicted;
    1.0 / (error * error)
}

/// Apply [`reward`] pairwise over labels and predictions
///
/// Fails with [`ProbeError::ShapeMismatch`] when the slices differ in length;
/// nothing is broadcast.
pub fn reward_elementwise(labels: &[f64], predicted: &[f64]) -> Result<Vec<f64>> {
    if labels.len() != predicted.len() {
        return Err(ProbeError::ShapeMismatch {
            expected: labels.len(),
            actual: predicted.len(),
        });
    }

    Ok(labels
        .iter()
        .zip(predicted)
        .map(|(&label, &pred)| reward(label, pred))
        .collect())
}
