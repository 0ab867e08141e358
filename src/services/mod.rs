//! Services layer for the reward probe
//!
//! Provides the prediction endpoint client.

pub mod seldon;

pub use seldon::{PredictionClient, SeldonClient};

#[cfg(test)]
pub use seldon::MockPredictionClient;
