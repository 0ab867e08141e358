//! Reward Probe - Feedback Loop for Deployed Models
//!
//! Replays a labelled dataset through a Seldon deployment and reports a
//! reward for every prediction, so the serving system can monitor or learn
//! online:
//! - Records are predicted one at a time, in dataset order
//! - Exact predictions earn a fixed bonus, others the inverse squared error
//! - The reward goes back with the original request/response pair
//!
//! # Architecture
//!
//! - **Types**: dataset records and the Seldon message schema
//! - **Dataset**: delimited-text loading
//! - **Reward**: the scoring function
//! - **Services**: prediction endpoint client
//! - **Driver**: the predict → score → feedback loop
//!
//! # Example
//!
//! ```ignore
//! use reward_probe_core::{Dataset, FeedbackDriver, ProbeConfig, SeldonClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ProbeConfig::default();
//!     let dataset = Dataset::from_path(&config.dataset, config.delimiter_byte()?)?;
//!     let client = SeldonClient::new(&config.endpoint)?;
//!
//!     let driver = FeedbackDriver::new(Arc::new(client), Arc::new(dataset));
//!     driver.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod driver;
pub mod error;
pub mod reward;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::{EndpointConfig, GatewayMode, ProbeConfig};
pub use dataset::Dataset;
pub use driver::{FeedbackDriver, PassReport, StopHandle};
pub use error::{ProbeError, Result};
pub use reward::{reward, reward_elementwise, EXACT_MATCH_REWARD};
pub use services::{PredictionClient, SeldonClient};
pub use types::{FeatureMatrix, LabelMatrix, Prediction, Record, SeldonMessage};
