//! Core data structures for the reward probe
//!
//! Two groups of types live here:
//! - **Dataset-side**: [`Record`], [`FeatureMatrix`], [`LabelMatrix`]
//! - **Wire-side**: the Seldon message schema ([`SeldonMessage`],
//!   [`DefaultData`], [`Tensor`], [`FeedbackMessage`]) and the
//!   [`Prediction`] pair returned by a predict call
//!
//! Unknown response fields (`meta`, `status`, ...) are kept in `extra` so a
//! response can be echoed back to the feedback endpoint unchanged.

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};

/// One dataset row: N feature values and the trailing label
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub features: Vec<f64>,
    pub label: f64,
}

impl Record {
    /// Split a full row (features followed by label) into a record
    pub fn from_row(row: &[f64]) -> Result<Self> {
        match row.split_last() {
            Some((label, features)) if !features.is_empty() => Ok(Self {
                features: features.to_vec(),
                label: *label,
            }),
            _ => Err(ProbeError::Dataset(format!(
                "row needs at least one feature and a label, got {} value(s)",
                row.len()
            ))),
        }
    }
}

/// Single-row feature matrix with its column names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Row-major values, `rows() * cols()` long
    pub values: Vec<f64>,
    pub names: Vec<String>,
}

impl FeatureMatrix {
    /// Reshape a feature vector into shape `[1, N]`
    pub fn single_row(values: Vec<f64>, names: Vec<String>) -> Result<Self> {
        if values.len() != names.len() {
            return Err(ProbeError::ShapeMismatch {
                expected: names.len(),
                actual: values.len(),
            });
        }
        Ok(Self { values, names })
    }

    pub fn rows(&self) -> usize {
        1
    }

    pub fn cols(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows(), self.cols()]
    }

    /// Rows as nested vectors, e.g. `[[5.1, 1.4]]`
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        vec![self.values.clone()]
    }
}

/// Label reshaped to `[1, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMatrix {
    value: f64,
}

impl LabelMatrix {
    pub fn single(value: f64) -> Self {
        Self { value }
    }

    pub fn shape(&self) -> [usize; 2] {
        [1, 1]
    }

    /// Flattened values in row-major order
    pub fn values(&self) -> &[f64] {
        std::slice::from_ref(&self.value)
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        vec![vec![self.value]]
    }
}

/// Dense tensor payload: shape plus flattened values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    #[serde(default)]
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

/// `data` section of a Seldon message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensor: Option<Tensor>,

    /// Other payload encodings (`ndarray`, ...) are carried but not read
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Seldon prediction request/response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeldonMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DefaultData>,

    /// `meta`, `status` and anything else the endpoint attaches
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SeldonMessage {
    /// Build a request message carrying a tensor payload
    pub fn from_features(features: &FeatureMatrix) -> Self {
        Self {
            data: Some(DefaultData {
                names: features.names.clone(),
                tensor: Some(Tensor {
                    shape: features.shape().to_vec(),
                    values: features.values.clone(),
                }),
                extra: serde_json::Map::new(),
            }),
            extra: serde_json::Map::new(),
        }
    }

    /// Prediction values at `data.tensor.values`
    pub fn tensor_values(&self) -> Result<&[f64]> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| ProbeError::MalformedResponse("missing 'data' field".to_string()))?;

        let tensor = data.tensor.as_ref().ok_or_else(|| {
            ProbeError::MalformedResponse("missing 'data.tensor' field".to_string())
        })?;

        Ok(&tensor.values)
    }
}

/// Body of a feedback call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub request: SeldonMessage,
    pub response: SeldonMessage,
    pub reward: f64,
}

/// Request/response pair returned by a predict call
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub request: SeldonMessage,
    pub response: SeldonMessage,
}
