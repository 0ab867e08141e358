//! Dataset loading
//!
//! The dataset is a delimited text table with a header row. Every column but
//! the last is a feature; the last column is the label. It is loaded once,
//! validated up front and then shared read-only by every pass.

use crate::error::{ProbeError, Result};
use crate::types::Record;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Immutable, ordered table of records
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    label_name: String,
    records: Vec<Record>,
}

impl Dataset {
    /// Load a dataset from a delimited text file
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        debug!("Loading dataset from {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            ProbeError::Dataset(format!("cannot open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file, delimiter)?;

        info!(
            "Loaded {} record(s) with {} feature(s) from {}",
            dataset.len(),
            dataset.feature_names.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// Load a dataset from any reader (header row first)
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        if headers.len() < 2 {
            return Err(ProbeError::Dataset(format!(
                "expected at least 2 columns (features + label), found {}",
                headers.len()
            )));
        }

        let mut records = Vec::new();

        // Row numbers are 1-based data rows, header excluded
        for (idx, result) in reader.records().enumerate() {
            let row_no = idx + 1;
            let row = result?;

            let values = row
                .iter()
                .zip(&headers)
                .map(|(cell, column)| {
                    match cell.parse::<f64>() {
                        Ok(value) if value.is_finite() => Ok(value),
                        Ok(_) => Err(ProbeError::Dataset(format!(
                            "row {}, column '{}': '{}' is not a finite number",
                            row_no, column, cell
                        ))),
                        Err(_) => Err(ProbeError::Dataset(format!(
                            "row {}, column '{}': '{}' is not a number",
                            row_no, column, cell
                        ))),
                    }
                })
                .collect::<Result<Vec<f64>>>()?;

            records.push(Record::from_row(&values)?);
        }

        let mut feature_names = headers;
        let label_name = feature_names.pop().unwrap_or_default();

        Ok(Self {
            feature_names,
            label_name,
            records,
        })
    }

    /// Feature column names in header order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
