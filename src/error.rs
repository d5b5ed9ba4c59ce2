//! Error kinds that abort a single report or the prediction feature.
//!
//! Plumbing (file access, CSV decoding, JSON) stays on `anyhow`; these are the
//! failures a user sees as a notice while the rest of the tool keeps working.

use thiserror::Error;

use crate::schema::Field;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    /// None of the accepted spellings for a required column is in the dataset.
    #[error("column for {field} not found (accepted names: {})", aliases.join(", "))]
    MissingColumn { field: Field, aliases: Vec<String> },

    /// The grouping produced nothing to report on.
    #[error("{report}: {reason}")]
    EmptyAggregation { report: String, reason: String },

    #[error("prediction unavailable: {0}")]
    ModelUnavailable(String),

    #[error("bucket width must be a positive finite number, got {0}")]
    InvalidBucketWidth(f64),

    #[error("invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
}

impl ReportError {
    pub fn empty(report: &str, reason: &str) -> Self {
        ReportError::EmptyAggregation {
            report: report.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ReportError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Warnings are reported but are not failures of the tool itself.
    pub fn is_warning(&self) -> bool {
        matches!(self, ReportError::EmptyAggregation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_aliases() {
        let err = ReportError::MissingColumn {
            field: Field::WarehouseBlock,
            aliases: vec!["warehouse_block".into(), "Warehouse_block".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("warehouse_block, Warehouse_block"));
    }

    #[test]
    fn test_only_empty_aggregation_is_warning() {
        assert!(ReportError::empty("late-share-by-mode", "no late shipments").is_warning());
        assert!(!ReportError::ModelUnavailable("gone".into()).is_warning());
    }
}
