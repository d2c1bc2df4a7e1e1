//! Error and warning types for dataset loading and filtering

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the dashboard datasets.
///
/// Every variant names the file it concerns so the entry point can tell the
/// user which dataset failed and why.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("schema mismatch in {}: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },
}

impl DashboardError {
    /// Path of the dataset that caused the error
    pub fn path(&self) -> &std::path::Path {
        match self {
            DashboardError::Io { path, .. }
            | DashboardError::Malformed { path, .. }
            | DashboardError::Schema { path, .. } => path,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DashboardError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DashboardError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions attached to a dashboard report
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error(
        "no customers match {selected_segments} selected segment(s) \
         with score in {min_score}..={max_score}"
    )]
    EmptyResult {
        selected_segments: usize,
        min_score: i64,
        max_score: i64,
    },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
