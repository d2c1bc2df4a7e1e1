//! rfmdash: customer analytics dashboard core
//!
//! Loads precomputed RFM, revenue-per-segment and cohort retention tables,
//! filters customers by segment and RFM score, aggregates KPIs and reshapes
//! cohort retention into a heatmap matrix. The resulting report is printed to
//! the console or serialized as JSON for an external renderer.

pub mod aggregate;
pub mod cli;
pub mod cohort;
pub mod data;
pub mod error;
pub mod filter;
pub mod report;
pub mod schema;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{summarize, KpiSummary, SegmentCount};
pub use cli::{Args, OutputFormat};
pub use cohort::{reshape, CohortMatrix};
pub use data::{load_dataset, CustomerRecord, DataLoader, DataPaths, Dataset, SegmentRevenue};
pub use error::{DashboardError, Result, Warning};
pub use filter::{filter, FilterControls, FilterCriteria, ScoreRange};
pub use report::{build_report, Dashboard, DashboardReport};

/// Result type used by the command-line layer
pub type AppResult<T> = anyhow::Result<T>;
