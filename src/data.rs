//! Dataset loading using Polars
//!
//! The three input CSV files are read with Polars, resolved against their
//! [`TableSchema`](crate::schema::TableSchema) and converted into typed,
//! immutable tables. Identifier and label columns are kept verbatim as text;
//! measure columns are cast to `Float64` by Polars, whose non-strict cast turns
//! unparseable cells into nulls. Nulls and non-finite values become `None`, so
//! absent values stay distinguishable from zero.

use crate::error::{DashboardError, Result};
use crate::schema::{
    integral_score, present, ColumnMap, TableSchema, RETENTION_SCHEMA, REVENUE_SCHEMA, RFM_SCHEMA,
};
use polars::prelude::*;
use serde::Serialize;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

/// One row per unique customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    /// Days since last activity
    pub recency: Option<f64>,
    /// Number of transactions
    pub frequency: Option<f64>,
    /// Total spend
    pub monetary: Option<f64>,
    pub rfm_score: i64,
    pub segment: String,
}

/// Total revenue attributed to one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRevenue {
    pub segment: String,
    pub total_revenue: Option<f64>,
}

/// One cohort with its per-period retention rates, in header order.
/// `None` marks a cell that was empty or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortRetentionRow {
    pub cohort_label: String,
    pub cells: Vec<Option<f64>>,
}

/// Retention rates per cohort and period, as read from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionTable {
    /// Period labels (every header column after the cohort label)
    pub periods: Vec<String>,
    pub rows: Vec<CohortRetentionRow>,
}

/// Immutable handle to the three loaded tables
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
    pub revenue: Vec<SegmentRevenue>,
    pub retention: RetentionTable,
}

/// Locations of the three input files
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub rfm: PathBuf,
    pub revenue: PathBuf,
    pub retention: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            rfm: PathBuf::from("dashboard/rfm_data.csv"),
            revenue: PathBuf::from("dashboard/revenue_by_segment.csv"),
            retention: PathBuf::from("dashboard/retention.csv"),
        }
    }
}

/// Loads the dataset once and hands out the same in-memory copy afterwards.
///
/// The loader is owned by the entry point; dropping it drops the cache. Files
/// changed on disk after the first successful load are not observed.
#[derive(Debug)]
pub struct DataLoader {
    paths: DataPaths,
    cache: OnceCell<Dataset>,
}

impl DataLoader {
    pub fn new(paths: DataPaths) -> Self {
        DataLoader {
            paths,
            cache: OnceCell::new(),
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Return the cached dataset, reading it from disk on first use.
    ///
    /// # Returns
    /// * The same `&Dataset` on every successful call
    ///
    /// # Errors
    /// * [`DashboardError`] naming the file that could not be loaded. A failed
    ///   load leaves the cache empty so a later call retries.
    pub fn load(&self) -> Result<&Dataset> {
        if let Some(dataset) = self.cache.get() {
            log::debug!("dataset served from cache");
            return Ok(dataset);
        }
        let dataset = load_dataset(&self.paths)?;
        Ok(self.cache.get_or_init(|| dataset))
    }
}

/// Read all three tables from disk without caching
///
/// # Arguments
/// * `paths` - Locations of the RFM, revenue and retention CSV files
///
/// # Returns
/// * `Dataset` holding the typed tables, or the first load error encountered
pub fn load_dataset(paths: &DataPaths) -> Result<Dataset> {
    let customers = load_customers(&paths.rfm)?;
    let revenue = load_revenue(&paths.revenue)?;
    let retention = load_retention(&paths.retention)?;

    log::info!(
        "loaded {} customers, {} revenue rows, {} cohorts x {} periods",
        customers.len(),
        revenue.len(),
        retention.rows.len(),
        retention.periods.len()
    );

    Ok(Dataset {
        customers,
        revenue,
        retention,
    })
}

/// Load the per-customer RFM table
///
/// # Arguments
/// * `path` - CSV file with customer id, recency, frequency, monetary,
///   RFM score and segment columns (matched by name, extra columns ignored)
///
/// # Returns
/// * One `CustomerRecord` per row, in file order
pub fn load_customers(path: &Path) -> Result<Vec<CustomerRecord>> {
    let table = CsvTable::read(path)?;
    let map = table.resolve(&RFM_SCHEMA)?;

    let segment_col = table.field(&map, "segment")?;
    let score_col = table.field(&map, "rfm_score")?;

    let ids = table.text_column(table.field(&map, "customer_id")?)?;
    let segments = table.text_column(segment_col)?;
    let raw_scores = table.text_column(score_col)?;
    let scores = table.measure_column(score_col)?;
    let recency = table.measure_column(table.field(&map, "recency")?)?;
    let frequency = table.measure_column(table.field(&map, "frequency")?)?;
    let monetary = table.measure_column(table.field(&map, "monetary")?)?;

    let mut records = Vec::with_capacity(ids.len());
    for (row, customer_id) in ids.into_iter().enumerate() {
        let customer_id =
            customer_id.ok_or_else(|| table.malformed_row(row, "empty customer id"))?;

        let segment = segments[row].clone().ok_or_else(|| {
            table.malformed_row(row, &format!("customer '{}' has no segment", customer_id))
        })?;

        let rfm_score = integral_score(scores[row]).ok_or_else(|| {
            let raw = raw_scores[row].as_deref().unwrap_or("");
            table.malformed_row(row, &format!("invalid RFM score '{}'", raw))
        })?;

        records.push(CustomerRecord {
            customer_id,
            recency: recency[row],
            frequency: frequency[row],
            monetary: monetary[row],
            rfm_score,
            segment,
        });
    }

    log::debug!("{}: {} customer records", path.display(), records.len());
    Ok(records)
}

/// Load the revenue-per-segment table from its first two columns
///
/// # Arguments
/// * `path` - CSV file whose first column is the segment and second the revenue
///
/// # Returns
/// * One `SegmentRevenue` per labelled row; rows without a segment are skipped
pub fn load_revenue(path: &Path) -> Result<Vec<SegmentRevenue>> {
    let table = CsvTable::read(path)?;
    let map = table.resolve(&REVENUE_SCHEMA)?;

    let segments = table.text_column(table.field(&map, "segment")?)?;
    let values = table.measure_column(table.field(&map, "total_revenue")?)?;

    let mut rows = Vec::with_capacity(segments.len());
    for (row, (segment, total_revenue)) in segments.into_iter().zip(values).enumerate() {
        let Some(segment) = segment else {
            log::warn!(
                "{}: skipping line {} without a segment label",
                path.display(),
                row + 2
            );
            continue;
        };
        rows.push(SegmentRevenue {
            segment,
            total_revenue,
        });
    }

    Ok(rows)
}

/// Load the cohort retention table: cohort label first, one rate per period
///
/// # Arguments
/// * `path` - CSV file with the cohort label in the first column
///
/// # Returns
/// * `RetentionTable` with the period headers and one row per cohort
pub fn load_retention(path: &Path) -> Result<RetentionTable> {
    let table = CsvTable::read(path)?;
    let map = table.resolve(&RETENTION_SCHEMA)?;

    let labels = table.text_column(table.field(&map, "cohort_label")?)?;
    let period_cols = map.trailing();

    let periods = period_cols
        .iter()
        .map(|&idx| table.header[idx].trim().to_string())
        .collect();
    let columns = period_cols
        .iter()
        .map(|&idx| table.measure_column(idx))
        .collect::<Result<Vec<_>>>()?;

    let rows = labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| CohortRetentionRow {
            cohort_label: label.unwrap_or_default(),
            cells: columns.iter().map(|column| column[row]).collect(),
        })
        .collect();

    Ok(RetentionTable { periods, rows })
}

/// A CSV file loaded into a Polars frame with every column read as text
struct CsvTable {
    path: PathBuf,
    header: Vec<String>,
    frame: DataFrame,
}

impl CsvTable {
    fn read(path: &Path) -> Result<Self> {
        // Surface a missing or unreadable file as an IO error before Polars
        // wraps it into its own error type.
        std::fs::File::open(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // A zero-length inference window reads every column as text, so ids
        // such as "00123" survive; measures are cast per column afterwards.
        let frame = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| DashboardError::malformed(path, e.to_string()))?;

        let header = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        Ok(CsvTable {
            path: path.to_path_buf(),
            header,
            frame,
        })
    }

    fn resolve(&self, schema: &TableSchema) -> Result<ColumnMap> {
        schema
            .resolve(&self.header)
            .map_err(|reason| DashboardError::schema(&self.path, reason))
    }

    fn field(&self, map: &ColumnMap, field: &str) -> Result<usize> {
        map.index(field).ok_or_else(|| {
            DashboardError::schema(&self.path, format!("column '{}' was not resolved", field))
        })
    }

    fn series(&self, idx: usize) -> Result<&Series> {
        self.frame.select_at_idx(idx).ok_or_else(|| {
            DashboardError::schema(&self.path, format!("no column at position {}", idx))
        })
    }

    /// Trimmed text values; nulls and blank cells are `None`
    fn text_column(&self, idx: usize) -> Result<Vec<Option<String>>> {
        let text = self
            .series(idx)?
            .cast(&DataType::String)
            .map_err(|e| self.polars_error(e))?;
        let values = text
            .str()
            .map_err(|e| self.polars_error(e))?
            .into_iter()
            .map(|v| {
                v.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();
        Ok(values)
    }

    /// Numeric values; cells Polars cannot cast to `Float64` are `None`
    fn measure_column(&self, idx: usize) -> Result<Vec<Option<f64>>> {
        let numeric = self
            .series(idx)?
            .cast(&DataType::Float64)
            .map_err(|e| self.polars_error(e))?;
        let values = numeric
            .f64()
            .map_err(|e| self.polars_error(e))?
            .into_iter()
            .map(present)
            .collect();
        Ok(values)
    }

    fn polars_error(&self, err: PolarsError) -> DashboardError {
        DashboardError::malformed(&self.path, err.to_string())
    }

    fn malformed_row(&self, row: usize, reason: &str) -> DashboardError {
        // +1 for the header, +1 for 1-based line numbers
        DashboardError::malformed(&self.path, format!("line {}: {}", row + 2, reason))
    }
}
