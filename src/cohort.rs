//! Cohort retention matrix

use crate::data::RetentionTable;
use crate::schema::present;
use ndarray::Array2;

/// Retention rates indexed by (cohort, period).
///
/// A cell is `None` when the cohort has no value for that period, which the
/// heatmap shows as blank. `Some(0.0)` is a real zero retention rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortMatrix {
    pub cohorts: Vec<String>,
    pub periods: Vec<String>,
    pub values: Array2<Option<f64>>,
}

impl CohortMatrix {
    pub fn get(&self, cohort: &str, period: &str) -> Option<f64> {
        let row = self.cohorts.iter().position(|c| c == cohort)?;
        let col = self.periods.iter().position(|p| p == period)?;
        self.values[[row, col]]
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest and largest present value
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Number of absent cells
    pub fn missing_cells(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Reshape retention rows into a cohort × period matrix.
///
/// Cells that are absent or not finite stay absent instead of failing the
/// whole table; rows shorter than the header are padded with absent cells.
pub fn reshape(table: &RetentionTable) -> CohortMatrix {
    let n_rows = table.rows.len();
    let n_cols = table.periods.len();

    let mut values = Array2::from_elem((n_rows, n_cols), None);
    for (i, row) in table.rows.iter().enumerate() {
        for (j, cell) in row.cells.iter().take(n_cols).enumerate() {
            values[[i, j]] = present(*cell);
        }
    }

    let matrix = CohortMatrix {
        cohorts: table.rows.iter().map(|r| r.cohort_label.clone()).collect(),
        periods: table.periods.clone(),
        values,
    };
    log::debug!(
        "cohort matrix {}x{} with {} missing cells",
        n_rows,
        n_cols,
        matrix.missing_cells()
    );
    matrix
}
