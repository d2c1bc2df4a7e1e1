//! Dashboard assembly: one report per user interaction

use crate::aggregate::{summarize, KpiSummary};
use crate::cohort::{reshape, CohortMatrix};
use crate::data::{CustomerRecord, Dataset};
use crate::error::Warning;
use crate::filter::{filter, FilterControls, FilterCriteria, ScoreRange};
use crate::viz::{self, BarSeries, HeatmapData, ScatterGroup};
use serde::Serialize;

/// Default number of rows in the table preview
pub const DEFAULT_PREVIEW_ROWS: usize = 50;

/// Criteria as applied, in a stable order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilter {
    pub segments: Vec<String>,
    pub score_range: ScoreRange,
}

impl From<&FilterCriteria> for AppliedFilter {
    fn from(criteria: &FilterCriteria) -> Self {
        let mut segments: Vec<String> = criteria.selected_segments.iter().cloned().collect();
        segments.sort();
        AppliedFilter {
            segments,
            score_range: criteria.score_range,
        }
    }
}

/// First rows of the filtered table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    /// Number of filtered rows before truncation
    pub total_rows: usize,
    pub rows: Vec<CustomerRecord>,
}

/// Everything the presentation layer needs for one interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub filter: AppliedFilter,
    pub kpis: KpiSummary,
    pub segment_counts: BarSeries,
    pub segment_revenue: BarSeries,
    pub scatter: Vec<ScatterGroup>,
    pub retention: HeatmapData,
    pub preview: TablePreview,
    pub warnings: Vec<Warning>,
}

impl DashboardReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn table_preview(filtered: &[&CustomerRecord], limit: usize) -> TablePreview {
    TablePreview {
        total_rows: filtered.len(),
        rows: filtered.iter().take(limit).map(|r| (*r).clone()).collect(),
    }
}

/// A loaded dataset together with the controls and cohort matrix derived
/// from it. Neither depends on the filter, so they are computed once.
#[derive(Debug)]
pub struct Dashboard<'a> {
    dataset: &'a Dataset,
    controls: FilterControls,
    cohorts: CohortMatrix,
}

impl<'a> Dashboard<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Dashboard {
            dataset,
            controls: FilterControls::from_records(&dataset.customers),
            cohorts: reshape(&dataset.retention),
        }
    }

    pub fn controls(&self) -> &FilterControls {
        &self.controls
    }

    pub fn cohorts(&self) -> &CohortMatrix {
        &self.cohorts
    }

    /// Recompute the filtered view, KPIs and chart series for `criteria`
    pub fn view(&self, criteria: &FilterCriteria, preview_rows: usize) -> DashboardReport {
        let known_segments = &self.controls.segments;
        let filtered = filter(&self.dataset.customers, criteria);
        let kpis = summarize(&filtered, known_segments);

        let mut warnings = Vec::new();
        if filtered.is_empty() {
            let warning = Warning::EmptyResult {
                selected_segments: criteria.selected_segments.len(),
                min_score: criteria.score_range.min,
                max_score: criteria.score_range.max,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
        }

        DashboardReport {
            filter: AppliedFilter::from(criteria),
            segment_counts: viz::segment_count_series(&kpis),
            segment_revenue: viz::segment_revenue_series(&self.dataset.revenue),
            scatter: viz::scatter_by_segment(&filtered, known_segments),
            retention: viz::heatmap(&self.cohorts),
            preview: table_preview(&filtered, preview_rows),
            kpis,
            warnings,
        }
    }
}

/// Build a single report without keeping a [`Dashboard`] around
///
/// # Arguments
/// * `dataset` - Loaded tables; segment options and score bounds are derived
///   from its customer table
/// * `criteria` - Segment selection and inclusive score range to apply
/// * `preview_rows` - Maximum number of filtered rows in the table preview
///
/// # Returns
/// * `DashboardReport` with KPIs, chart series, heatmap, preview and warnings
pub fn build_report(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    preview_rows: usize,
) -> DashboardReport {
    Dashboard::new(dataset).view(criteria, preview_rows)
}
