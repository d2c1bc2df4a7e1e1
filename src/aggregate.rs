//! KPI aggregation over a filtered customer view

use crate::data::CustomerRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Headline figures for the filtered customers.
///
/// Averages are `None` when no record carries a value ("no data"), which is
/// distinct from an average of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_customers: usize,
    pub avg_recency: Option<f64>,
    pub avg_frequency: Option<f64>,
    pub total_monetary: f64,
    /// Count per known segment, in the caller's order, zero-filled
    pub segment_distribution: Vec<SegmentCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub customers: usize,
}

impl KpiSummary {
    pub fn is_empty(&self) -> bool {
        self.total_customers == 0
    }
}

/// Arithmetic mean of the present values
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Summarize `filtered`, reporting segment counts for `known_segments`
pub fn summarize<S: AsRef<str>>(filtered: &[&CustomerRecord], known_segments: &[S]) -> KpiSummary {
    let total_customers = filtered
        .iter()
        .map(|r| r.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let total_monetary: f64 = filtered
        .iter()
        .filter_map(|r| r.monetary)
        .fold(0.0, |acc, v| acc + v);

    KpiSummary {
        total_customers,
        avg_recency: mean(filtered.iter().map(|r| r.recency)),
        avg_frequency: mean(filtered.iter().map(|r| r.frequency)),
        total_monetary,
        segment_distribution: segment_distribution(filtered, known_segments),
    }
}

/// Records per segment, one entry per known segment in the given order
pub fn segment_distribution<S: AsRef<str>>(
    filtered: &[&CustomerRecord],
    known_segments: &[S],
) -> Vec<SegmentCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in filtered {
        *counts.entry(record.segment.as_str()).or_insert(0) += 1;
    }

    known_segments
        .iter()
        .map(|segment| SegmentCount {
            segment: segment.as_ref().to_string(),
            customers: counts.get(segment.as_ref()).copied().unwrap_or(0),
        })
        .collect()
}
