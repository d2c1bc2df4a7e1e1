//! Segment and score filtering over the customer table

use crate::data::CustomerRecord;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Inclusive range of RFM scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
}

impl ScoreRange {
    pub fn new(min: i64, max: i64) -> Self {
        ScoreRange { min, max }
    }

    pub fn contains(&self, score: i64) -> bool {
        self.min <= score && score <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn overlaps(&self, other: ScoreRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.min <= other.max && other.min <= self.max
    }

    /// Narrow the range to its intersection with `bounds`.
    ///
    /// A range that does not overlap `bounds` (or either range being inverted)
    /// is returned unchanged, so it still matches nothing.
    pub fn clamp_to(&self, bounds: ScoreRange) -> ScoreRange {
        if !self.overlaps(bounds) {
            return *self;
        }
        ScoreRange {
            min: self.min.max(bounds.min),
            max: self.max.min(bounds.max),
        }
    }
}

/// User selection applied to the customer table
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub selected_segments: HashSet<String>,
    pub score_range: ScoreRange,
}

impl FilterCriteria {
    pub fn new<I, S>(segments: I, score_range: ScoreRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterCriteria {
            selected_segments: segments.into_iter().map(Into::into).collect(),
            score_range,
        }
    }

    pub fn matches(&self, record: &CustomerRecord) -> bool {
        self.selected_segments.contains(&record.segment)
            && self.score_range.contains(record.rfm_score)
    }
}

/// Keep the records matching `criteria`, preserving their relative order
pub fn filter<'a>(
    records: &'a [CustomerRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a CustomerRecord> {
    let selected: Vec<&CustomerRecord> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .collect();
    log::debug!(
        "filter kept {} of {} customers ({} segments, score {}..={})",
        selected.len(),
        records.len(),
        criteria.selected_segments.len(),
        criteria.score_range.min,
        criteria.score_range.max
    );
    selected
}

/// Options and bounds offered to the user, derived from the full table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterControls {
    /// Distinct segments, sorted
    pub segments: Vec<String>,
    /// Observed min/max score of the unfiltered table
    pub score_bounds: ScoreRange,
}

impl FilterControls {
    pub fn from_records(records: &[CustomerRecord]) -> Self {
        let segments: BTreeSet<&str> = records.iter().map(|r| r.segment.as_str()).collect();

        let score_bounds = records
            .iter()
            .map(|r| r.rfm_score)
            .fold(None, |acc: Option<ScoreRange>, score| match acc {
                None => Some(ScoreRange::new(score, score)),
                Some(range) => Some(ScoreRange::new(range.min.min(score), range.max.max(score))),
            })
            .unwrap_or(ScoreRange::new(0, 0));

        FilterControls {
            segments: segments.into_iter().map(str::to_string).collect(),
            score_bounds,
        }
    }

    /// Every segment selected, full score range
    pub fn default_criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.segments.iter().cloned(), self.score_bounds)
    }

    /// Build criteria from optional user input. `None` segments means all of
    /// them. A requested range overlapping the observed bounds is narrowed to
    /// them; one lying entirely outside is kept as is and selects nothing.
    pub fn criteria(
        &self,
        segments: Option<Vec<String>>,
        min_score: Option<i64>,
        max_score: Option<i64>,
    ) -> FilterCriteria {
        let requested = ScoreRange::new(
            min_score.unwrap_or(self.score_bounds.min),
            max_score.unwrap_or(self.score_bounds.max),
        );
        let segments = segments.unwrap_or_else(|| self.segments.clone());

        for segment in &segments {
            if !self.segments.contains(segment) {
                log::warn!("segment '{}' does not occur in the customer table", segment);
            }
        }

        if !requested.overlaps(self.score_bounds) {
            log::warn!(
                "requested score range {}..={} lies outside the observed {}..={}",
                requested.min,
                requested.max,
                self.score_bounds.min,
                self.score_bounds.max
            );
        }

        FilterCriteria::new(segments, requested.clamp_to(self.score_bounds))
    }
}
