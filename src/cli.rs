//! Command-line interface definitions and argument parsing

use crate::data::DataPaths;
use crate::filter::{FilterControls, FilterCriteria};
use crate::report::DEFAULT_PREVIEW_ROWS;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the dashboard report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Console summary
    Text,
    /// JSON payload for an external renderer
    Json,
}

/// Customer analytics dashboard over precomputed RFM, revenue and retention tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the per-customer RFM CSV file
    #[arg(long, default_value = "dashboard/rfm_data.csv")]
    pub rfm: PathBuf,

    /// Path to the revenue-per-segment CSV file (segment and value in the first two columns)
    #[arg(long, default_value = "dashboard/revenue_by_segment.csv")]
    pub revenue: PathBuf,

    /// Path to the cohort retention CSV file (cohort label in the first column)
    #[arg(long, default_value = "dashboard/retention.csv")]
    pub retention: PathBuf,

    /// Segments to include, comma-separated. Defaults to all segments;
    /// "none" selects no segment.
    /// Example: --segments "Champions,Loyal Customers"
    #[arg(short, long)]
    pub segments: Option<String>,

    /// Lowest RFM score to include (defaults to the observed minimum)
    #[arg(long)]
    pub min_score: Option<i64>,

    /// Highest RFM score to include (defaults to the observed maximum)
    #[arg(long)]
    pub max_score: Option<i64>,

    /// Number of filtered rows shown in the table preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            rfm: self.rfm.clone(),
            revenue: self.revenue.clone(),
            retention: self.retention.clone(),
        }
    }

    /// Parse the segment selection.
    /// `None` means every known segment; `Some(vec![])` selects nothing.
    pub fn parse_segments(&self) -> crate::AppResult<Option<Vec<String>>> {
        let Some(ref raw) = self.segments else {
            return Ok(None);
        };

        if raw.trim().eq_ignore_ascii_case("none") {
            return Ok(Some(Vec::new()));
        }

        let segments: Vec<String> = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            anyhow::bail!("Segments must be a comma-separated list of names, or 'none'");
        }
        Ok(Some(segments))
    }

    /// Turn the arguments into filter criteria bounded by `controls`
    pub fn filter_criteria(&self, controls: &FilterControls) -> crate::AppResult<FilterCriteria> {
        if let (Some(min), Some(max)) = (self.min_score, self.max_score) {
            if min > max {
                anyhow::bail!("Minimum score {} is greater than maximum score {}", min, max);
            }
        }
        let segments = self.parse_segments()?;
        Ok(controls.criteria(segments, self.min_score, self.max_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ScoreRange;

    fn args() -> Args {
        Args::parse_from(["rfmdash"])
    }

    fn controls() -> FilterControls {
        FilterControls {
            segments: vec!["Champions".to_string(), "Lost".to_string()],
            score_bounds: ScoreRange::new(3, 15),
        }
    }

    #[test]
    fn test_defaults() {
        let args = args();
        assert_eq!(args.data_paths(), DataPaths::default());
        assert_eq!(args.preview_rows, 50);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.parse_segments().unwrap(), None);
    }

    #[test]
    fn test_parse_segments() {
        let mut args = args();

        args.segments = Some("Champions, Lost".to_string());
        let result = args.parse_segments().unwrap();
        assert_eq!(result, Some(vec!["Champions".to_string(), "Lost".to_string()]));

        args.segments = Some("none".to_string());
        assert_eq!(args.parse_segments().unwrap(), Some(vec![]));

        args.segments = Some(" , ".to_string());
        assert!(args.parse_segments().is_err());
    }

    #[test]
    fn test_filter_criteria() {
        let mut args = Args::parse_from(["rfmdash", "--segments", "Lost", "--min-score", "5"]);
        let criteria = args.filter_criteria(&controls()).unwrap();
        assert_eq!(criteria.score_range, ScoreRange::new(5, 15));
        assert!(criteria.selected_segments.contains("Lost"));
        assert_eq!(criteria.selected_segments.len(), 1);

        args.max_score = Some(4);
        assert!(args.filter_criteria(&controls()).is_err());
    }

    #[test]
    fn test_json_format_flag() {
        let args = Args::parse_from(["rfmdash", "-f", "json", "-o", "report.json"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("report.json")));
    }
}
