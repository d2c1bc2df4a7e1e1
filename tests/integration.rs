//! Integration tests for rfmdash

use rfmdash::{
    build_report, filter, reshape, summarize, Dashboard, DashboardError, DataLoader, DataPaths,
    FilterCriteria, ScoreRange,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

/// Test fixture holding the three CSV files alive for the duration of a test
struct Fixture {
    rfm: NamedTempFile,
    revenue: NamedTempFile,
    retention: NamedTempFile,
}

impl Fixture {
    fn new() -> Self {
        let rfm = write_csv(&[
            "customer_unique_id,recency,frequency,monetary,R_score,F_score,M_score,RFM_score,segment",
            "c1,5,3,100.0,5,5,5,10,Champion",
            "c2,90,1,10.0,1,1,1,2,Lost",
            "c3,20,2,250.5,4,4,4,12,Champion",
            "c4,40,2,75.25,3,3,3,7,Loyal",
            "c5,200,1,5.0,1,1,1,3,Lost",
        ]);
        let revenue = write_csv(&[
            "segment,payment_value",
            "Champion,350.5",
            "Loyal,75.25",
            "Lost,15.0",
        ]);
        let retention = write_csv(&[
            "cohort_month,1,2,3",
            "2017-01,1.0,0.05,0.0",
            "2017-02,1.0,0.04,",
            "2017-03,1.0,-,",
        ]);
        Fixture {
            rfm,
            revenue,
            retention,
        }
    }

    fn paths(&self) -> DataPaths {
        DataPaths {
            rfm: self.rfm.path().to_path_buf(),
            revenue: self.revenue.path().to_path_buf(),
            retention: self.retention.path().to_path_buf(),
        }
    }
}

#[test]
fn test_end_to_end_dashboard() {
    let fixture = Fixture::new();
    let loader = DataLoader::new(fixture.paths());
    let dataset = loader.load().unwrap();

    assert_eq!(dataset.customers.len(), 5);
    assert_eq!(dataset.revenue.len(), 3);
    assert_eq!(dataset.retention.rows.len(), 3);

    let dashboard = Dashboard::new(dataset);
    let controls = dashboard.controls();
    assert_eq!(controls.segments, vec!["Champion", "Lost", "Loyal"]);
    assert_eq!(controls.score_bounds, ScoreRange::new(2, 12));

    let report = dashboard.view(&controls.default_criteria(), 50);
    assert_eq!(report.kpis.total_customers, 5);
    assert_eq!(report.kpis.avg_recency, Some(71.0));
    assert_eq!(report.kpis.avg_frequency, Some(1.8));
    assert!((report.kpis.total_monetary - 440.75).abs() < 1e-9);

    let counts: Vec<(String, Option<f64>)> = report
        .segment_counts
        .bars
        .iter()
        .map(|b| (b.label.clone(), b.value))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Champion".to_string(), Some(2.0)),
            ("Lost".to_string(), Some(2.0)),
            ("Loyal".to_string(), Some(1.0)),
        ]
    );
    assert_eq!(report.preview.rows.len(), 5);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_filtered_interaction() {
    let fixture = Fixture::new();
    let loader = DataLoader::new(fixture.paths());
    let dataset = loader.load().unwrap();

    let criteria = FilterCriteria::new(["Champion", "Loyal"], ScoreRange::new(7, 10));
    let filtered = filter(&dataset.customers, &criteria);
    let ids: Vec<&str> = filtered.iter().map(|r| r.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c4"]);

    let summary = summarize(&filtered, &["Champion", "Lost", "Loyal"]);
    assert_eq!(summary.total_customers, 2);
    assert_eq!(summary.avg_recency, Some(22.5));
    assert_eq!(
        summary
            .segment_distribution
            .iter()
            .map(|c| c.customers)
            .collect::<Vec<_>>(),
        vec![1, 0, 1]
    );
}

#[test]
fn test_empty_result_renders_without_failing() {
    let fixture = Fixture::new();
    let loader = DataLoader::new(fixture.paths());
    let dataset = loader.load().unwrap();

    let criteria = FilterCriteria::new(["Champion"], ScoreRange::new(0, 1));
    let report = build_report(dataset, &criteria, 50);

    assert_eq!(report.kpis.total_customers, 0);
    assert_eq!(report.kpis.avg_recency, None);
    assert_eq!(report.kpis.avg_frequency, None);
    assert_eq!(report.kpis.total_monetary, 0.0);
    assert_eq!(report.warnings.len(), 1);

    let text = rfmdash::viz::render_text(&report);
    assert!(text.contains("Total customers (filtered): 0"));
    assert!(text.contains("no rows"));
}

#[test]
fn test_retention_missing_cells_stay_missing() {
    let fixture = Fixture::new();
    let loader = DataLoader::new(fixture.paths());
    let dataset = loader.load().unwrap();

    let matrix = reshape(&dataset.retention);
    assert_eq!(matrix.cohorts, vec!["2017-01", "2017-02", "2017-03"]);
    assert_eq!(matrix.periods, vec!["1", "2", "3"]);
    assert_eq!(matrix.get("2017-01", "3"), Some(0.0));
    assert_eq!(matrix.get("2017-02", "3"), None);
    assert_eq!(matrix.get("2017-03", "2"), None);
    assert_eq!(matrix.get("2017-01", "2"), Some(0.05));
}

#[test]
fn test_loader_returns_cached_dataset() {
    let fixture = Fixture::new();
    let loader = DataLoader::new(fixture.paths());

    let first = loader.load().unwrap();
    let first_len = first.customers.len();
    let first_ptr = first as *const _;

    // Later edits on disk are not observed by the running loader
    let mut rfm = std::fs::OpenOptions::new()
        .append(true)
        .open(fixture.rfm.path())
        .unwrap();
    writeln!(rfm, "c6,1,1,1.0,1,1,1,5,Loyal").unwrap();

    let second = loader.load().unwrap();
    assert_eq!(first_ptr, second as *const _);
    assert_eq!(second.customers.len(), first_len);
}

#[test]
fn test_missing_file_names_the_file() {
    let fixture = Fixture::new();
    let dir = tempfile::tempdir().unwrap();
    let mut paths = fixture.paths();
    paths.retention = dir.path().join("retention.csv");

    let loader = DataLoader::new(paths);
    let err = loader.load().unwrap_err();
    assert!(matches!(err, DashboardError::Io { .. }));
    assert!(err.path().ends_with("retention.csv"));
    assert!(!loader.is_loaded());
}

#[test]
fn test_missing_rfm_column_is_schema_error() {
    let fixture = Fixture::new();
    let rfm = write_csv(&[
        "customer_unique_id,recency,frequency,monetary,segment",
        "c1,5,3,100.0,Champion",
    ]);
    let mut paths = fixture.paths();
    paths.rfm = rfm.path().to_path_buf();

    let err = DataLoader::new(paths).load().unwrap_err();
    assert!(matches!(err, DashboardError::Schema { .. }));
    assert!(err.to_string().contains("rfm_score"));
}
