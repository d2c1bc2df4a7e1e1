//! Chart series for the presentation layer and a plain-text rendering of the
//! dashboard for the console.
//!
//! Nothing here draws pixels: the series are handed to whatever renderer
//! consumes the JSON report. The text rendering mirrors the dashboard layout
//! (KPI row, bar charts, heatmap, table preview).

use crate::aggregate::KpiSummary;
use crate::cohort::CohortMatrix;
use crate::data::{CustomerRecord, SegmentRevenue};
use crate::report::{DashboardReport, TablePreview};
use serde::Serialize;
use std::fmt::Write as _;

/// Width of the longest bar in the text rendering
const BAR_WIDTH: usize = 40;

/// A labelled bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    /// `None` when the source value was absent
    pub value: Option<f64>,
}

/// Frequency vs monetary points of one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterGroup {
    pub segment: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub customer_id: String,
    pub frequency: f64,
    pub monetary: f64,
}

/// Heatmap cells with the colour-scale bounds of the present values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapData {
    pub title: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Customers per segment, zero-filled for unselected segments
pub fn segment_count_series(kpis: &KpiSummary) -> BarSeries {
    BarSeries {
        title: "Customers per Segment".to_string(),
        x_label: "Segment".to_string(),
        y_label: "Customers".to_string(),
        bars: kpis
            .segment_distribution
            .iter()
            .map(|c| Bar {
                label: c.segment.clone(),
                value: Some(c.customers as f64),
            })
            .collect(),
    }
}

/// Total revenue per segment, straight from the revenue table
pub fn segment_revenue_series(revenue: &[SegmentRevenue]) -> BarSeries {
    BarSeries {
        title: "Total Revenue per Segment".to_string(),
        x_label: "Segment".to_string(),
        y_label: "Total Revenue".to_string(),
        bars: revenue
            .iter()
            .map(|r| Bar {
                label: r.segment.clone(),
                value: r.total_revenue,
            })
            .collect(),
    }
}

/// Group filtered customers by segment for a frequency/monetary scatter plot.
///
/// Groups follow `known_segments`; segments without points are left out and
/// customers missing either coordinate are skipped.
pub fn scatter_by_segment<S: AsRef<str>>(
    filtered: &[&CustomerRecord],
    known_segments: &[S],
) -> Vec<ScatterGroup> {
    known_segments
        .iter()
        .filter_map(|segment| {
            let segment = segment.as_ref();
            let points: Vec<ScatterPoint> = filtered
                .iter()
                .filter(|r| r.segment == segment)
                .filter_map(|r| {
                    Some(ScatterPoint {
                        customer_id: r.customer_id.clone(),
                        frequency: r.frequency?,
                        monetary: r.monetary?,
                    })
                })
                .collect();
            if points.is_empty() {
                None
            } else {
                Some(ScatterGroup {
                    segment: segment.to_string(),
                    points,
                })
            }
        })
        .collect()
}

/// Heatmap payload for the cohort retention matrix
pub fn heatmap(matrix: &CohortMatrix) -> HeatmapData {
    let range = matrix.value_range();
    HeatmapData {
        title: "Retention Rate (Cohort Analysis)".to_string(),
        rows: matrix.cohorts.clone(),
        columns: matrix.periods.clone(),
        cells: matrix.values.outer_iter().map(|row| row.to_vec()).collect(),
        min: range.map(|(lo, _)| lo),
        max: range.map(|(_, hi)| hi),
    }
}

/// Format with thousands separators, e.g. `1234567.891` -> `1,234,567.89`
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "no data".to_string())
}

/// Render the whole report as console text
pub fn render_text(report: &DashboardReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

/// Print the report to stdout
pub fn print_report(report: &DashboardReport) {
    print!("{}", render_text(report));
}

fn write_report(out: &mut String, report: &DashboardReport) -> std::fmt::Result {
    let kpis = &report.kpis;

    writeln!(out, "=== Customer Analysis Dashboard ===")?;
    writeln!(
        out,
        "Segments: {} | RFM score: {}..={}",
        if report.filter.segments.is_empty() {
            "(none)".to_string()
        } else {
            report.filter.segments.join(", ")
        },
        report.filter.score_range.min,
        report.filter.score_range.max
    )?;
    for warning in &report.warnings {
        writeln!(out, "warning: {}", warning)?;
    }

    writeln!(out, "\n=== KPIs ===")?;
    writeln!(out, "Total customers (filtered): {}", format_number(kpis.total_customers as f64, 0))?;
    writeln!(out, "Average recency (days):     {}", format_optional(kpis.avg_recency, 1))?;
    writeln!(out, "Average frequency:          {}", format_optional(kpis.avg_frequency, 2))?;
    writeln!(out, "Total monetary:             {}", format_number(kpis.total_monetary, 2))?;

    write_bars(out, &report.segment_counts, 0)?;
    write_bars(out, &report.segment_revenue, 2)?;

    writeln!(out, "\n=== Frequency vs Monetary ===")?;
    if report.scatter.is_empty() {
        writeln!(out, "  (no points)")?;
    }
    for group in &report.scatter {
        writeln!(out, "  {}: {} points", group.segment, group.points.len())?;
    }

    write_heatmap(out, &report.retention)?;
    write_preview(out, &report.preview)?;
    Ok(())
}

fn write_bars(out: &mut String, series: &BarSeries, decimals: usize) -> std::fmt::Result {
    writeln!(out, "\n=== {} ===", series.title)?;
    if series.bars.is_empty() {
        return writeln!(out, "  (no data)");
    }

    let label_width = series
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);
    let max_value = series
        .bars
        .iter()
        .filter_map(|b| b.value)
        .fold(0.0_f64, |acc, v| acc.max(v));

    for bar in &series.bars {
        let (value, length) = match bar.value {
            Some(v) if max_value > 0.0 => (
                format_number(v, decimals),
                ((v.max(0.0) / max_value) * BAR_WIDTH as f64).round() as usize,
            ),
            Some(v) => (format_number(v, decimals), 0),
            None => ("-".to_string(), 0),
        };
        writeln!(
            out,
            "  {:<width$} | {:>14} | {}",
            bar.label,
            value,
            "#".repeat(length),
            width = label_width
        )?;
    }
    Ok(())
}

fn write_heatmap(out: &mut String, data: &HeatmapData) -> std::fmt::Result {
    writeln!(out, "\n=== {} ===", data.title)?;
    if data.rows.is_empty() || data.columns.is_empty() {
        return writeln!(out, "  (no data)");
    }

    let label_width = data
        .rows
        .iter()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    write!(out, "  {:<width$}", "Cohort", width = label_width)?;
    for column in &data.columns {
        write!(out, " {:>6}", column)?;
    }
    writeln!(out)?;

    for (label, cells) in data.rows.iter().zip(&data.cells) {
        write!(out, "  {:<width$}", label, width = label_width)?;
        for cell in cells {
            match cell {
                Some(v) => write!(out, " {:>6.2}", v)?,
                None => write!(out, " {:>6}", "")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_preview(out: &mut String, preview: &TablePreview) -> std::fmt::Result {
    writeln!(
        out,
        "\n=== Filtered Customers (showing {} of {}) ===",
        preview.rows.len(),
        preview.total_rows
    )?;
    if preview.rows.is_empty() {
        return writeln!(out, "  no rows");
    }

    writeln!(
        out,
        "  {:<34} | {:>8} | {:>9} | {:>12} | {:>5} | Segment",
        "Customer", "Recency", "Frequency", "Monetary", "Score"
    )?;
    for row in &preview.rows {
        writeln!(
            out,
            "  {:<34} | {:>8} | {:>9} | {:>12} | {:>5} | {}",
            row.customer_id,
            format_optional_cell(row.recency, 0),
            format_optional_cell(row.frequency, 0),
            format_optional_cell(row.monetary, 2),
            row.rfm_score,
            row.segment
        )?;
    }
    Ok(())
}

fn format_optional_cell(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}
