//! rfmdash: customer analytics dashboard over precomputed RFM tables
//!
//! This is the main entrypoint that owns the dataset handle and runs one
//! dashboard interaction: load, filter, aggregate, reshape and report.

use anyhow::{Context, Result};
use clap::Parser;
use rfmdash::{viz, Args, Dashboard, DataLoader, DashboardReport, OutputFormat};
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if args.verbose {
        println!("rfmdash - Customer Analysis Dashboard (RFM & Retention)");
        println!("=======================================================\n");
    }

    let start_time = Instant::now();

    // Step 1: Load datasets; any failure here aborts before rendering
    let loader = DataLoader::new(args.data_paths());
    if args.verbose {
        println!("Step 1: Loading datasets");
        println!("  RFM:       {}", args.rfm.display());
        println!("  Revenue:   {}", args.revenue.display());
        println!("  Retention: {}", args.retention.display());
    }

    let load_start = Instant::now();
    let dataset = loader.load().context("Failed to load dashboard data")?;
    if args.verbose {
        println!(
            "✓ Loaded {} customers, {} revenue rows, {} cohorts",
            dataset.customers.len(),
            dataset.revenue.len(),
            dataset.retention.rows.len()
        );
        println!("  Loading time: {:.2}s", load_start.elapsed().as_secs_f64());
    }

    // Step 2: Apply the user's filter and compute the report
    let dashboard = Dashboard::new(dataset);
    let controls = dashboard.controls();
    let criteria = args.filter_criteria(controls)?;
    if args.verbose {
        println!("\nStep 2: Filtering and aggregating");
        println!("  Available segments: {}", controls.segments.join(", "));
        println!(
            "  Score bounds: {}..={}",
            controls.score_bounds.min, controls.score_bounds.max
        );
    }

    let report_start = Instant::now();
    let report = dashboard.view(&criteria, args.preview_rows);
    if args.verbose {
        println!("  Report time: {:.2}s\n", report_start.elapsed().as_secs_f64());
    }

    // Step 3: Emit the report
    emit_report(&args, &report)?;

    if args.verbose {
        println!(
            "\nTotal processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Print or write the report in the requested format
fn emit_report(args: &Args, report: &DashboardReport) -> Result<()> {
    match (args.format, &args.output) {
        (OutputFormat::Text, None) => viz::print_report(report),
        (OutputFormat::Json, None) => {
            println!("{}", report.to_json().context("Failed to serialize report")?);
        }
        (_, Some(path)) => {
            let json = report.to_json().context("Failed to serialize report")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report saved to: {}", path.display());
            if args.format == OutputFormat::Text {
                viz::print_report(report);
            }
        }
    }
    Ok(())
}
