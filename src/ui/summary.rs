//! Spoken summaries of what the dashboard currently shows
//!
//! The dashboard hands over plain snapshots; these functions turn them
//! into sentences suitable for speech.

use regex::Regex;
use std::sync::OnceLock;

const NOT_AVAILABLE: &str = "N/A";

/// Which charts on the visualizations page have data
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartSnapshot {
    pub brand_has_data: bool,
    pub category_has_data: bool,
}

/// Results panel shown after an upload was processed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadResults {
    /// Whether the results panel is showing at all
    pub visible: bool,
    pub date: Option<String>,
    pub records: Option<String>,
    pub new_records: Option<String>,
    pub updated: Option<String>,
    pub daily_sales: Option<String>,
    pub daily_purchases: Option<String>,
}

/// Summary metrics from the data preview page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewMetrics {
    pub total_records: Option<String>,
    pub unique_brands: Option<String>,
    pub unique_categories: Option<String>,
    pub sales_purchase_ratio: Option<String>,
}

fn or_na(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

pub fn summarize_charts(charts: &ChartSnapshot) -> String {
    let mut summary = String::from("Here's a summary of the visualizations: ");

    if charts.brand_has_data {
        summary.push_str("The brand chart shows sales and purchase quantities for top brands. ");
    } else {
        summary.push_str("No brand data is currently displayed. ");
    }

    if charts.category_has_data {
        summary.push_str("The category chart shows similar data for top categories. ");
    } else {
        summary.push_str("No category data is currently displayed. ");
    }

    summary
}

pub fn summarize_upload_results(results: &UploadResults) -> String {
    if !results.visible {
        return "No upload results are currently visible.".to_string();
    }

    format!(
        "The latest upload summary for date {} shows: Total records processed {}. \
         New records added: {}. Existing records updated: {}. \
         Daily sales total: {}. Daily purchases total: {}.",
        or_na(&results.date),
        or_na(&results.records),
        or_na(&results.new_records),
        or_na(&results.updated),
        or_na(&results.daily_sales),
        or_na(&results.daily_purchases),
    )
}

pub fn summarize_metrics(metrics: &PreviewMetrics) -> String {
    format!(
        "The current data preview metrics are: Total records: {}. Unique brands: {}. \
         Unique categories: {}. Sales to purchase ratio: {}.",
        or_na(&metrics.total_records),
        or_na(&metrics.unique_brands),
        or_na(&metrics.unique_categories),
        or_na(&metrics.sales_purchase_ratio),
    )
}

fn log_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    // [LEVEL] YYYY-MM-DD HH:MM:SS -
    PREFIX.get_or_init(|| {
        Regex::new(r"^\s*\[[^\]]*\]\s*\d{4}-\d{2}-\d{2}\s*\d{2}:\d{2}:\d{2}\s*-\s*")
            .expect("log prefix pattern is valid")
    })
}

/// Strip the level and timestamp prefix from a log line
pub fn clean_log_line(line: &str) -> String {
    log_prefix().replace(line, "").trim().to_string()
}

/// Read back the last `count` log lines
pub fn summarize_logs(entries: &[String], count: usize) -> String {
    let mut recent: Vec<String> = entries
        .iter()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .take(count)
        .map(|line| clean_log_line(line))
        .collect();
    recent.reverse();

    if recent.is_empty() {
        return "There are no recent logs to read.".to_string();
    }

    format!("Recent activity: {}", recent.join(". "))
}
