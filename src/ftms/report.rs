use super::schema::{SearchReport, SearchResult};
use anyhow::{Context, Result};
use console::{style, Term};
use serde::Serialize;
use std::path::Path;

pub const CSV_HEADER: [&str; 5] = ["file_name", "full_path", "file_type", "file_size", "occurrence_num"];

pub const CHART_TITLE: &str = "Occurrences of Search String per File";
pub const X_LABEL: &str = "Occurrences";
pub const Y_LABEL: &str = "File Name";
pub const BAR_HEIGHT: f64 = 0.3;
pub const BAR_SPACING: f64 = 1.3;

#[derive(Serialize)]
struct CsvRow<'a> {
    file_name: &'a str,
    full_path: &'a str,
    file_type: &'a str,
    file_size: u64,
    occurrence_num: u64,
}

/// Write the header and one row per result. Content is not exported.
pub fn write_csv(path: &Path, results: &[SearchResult]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(CSV_HEADER)?;
    for result in results {
        writer.serialize(CsvRow {
            file_name: &result.file.file_name,
            full_path: &result.file.full_path,
            file_type: &result.file.file_type,
            file_size: result.file.file_size,
            occurrence_num: result.occurrence_num,
        })?;
    }
    writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Plain-text summary printed after a search.
pub fn summary(report: &SearchReport) -> String {
    format!(
        "Summary Statistics:\n- Total occurrences of '{}': {}",
        report.term, report.total_occurrences
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
    /// Centre of the bar on the category axis.
    pub y: f64,
}

/// Horizontal bar chart, one bar per file, ascending by value.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub bar_height: f64,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// Lay out `ranking`, which must already be sorted ascending.
    pub fn from_ranking(ranking: &[(String, u64)]) -> Self {
        let step = BAR_HEIGHT + BAR_SPACING;
        let bars = ranking
            .iter()
            .enumerate()
            .map(|(i, (label, value))| Bar {
                label: label.clone(),
                value: *value,
                y: i as f64 * step,
            })
            .collect();
        Self {
            title: CHART_TITLE,
            x_label: X_LABEL,
            y_label: Y_LABEL,
            bar_height: BAR_HEIGHT,
            bars,
        }
    }
}

/// Displays a chart. The window itself lives outside the pipeline.
pub trait ChartRenderer {
    fn render(&self, chart: &BarChart) -> Result<()>;
}

/// Draws the chart as horizontal bars on the terminal.
pub struct TerminalChart {
    width: usize,
}

impl TerminalChart {
    pub fn new(width: usize) -> Self {
        Self { width: width.max(1) }
    }

    /// The chart as lines of text, highest bar first like a plotted `barh`.
    pub fn draw(&self, chart: &BarChart) -> Vec<String> {
        let label_width = chart
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0)
            .max(chart.y_label.len());
        let max = chart.bars.iter().map(|b| b.value).max().unwrap_or(0).max(1);

        let mut lines = vec![style(chart.title).bold().to_string(), String::new()];
        lines.push(format!("{:>label_width$} |", chart.y_label));
        for (i, bar) in chart.bars.iter().rev().enumerate() {
            if i > 0 {
                lines.push(format!("{:>label_width$} |", ""));
            }
            let len = ((bar.value as f64 / max as f64) * self.width as f64).round() as usize;
            let len = len.max(1);
            lines.push(format!(
                "{:>label_width$} | {} {}",
                bar.label,
                style("█".repeat(len)).cyan(),
                bar.value
            ));
        }
        lines.push(format!("{:>label_width$} +{}", "", "-".repeat(self.width + 2)));
        lines.push(format!("{:>label_width$}   {}", "", chart.x_label));
        lines
    }
}

impl Default for TerminalChart {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ChartRenderer for TerminalChart {
    fn render(&self, chart: &BarChart) -> Result<()> {
        let term = Term::stdout();
        for line in self.draw(chart) {
            term.write_line(&line).context("Failed to draw chart")?;
        }
        Ok(())
    }
}
