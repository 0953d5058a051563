use crate::utils::{format_elapsed, format_file_size, format_savings_percent};
use std::fmt;
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Placeholder for columns that do not apply to a row ("not replaced").
const NOT_REPLACED: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Replacement occurred.
    Success,
    /// Already optimal, file untouched.
    Skipped,
    /// Rejected, transport error, or failed overwrite.
    Failed,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Success => write!(f, "success"),
            RowStatus::Skipped => write!(f, "skipped"),
            RowStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One line of the final summary, appended in processing order.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub path: String,
    pub input_size: u64,
    pub output_size: Option<u64>,
    /// Service ratio when a replacement occurred; `None` is the
    /// "not replaced" sentinel.
    pub ratio: Option<f64>,
    pub elapsed: Option<Duration>,
    pub status: RowStatus,
}

impl ReportRow {
    pub fn replaced(
        path: String,
        input_size: u64,
        output_size: u64,
        ratio: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            path,
            input_size,
            output_size: Some(output_size),
            ratio: Some(ratio),
            elapsed: Some(elapsed),
            status: RowStatus::Success,
        }
    }

    pub fn skipped(path: String, input_size: u64) -> Self {
        Self {
            path,
            input_size,
            output_size: None,
            ratio: None,
            elapsed: None,
            status: RowStatus::Skipped,
        }
    }

    pub fn failed(path: String, input_size: u64) -> Self {
        Self {
            path,
            input_size,
            output_size: None,
            ratio: None,
            elapsed: None,
            status: RowStatus::Failed,
        }
    }
}

#[derive(Tabled)]
struct RenderedRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Original")]
    original: String,
    #[tabled(rename = "Optimized")]
    optimized: String,
    #[tabled(rename = "Savings")]
    savings: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ReportRow> for RenderedRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            name: row.path.clone(),
            original: format_file_size(row.input_size),
            optimized: row
                .output_size
                .map(format_file_size)
                .unwrap_or_else(|| NOT_REPLACED.to_string()),
            savings: row
                .ratio
                .map(format_savings_percent)
                .unwrap_or_else(|| NOT_REPLACED.to_string()),
            time: row
                .elapsed
                .map(format_elapsed)
                .unwrap_or_else(|| NOT_REPLACED.to_string()),
            status: row.status.to_string(),
        }
    }
}

/// Append-only sequence of per-file outcomes; insertion order is processing
/// order.
#[derive(Debug, Default)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, status: RowStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    /// Bytes shaved off by successful replacements.
    pub fn bytes_saved(&self) -> u64 {
        self.rows
            .iter()
            .filter(|r| r.status == RowStatus::Success)
            .map(|r| r.input_size.saturating_sub(r.output_size.unwrap_or(r.input_size)))
            .sum()
    }

    /// Render the summary table. Pure; the caller decides where it goes.
    pub fn render(&self) -> String {
        let rendered: Vec<RenderedRow> = self.rows.iter().map(RenderedRow::from).collect();
        Table::new(rendered).with(Style::psql()).to_string()
    }

    pub fn render_summary(&self, total_elapsed: Duration) -> String {
        format!(
            "{} replaced, {} skipped, {} failed | saved {} in {}",
            self.count(RowStatus::Success),
            self.count(RowStatus::Skipped),
            self.count(RowStatus::Failed),
            format_file_size(self.bytes_saved()),
            format_elapsed(total_elapsed),
        )
    }
}
