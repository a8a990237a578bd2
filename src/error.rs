//! Error types for report generation.

use std::path::PathBuf;

/// Errors raised while building a VIP opens report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A required input was not supplied (no VIP list, no opener files,
    /// or a master report requested before both provider reports exist).
    #[error("missing input: {0}")]
    MissingInput(String),

    /// An input file lacks the column it is keyed on.
    #[error("column '{column}' not found in {}", .source_path.display())]
    MissingColumn {
        column: String,
        source_path: PathBuf,
    },

    /// A workbook with no sheets, or a report with no header row.
    #[error("workbook has no usable sheet: {}", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    XlsxRead(#[from] calamine::Error),

    #[error("failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
