//! Error types for the data layer.

use thiserror::Error;

/// Failure to turn a file into an [`ExpressionTable`](crate::data::model::ExpressionTable).
///
/// Fatal to that load attempt only; the previously loaded table stays in place.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file is empty")]
    Empty,

    #[error("no header row found")]
    NoHeader,

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("row {row} has {got} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("no column can serve as gene identifier")]
    NoGeneColumn,

    #[error("gene column '{column}' is empty at row {row}")]
    MissingGeneId { column: String, row: usize },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("JSON error: {0}")]
    Json(String),
}

/// A filter threshold outside its valid range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidThresholdError {
    #[error("|logFC| threshold must be a finite, non-negative number (got {0})")]
    LogFc(f64),

    #[error("FDR threshold must be within [0, 1] (got {0})")]
    Fdr(f64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("gene '{gene}' has no values in any contrast")]
pub struct GeneNotFoundError {
    pub gene: String,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("flushing export buffer: {0}")]
    Flush(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
