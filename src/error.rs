use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}, column {column}: '{value}' is not a number")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected} data rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("line {line}: a row needs a time column and at least one current column")]
    TooNarrow { line: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum SegmentError {
    #[error("channel {channel} is out of range (table has channels 1..={available})")]
    ChannelOutOfRange { channel: usize, available: usize },

    #[error("timestamp went from {previous}s back to {at}s")]
    TimestampDecreased { previous: i64, at: i64 },
}
