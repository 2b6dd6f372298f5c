//! Error types for the squad-view pipeline.
//!
//! Structural failures abort a whole extraction and surface as
//! [`ExtractError`]. Per-row failures never abort anything; they travel on the
//! outcome queue as [`RowError`] next to the row index that produced them.

use thiserror::Error;

/// Fatal extraction failures.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The markup tokenizer failed before the end of the stream.
    #[error("tokenizer error at byte {position}: {source}")]
    Tokenize {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// The stream ended without a single header cell.
    #[error("no table headers found in document")]
    NoHeaders,

    /// Headers were collected but the table never reached a point where
    /// the worker pool could be handed a frozen header snapshot.
    #[error("found {header_count} headers but the table never started its body")]
    WorkersNotStarted { header_count: usize },

    /// Reading the export from disk failed.
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the run.
    #[error("extraction cancelled")]
    Cancelled,
}

/// A single row that could not be turned into a player record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Every cell of the row was blank.
    #[error("row is empty")]
    EmptyRow,

    /// Cells were present but the name column was blank.
    #[error("row has no player name (first cells: {preview:?})")]
    MissingName { preview: Vec<String> },

    /// The worker was launched without headers to map cells against.
    #[error("no headers available to map row cells")]
    NoHeaders,

    /// Parsing the row panicked inside a worker; the worker kept running.
    #[error("worker {worker} faulted: {message}")]
    WorkerFault { worker: usize, message: String },
}

impl RowError {
    /// Blank spacer rows are expected noise in exports. Everything else,
    /// including a row without a name, is worth reporting.
    pub fn is_skippable(&self) -> bool {
        matches!(self, RowError::EmptyRow)
    }
}
