use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("need at least {needed} matches to train, got {got}")]
    NotEnoughData { needed: usize, got: usize },

    #[error("training split contains only {0} results")]
    SingleClass(&'static str),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
