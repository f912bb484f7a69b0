use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnccpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open archive {}: {source}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot create output root {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read entry {path}: {message}")]
    EntryRead { path: String, message: String },

    #[error("unrecognized blob format: {0}")]
    UnrecognizedFormat(String),

    #[error("decompiler failed: {0}")]
    Decompiler(String),

    #[error("unsafe path: {0}")]
    UnsafePath(String),

    #[error("output path {path} already claimed by {other}")]
    OutputCollision { path: String, other: String },

    #[error("error report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, UnccpError>;
