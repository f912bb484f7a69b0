// unccp_core/src/domain.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file record read out of the archive.
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    /// Position of the record in the zip central directory.
    pub index: usize,
    /// Archive-internal, slash-separated path.
    pub path: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct DecompileJob {
    pub entry: ArchiveEntry,
    /// Relative to `<out>/client_code`.
    pub output_rel: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecompileResult {
    Success {
        entry_path: String,
        output_rel: PathBuf,
        source_text: String,
    },
    Failure {
        entry_path: String,
        error_message: String,
    },
}

impl DecompileResult {
    pub fn failure(entry_path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        DecompileResult::Failure {
            entry_path: entry_path.into(),
            error_message: err.to_string(),
        }
    }
}

/// Final per-entry state once the writer has had its turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Written { entry_path: String, output: PathBuf },
    /// Output already present and the run was asked not to overwrite it.
    Skipped { entry_path: String, output: PathBuf },
    Failed(ErrorRecord),
}

impl Outcome {
    pub fn entry_path(&self) -> &str {
        match self {
            Outcome::Written { entry_path, .. } | Outcome::Skipped { entry_path, .. } => entry_path,
            Outcome::Failed(rec) => &rec.path,
        }
    }
}

/// One line of `decompile_errors.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub path: String,
    pub error: String,
}
