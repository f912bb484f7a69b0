use crate::error::{Result, UnccpError};
use crate::normalize::NormalizeOptions;
use std::path::PathBuf;

pub const DEFAULT_JOBS: usize = 4;

/// What to do when a mirrored output file is already on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExistingOutput {
    #[default]
    Overwrite,
    Skip,
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Directory receiving `client_code/` and `decompile_errors.json`.
    pub out_root: PathBuf,
    pub jobs: usize,
    pub existing: ExistingOutput,
    /// Also dump each normalized `.pyc` under `intermediate/`.
    pub keep_intermediate: bool,
    pub normalize: NormalizeOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(".")
    }
}

impl RunOptions {
    pub fn new(out_root: impl Into<PathBuf>) -> Self {
        Self {
            out_root: out_root.into(),
            jobs: DEFAULT_JOBS,
            existing: ExistingOutput::default(),
            keep_intermediate: false,
            normalize: NormalizeOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(UnccpError::InvalidOption(
                "worker pool needs at least one job".to_string(),
            ));
        }
        Ok(())
    }
}
