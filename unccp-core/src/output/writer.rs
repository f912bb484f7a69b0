use crate::domain::{DecompileResult, ErrorRecord, Outcome};
use crate::error::{Result, UnccpError};
use crate::normalize::NormalizedBlob;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const CLIENT_CODE_DIR: &str = "client_code";
pub const ERROR_REPORT_FILE: &str = "decompile_errors.json";
pub const INTERMEDIATE_DIR: &str = "intermediate";

pub struct OutputWriter {
    out_root: PathBuf,
    code_root: PathBuf,
}

impl OutputWriter {
    /// Creates `<out_root>/client_code`. Failing here is fatal for the run.
    pub fn create(out_root: &Path) -> Result<Self> {
        let code_root = out_root.join(CLIENT_CODE_DIR);
        fs::create_dir_all(&code_root).map_err(|source| UnccpError::OutputRoot {
            path: code_root.clone(),
            source,
        })?;
        Ok(Self {
            out_root: out_root.to_path_buf(),
            code_root,
        })
    }

    pub fn code_root(&self) -> &Path {
        &self.code_root
    }

    pub fn target(&self, rel: &Path) -> PathBuf {
        self.code_root.join(rel)
    }

    pub fn exists(&self, rel: &Path) -> bool {
        self.target(rel).is_file()
    }

    /// Writes a successful result; write errors come back as `Outcome::Failed`.
    pub fn persist(&self, result: DecompileResult) -> Outcome {
        match result {
            DecompileResult::Success {
                entry_path,
                output_rel,
                source_text,
            } => match self.write_source(&output_rel, &source_text) {
                Ok(output) => {
                    info!("Decompiled: {}", self.display_rel(&output));
                    Outcome::Written { entry_path, output }
                }
                Err(e) => {
                    warn!("Error: {entry_path}: {e}");
                    Outcome::Failed(ErrorRecord {
                        path: entry_path,
                        error: e.to_string(),
                    })
                }
            },
            DecompileResult::Failure {
                entry_path,
                error_message,
            } => {
                warn!("Error: {entry_path}: {error_message}");
                Outcome::Failed(ErrorRecord {
                    path: entry_path,
                    error: error_message,
                })
            }
        }
    }

    pub fn write_source(&self, rel: &Path, text: &str) -> Result<PathBuf> {
        let target = self.target(rel);
        write_atomic(&target, text.as_bytes())?;
        Ok(target)
    }

    pub fn write_intermediate(&self, rel: &Path, blob: &NormalizedBlob) -> Result<PathBuf> {
        let target = self
            .out_root
            .join(INTERMEDIATE_DIR)
            .join(rel)
            .with_extension("pyc");
        write_atomic(&target, &blob.bytes)?;
        Ok(target)
    }

    /// Writes every failure as one JSON array; `[]` when the run was clean.
    pub fn write_error_report(&self, failures: &[ErrorRecord]) -> Result<PathBuf> {
        let target = self.out_root.join(ERROR_REPORT_FILE);
        let mut body = serde_json::to_vec_pretty(failures)?;
        body.push(b'\n');
        write_atomic(&target, &body)?;
        Ok(target)
    }

    fn display_rel<'a>(&self, p: &'a Path) -> std::path::Display<'a> {
        p.strip_prefix(&self.out_root).unwrap_or(p).display()
    }
}

// Sibling temp file + rename, so readers never see a half-written file.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| UnccpError::UnsafePath(target.display().to_string()))?;
    // idempotent; siblings may be creating the same directories concurrently
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
