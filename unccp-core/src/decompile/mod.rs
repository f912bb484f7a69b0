use crate::domain::{DecompileJob, DecompileResult};
use crate::error::Result;
use crate::normalize::{NormalizedBlob, Normalizer};

/// Bytecode in, source text out. Implementations must be shareable across workers.
pub trait Decompiler: Send + Sync {
    fn decompile(&self, blob: &NormalizedBlob, entry_path: &str) -> Result<String>;
}

/// Normalizes and decompiles one job. Never fails: every error becomes a `Failure`.
///
/// `on_normalized` sees the `.pyc` image before it is handed to the decompiler.
pub fn decompile_job(
    job: &DecompileJob,
    normalizer: &Normalizer,
    decompiler: &dyn Decompiler,
    on_normalized: impl FnOnce(&NormalizedBlob),
) -> DecompileResult {
    let entry_path = job.entry.path.as_str();
    let blob = match normalizer.normalize(&job.entry.data) {
        Ok(b) => b,
        Err(e) => return DecompileResult::failure(entry_path, e),
    };
    on_normalized(&blob);
    match decompiler.decompile(&blob, entry_path) {
        Ok(source_text) => DecompileResult::Success {
            entry_path: entry_path.to_string(),
            output_rel: job.output_rel.clone(),
            source_text,
        },
        Err(e) => DecompileResult::failure(entry_path, e),
    }
}

pub mod external;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArchiveEntry;
    use crate::error::UnccpError;
    use std::path::PathBuf;

    struct Echo;

    impl Decompiler for Echo {
        fn decompile(&self, blob: &NormalizedBlob, entry_path: &str) -> Result<String> {
            Ok(format!("# {entry_path} python {}\n", blob.version))
        }
    }

    struct Refuse;

    impl Decompiler for Refuse {
        fn decompile(&self, _blob: &NormalizedBlob, _entry_path: &str) -> Result<String> {
            Err(UnccpError::Decompiler("unsupported opcode 0x99".to_string()))
        }
    }

    fn job(data: &[u8]) -> DecompileJob {
        DecompileJob {
            entry: ArchiveEntry {
                index: 0,
                path: "pkg/mod.pyj".to_string(),
                data: data.to_vec(),
            },
            output_rel: PathBuf::from("pkg/mod.py"),
        }
    }

    const PYC27: &[u8] = b"\x03\xf3\r\n\0\0\0\0c\0\0\0\0";

    #[test]
    fn success_carries_output_path_and_text() {
        let mut seen = 0;
        let r = decompile_job(&job(PYC27), &Normalizer::default(), &Echo, |b| {
            seen = b.bytes.len()
        });
        assert_eq!(seen, PYC27.len());
        assert_eq!(
            r,
            DecompileResult::Success {
                entry_path: "pkg/mod.pyj".to_string(),
                output_rel: PathBuf::from("pkg/mod.py"),
                source_text: "# pkg/mod.pyj python 2.7\n".to_string(),
            }
        );
    }

    #[test]
    fn decompiler_error_becomes_failure() {
        let r = decompile_job(&job(PYC27), &Normalizer::default(), &Refuse, |_| {});
        match r {
            DecompileResult::Failure {
                entry_path,
                error_message,
            } => {
                assert_eq!(entry_path, "pkg/mod.pyj");
                assert!(error_message.contains("unsupported opcode"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn bad_blob_never_reaches_decompiler() {
        let mut called = false;
        let r = decompile_job(&job(b"garbage"), &Normalizer::default(), &Echo, |_| {
            called = true
        });
        assert!(!called);
        assert!(matches!(r, DecompileResult::Failure { .. }));
    }
}
