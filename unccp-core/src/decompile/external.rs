use super::Decompiler;
use crate::error::{Result, UnccpError};
use crate::normalize::NormalizedBlob;
use std::ffi::OsString;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::trace;

pub const DEFAULT_PROGRAM: &str = "pycdc";

/// Runs a decompiler executable as `program args... <file.pyc>` and takes stdout as source.
#[derive(Clone, Debug)]
pub struct ExternalDecompiler {
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalDecompiler {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &std::ffi::OsStr {
        &self.program
    }
}

impl Decompiler for ExternalDecompiler {
    fn decompile(&self, blob: &NormalizedBlob, entry_path: &str) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .prefix("unccp-")
            .suffix(".pyc")
            .tempfile()?;
        tmp.write_all(&blob.bytes)?;
        tmp.flush()?;

        let prog = self.program.to_string_lossy();
        trace!(entry = entry_path, program = %prog, "spawning decompiler");
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg(tmp.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| UnccpError::Decompiler(format!("cannot run {prog}: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let first = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no diagnostics");
            return Err(UnccpError::Decompiler(format!(
                "{prog} {}: {first}",
                out.status
            )));
        }

        let text = String::from_utf8_lossy(&out.stdout).into_owned();
        if text.trim().is_empty() {
            return Err(UnccpError::Decompiler(format!("{prog} produced no output")));
        }
        Ok(text)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::codec::CodecId;
    use crate::container::pyc::PyVersion;

    fn blob() -> NormalizedBlob {
        NormalizedBlob {
            codec: CodecId::Store,
            version: PyVersion::new(2, 7),
            synthesized_header: false,
            bytes: b"\x03\xf3\r\nxxxxc".to_vec(),
        }
    }

    #[test]
    fn stdout_becomes_source() {
        let d = ExternalDecompiler::new("sh")
            .with_args(["-c", "echo \"# from $0\"; echo 'x = 1'"]);
        let src = d.decompile(&blob(), "a.pyj").unwrap();
        assert!(src.contains("x = 1"));
        assert!(src.contains(".pyc"));
    }

    #[test]
    fn nonzero_exit_reports_stderr() {
        let d = ExternalDecompiler::new("sh")
            .with_args(["-c", "echo 'Unsupported opcode' >&2; exit 3"]);
        let err = d.decompile(&blob(), "a.pyj").unwrap_err().to_string();
        assert!(err.contains("Unsupported opcode"), "{err}");
    }

    #[test]
    fn missing_program_is_a_decompiler_error() {
        let d = ExternalDecompiler::new("/nonexistent/unccp-decompiler");
        let err = d.decompile(&blob(), "a.pyj").unwrap_err();
        assert!(matches!(err, UnccpError::Decompiler(_)));
    }

    #[test]
    fn empty_output_is_an_error() {
        let d = ExternalDecompiler::new("true");
        assert!(d.decompile(&blob(), "a.pyj").is_err());
    }
}
