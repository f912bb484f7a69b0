use std::path::{Path, PathBuf};

use tracing::warn;
use unccp_core::error::Result;
use unccp_core::{ExistingOutput, ExternalDecompiler, NormalizeOptions, RunOptions, run};

use crate::presentation::cli::Cli;

fn default_out_root(archive: &Path) -> PathBuf {
    let abs = std::path::absolute(archive).unwrap_or_else(|_| archive.to_path_buf());
    abs.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn handle_decompile(cli: Cli) -> Result<()> {
    let out_root = cli
        .out
        .clone()
        .unwrap_or_else(|| default_out_root(&cli.archive));

    let opts = RunOptions {
        out_root,
        jobs: cli.jobs,
        existing: if cli.skip_existing {
            ExistingOutput::Skip
        } else {
            ExistingOutput::Overwrite
        },
        keep_intermediate: cli.keep_intermediate,
        normalize: NormalizeOptions {
            assume_version: cli.assume_python,
        },
    };
    let decompiler = ExternalDecompiler::new(&cli.decompiler).with_args(&cli.decompiler_args);

    let report = run(&cli.archive, &decompiler, &opts)?;

    let s = &report.stats;
    if s.entries > 0 && s.failed == s.entries {
        warn!(
            "every entry failed; is `{}` installed and on PATH?",
            decompiler.program().to_string_lossy()
        );
    }
    eprintln!(
        "decompiled {} / skipped {} / failed {} of {} entries; errors: {}",
        s.decompiled,
        s.skipped,
        s.failed,
        s.entries,
        report.error_report.display()
    );
    Ok(())
}
