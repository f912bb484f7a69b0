use crate::archive::reader::{ArchiveReader, UnreadableEntry};
use crate::decompile::{Decompiler, decompile_job};
use crate::domain::{ArchiveEntry, DecompileJob, ErrorRecord, Outcome};
use crate::error::{Result, UnccpError};
use crate::normalize::Normalizer;
use crate::output::writer::OutputWriter;
use crate::pipeline::plan::OutputPlan;
use crate::policy::{ExistingOutput, RunOptions};
use crate::stats::RunStats;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct RunReport {
    /// One outcome per archive file entry, sorted by archive path.
    pub outcomes: Vec<Outcome>,
    pub stats: RunStats,
    pub error_report: PathBuf,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Failed(rec) => Some(rec),
            _ => None,
        })
    }
}

struct JobReport {
    index: usize,
    outcome: Outcome,
    input_bytes: u64,
    normalized_bytes: u64,
}

/// Unpacks, normalizes and decompiles every entry of `archive`.
///
/// Only an unreadable archive, an uncreatable output root or an unwritable
/// error report fail the run; everything else lands in the report.
pub fn run(archive: &Path, decompiler: &dyn Decompiler, opts: &RunOptions) -> Result<RunReport> {
    opts.validate()?;
    // open before touching the output root so a bad path leaves nothing behind
    let mut reader = ArchiveReader::open(archive)?;
    let writer = OutputWriter::create(&opts.out_root)?;

    let plan = OutputPlan::build(&reader.entry_names());
    let normalizer = Normalizer::new(opts.normalize.clone());
    info!(
        "Processing {} files from {} with {} workers...",
        plan.len(),
        reader.path().display(),
        opts.jobs
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .thread_name(|i| format!("unccp-worker-{i}"))
        .build()
        .map_err(|e| UnccpError::InvalidOption(format!("worker pool: {e}")))?;

    let ctx = JobContext {
        plan: &plan,
        normalizer: &normalizer,
        decompiler,
        writer: &writer,
        opts,
    };
    let mut reports: Vec<JobReport> = pool.install(|| {
        reader
            .entries()
            .par_bridge()
            .map(|item| ctx.process(item))
            .collect()
    });

    // completion order depends on scheduling; archive path order does not
    reports.sort_by(|a, b| {
        a.outcome
            .entry_path()
            .cmp(b.outcome.entry_path())
            .then(a.index.cmp(&b.index))
    });

    let mut stats = RunStats::default();
    let mut failures = Vec::new();
    let mut outcomes = Vec::with_capacity(reports.len());
    for r in reports {
        stats.tally(&r.outcome);
        stats.input_bytes += r.input_bytes;
        stats.normalized_bytes += r.normalized_bytes;
        if let Outcome::Failed(rec) = &r.outcome {
            failures.push(rec.clone());
        }
        outcomes.push(r.outcome);
    }

    let error_report = writer.write_error_report(&failures)?;
    if failures.is_empty() {
        info!("No errors; wrote empty {}", error_report.display());
    } else {
        info!(
            "Wrote errors to {} ({} files)",
            error_report.display(),
            failures.len()
        );
    }
    info!(
        entries = stats.entries,
        decompiled = stats.decompiled,
        skipped = stats.skipped,
        failed = stats.failed,
        input_bytes = stats.input_bytes,
        normalized_bytes = stats.normalized_bytes,
        "run complete"
    );

    Ok(RunReport {
        outcomes,
        stats,
        error_report,
    })
}

struct JobContext<'a> {
    plan: &'a OutputPlan,
    normalizer: &'a Normalizer,
    decompiler: &'a dyn Decompiler,
    writer: &'a OutputWriter,
    opts: &'a RunOptions,
}

impl JobContext<'_> {
    fn process(&self, item: std::result::Result<ArchiveEntry, UnreadableEntry>) -> JobReport {
        let entry = match item {
            Ok(e) => e,
            Err(bad) => return failed(bad.index, bad.path, bad.error, 0),
        };
        let index = entry.index;
        let input_bytes = entry.data.len() as u64;

        let output_rel = match self.plan.output_for(index, &entry.path) {
            Ok(p) => p,
            Err(e) => return failed(index, entry.path, e, input_bytes),
        };

        if self.opts.existing == ExistingOutput::Skip && self.writer.exists(&output_rel) {
            let output = self.writer.target(&output_rel);
            info!("Skip: {}", output.display());
            return JobReport {
                index,
                outcome: Outcome::Skipped {
                    entry_path: entry.path,
                    output,
                },
                input_bytes,
                normalized_bytes: 0,
            };
        }

        let job = DecompileJob { entry, output_rel };
        let mut normalized_bytes = 0u64;
        let result = decompile_job(&job, self.normalizer, self.decompiler, |blob| {
            normalized_bytes = blob.bytes.len() as u64;
            debug!(
                entry = %job.entry.path,
                version = %blob.version,
                synthesized = blob.synthesized_header,
                "normalized"
            );
            if self.opts.keep_intermediate {
                if let Err(e) = self.writer.write_intermediate(&job.output_rel, blob) {
                    warn!("cannot keep intermediate for {}: {e}", job.entry.path);
                }
            }
        });

        JobReport {
            index,
            outcome: self.writer.persist(result),
            input_bytes,
            normalized_bytes,
        }
    }
}

fn failed(index: usize, path: String, err: UnccpError, input_bytes: u64) -> JobReport {
    warn!("Error: {path}: {err}");
    JobReport {
        index,
        outcome: Outcome::Failed(ErrorRecord {
            path,
            error: err.to_string(),
        }),
        input_bytes,
        normalized_bytes: 0,
    }
}
