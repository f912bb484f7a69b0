#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod policy;
pub mod stats;

pub mod archive {
    pub mod reader;
}

pub mod codec;

pub mod container {
    pub mod pyc;
}

pub mod normalize;

pub mod decompile;

pub mod pipeline {
    pub mod plan;
    pub mod run;
}

pub mod output {
    pub mod writer;
}

// Re-exports: stable API surface
pub use archive::reader::ArchiveReader;
pub use container::pyc::PyVersion;
pub use decompile::external::ExternalDecompiler;
pub use decompile::{Decompiler, decompile_job};
pub use domain::{ArchiveEntry, DecompileJob, DecompileResult, ErrorRecord, Outcome};
pub use normalize::{NormalizeOptions, NormalizedBlob, Normalizer};
pub use pipeline::run::{RunReport, run};
pub use policy::{ExistingOutput, RunOptions};
pub use stats::RunStats;
