use clap::{ArgAction, Parser};
use std::path::PathBuf;
use unccp_core::PyVersion;
use unccp_core::decompile::external::DEFAULT_PROGRAM;
use unccp_core::policy::DEFAULT_JOBS;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extract & decompile code.ccp into a Python source tree",
    long_about = None
)]
pub struct Cli {
    /// Path to code.ccp (a ZIP of .pyj blobs)
    pub archive: PathBuf,

    /// Directory in which to create client_code/ (default: same dir as the archive)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Decompiler executable, invoked as `<program> [args...] <file.pyc>`
    #[arg(long, env = "UNCCP_DECOMPILER", default_value = DEFAULT_PROGRAM)]
    pub decompiler: String,

    /// Extra argument for the decompiler (repeatable)
    #[arg(long = "decompiler-arg", allow_hyphen_values = true)]
    pub decompiler_args: Vec<String>,

    /// Python release (X.Y) to assume for blobs without a pyc header
    #[arg(long = "assume-python")]
    pub assume_python: Option<PyVersion>,

    /// Leave already decompiled files untouched instead of overwriting them
    #[arg(long)]
    pub skip_existing: bool,

    /// Also write each normalized .pyc under intermediate/
    #[arg(long)]
    pub keep_intermediate: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
