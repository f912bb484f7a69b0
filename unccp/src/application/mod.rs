pub mod handlers;

use crate::presentation::cli::Cli;
use clap::Parser;
use unccp_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    set_up_tracing(cli.verbose);
    handlers::handle_decompile(cli)
}

fn set_up_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
