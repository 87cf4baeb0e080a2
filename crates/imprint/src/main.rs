use std::process::ExitCode;

use clap::Parser;
use imprint::cli::{init_logging, run, Cli};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
