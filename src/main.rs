use std::process::ExitCode;

use clap::Parser;

use skinfe::cli::{self, CliArgs};
use skinfe::logger;

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
