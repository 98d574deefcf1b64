// Console binary: renders one texture per invocation and exits.

mod cli;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    grainy::logger::init();
    grainy::log_info!("Grainy Editorial v{} starting", env!("CARGO_PKG_VERSION"));

    let args = cli::CliArgs::parse();
    cli::run(args)
}
