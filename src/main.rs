//! tokenforge - build design-token sources into platform stylesheets.

use std::process::ExitCode;

use tokenforge::cli;

fn main() -> ExitCode {
    cli::run()
}
