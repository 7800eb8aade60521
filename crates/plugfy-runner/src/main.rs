//! CLI entrypoint for the Plugfy runner.
//!
//! The binary delegates to [`plugfy_runner::run`], which loads configuration,
//! opens the requested transport, and serves the verb's command over it.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: transports and log writers use both streams from
    // worker threads.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    plugfy_runner::run(std::env::args_os(), &mut stdout, &mut stderr)
}
