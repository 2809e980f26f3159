use hrt_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // File logging if possible; the CLI still works when the state dir is unwritable.
    if let Err(err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("file logging unavailable, using stderr: {:#}", err),
            Err(stderr_err) => eprintln!("hrt: logging disabled: {:#}; {:#}", err, stderr_err),
        }
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("hrt error: {:#}", err);
        std::process::exit(1);
    }
}
