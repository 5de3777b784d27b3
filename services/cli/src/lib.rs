mod cli;
mod commands;
mod infra;
mod preview;
mod routes;
mod server;

use insight_desk::error::AppError;

/// Parse arguments and dispatch. Runs on the calling thread; only `serve` starts a runtime.
pub fn run() -> Result<(), AppError> {
    cli::run()
}
