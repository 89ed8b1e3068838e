//! Checks `IORING_OP_CONNECT` with and without a peer listening, and with a
//! linked timeout cancelling it.
//!
//! Any argument makes the binary exit successfully without doing anything,
//! for environments where the check cannot run.

use std::process::ExitCode;

use log::{error, info};
use uring_connect::{Config, Ring, Runner};

fn main() -> ExitCode {
    if std::env::args_os().len() > 1 {
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let ring = match Ring::new(config.queue_entries) {
        Ok(ring) => ring,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut runner = Runner::new(ring, config);
    match runner.run() {
        Ok(report) => {
            info!("{}", report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
