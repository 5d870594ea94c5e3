//! Cart Discounts runner
//!
//! Runs one discount evaluation the way the checkout host does: a `FunctionInput` JSON
//! document in, a `FunctionResult` JSON document out.

use std::{
    fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use clap::Parser;
use thiserror::Error;
use tracing::{debug, error};

use cart_discounts::run::{EvaluationError, FunctionInput, run};

use crate::config::RunnerConfig;

mod config;
mod logging;

/// Errors that stop the runner.
#[derive(Debug, Error)]
enum RunError {
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

fn main() -> ExitCode {
    let config = RunnerConfig::parse();

    if let Err(init_error) = logging::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for subscriber errors"
        )]
        {
            eprintln!("failed to initialize logging: {init_error}");
        }

        return ExitCode::FAILURE;
    }

    match execute(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!("discount evaluation failed: {run_error}");

            ExitCode::FAILURE
        }
    }
}

fn execute(config: &RunnerConfig) -> Result<(), RunError> {
    let json = match &config.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut json = String::new();
            io::stdin().read_to_string(&mut json)?;
            json
        }
    };

    debug!(input = %json, "function input");

    let input = FunctionInput::from_json(&json)?;
    let output = run(&input)?.to_json(config.pretty)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;

    Ok(())
}
