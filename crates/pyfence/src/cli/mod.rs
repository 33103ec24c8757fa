//! Command-line runtime for the `pyfence` binary.
//!
//! [`run`] splits configuration flags from the subcommand, loads the
//! configuration, installs telemetry, builds an [`Engine`] and prints the
//! result as JSON. Exit codes: `0` when the snippet succeeded or every test
//! passed, `1` when it did not, `2` for usage and configuration errors.

mod args;
mod config;
mod error;

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use serde::Serialize;

use crate::engine::Engine;
use crate::telemetry;
use crate::validation::TestCase;
use args::{Cli, Command, SourceArgs};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use error::CliError;

const FAILED: u8 = 1;
const USAGE_ERROR: u8 = 2;

/// Runs the CLI with the process's stdin and the given output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut stdin = io::stdin().lock();
    run_with(args, &mut stdin, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with<I, R, W, E, L>(
    args: I,
    stdin: &mut R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(stdout, "{error}").ok();
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(stderr, &CliError::Usage(error)),
    };

    match execute(cli, &split.config_arguments, stdin, stdout, loader) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(FAILED),
        Err(error) => report(stderr, &error),
    }
}

/// Runs one command; `Ok(false)` means the snippet failed or a test did not
/// pass.
fn execute<R, W, L>(
    cli: Cli,
    config_arguments: &[OsString],
    stdin: &mut R,
    stdout: &mut W,
    loader: &L,
) -> Result<bool, CliError>
where
    R: Read,
    W: Write,
    L: ConfigLoader,
{
    let config = loader.load(config_arguments)?;
    telemetry::initialise(&config)?;
    let engine = Engine::from_config(&config)?;

    match cli.command {
        Command::Exec { source } => {
            let code = read_source(&source, stdin)?;
            let outcome = engine.execute(&code);
            emit(stdout, &outcome)?;
            Ok(outcome.success())
        }
        Command::Test {
            input,
            expected,
            source,
        } => {
            let value = serde_json::from_str(&input).map_err(CliError::ParseInput)?;
            let code = read_source(&source, stdin)?;
            let result = engine.run_test_case(&code, value, &expected);
            emit(stdout, &result)?;
            Ok(result.passed)
        }
        Command::Validate {
            cases: cases_path,
            source,
        } => {
            let raw = fs::read_to_string(&cases_path).map_err(|error| CliError::ReadCases {
                path: cases_path.clone(),
                source: error,
            })?;
            let cases: Vec<TestCase> = serde_json::from_str(&raw).map_err(CliError::ParseCases)?;
            let code = read_source(&source, stdin)?;
            let report = engine.validate_solution(&code, &cases);
            emit(stdout, &report)?;
            Ok(report.all_passed)
        }
        Command::Describe => {
            writeln!(stdout, "{}", engine.describe()).map_err(CliError::Emit)?;
            Ok(true)
        }
    }
}

fn read_source<R: Read>(source: &SourceArgs, stdin: &mut R) -> Result<String, CliError> {
    if let Some(code) = &source.code {
        return Ok(code.clone());
    }
    match source.file.as_ref().filter(|path| path.as_str() != "-") {
        Some(path) => fs::read_to_string(path).map_err(|error| CliError::ReadSource {
            path: path.to_string(),
            source: error,
        }),
        None => {
            let mut code = String::new();
            stdin
                .read_to_string(&mut code)
                .map_err(|error| CliError::ReadSource {
                    path: String::from("stdin"),
                    source: error,
                })?;
            Ok(code)
        }
    }
}

fn emit<W: Write, T: Serialize>(stdout: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *stdout, value).map_err(CliError::Serialise)?;
    stdout.write_all(b"\n").map_err(CliError::Emit)?;
    stdout.flush().map_err(CliError::Emit)
}

fn report<E: Write>(stderr: &mut E, error: &CliError) -> ExitCode {
    writeln!(stderr, "{error}").ok();
    ExitCode::from(USAGE_ERROR)
}
