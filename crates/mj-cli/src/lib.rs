use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use mj_api::{default_arguments, descriptor, MathJax, MathJaxOptions};
use mj_core::{ConversionOptions, MathJaxError, MathJaxResult, VersionGate};
use mj_runtime::DirectoryBundleLocator;
use tracing::debug;

mod cli_args;
mod error_map;
mod logging;

pub(crate) use cli_args::{Cli, ConvertArgs, MetadataArgs, Mode};
pub(crate) use error_map::{emit_error, emit_item_error};
pub use logging::{init_logging, LOG_ENV};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> MathJaxResult<i32> {
    match cli.command {
        Mode::Convert(args) => run_convert(args),
        Mode::Metadata(args) => run_metadata(args),
    }
}

fn run_convert(args: ConvertArgs) -> MathJaxResult<i32> {
    let function = descriptor(&args.function)
        .ok_or_else(|| MathJaxError::MissingFunction(args.function.clone()))?;

    let mut options = MathJaxOptions::new(
        &args.lockfile,
        Arc::new(DirectoryBundleLocator::new(&args.bundles_dir)),
    );
    options.expected_version = args.expect;
    options.preferred_formats = args.preload;
    let mut mathjax = MathJax::new(options)?;

    let extra = default_arguments(
        function,
        ConversionOptions {
            display: !args.inline,
            ..ConversionOptions::default()
        },
    )?;
    debug!(function = function.name, items = args.inputs.len(), "converting");
    let responses = mathjax.convert_batch(function, &args.inputs, &extra)?;

    println!("RESULT:OK");
    println!("FUNCTION:{}", function.name);
    for (index, response) in responses.iter().enumerate() {
        match &response.error {
            None => println!(
                "OUTPUT_JSON:{}",
                serde_json::to_string(&response.value).expect("string json")
            ),
            Some(error) => emit_item_error(index, error),
        }
    }
    Ok(0)
}

fn run_metadata(args: MetadataArgs) -> MathJaxResult<i32> {
    let gate = VersionGate::new(&args.lockfile);
    let metadata = match args.expect {
        Some(expected) => gate.with_expected_version(expected).check()?,
        None => gate.read_metadata()?,
    };

    println!("RESULT:OK");
    println!(
        "METADATA_JSON:{}",
        serde_json::to_string(&metadata).expect("metadata json")
    );
    Ok(0)
}
