//! # cache-bust CLI
//!
//! Prepends `/* BUILD_VERSION: <unix-seconds> */` to a file so bundlers that
//! key their cache on content hash pick up a fresh artifact.
//!
//! ```text
//! cache-bust <input_file> <output_file>
//! ```

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use cachebust_config::logging::init_logging;
use cachebust_config::path::normalize_or_original;
use cachebust_config::{log_cli_debug, log_cli_warn, Config};
use cachebust_core::{BustReport, CacheBuster};
use clap::Parser;

pub mod exit_codes;

const USAGE: &str = "Usage: cache-bust <input_file> <output_file>";

/// Stamp a text file with a build-time comment to defeat bundler caching
#[derive(Parser, Debug)]
#[command(name = "cache-bust")]
#[command(about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// File to read
    #[arg(value_name = "INPUT_FILE", allow_hyphen_values = true)]
    input: PathBuf,

    /// File to create or overwrite (may be the input file)
    #[arg(value_name = "OUTPUT_FILE", allow_hyphen_values = true)]
    output: PathBuf,
}

enum Parsed {
    Run(Cli),
    Exit(i32),
}

/// Exactly two arguments, both taken as paths whatever they look like.
fn parse_args<I, T>(args: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() != 3 {
        let _ = writeln!(io::stdout().lock(), "{USAGE}");
        return Parsed::Exit(exit_codes::FAILURE);
    }

    // `--` makes clap treat a second `--` or anything dash-prefixed as a value
    args.insert(1, OsString::from("--"));
    match Cli::try_parse_from(args) {
        Ok(cli) => Parsed::Run(cli),
        Err(_) => {
            let _ = writeln!(io::stdout().lock(), "{USAGE}");
            Parsed::Exit(exit_codes::FAILURE)
        }
    }
}

fn write_report(out: &mut impl Write, report: &BustReport) -> io::Result<()> {
    writeln!(out, "{report}")?;
    out.flush()
}

fn main() {
    let cli = match parse_args(std::env::args_os()) {
        Parsed::Run(cli) => cli,
        Parsed::Exit(code) => std::process::exit(code),
    };

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_logging(config.logging.level);

    if let Some(e) = config_error {
        log_cli_warn!(
            "Ignoring unreadable config, using defaults",
            error = tracing::field::display(&e)
        );
    }

    let outcome = run(&cli, &config).and_then(|report| {
        write_report(&mut io::stdout().lock(), &report)
            .map_err(|e| anyhow::anyhow!("failed to print report: {e}"))
    });
    let code = match outcome {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let _ = writeln!(io::stderr().lock(), "❌ Error: {e}");
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli, config: &Config) -> Result<BustReport> {
    log_cli_debug!(
        "Stamping",
        input = tracing::field::display(normalize_or_original(&cli.input).display()),
        output = tracing::field::display(cli.output.display()),
        label = config.stamp.label.as_str(),
    );

    let report = CacheBuster::new()
        .label(config.stamp.label.clone())
        .apply(&cli.input, &cli.output)?;
    Ok(report)
}
