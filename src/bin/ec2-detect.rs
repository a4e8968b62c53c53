//! CLI binary for the ec2-detect crate.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use ec2_detect::{
    is_override_key, DetectOptions, DetectionResult, Detector, EnvExport, ImdsError,
    DEFAULT_PREFIX,
};
use tracing_subscriber::EnvFilter;

/// Exit status when the host is not an EC2 instance.
const NOT_EC2: u8 = 1;

/// Exit status for unexpected errors.
const ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "ec2-detect")]
#[command(
    author,
    version,
    about = "Detect whether this machine is an AWS EC2 instance",
    long_about = "Probes the EC2 instance metadata service (IMDSv2, then IMDSv1).\n\
                  Exits 0 on EC2, 1 otherwise, and 2 on unexpected errors.\n\
                  Set RUST_LOG=debug to trace individual probes."
)]
struct Cli {
    /// Print the result as JSON
    #[arg(short, long)]
    json: bool,

    /// Also retrieve instance metadata
    #[arg(short, long)]
    verbose: bool,

    /// Per-request timeout in milliseconds
    #[arg(short, long, value_name = "MS", default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print shell `export` commands instead of text or JSON
    #[arg(short, long, conflicts_with = "json")]
    env: bool,

    /// Variable name prefix used with --env
    #[arg(short, long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Replace the variable name for one key, e.g. instance-id=INSTANCE_ID
    #[arg(short = 'o', long = "override", value_name = "KEY=NAME", value_parser = parse_override)]
    overrides: Vec<(String, String)>,
}

fn parse_override(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, name)) if !key.is_empty() && !name.is_empty() => {
            if !is_override_key(key) {
                return Err(format!(
                    "unknown key: {} (expected isEC2, imdsVersion, or a metadata field such as instance-id)",
                    key
                ));
            }
            Ok((key.to_string(), name.to_string()))
        }
        _ => Err(format!("expected KEY=NAME, got: {}", s)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(NOT_EC2),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(ERROR)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<bool, ImdsError> {
    let options = DetectOptions::default()
        .with_timeout(Duration::from_millis(cli.timeout))
        .with_verbose(cli.verbose);

    let result = Detector::new()?.detect(&options).await;

    let mut stdout = io::stdout().lock();
    if cli.env {
        let export = cli
            .overrides
            .into_iter()
            .fold(EnvExport::new().with_prefix(cli.prefix), |export, (key, name)| {
                export.with_override(key, name)
            });
        stdout.write_all(export.shell(&result).as_bytes())?;
    } else if cli.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write_text(&mut stdout, &result)?;
    }

    Ok(result.is_ec2)
}

fn write_text(out: &mut impl Write, result: &DetectionResult) -> io::Result<()> {
    writeln!(out, "{}", result.is_ec2)?;
    if let Some(version) = result.imds_version {
        writeln!(out, "imds-version: {}", version)?;
    }
    if let Some(metadata) = &result.metadata {
        for (field, value) in metadata {
            writeln!(out, "{}: {}", field, value)?;
        }
    }
    Ok(())
}
