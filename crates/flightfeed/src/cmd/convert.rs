//! Convert command - Offline dry run of the parse and encode stages
//!
//! Reads feeder lines from a file or stdin and prints one JSON document per
//! accepted line. Nothing is published.
//!
//! # Usage
//!
//! ```bash
//! flightfeed convert capture.tsv            # output to stdout
//! nc feeder 10001 | flightfeed convert      # live feed from stdin
//! ```

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use flightfeed_config::Config;
use flightfeed_pipeline::DriverConfig;
use flightfeed_protocol::{FieldPolicy, LineParser, Rejection, encode};
use flightfeed_sources::LineReader;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, trace};

/// Convert command arguments
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input file (reads stdin when omitted or "-")
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,
}

/// Line counts for one conversion
#[derive(Debug, Default, PartialEq, Eq)]
struct ConvertSummary {
    lines: u64,
    accepted: u64,
    rejected: u64,
    invalid: u64,
    defaulted: u64,
}

/// Run the convert command
pub async fn run(args: ConvertArgs, config: &Config) -> Result<ExitCode> {
    let policy = DriverConfig::from_config(config).field_policy;
    let max_line_size = config.source.max_line_size;
    let mut out = BufWriter::new(io::stdout());

    let summary = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            convert(BufReader::new(file), &mut out, policy, max_line_size).await?
        }
        _ => convert(BufReader::new(tokio::io::stdin()), &mut out, policy, max_line_size).await?,
    };

    info!(
        lines = summary.lines,
        accepted = summary.accepted,
        rejected = summary.rejected,
        invalid = summary.invalid,
        defaulted = summary.defaulted,
        "conversion complete"
    );

    Ok(ExitCode::SUCCESS)
}

async fn convert<R, W>(
    reader: R,
    out: &mut W,
    policy: FieldPolicy,
    max_line_size: usize,
) -> Result<ConvertSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    // A capture is finished input, so its last line counts even without a newline
    let mut reader = LineReader::new(reader, max_line_size)
        .with_name("convert")
        .with_trailing_line(true);
    let parser = LineParser::new(policy);
    let mut summary = ConvertSummary::default();

    while let Some(line) = reader.read_line().await.context("failed to read input")? {
        summary.lines += 1;

        let parsed = match parser.parse(&line) {
            Ok(parsed) => parsed,
            Err(rejection) => {
                match rejection {
                    Rejection::ShapeMismatch { .. } => summary.rejected += 1,
                    Rejection::InvalidField { .. } => summary.invalid += 1,
                }
                trace!(line = summary.lines, reason = %rejection, "line discarded");
                continue;
            }
        };

        summary.defaulted += parsed.defaulted.len() as u64;
        let payload = encode(&parsed.record)?;
        out.write_all(&payload)?;
        out.write_all(b"\n")?;
        summary.accepted += 1;
    }

    out.flush().context("failed to write output")?;
    Ok(summary)
}
