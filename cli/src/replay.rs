//! Replays an operation log against a registry.

use serde::Serialize;
use std::io::{BufRead, Write};
use tcr_registry::{Receipt, Registry};
use tcr_utils::OperationStats;

use crate::ops::{LogEntry, OpOutput};
use crate::CliError;

/// How receipts are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Line<'a> {
    Committed { line: usize, op: &'static str, receipt: &'a Receipt<OpOutput> },
    Rejected { line: usize, op: &'static str, kind: &'static str, error: String },
}

/// Apply every entry of `input` in order. Blank lines and lines starting
/// with `#` are skipped; a line that does not parse aborts the replay.
/// Rejected operations are reported and counted, and the replay goes on.
pub fn replay<R: BufRead, W: Write>(
    registry: &Registry,
    input: R,
    out: &mut W,
    format: OutputFormat,
) -> Result<OperationStats, CliError> {
    let mut stats = OperationStats::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let raw = raw?;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let entry: LogEntry = serde_json::from_str(text).map_err(|e| CliError::Log {
            line,
            message: e.to_string(),
        })?;
        let op = entry.op.name();

        match registry.execute_at(entry.at, |engine, now| entry.op.apply(engine, now)) {
            Ok(receipt) => {
                stats.record_applied(op);
                match format {
                    OutputFormat::Human => write_receipt(out, op, &receipt)?,
                    OutputFormat::Json => {
                        serde_json::to_writer(&mut *out, &Line::Committed { line, op, receipt: &receipt })?;
                        writeln!(out)?;
                    }
                }
            }
            Err(rejection) => {
                tracing::warn!(line, op, at = %entry.at, error = %rejection, "operation rejected");
                stats.record_rejected(op, rejection.kind());
                match format {
                    OutputFormat::Human => writeln!(out, "line {line}: {op} rejected: {rejection}")?,
                    OutputFormat::Json => {
                        let record = Line::Rejected {
                            line,
                            op,
                            kind: rejection.kind(),
                            error: rejection.to_string(),
                        };
                        serde_json::to_writer(&mut *out, &record)?;
                        writeln!(out)?;
                    }
                }
            }
        }
    }
    Ok(stats)
}

fn write_receipt<W: Write>(out: &mut W, op: &str, receipt: &Receipt<OpOutput>) -> Result<(), CliError> {
    write!(out, "#{} @{} {op}", receipt.sequence, receipt.at)?;
    match &receipt.value {
        OpOutput::None => writeln!(out)?,
        value => writeln!(out, " -> {}", serde_json::to_string(value)?)?,
    }
    for event in &receipt.events {
        writeln!(out, "    {} {}", event.name(), serde_json::to_string(event)?)?;
    }
    for event in &receipt.directory_events {
        writeln!(out, "    directory {}", serde_json::to_string(event)?)?;
    }
    Ok(())
}

/// One-line summary of a finished replay.
pub fn write_summary<W: Write>(out: &mut W, stats: &OperationStats, last_sequence: u64) -> Result<(), CliError> {
    writeln!(
        out,
        "applied {} operations, rejected {}, last sequence {last_sequence}",
        stats.total_applied(),
        stats.total_rejected()
    )?;
    for (kind, count) in stats.errors() {
        writeln!(out, "    {kind}: {count}")?;
    }
    Ok(())
}
