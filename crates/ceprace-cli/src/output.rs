//! Rendering of lookup outcomes to stdout.
//!
//! Text mode prints labelled lines for people; JSON mode prints one document
//! per invocation with a `status` discriminator so scripts can branch on it.

use std::io::Write;

use ceprace_core::{ContenderReport, ProviderId, RaceSuccess};
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// What is left of a timed-out race once its stragglers have settled.
pub struct TimeoutSummary<'a> {
    pub postal_code: &'a str,
    pub budget_ms: u64,
    pub latency_ms: u64,
    pub contenders: &'a [ProviderId],
    pub reports: &'a [ContenderReport],
}

#[derive(Debug, Clone)]
pub struct SourceRow {
    pub id: ProviderId,
    pub endpoint: String,
}

pub fn render_success<W: Write>(
    out: &mut W,
    success: &RaceSuccess,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            let address = &success.address;
            writeln!(
                out,
                "✅ Response received from {} in {}ms",
                address.source_label(),
                success.latency_ms
            )?;
            writeln!(out, "📍 CEP: {}", address.postal_code)?;
            writeln!(out, "📍 Street: {}", address.street)?;
            writeln!(out, "📍 Neighborhood: {}", address.neighborhood)?;
            writeln!(out, "📍 City/State: {}", address.city_and_state())?;
            Ok(())
        }
        OutputFormat::Json => {
            let document = json!({
                "status": "ok",
                "address": success.address,
                "meta": {
                    "winner": success.winner,
                    "contenders": success.contenders,
                    "latency_ms": success.latency_ms,
                },
            });
            write_json(out, &document, pretty)
        }
    }
}

pub fn render_timeout<W: Write>(
    out: &mut W,
    summary: &TimeoutSummary<'_>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "⏱️ Error: timeout after {}ms.", summary.budget_ms)?;
            Ok(())
        }
        OutputFormat::Json => {
            let document = json!({
                "status": "timeout",
                "error": format!(
                    "timed out after {}ms waiting for an address",
                    summary.budget_ms
                ),
                "postal_code": summary.postal_code,
                "meta": {
                    "budget_ms": summary.budget_ms,
                    "latency_ms": summary.latency_ms,
                    "contenders": summary.contenders,
                    "reports": summary.reports,
                },
            });
            write_json(out, &document, pretty)
        }
    }
}

pub fn render_sources<W: Write>(
    out: &mut W,
    rows: &[SourceRow],
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            for row in rows {
                writeln!(out, "{:<10} {:<10} {}", row.id, row.id.label(), row.endpoint)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let sources = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.id,
                        "label": row.id.label(),
                        "endpoint": row.endpoint,
                    })
                })
                .collect::<Vec<_>>();
            write_json(out, &json!({ "sources": sources }), pretty)
        }
    }
}

fn write_json<W: Write>(out: &mut W, document: &Value, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, document)?;
    } else {
        serde_json::to_writer(&mut *out, document)?;
    }
    writeln!(out)?;
    Ok(())
}
