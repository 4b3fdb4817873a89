use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use ceprace_core::{LookupConfig, RaceCoordinator};
use tracing::debug;

use crate::cli::Cli;
use crate::commands::TIMEOUT_EXIT_CODE;
use crate::error::CliError;
use crate::output;

/// How long a timed-out lookup waits for its contenders to report back.
/// They were cancelled at the deadline, so this only covers task teardown.
const SETTLE_GRACE: Duration = Duration::from_millis(100);

pub async fn run(cli: &Cli, config: &LookupConfig) -> Result<ExitCode, CliError> {
    let coordinator = RaceCoordinator::from_config(config);
    let outcome = coordinator
        .race(&config.postal_code, config.timeout())
        .await;

    match outcome {
        Ok(success) => {
            let mut out = io::stdout().lock();
            output::render_success(&mut out, &success, cli.format, cli.pretty)?;
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(timeout) => {
            let budget_ms = timeout.budget_ms;
            let contenders = timeout.contenders.clone();
            let latency_ms = timeout.latency_ms;
            let reports = tokio::time::timeout(SETTLE_GRACE, timeout.stragglers.settle())
                .await
                .unwrap_or_default();
            for report in &reports {
                debug!(provider = %report.provider, delivery = ?report.delivery, "contender settled");
            }

            // Settling awaits, so stdout is only locked once it is done.
            let mut out = io::stdout().lock();
            let summary = output::TimeoutSummary {
                postal_code: &config.postal_code,
                budget_ms,
                latency_ms,
                contenders: &contenders,
                reports: &reports,
            };
            output::render_timeout(&mut out, &summary, cli.format, cli.pretty)?;
            out.flush()?;
            Ok(ExitCode::from(TIMEOUT_EXIT_CODE))
        }
    }
}
