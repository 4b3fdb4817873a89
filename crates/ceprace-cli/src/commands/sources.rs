use std::io::{self, Write};
use std::process::ExitCode;

use ceprace_core::{LookupConfig, RaceCoordinator};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::{self, SourceRow};

/// Lists every backend the lookup would race, with the URL it would hit
/// for the configured postal code. No request is made.
pub fn run(cli: &Cli, config: &LookupConfig) -> Result<ExitCode, CliError> {
    let coordinator = RaceCoordinator::from_config(config);
    let rows = coordinator
        .sources()
        .iter()
        .map(|source| SourceRow {
            id: source.id(),
            endpoint: source.endpoint(&config.postal_code),
        })
        .collect::<Vec<_>>();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::render_sources(&mut out, &rows, cli.format, cli.pretty)?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
