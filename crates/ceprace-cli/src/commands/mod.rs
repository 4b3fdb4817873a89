mod lookup;
mod sources;

use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Exit code for a lookup that reached its deadline without an address.
pub const TIMEOUT_EXIT_CODE: u8 = 3;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let config = cli.lookup_config()?;

    match &cli.command {
        None | Some(Command::Lookup(_)) => lookup::run(cli, &config).await,
        Some(Command::Sources) => sources::run(cli, &config),
    }
}
