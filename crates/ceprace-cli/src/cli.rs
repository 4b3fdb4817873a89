//! CLI argument definitions for ceprace.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `[POSTAL_CODE]` | Race the backends for one CEP |
//! | `lookup` | Same as the bare form |
//! | `sources` | List the registered backends and their endpoints |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `1000` | Overall race budget in ms |
//! | `--brasilapi-url` | `https://brasilapi.com.br` | BrasilAPI base URL |
//! | `--viacep-url` | `http://viacep.com.br` | ViaCEP base URL |
//! | `--cancel-losers` | `false` | Abort losing requests once a winner is in |
//! | `-v, --verbose` | `false` | Debug logging on stderr |
//!
//! Unset options fall back to the `CEPRACE_*` environment and then to the
//! built-in defaults.
//!
//! # Examples
//!
//! ```bash
//! # Race both backends for the default CEP
//! ceprace
//!
//! # Bare positional form
//! ceprace 20040002
//!
//! # Look up a specific CEP as JSON
//! ceprace lookup 01001000 --format json --pretty
//!
//! # Tighter budget, show why each backend lost
//! ceprace lookup 01001000 --timeout-ms 300 -v
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use ceprace_core::{ConfigError, LookupConfig};

/// Resolve a Brazilian CEP by racing BrasilAPI and ViaCEP.
#[derive(Debug, Parser)]
#[command(
    name = "ceprace",
    author,
    version,
    about = "Resolve a Brazilian CEP by racing redundant address backends",
    long_about = "ceprace asks BrasilAPI and ViaCEP for the same postal code at the same time \
and prints whichever answers first. Backends that fail stay silent; if nobody answers \
within the budget the lookup times out.\n\
\n\
Use 'ceprace <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Overall race budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// BrasilAPI base URL.
    #[arg(long, global = true, value_name = "URL")]
    pub brasilapi_url: Option<String>,

    /// ViaCEP base URL.
    #[arg(long, global = true, value_name = "URL")]
    pub viacep_url: Option<String>,

    /// Abort the losing requests as soon as a winner is picked.
    #[arg(long, global = true)]
    pub cancel_losers: bool,

    /// Emit debug logs on stderr, including why each backend lost.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Postal code to resolve; defaults to CEPRACE_POSTAL_CODE or 54325251
    pub postal_code: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// Single JSON document
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Race the backends for one CEP
    Lookup(LookupArgs),
    /// List the registered backends
    Sources,
}

#[derive(Debug, Clone, Args)]
pub struct LookupArgs {
    /// Postal code to resolve; defaults to CEPRACE_POSTAL_CODE or 54325251
    pub postal_code: Option<String>,
}

impl Cli {
    /// Environment-backed defaults with explicit flags layered on top.
    pub fn lookup_config(&self) -> Result<LookupConfig, ConfigError> {
        let config = LookupConfig::with_env_overrides()?;
        let config = self.apply_overrides(config);
        config.validate()?;
        Ok(config)
    }

    /// `lookup <CEP>` wins over the bare positional form.
    fn requested_postal_code(&self) -> Option<&str> {
        match &self.command {
            Some(Command::Lookup(LookupArgs {
                postal_code: Some(postal_code),
            })) => Some(postal_code),
            _ => self.postal_code.as_deref(),
        }
    }

    fn apply_overrides(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(postal_code) = self.requested_postal_code() {
            config = config.with_postal_code(postal_code.trim());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout_ms(timeout_ms);
        }
        if let Some(url) = &self.brasilapi_url {
            config = config.with_brasilapi_base_url(url.as_str());
        }
        if let Some(url) = &self.viacep_url {
            config = config.with_viacep_base_url(url.as_str());
        }
        if self.cancel_losers {
            config = config.with_cancel_losers_on_win(true);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_defaults_to_text_lookup() {
        let cli = Cli::try_parse_from(["ceprace"]).expect("parses");

        assert!(cli.command.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.pretty);

        let config = cli.apply_overrides(LookupConfig::default());
        assert_eq!(config, LookupConfig::default());
    }

    #[test]
    fn bare_positional_sets_postal_code() {
        let cli = Cli::try_parse_from(["ceprace", "20040002", "--timeout-ms", "500"])
            .expect("parses");

        assert!(cli.command.is_none());
        let config = cli.apply_overrides(LookupConfig::default());
        assert_eq!(config.postal_code, "20040002");
        assert_eq!(config.timeout_ms, 500);
    }

    #[test]
    fn lookup_flags_override_config() {
        let cli = Cli::try_parse_from([
            "ceprace",
            "lookup",
            " 01001000 ",
            "--timeout-ms",
            "250",
            "--viacep-url",
            "http://127.0.0.1:9000",
            "--cancel-losers",
            "--format",
            "json",
        ])
        .expect("parses");

        assert_eq!(cli.format, OutputFormat::Json);
        let config = cli.apply_overrides(LookupConfig::default());
        assert_eq!(config.postal_code, "01001000");
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.viacep_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.brasilapi_base_url, "https://brasilapi.com.br");
        assert!(config.cancel_losers_on_win);
    }

    #[test]
    fn global_flags_are_accepted_before_the_command() {
        let cli = Cli::try_parse_from(["ceprace", "-v", "--pretty", "sources"]).expect("parses");

        assert!(cli.verbose);
        assert!(cli.pretty);
        assert!(matches!(cli.command, Some(Command::Sources)));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["ceprace", "--format", "table"]).is_err());
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["ceprace", "--timeout-ms", "1s"]).is_err());
    }
}
