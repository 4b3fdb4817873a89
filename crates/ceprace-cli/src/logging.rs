use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr so stdout only carries the lookup result.
///
/// `--verbose` wins over `RUST_LOG`; otherwise `RUST_LOG` applies and falls
/// back to `warn`.
pub fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}
