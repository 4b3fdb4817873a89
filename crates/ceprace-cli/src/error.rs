use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
///
/// A timeout is not an error here: it is rendered like any other outcome
/// and exits with [`crate::commands::TIMEOUT_EXIT_CODE`].
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ceprace_core::ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
