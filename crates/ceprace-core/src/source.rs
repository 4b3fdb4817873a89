use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Canonical backend identifiers used in race reports and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    BrasilApi,
    ViaCep,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::BrasilApi, Self::ViaCep];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrasilApi => "brasilapi",
            Self::ViaCep => "viacep",
        }
    }

    /// Human-facing label stamped on resolved addresses.
    pub const fn label(self) -> &'static str {
        match self {
            Self::BrasilApi => "BrasilAPI",
            Self::ViaCep => "ViaCEP",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "brasilapi" => Ok(Self::BrasilApi),
            "viacep" => Ok(Self::ViaCep),
            other => Err(ConfigError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ViaCEP".parse::<ProviderId>(), Ok(ProviderId::ViaCep));
        assert_eq!(" brasilapi ".parse::<ProviderId>(), Ok(ProviderId::BrasilApi));
    }

    #[test]
    fn rejects_unknown_backend() {
        let error = "correios".parse::<ProviderId>().expect_err("unknown backend");
        assert_eq!(
            error,
            ConfigError::InvalidSource {
                value: String::from("correios")
            }
        );
    }

    #[test]
    fn labels_differ_from_machine_names() {
        for provider in ProviderId::ALL {
            assert_ne!(provider.as_str(), provider.label());
        }
    }
}
