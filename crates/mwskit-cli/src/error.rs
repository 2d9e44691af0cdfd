use mwskit_core::{ClientError, ConfigError, ParamError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Client(ClientError::Config(_) | ClientError::Params(_)) => 2,
            Self::Client(ClientError::Transport(_)) => 3,
            Self::Client(ClientError::ThrottleExhausted { .. }) => 4,
            Self::Config(_) | Self::Params(_) | Self::Argument(_) => 2,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwskit_core::{HttpError, ThrottleKey};
    use std::time::Duration;

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(CliError::from(ConfigError::MissingSecretKey).exit_code(), 2);
        assert_eq!(
            CliError::from(ClientError::from(ConfigError::MissingMerchantId)).exit_code(),
            2
        );
        assert_eq!(
            CliError::from(ClientError::from(HttpError::new("reset"))).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(ClientError::ThrottleExhausted {
                key: ThrottleKey::new("Orders", "ListOrders"),
                attempts: 11,
                waited: Duration::from_secs(100),
            })
            .exit_code(),
            4
        );
        assert_eq!(CliError::Argument(String::from("x")).exit_code(), 2);
    }
}
