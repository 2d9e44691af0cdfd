use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::http_client::HttpError;
use crate::throttling::ThrottleKey;

/// Configuration problems detected before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("must provide an access key id (aws_access_key_id)")]
    MissingAccessKeyId,
    #[error("must provide a secret access key (secret_access_key)")]
    MissingSecretKey,
    #[error("must provide a merchant/seller id (merchant_id)")]
    MissingMerchantId,

    #[error("invalid endpoint '{value}', expected scheme://host[:port]")]
    InvalidEndpoint { value: String },
    #[error("unknown marketplace '{value}'")]
    UnknownMarketplace { value: String },
    #[error("category name cannot be empty")]
    EmptyCategory,

    #[error("failed to read config file {path}: {message}")]
    ReadConfig { path: PathBuf, message: String },
    #[error("failed to parse config file {path}: {message}")]
    ParseConfig { path: PathBuf, message: String },
}

/// Usage errors raised while flattening request parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid key '{key}': no word boundary to infer a list element name from")]
    NoElementBoundary { key: String },
    #[error("list '{key}' mixes records and scalar values")]
    MixedList { key: String },
    #[error("list '{key}' contains a nested list")]
    NestedList { key: String },
    #[error("parameter '{key}' is a record outside of a list")]
    UnexpectedRecord { key: String },
    #[error("parameter '{key}' has an unsupported JSON value: {kind}")]
    UnsupportedJson { key: String, kind: &'static str },
    #[error("timestamp for '{key}' cannot be rendered as ISO-8601")]
    UnformattableTimestamp { key: String },
}

/// Malformed response body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed XML document: {message}")]
pub struct DocumentError {
    message: String,
}

impl DocumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Top-level error type for requests issued through an [`crate::ApiEndpoint`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("request {key} still throttled after {attempts} attempts ({waited:?} spent backing off)")]
    ThrottleExhausted {
        key: ThrottleKey,
        attempts: u32,
        waited: Duration,
    },
}

impl ClientError {
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub const fn is_throttle_exhausted(&self) -> bool {
        matches!(self, Self::ThrottleExhausted { .. })
    }
}
