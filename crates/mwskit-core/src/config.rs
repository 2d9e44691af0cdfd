//! Client configuration, per-category options and credential inference.
//!
//! Explicit values always win over inferred ones:
//!
//! ```rust,ignore
//! let config = ClientConfig::infer(&EnvCredentialSource)?
//!     .overlay(ClientConfig::new().with_merchant_id("A2MERCHANT"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter};
use std::path::Path;

use serde::Deserialize;

use crate::debug_log::DebugLog;
use crate::error::ConfigError;
use crate::http_client::{merge_headers, set_header, HttpMethod};
use crate::marketplace::Marketplace;
use crate::params::Params;

pub const DEFAULT_USER_AGENT: &str = concat!("mwskit/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Key/value lookup used to infer configuration (environment, secret stores).
pub trait CredentialSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads upper-cased keys from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialSource;

impl CredentialSource for EnvCredentialSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key.to_ascii_uppercase()).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl CredentialSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Looks up `mws_{key}` first, then `{key}`. Blank values count as absent.
fn infer_value(source: &dyn CredentialSource, key: &str) -> Option<String> {
    source
        .lookup(&format!("mws_{key}"))
        .filter(|value| !value.trim().is_empty())
        .or_else(|| source.lookup(key).filter(|value| !value.trim().is_empty()))
}

/// Access key id, secret key and merchant id. `Debug` never prints the secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: Option<String>,
    pub secret_key: Option<String>,
    pub merchant_id: Option<String>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("merchant_id", &self.merchant_id)
            .finish()
    }
}

/// Client-wide settings shared by every category.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub marketplace: Option<Marketplace>,
    pub user_agent: Option<String>,
    pub endpoint: Option<String>,
    pub verb: Option<HttpMethod>,
    pub timeout_ms: Option<u64>,
    pub params: Params,
    pub headers: BTreeMap<String, String>,
    pub log: Option<DebugLog>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infers credentials, marketplace and user agent from `source`.
    pub fn infer(source: &dyn CredentialSource) -> Result<Self, ConfigError> {
        let marketplace = infer_value(source, "marketplace")
            .map(|value| value.parse::<Marketplace>())
            .transpose()?;

        Ok(Self {
            credentials: Credentials {
                access_key_id: infer_value(source, "aws_access_key_id"),
                secret_key: infer_value(source, "secret_access_key"),
                merchant_id: infer_value(source, "merchant_id")
                    .or_else(|| infer_value(source, "seller_id")),
            },
            marketplace,
            user_agent: infer_value(source, "user_agent"),
            ..Self::default()
        })
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let parse_error = |message: String| ConfigError::ParseConfig {
            path: path.to_path_buf(),
            message,
        };

        let file: ConfigFile = serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string()))?;
        file.into_config().map_err(parse_error)
    }

    /// Returns `self` with every value set in `other` taking precedence.
    pub fn overlay(mut self, other: ClientConfig) -> Self {
        let ClientConfig {
            credentials,
            marketplace,
            user_agent,
            endpoint,
            verb,
            timeout_ms,
            params,
            headers,
            log,
        } = other;

        self.credentials.access_key_id = credentials
            .access_key_id
            .or(self.credentials.access_key_id);
        self.credentials.secret_key = credentials.secret_key.or(self.credentials.secret_key);
        self.credentials.merchant_id = credentials.merchant_id.or(self.credentials.merchant_id);
        self.marketplace = marketplace.or(self.marketplace);
        self.user_agent = user_agent.or(self.user_agent);
        self.endpoint = endpoint.or(self.endpoint);
        self.verb = verb.or(self.verb);
        self.timeout_ms = timeout_ms.or(self.timeout_ms);
        self.params.extend(&params);
        merge_headers(&mut self.headers, &headers);
        self.log = log.or(self.log);
        self
    }

    pub fn with_access_key_id(mut self, value: impl Into<String>) -> Self {
        self.credentials.access_key_id = Some(value.into());
        self
    }

    pub fn with_secret_key(mut self, value: impl Into<String>) -> Self {
        self.credentials.secret_key = Some(value.into());
        self
    }

    pub fn with_merchant_id(mut self, value: impl Into<String>) -> Self {
        self.credentials.merchant_id = Some(value.into());
        self
    }

    pub fn with_marketplace(mut self, marketplace: Marketplace) -> Self {
        self.marketplace = Some(marketplace);
        self
    }

    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = Some(value.into());
        self
    }

    pub fn with_endpoint(mut self, value: impl Into<String>) -> Self {
        self.endpoint = Some(value.into());
        self
    }

    pub fn with_verb(mut self, verb: HttpMethod) -> Self {
        self.verb = Some(verb);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(&params);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn with_log(mut self, log: DebugLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace.unwrap_or_default()
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Explicit endpoint, or the marketplace's regional endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.marketplace().endpoint())
    }
}

/// Settings that apply to a single category and override the client's.
#[derive(Debug, Clone, Default)]
pub struct CategoryOptions {
    pub verb: Option<HttpMethod>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub params: Params,
    pub headers: BTreeMap<String, String>,
    pub log: Option<DebugLog>,
}

impl CategoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verb(mut self, verb: HttpMethod) -> Self {
        self.verb = Some(verb);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(&params);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn with_log(mut self, log: DebugLog) -> Self {
        self.log = Some(log);
        self
    }
}

/// On-disk JSON form of [`ClientConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    aws_access_key_id: Option<String>,
    secret_access_key: Option<String>,
    #[serde(alias = "seller_id", alias = "merchant")]
    merchant_id: Option<String>,
    marketplace: Option<String>,
    user_agent: Option<String>,
    endpoint: Option<String>,
    verb: Option<String>,
    timeout_ms: Option<u64>,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl ConfigFile {
    fn into_config(self) -> Result<ClientConfig, String> {
        let marketplace = self
            .marketplace
            .map(|value| value.parse::<Marketplace>())
            .transpose()
            .map_err(|e| e.to_string())?;
        let verb = self
            .verb
            .map(|value| value.parse::<HttpMethod>())
            .transpose()
            .map_err(|e| e.to_string())?;
        let params = Params::from_json_object(&self.params).map_err(|e| e.to_string())?;

        Ok(ClientConfig {
            credentials: Credentials {
                access_key_id: self.aws_access_key_id,
                secret_key: self.secret_access_key,
                merchant_id: self.merchant_id,
            },
            marketplace,
            user_agent: self.user_agent,
            endpoint: self.endpoint,
            verb,
            timeout_ms: self.timeout_ms,
            params,
            headers: self.headers,
            log: None,
        })
    }
}
