use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::debug;

use crate::category::ApiCategory;
use crate::clock::{Clock, SystemClock};
use crate::config::{CategoryOptions, ClientConfig, CredentialSource};
use crate::endpoint::ApiEndpoint;
use crate::error::ClientError;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::throttling::{ThrottleController, ThrottleTable};

/// Entry point: holds configuration, transport, clock and the quota table
/// shared by every category obtained from it.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    throttle: Arc<ThrottleTable>,
    retry: RetryConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: Arc::new(ReqwestHttpClient::default()),
            clock: Arc::new(SystemClock),
            throttle: Arc::new(ThrottleTable::new()),
            retry: RetryConfig::default(),
        }
    }

    /// Infers settings from `source`, then applies `overrides` on top.
    pub fn from_source(
        source: &dyn CredentialSource,
        overrides: ClientConfig,
    ) -> Result<Self, ClientError> {
        let config = ClientConfig::infer(source)?.overlay(overrides);
        Ok(Self::new(config))
    }

    /// [`Client::from_source`] over the process environment.
    pub fn from_env(overrides: ClientConfig) -> Result<Self, ClientError> {
        Self::from_source(&crate::config::EnvCredentialSource, overrides)
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Quota table shared by this client's categories.
    pub fn throttling(&self) -> &ThrottleTable {
        &self.throttle
    }

    pub fn category(&self, name: &str) -> Result<ApiEndpoint, ClientError> {
        self.category_with(name, &CategoryOptions::default())
    }

    pub fn category_with(
        &self,
        name: &str,
        options: &CategoryOptions,
    ) -> Result<ApiEndpoint, ClientError> {
        let category = ApiCategory::new(name, &self.config, options)?;
        debug!(
            category = category.name(),
            version = category.version(),
            endpoint = category.endpoint().base(),
            "category ready"
        );

        let throttle = ThrottleController::new(Arc::clone(&self.throttle), Arc::clone(&self.clock));
        Ok(ApiEndpoint::new(
            category,
            Arc::clone(&self.http),
            Arc::clone(&self.clock),
            throttle,
            self.retry.clone(),
        ))
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("throttled_keys", &self.throttle.len())
            .finish_non_exhaustive()
    }
}
