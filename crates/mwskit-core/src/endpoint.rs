//! Request orchestration: merge, resolve, sign, send, inspect, retry.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::category::{ApiCategory, EndpointUrl};
use crate::clock::Clock;
use crate::error::{ClientError, ParamError};
use crate::http_client::{merge_headers, set_header, HttpClient, HttpMethod, HttpRequest};
use crate::params::{resolve, Params};
use crate::response::Response;
use crate::retry::RetryConfig;
use crate::signer::{
    canonical_query, canonical_string, generate_signature, signed_query, SIGNATURE_METHOD,
    SIGNATURE_PARAM, SIGNATURE_VERSION,
};
use crate::throttling::{ThrottleController, ThrottleKey, ThrottleVerdict};
use crate::timestamp::format_iso8601;

/// Per-call overrides of the category's verb, endpoint and headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub verb: Option<HttpMethod>,
    pub endpoint: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verb(mut self, verb: HttpMethod) -> Self {
        self.verb = Some(verb);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }
}

/// Fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub verb: HttpMethod,
    pub base_url: String,
    pub host: String,
    pub path: String,
    /// Sorted, encoded parameters without `Signature`; this is what was signed.
    pub sorted_query: String,
    pub signature: String,
    pub canonical: String,
    pub headers: BTreeMap<String, String>,
    /// Every parameter that was signed, decoded.
    pub params: BTreeMap<String, String>,
}

impl SignedRequest {
    /// Query string as sent, including `Signature`.
    pub fn query(&self) -> String {
        signed_query(&self.sorted_query, &self.signature)
    }

    pub fn url(&self) -> String {
        format!("{}{}?{}", self.base_url, self.path, self.query())
    }

    pub fn to_http_request(&self, timeout_ms: u64) -> HttpRequest {
        HttpRequest::new(self.verb, self.url())
            .with_headers(&self.headers)
            .with_timeout_ms(timeout_ms)
    }

    fn describe(&self) -> Vec<String> {
        let mut body = self.params.clone();
        body.insert(SIGNATURE_PARAM.to_owned(), self.signature.clone());

        vec![
            format!("PATH:  {}", self.path),
            format!(
                "HEADERS:\n{}",
                serde_json::to_string_pretty(&self.headers).unwrap_or_default()
            ),
            format!(
                "BODY:\n{}",
                serde_json::to_string_pretty(&body).unwrap_or_default()
            ),
            format!("CANONICAL:\n  {}\n", self.canonical.replace('\n', "\n  ")),
        ]
    }
}

/// One API category bound to a client's transport, clock and throttle table.
#[derive(Clone)]
pub struct ApiEndpoint {
    category: Arc<ApiCategory>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    throttle: ThrottleController,
    retry: RetryConfig,
}

impl ApiEndpoint {
    pub fn new(
        category: ApiCategory,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        throttle: ThrottleController,
        retry: RetryConfig,
    ) -> Self {
        Self {
            category: Arc::new(category),
            http,
            clock,
            throttle,
            retry,
        }
    }

    pub fn category(&self) -> &ApiCategory {
        &self.category
    }

    pub async fn request(&self, operation: &str, params: &Params) -> Result<Response, ClientError> {
        self.request_with(operation, params, &RequestOptions::default())
            .await
    }

    /// Alias of [`ApiEndpoint::request`].
    pub async fn call(&self, operation: &str, params: &Params) -> Result<Response, ClientError> {
        self.request(operation, params).await
    }

    /// Sends `operation`, waiting out exhausted quota and retrying throttled
    /// attempts with a freshly signed request each time.
    pub async fn request_with(
        &self,
        operation: &str,
        params: &Params,
        options: &RequestOptions,
    ) -> Result<Response, ClientError> {
        self.category.credentials()?;
        let resolved = resolve(params)?;
        let endpoint = self.endpoint_for(options)?;
        let key = ThrottleKey::new(self.category.name(), operation);

        self.log(|| vec![format!("=== Begin MWS request {}", self.clock.now())]);
        let outcome = self
            .dispatch(operation, &key, &resolved, &endpoint, options)
            .await;
        self.log(|| vec![format!("=== End MWS request {}", self.clock.now())]);

        outcome
    }

    /// Builds and signs the request for `operation` without sending it.
    pub fn prepare(
        &self,
        operation: &str,
        params: &Params,
        options: &RequestOptions,
    ) -> Result<SignedRequest, ClientError> {
        self.category.credentials()?;
        let resolved = resolve(params)?;
        let endpoint = self.endpoint_for(options)?;
        self.sign_request(operation, &resolved, &endpoint, options)
    }

    async fn dispatch(
        &self,
        operation: &str,
        key: &ThrottleKey,
        resolved: &BTreeMap<String, String>,
        endpoint: &EndpointUrl,
        options: &RequestOptions,
    ) -> Result<Response, ClientError> {
        let mut attempt: u32 = 0;
        let mut backed_off = Duration::ZERO;

        loop {
            if let Some(waited) = self.throttle.before_send(key).await {
                self.log(|| {
                    vec![format!(
                        "Waited {:.3} seconds to avoid throttling",
                        waited.as_secs_f64()
                    )]
                });
            }

            let signed = self.sign_request(operation, resolved, endpoint, options)?;
            self.log(|| signed.describe());
            debug!(
                category = self.category.name(),
                operation,
                attempt,
                verb = signed.verb.as_str(),
                "sending request"
            );

            let raw = self
                .http
                .execute(signed.to_http_request(self.category.timeout_ms()))
                .await?;
            let response = Response::new(raw);

            match self.throttle.after_receive(key, &response) {
                ThrottleVerdict::Settled => return Ok(response),
                ThrottleVerdict::Throttled => {
                    let Some(delay) = self.retry.next_delay(attempt, backed_off) else {
                        warn!(
                            key = key.as_str(),
                            attempts = attempt + 1,
                            "giving up on throttled request"
                        );
                        return Err(ClientError::ThrottleExhausted {
                            key: key.clone(),
                            attempts: attempt + 1,
                            waited: backed_off,
                        });
                    };

                    self.log(|| {
                        vec![format!(
                            "Request throttled! Waiting {:.3} seconds",
                            delay.as_secs_f64()
                        )]
                    });
                    self.clock.sleep(delay).await;
                    backed_off = backed_off.saturating_add(delay);
                    attempt += 1;
                }
            }
        }
    }

    fn endpoint_for(&self, options: &RequestOptions) -> Result<EndpointUrl, ClientError> {
        match options.endpoint.as_deref() {
            Some(endpoint) => Ok(EndpointUrl::parse(endpoint)?),
            None => Ok(self.category.endpoint().clone()),
        }
    }

    /// Merges parameters by precedence (defaults, category, call, mandated),
    /// then sorts, signs and assembles the request.
    fn sign_request(
        &self,
        operation: &str,
        resolved: &BTreeMap<String, String>,
        endpoint: &EndpointUrl,
        options: &RequestOptions,
    ) -> Result<SignedRequest, ClientError> {
        let credentials = self.category.credentials()?;
        let timestamp =
            format_iso8601(self.clock.now()).ok_or_else(|| ParamError::UnformattableTimestamp {
                key: String::from("Timestamp"),
            })?;

        let mut params = BTreeMap::new();
        params.insert(String::from("SellerId"), credentials.merchant_id.to_owned());
        params.insert(String::from("SignatureMethod"), SIGNATURE_METHOD.to_owned());
        params.insert(String::from("SignatureVersion"), SIGNATURE_VERSION.to_owned());
        params.insert(String::from("Timestamp"), timestamp);
        params.insert(String::from("Version"), self.category.version().to_owned());
        params.extend(self.category.params().clone());
        params.extend(resolved.clone());
        params.insert(String::from("Action"), operation.to_owned());
        params.insert(
            String::from("AWSAccessKeyId"),
            credentials.access_key_id.to_owned(),
        );
        params.remove(SIGNATURE_PARAM);

        let verb = options.verb.unwrap_or(self.category.verb());
        let version = params.get("Version").map(String::as_str).unwrap_or_default();
        let path = format!("/{}/{}", self.category.name(), version);

        let sorted_query = canonical_query(&params);
        let canonical = canonical_string(verb, endpoint.host(), &path, &sorted_query);
        let signature = generate_signature(credentials.secret_key, &canonical);

        let mut headers = self.category.headers().clone();
        merge_headers(&mut headers, &options.headers);

        Ok(SignedRequest {
            verb,
            base_url: endpoint.base().to_owned(),
            host: endpoint.host().to_owned(),
            path,
            sorted_query,
            signature,
            canonical,
            headers,
            params,
        })
    }

    /// Builds the message only when a log sink is configured.
    fn log<F>(&self, message: F)
    where
        F: FnOnce() -> Vec<String>,
    {
        if let Some(log) = self.category.log() {
            let entries = message();
            #[cfg(test)]
            tests::MESSAGES_BUILT.with(|built| built.set(built.get() + 1));
            for entry in entries {
                log.emit(&entry);
            }
        }
    }
}

impl Debug for ApiEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("category", &self.category)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryOptions, ClientConfig};
    use crate::debug_log::DebugLog;
    use crate::mocks::{MockClock, ScriptedHttpClient};
    use crate::signer::sign;
    use crate::throttling::ThrottleTable;
    use std::cell::Cell;
    use std::sync::Mutex;
    use time::macros::datetime;

    thread_local! {
        pub(super) static MESSAGES_BUILT: Cell<usize> = const { Cell::new(0) };
    }

    fn endpoint_with(
        config: ClientConfig,
        http: &ScriptedHttpClient,
        clock: &MockClock,
    ) -> ApiEndpoint {
        let category =
            ApiCategory::new("Testing", &config, &CategoryOptions::new()).expect("valid category");
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        ApiEndpoint::new(
            category,
            Arc::new(http.clone()),
            Arc::clone(&clock),
            ThrottleController::new(Arc::new(ThrottleTable::new()), clock),
            RetryConfig::default(),
        )
    }

    fn config() -> ClientConfig {
        ClientConfig::new()
            .with_access_key_id("AKIAEXAMPLE")
            .with_secret_key("secret")
            .with_merchant_id("A2MERCHANT")
    }

    #[test]
    fn prepare_orders_parameters_by_precedence() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(
            config().with_params(Params::new().with("MarketplaceId", "ATVPDKIKX0DER")),
            &http,
            &clock,
        );

        let params = Params::new()
            .with("Version", "2020-01-01")
            .with("Action", "Spoofed")
            .with("Signature", "forged");
        let signed = endpoint
            .prepare("GetWidget", &params, &RequestOptions::new())
            .expect("signable");

        assert_eq!(signed.params["Action"], "GetWidget");
        assert_eq!(signed.params["Version"], "2020-01-01");
        assert_eq!(signed.params["SellerId"], "A2MERCHANT");
        assert_eq!(signed.params["MarketplaceId"], "ATVPDKIKX0DER");
        assert_eq!(signed.params["Timestamp"], "2017-04-07T12:00:00Z");
        assert!(!signed.params.contains_key("Signature"));
        assert_eq!(signed.path, "/Testing/2020-01-01");
        assert_eq!(signed.verb, HttpMethod::Post);
        assert_eq!(signed.host, "mws.amazonservices.com");
    }

    #[test]
    fn signature_covers_the_exact_sorted_query() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config(), &http, &clock);

        let signed = endpoint
            .prepare("GetWidget", &Params::new(), &RequestOptions::new())
            .expect("signable");

        let expected = sign(
            HttpMethod::Post,
            "mws.amazonservices.com",
            "/Testing/2009-01-01",
            &signed.sorted_query,
            "secret",
        );
        assert_eq!(signed.signature, expected);
        assert!(signed.url().starts_with("https://mws.amazonservices.com/Testing/2009-01-01?"));
        assert!(signed.query().ends_with(&format!(
            "&Signature={}",
            urlencoding::encode(&expected)
        )));
    }

    #[test]
    fn signature_does_not_depend_on_insertion_order() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config(), &http, &clock);

        let forward = Params::new()
            .with("MarketplaceId", vec!["A", "B"])
            .with("CreatedAfter", "2017-04-01T00:00:00Z");
        let reverse = Params::new()
            .with("CreatedAfter", "2017-04-01T00:00:00Z")
            .with("MarketplaceId", vec!["A", "B"]);

        let first = endpoint
            .prepare("ListOrders", &forward, &RequestOptions::new())
            .expect("signable");
        let second = endpoint
            .prepare("ListOrders", &reverse, &RequestOptions::new())
            .expect("signable");

        assert_eq!(first.signature, second.signature);
        assert_eq!(first.url(), second.url());
    }

    #[test]
    fn per_call_options_override_verb_endpoint_and_headers() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config(), &http, &clock);

        let options = RequestOptions::new()
            .with_verb(HttpMethod::Get)
            .with_endpoint("https://mws-eu.amazonservices.com")
            .with_header("User-Agent", "custom/1.0");
        let signed = endpoint
            .prepare("GetWidget", &Params::new(), &options)
            .expect("signable");

        assert_eq!(signed.verb, HttpMethod::Get);
        assert!(signed.canonical.starts_with("GET\nmws-eu.amazonservices.com\n"));
        assert_eq!(signed.headers["User-Agent"], "custom/1.0");
        assert_eq!(signed.headers["Content-Type"], "x-www-form-urlencoded");
    }

    #[test]
    fn per_call_header_replaces_default_regardless_of_case() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config(), &http, &clock);

        let options = RequestOptions::new().with_header("user-agent", "custom/1.0");
        let signed = endpoint
            .prepare("GetWidget", &Params::new(), &options)
            .expect("signable");

        let agents: Vec<&String> = signed
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("User-Agent"))
            .map(|(_, value)| value)
            .collect();
        assert_eq!(agents, vec!["custom/1.0"]);
        assert_eq!(
            signed.to_http_request(1_000).headers.len(),
            signed.headers.len()
        );
    }

    #[tokio::test]
    async fn log_messages_are_not_built_without_a_sink() {
        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config(), &http, &clock);
        assert!(endpoint.category().log().is_none());

        let built = Cell::new(false);
        endpoint.log(|| {
            built.set(true);
            vec![String::from("never emitted")]
        });
        assert!(!built.get());

        MESSAGES_BUILT.with(|count| count.set(0));
        endpoint
            .request("GetWidget", &Params::new())
            .await
            .expect("response");
        assert_eq!(http.request_count(), 1);
        assert_eq!(MESSAGES_BUILT.with(Cell::get), 0);

        let sinked = endpoint_with(config().with_log(DebugLog::new(|_| {})), &http, &clock);
        sinked
            .request("GetWidget", &Params::new())
            .await
            .expect("response");
        assert!(MESSAGES_BUILT.with(Cell::get) > 0);
    }

    #[tokio::test]
    async fn log_sink_receives_begin_detail_and_end_lines() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&lines);
        let log = DebugLog::new(move |line| {
            captured
                .lock()
                .expect("capture lock")
                .push(line.to_owned())
        });

        let http = ScriptedHttpClient::new();
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config().with_log(log), &http, &clock);

        endpoint
            .request("GetWidget", &Params::new())
            .await
            .expect("response");

        let lines = lines.lock().expect("capture lock");
        assert!(lines.first().is_some_and(|line| line.starts_with("=== Begin MWS request")));
        assert!(lines.last().is_some_and(|line| line.starts_with("=== End MWS request")));
        assert!(lines.iter().any(|line| line == "PATH:  /Testing/2009-01-01"));
        assert!(lines.iter().any(|line| line == "CANONICAL:"));
        assert!(lines.iter().all(|line| !line.contains('\n')));
        assert!(lines.iter().all(|line| !line.contains("secret\"")));
    }

    #[tokio::test]
    async fn end_marker_is_logged_on_transport_failure() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&lines);
        let log = DebugLog::new(move |line| {
            captured
                .lock()
                .expect("capture lock")
                .push(line.to_owned())
        });

        let http = ScriptedHttpClient::new();
        http.push_error(crate::http_client::HttpError::new("connection reset"));
        let clock = MockClock::new(datetime!(2017-04-07 12:00:00 UTC));
        let endpoint = endpoint_with(config().with_log(log), &http, &clock);

        let err = endpoint
            .request("GetWidget", &Params::new())
            .await
            .expect_err("transport failure");

        assert!(matches!(err, ClientError::Transport(_)));
        let lines = lines.lock().expect("capture lock");
        assert!(lines.last().is_some_and(|line| line.starts_with("=== End MWS request")));
    }
}
