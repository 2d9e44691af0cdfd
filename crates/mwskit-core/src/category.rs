use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use crate::config::{CategoryOptions, ClientConfig, DEFAULT_TIMEOUT_MS};
use crate::debug_log::DebugLog;
use crate::error::{ClientError, ConfigError};
use crate::http_client::{merge_headers, HttpMethod};
use crate::params::{resolve, Params};

/// Latest API version of each well-known category.
pub fn default_version(category: &str) -> &'static str {
    match category {
        "Products" => "2011-10-01",
        "Orders" => "2013-09-01",
        "FulfillmentInventory" => "2010-10-01",
        "Feeds" => "2009-01-01",
        "Reports" => "2009-01-01",
        "MerchantFulfillment" => "2015-06-01",
        "Sellers" => "2011-07-01",
        _ => "2009-01-01",
    }
}

/// `"Fulfillment Inventory"` → `"FulfillmentInventory"`.
pub fn normalize_category_name(name: &str) -> String {
    name.split_whitespace().collect()
}

/// Base URL (`scheme://authority`) and the host used in the canonical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl {
    base: String,
    host: String,
}

impl EndpointUrl {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidEndpoint {
            value: value.to_owned(),
        };

        let trimmed = value.trim().trim_end_matches('/');
        let (scheme, host) = trimmed.split_once("://").ok_or_else(invalid)?;
        if scheme.is_empty() || host.is_empty() || host.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            base: trimmed.to_owned(),
            host: host.to_ascii_lowercase(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Signing credentials after presence checks.
#[derive(Clone, Copy)]
pub struct SigningCredentials<'a> {
    pub access_key_id: &'a str,
    pub secret_key: &'a str,
    pub merchant_id: &'a str,
}

/// Immutable descriptor of one API category, built once per client configuration.
#[derive(Clone)]
pub struct ApiCategory {
    name: String,
    verb: HttpMethod,
    version: String,
    endpoint: EndpointUrl,
    access_key_id: Option<String>,
    secret_key: Option<String>,
    merchant_id: Option<String>,
    params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    timeout_ms: u64,
    log: Option<DebugLog>,
}

impl ApiCategory {
    /// Combines client-wide settings with category options.
    ///
    /// Category params are flattened here, so list-encoding mistakes surface
    /// at configuration time.
    pub fn new(
        name: &str,
        config: &ClientConfig,
        options: &CategoryOptions,
    ) -> Result<Self, ClientError> {
        let name = normalize_category_name(name);
        if name.is_empty() {
            return Err(ConfigError::EmptyCategory.into());
        }

        let endpoint = EndpointUrl::parse(options.endpoint.as_deref().unwrap_or(config.endpoint()))?;

        let mut params = Params::new();
        params.extend(&config.params);
        params.extend(&options.params);
        let params = resolve(&params)?;

        let mut headers = BTreeMap::new();
        headers.insert(String::from("User-Agent"), config.user_agent().to_owned());
        headers.insert(
            String::from("Content-Type"),
            String::from("x-www-form-urlencoded"),
        );
        merge_headers(&mut headers, &config.headers);
        merge_headers(&mut headers, &options.headers);

        let version = options
            .version
            .clone()
            .unwrap_or_else(|| default_version(&name).to_owned());

        Ok(Self {
            verb: options.verb.or(config.verb).unwrap_or_default(),
            version,
            endpoint,
            access_key_id: config.credentials.access_key_id.clone(),
            secret_key: config.credentials.secret_key.clone(),
            merchant_id: config.credentials.merchant_id.clone(),
            params,
            headers,
            timeout_ms: config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            log: options.log.clone().or_else(|| config.log.clone()),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verb(&self) -> HttpMethod {
        self.verb
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn endpoint(&self) -> &EndpointUrl {
        &self.endpoint
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    /// Category-configured parameters, already flattened.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn log(&self) -> Option<&DebugLog> {
        self.log.as_ref()
    }

    /// Fails on the first missing (or blank) credential.
    pub fn credentials(&self) -> Result<SigningCredentials<'_>, ConfigError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|value| !value.trim().is_empty())
        }

        let access_key_id = present(&self.access_key_id).ok_or(ConfigError::MissingAccessKeyId)?;
        let secret_key = present(&self.secret_key).ok_or(ConfigError::MissingSecretKey)?;
        let merchant_id = present(&self.merchant_id).ok_or(ConfigError::MissingMerchantId)?;

        Ok(SigningCredentials {
            access_key_id,
            secret_key,
            merchant_id,
        })
    }
}

impl Debug for ApiCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiCategory({} {})", self.verb, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new()
            .with_access_key_id("AKIA")
            .with_secret_key("secret")
            .with_merchant_id("A2MERCHANT")
    }

    #[test]
    fn names_lose_their_spaces() {
        let category = ApiCategory::new("Fulfillment Inventory", &config(), &CategoryOptions::new())
            .expect("valid category");

        assert_eq!(category.name(), "FulfillmentInventory");
        assert_eq!(category.version(), "2010-10-01");
        assert_eq!(category.verb(), HttpMethod::Post);
    }

    #[test]
    fn unknown_categories_use_the_fallback_version() {
        assert_eq!(default_version("Testing"), "2009-01-01");
        assert_eq!(default_version("Orders"), "2013-09-01");
    }

    #[test]
    fn options_override_client_settings() {
        let client = config()
            .with_verb(HttpMethod::Post)
            .with_header("User-Agent", "client-agent")
            .with_params(Params::new().with("MarketplaceId", "A"));
        let options = CategoryOptions::new()
            .with_verb(HttpMethod::Get)
            .with_version("2099-01-01")
            .with_endpoint("http://localhost:8080/")
            .with_header("User-Agent", "category-agent")
            .with_params(Params::new().with("MarketplaceId", "B"));

        let category = ApiCategory::new("Orders", &client, &options).expect("valid category");

        assert_eq!(category.verb(), HttpMethod::Get);
        assert_eq!(category.version(), "2099-01-01");
        assert_eq!(category.endpoint().base(), "http://localhost:8080");
        assert_eq!(category.endpoint().host(), "localhost:8080");
        assert_eq!(category.headers()["User-Agent"], "category-agent");
        assert_eq!(category.headers()["Content-Type"], "x-www-form-urlencoded");
        assert_eq!(category.params()["MarketplaceId"], "B");
    }

    #[test]
    fn lower_case_header_overrides_replace_defaults() {
        let client = config().with_header("content-type", "text/xml");
        let options = CategoryOptions::new().with_header("user-agent", "category-agent");

        let category = ApiCategory::new("Orders", &client, &options).expect("valid category");

        let mut names: Vec<String> = category
            .headers()
            .keys()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        names.dedup();
        assert_eq!(names, vec!["content-type", "user-agent"]);
        assert_eq!(category.headers().len(), 2);
        assert_eq!(category.headers()["user-agent"], "category-agent");
        assert_eq!(category.headers()["content-type"], "text/xml");
    }

    #[test]
    fn missing_credentials_are_reported_in_order() {
        let none = ApiCategory::new("Orders", &ClientConfig::new(), &CategoryOptions::new())
            .expect("valid category");
        assert_eq!(
            none.credentials().err(),
            Some(ConfigError::MissingAccessKeyId)
        );

        let no_secret = ApiCategory::new(
            "Orders",
            &ClientConfig::new().with_access_key_id("AKIA"),
            &CategoryOptions::new(),
        )
        .expect("valid category");
        assert_eq!(
            no_secret.credentials().err(),
            Some(ConfigError::MissingSecretKey)
        );

        let blank_merchant = ApiCategory::new(
            "Orders",
            &config().with_merchant_id("   "),
            &CategoryOptions::new(),
        )
        .expect("valid category");
        assert_eq!(
            blank_merchant.credentials().err(),
            Some(ConfigError::MissingMerchantId)
        );
    }

    #[test]
    fn debug_output_hides_credentials() {
        let category =
            ApiCategory::new("Orders", &config(), &CategoryOptions::new()).expect("valid category");
        let rendered = format!("{category:?}");

        assert_eq!(rendered, "ApiCategory(POST Orders)");
    }

    #[test]
    fn endpoint_urls_are_validated() {
        assert!(EndpointUrl::parse("mws.amazonservices.com").is_err());
        assert!(EndpointUrl::parse("https://").is_err());
        assert!(EndpointUrl::parse("https://host/path").is_err());

        let url = EndpointUrl::parse("https://MWS.amazonservices.com/").expect("valid url");
        assert_eq!(url.base(), "https://MWS.amazonservices.com");
        assert_eq!(url.host(), "mws.amazonservices.com");
    }

    #[test]
    fn bad_category_params_fail_at_configuration() {
        let options = CategoryOptions::new().with_params(Params::new().with("ids", vec!["A"]));
        let err = ApiCategory::new("Orders", &config(), &options).expect_err("bad key");
        assert!(matches!(err, ClientError::Params(_)));
    }
}
