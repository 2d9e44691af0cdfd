//! # mwskit Core
//!
//! Signed-request client core for the Amazon Marketplace Web Service (MWS) API.
//!
//! ## Overview
//!
//! This crate turns an operation name plus structured parameters into a signed
//! HTTP request, sends it, and inspects the XML response:
//!
//! - **Parameter resolution** flattens lists and records into MWS's dotted keys
//! - **Request signing** with HMAC-SHA256, signature version 2
//! - **Throttle control** waits out exhausted quotas and retries throttled calls
//! - **Response inspection** for errors, quota headers and request ids
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`params`] | Parameter values and flattening |
//! | [`signer`] | Canonical string and HMAC-SHA256 signature |
//! | [`throttling`] | Per-operation quota table and throttle decisions |
//! | [`response`] | Response wrapper with lazy XML parsing |
//! | [`endpoint`] | Request orchestration for one category |
//! | [`client`] | Client factory, shared transport and quota table |
//! | [`config`] | Client configuration and credential inference |
//! | [`category`] | Category descriptor (name, version, endpoint) |
//! | [`marketplace`] | Marketplace ids and regional endpoints |
//! | [`retry`] | Retry policy for throttled requests |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`clock`] | Time source abstraction |
//! | `mocks` | Scripted transport and controllable clock (`test-util` feature) |
//! | [`error`] | Error types |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mwskit_core::{Client, ClientConfig, ParamValue, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_env(ClientConfig::new())?;
//!     let orders = client.category("Orders")?;
//!
//!     let params = Params::new()
//!         .with("CreatedAfter", "2017-04-01T00:00:00Z")
//!         .with("MarketplaceIdList", vec!["ATVPDKIKX0DER"]);
//!     let response = orders.request("ListOrders", &params).await?;
//!
//!     if let Some(error) = response.error() {
//!         eprintln!("MWS error: {error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Client         │── config, transport, clock, quota table
//! └────────┬────────┘
//!          │ category("Orders")
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  ApiEndpoint    │────▶│ ThrottleController│
//! └────────┬────────┘     └──────────────────┘
//!          │ resolve → sign
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  HttpClient     │────▶│ Response         │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - Secret keys never appear in `Debug` output or log lines
//! - The `Signature` parameter is always computed, never taken from input

pub mod category;
pub mod client;
pub mod clock;
pub mod config;
pub mod debug_log;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod http_client;
pub mod marketplace;
#[cfg(any(test, feature = "test-util"))]
pub mod mocks;
pub mod params;
pub mod response;
pub mod retry;
pub mod signer;
pub mod throttling;
pub mod timestamp;

// Client and categories
pub use category::{default_version, ApiCategory, EndpointUrl};
pub use client::Client;
pub use endpoint::{ApiEndpoint, RequestOptions, SignedRequest};

// Configuration
pub use config::{
    CategoryOptions, ClientConfig, CredentialSource, Credentials, EnvCredentialSource,
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT,
};
pub use debug_log::DebugLog;
pub use marketplace::Marketplace;

// Errors
pub use error::{ClientError, ConfigError, DocumentError, ParamError};

// Parameters and signing
pub use params::{element_name_suffix, resolve, ParamValue, Params};
pub use signer::{canonical_query, canonical_string, generate_signature, sign};

// Responses
pub use document::{XmlDocument, XmlElement};
pub use response::Response;

// Throttling and retry
pub use retry::RetryConfig;
pub use throttling::{Quota, ThrottleController, ThrottleKey, ThrottleTable, ThrottleVerdict};

// Transport and time
pub use clock::{Clock, SystemClock};
pub use http_client::{HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
