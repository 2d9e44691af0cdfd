use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::document::{XmlDocument, XmlElement};
use crate::error::DocumentError;
use crate::http_client::HttpResponse;
use crate::throttling::Quota;
use crate::timestamp::parse_iso8601;

pub const QUOTA_REMAINING_HEADER: &str = "x-mws-quota-remaining";
pub const QUOTA_RESETS_ON_HEADER: &str = "x-mws-quota-resetson";

const THROTTLED_MESSAGE: &str = "Request is throttled";
const THROTTLED_CODE: &str = "RequestThrottled";

/// A received MWS response. The XML body is parsed on first access and cached.
#[derive(Debug)]
pub struct Response {
    raw: HttpResponse,
    document: OnceLock<Result<XmlDocument, DocumentError>>,
}

impl Response {
    pub fn new(raw: HttpResponse) -> Self {
        Self {
            raw,
            document: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn is_success(&self) -> bool {
        self.raw.is_success()
    }

    /// Response headers with lower-cased names.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.raw.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn raw_body(&self) -> &str {
        &self.raw.body
    }

    pub fn into_raw(self) -> HttpResponse {
        self.raw
    }

    pub fn document(&self) -> Result<&XmlDocument, DocumentError> {
        self.document
            .get_or_init(|| XmlDocument::parse(&self.raw.body))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// `"{Type}: {Message}"` of the first `Error` element, if the body has one.
    pub fn error(&self) -> Option<String> {
        let error = self.error_element()?;
        let kind = error.child("Type").map(XmlElement::text).unwrap_or_default();
        let message = error
            .child("Message")
            .map(XmlElement::text)
            .unwrap_or_default();
        Some(format!("{kind}: {message}"))
    }

    /// Quota reported by the response headers. Both headers must be present and valid.
    pub fn quota(&self) -> Option<Quota> {
        let remaining = self.header(QUOTA_REMAINING_HEADER)?.trim();
        let resets_on = self.header(QUOTA_RESETS_ON_HEADER)?.trim();
        if remaining.is_empty() || resets_on.is_empty() {
            return None;
        }

        // MWS reports the count as a decimal, e.g. "199.0".
        let remaining = remaining.parse::<f64>().ok().filter(|value| value.is_finite())?;
        let resets_at = parse_iso8601(resets_on)?;

        Some(Quota::new(remaining.trunc() as i64, resets_at))
    }

    /// Whether the body carries the provider's "request is throttled" error.
    pub fn is_throttled(&self) -> bool {
        let Some(error) = self.error_element() else {
            return false;
        };
        let message = error.descendant("Message").map(XmlElement::text);
        let code = error.descendant("Code").map(XmlElement::text);
        message == Some(THROTTLED_MESSAGE) || code == Some(THROTTLED_CODE)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.document()
            .ok()?
            .descendant("RequestId")
            .map(XmlElement::text)
    }

    fn error_element(&self) -> Option<&XmlElement> {
        self.document().ok()?.descendant("Error")
    }
}

impl From<HttpResponse> for Response {
    fn from(raw: HttpResponse) -> Self {
        Self::new(raw)
    }
}
