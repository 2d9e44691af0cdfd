//! MWS signature version 2: canonical string construction and HMAC-SHA256 signing.
//!
//! The canonical string is
//!
//! ```text
//! VERB\nhost\n/Category/Version\nsorted-query
//! ```
//!
//! where `sorted-query` is the full parameter set (without `Signature`) sorted
//! by key in byte order and percent-encoded exactly as it is sent.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::http_client::HttpMethod;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PARAM: &str = "Signature";
pub const SIGNATURE_METHOD: &str = "HmacSHA256";
pub const SIGNATURE_VERSION: &str = "2";

/// Serializes parameters as `k=v&k=v` sorted by key, excluding `Signature`.
///
/// Keys and values are encoded with the RFC 3986 unreserved set left bare.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE_PARAM)
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Joins verb, host, path and query into the string that gets signed.
pub fn canonical_string(verb: HttpMethod, host: &str, path: &str, sorted_query: &str) -> String {
    [verb.as_str(), host, path, sorted_query].join("\n")
}

/// base64(HMAC-SHA256(secret, canonical)).
pub fn generate_signature(secret_key: &str, canonical: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(canonical.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Signs a request described by its verb, host, path and sorted query string.
pub fn sign(
    verb: HttpMethod,
    host: &str,
    path: &str,
    sorted_query: &str,
    secret_key: &str,
) -> String {
    generate_signature(secret_key, &canonical_string(verb, host, path, sorted_query))
}

/// Returns the query string that is sent: the sorted query with `Signature` appended.
pub fn signed_query(sorted_query: &str, signature: &str) -> String {
    let encoded = format!("{SIGNATURE_PARAM}={}", urlencoding::encode(signature));
    if sorted_query.is_empty() {
        encoded
    } else {
        format!("{sorted_query}&{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn query_is_sorted_by_key_bytes() {
        let query = canonical_query(&params(&[
            ("b", "2"),
            ("Action", "ListOrders"),
            ("a", "1"),
            ("Z", "0"),
        ]));

        // Upper-case sorts before lower-case in byte order.
        assert_eq!(query, "Action=ListOrders&Z=0&a=1&b=2");
    }

    #[test]
    fn query_uses_rfc3986_encoding() {
        let query = canonical_query(&params(&[
            ("Timestamp", "2017-04-07T12:00:00Z"),
            ("Query", "red shoes/size~9"),
        ]));

        assert_eq!(
            query,
            "Query=red%20shoes%2Fsize~9&Timestamp=2017-04-07T12%3A00%3A00Z"
        );
    }

    #[test]
    fn signature_field_is_never_signed() {
        let with_signature = params(&[("Action", "GetWidget"), ("Signature", "stale")]);
        let without = params(&[("Action", "GetWidget")]);

        assert_eq!(canonical_query(&with_signature), canonical_query(&without));
    }

    #[test]
    fn canonical_string_has_four_lines() {
        let canonical = canonical_string(
            HttpMethod::Post,
            "mws.amazonservices.com",
            "/Orders/2013-09-01",
            "Action=ListOrders",
        );

        assert_eq!(
            canonical,
            "POST\nmws.amazonservices.com\n/Orders/2013-09-01\nAction=ListOrders"
        );
    }

    #[test]
    fn hmac_matches_known_vector() {
        // RFC 4231 test case 2.
        let signature = generate_signature("Jefe", "what do ya want for nothing?");
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn signature_is_base64_without_newline() {
        let signature = sign(
            HttpMethod::Get,
            "mws.amazonservices.com",
            "/Products/2011-10-01",
            "Action=GetServiceStatus",
            "secret",
        );

        assert_eq!(signature.len(), 44);
        assert!(!signature.ends_with('\n'));
        assert!(STANDARD.decode(&signature).is_ok());
    }

    #[test]
    fn signed_query_appends_encoded_signature() {
        assert_eq!(signed_query("Action=A", "ab+/="), "Action=A&Signature=ab%2B%2F%3D");
        assert_eq!(signed_query("", "x"), "Signature=x");
    }
}
