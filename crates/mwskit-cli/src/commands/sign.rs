use std::collections::BTreeMap;

use mwskit_core::{Client, SignedRequest};
use serde::Serialize;
use serde_json::Value;

use crate::cli::RequestArgs;
use crate::error::CliError;

use super::{request_options, request_params};

#[derive(Debug, Serialize)]
struct SignResponseData {
    verb: &'static str,
    url: String,
    canonical: String,
    headers: BTreeMap<String, String>,
}

impl From<SignedRequest> for SignResponseData {
    fn from(signed: SignedRequest) -> Self {
        Self {
            verb: signed.verb.as_str(),
            url: signed.url(),
            canonical: signed.canonical,
            headers: signed.headers,
        }
    }
}

/// Signs without touching the network.
pub fn run(client: &Client, args: &RequestArgs) -> Result<Value, CliError> {
    let endpoint = client.category(&args.category)?;
    let params = request_params(args)?;
    let signed = endpoint.prepare(&args.operation, &params, &request_options(args))?;

    Ok(serde_json::to_value(SignResponseData::from(signed))?)
}
