use mwskit_core::{Client, Quota, Response};
use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;

use crate::cli::RequestArgs;
use crate::error::CliError;

use super::{request_options, request_params};

#[derive(Debug, Serialize)]
struct QuotaData {
    remaining: i64,
    resets_at: Option<String>,
}

impl From<Quota> for QuotaData {
    fn from(quota: Quota) -> Self {
        Self {
            remaining: quota.remaining,
            resets_at: quota.resets_at.format(&Rfc3339).ok(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CallResponseData {
    status: u16,
    request_id: Option<String>,
    quota: Option<QuotaData>,
    error: Option<String>,
    body: String,
}

impl From<&Response> for CallResponseData {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status(),
            request_id: response.request_id().map(str::to_owned),
            quota: response.quota().map(QuotaData::from),
            error: response.error(),
            body: response.raw_body().to_owned(),
        }
    }
}

pub async fn run(client: &Client, args: &RequestArgs) -> Result<Value, CliError> {
    let endpoint = client.category(&args.category)?;
    let params = request_params(args)?;
    let response = endpoint
        .request_with(&args.operation, &params, &request_options(args))
        .await?;

    Ok(serde_json::to_value(CallResponseData::from(&response))?)
}
