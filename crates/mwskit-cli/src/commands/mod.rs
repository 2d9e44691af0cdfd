mod call;
mod marketplaces;
mod sign;

use mwskit_core::{
    Client, ClientConfig, DebugLog, EnvCredentialSource, ParamValue, Params, RequestOptions,
    RetryConfig,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command, RequestArgs};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Call(args) => call::run(&build_client(cli)?, args).await,
        Command::Sign(args) => sign::run(&build_client(cli)?, args),
        Command::Marketplaces => marketplaces::run(),
    }
}

/// Environment, then `--config`, then flags; later layers win.
fn build_client(cli: &Cli) -> Result<Client, CliError> {
    let mut config = ClientConfig::infer(&EnvCredentialSource)?;
    if let Some(path) = &cli.config {
        config = config.overlay(ClientConfig::from_file(path)?);
    }

    let mut flags = ClientConfig::new();
    if let Some(marketplace) = &cli.marketplace {
        flags = flags.with_marketplace(marketplace.parse()?);
    }
    if let Some(endpoint) = &cli.endpoint {
        flags = flags.with_endpoint(endpoint);
    }
    if let Some(user_agent) = &cli.user_agent {
        flags = flags.with_user_agent(user_agent);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        flags = flags.with_timeout_ms(timeout_ms);
    }
    if cli.debug {
        flags = flags.with_log(DebugLog::stderr());
    }

    let config = config.overlay(flags);
    debug!(
        marketplace = %config.marketplace(),
        endpoint = config.endpoint(),
        config_file = cli.config.is_some(),
        "client configured"
    );

    let mut client = Client::new(config);
    if let Some(max_retries) = cli.max_retries {
        client = client.with_retry(RetryConfig {
            max_retries,
            ..RetryConfig::default()
        });
    }
    Ok(client)
}

/// `--params-json`, then `--param`, then `--list`, then `--version`.
fn request_params(args: &RequestArgs) -> Result<Params, CliError> {
    let mut params = Params::new();

    if let Some(raw) = &args.params_json {
        let value: Value = serde_json::from_str(raw)?;
        let object = value.as_object().ok_or_else(|| {
            CliError::Argument(String::from("--params-json must be a JSON object"))
        })?;
        params.extend(&Params::from_json_object(object)?);
    }

    for raw in &args.params {
        let (key, value) = split_pair(raw, "--param")?;
        params.insert(key, value);
    }

    for raw in &args.lists {
        let (key, values) = split_pair(raw, "--list")?;
        let items = values
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ParamValue::from);
        params.insert(key, ParamValue::list(items));
    }

    if let Some(version) = &args.version {
        params.insert("Version", version.as_str());
    }

    Ok(params)
}

fn request_options(args: &RequestArgs) -> RequestOptions {
    RequestOptions {
        verb: args.verb.map(Into::into),
        ..RequestOptions::default()
    }
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::Argument(format!(
            "{flag} expects KEY=VALUE, got '{raw}'"
        ))),
    }
}
