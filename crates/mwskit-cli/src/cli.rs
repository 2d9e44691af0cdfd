//! CLI argument definitions for mwskit.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `call` | Send a signed request and print a response summary |
//! | `sign` | Build and sign a request without sending it |
//! | `marketplaces` | List known marketplaces and their endpoints |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | JSON configuration file |
//! | `--marketplace` | `US` | Marketplace code or id |
//! | `--endpoint` | marketplace's | Endpoint base URL override |
//! | `--timeout-ms` | `30000` | Request timeout in ms |
//! | `--max-retries` | `10` | Retries after a throttled response |
//! | `--debug` | `false` | Print request/response detail to stderr |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! mwskit call Orders ListOrders --param CreatedAfter=2017-04-01T00:00:00Z \
//!     --list MarketplaceId=ATVPDKIKX0DER --pretty
//!
//! mwskit sign Products GetMatchingProduct --list ASINList=B000000001,B000000002
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mwskit_core::HttpMethod;

/// Signed-request client for the Amazon MWS API.
///
/// Credentials are read from `MWS_AWS_ACCESS_KEY_ID`, `MWS_SECRET_ACCESS_KEY`
/// and `MWS_MERCHANT_ID` (the unprefixed names work too), then from
/// `--config`, then from flags.
#[derive(Debug, Parser)]
#[command(name = "mwskit", author, version, about = "Signed-request client for the Amazon MWS API")]
pub struct Cli {
    /// JSON configuration file; its values override the environment.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Marketplace code (US, DE, JP, ...) or marketplace id.
    #[arg(long, global = true)]
    pub marketplace: Option<String>,

    /// Endpoint base URL, e.g. https://mws-eu.amazonservices.com.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// User-Agent header value.
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Retries after a throttled response before giving up.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Print request/response detail to stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a signed request and print status, quota, error and body.
    ///
    /// # Examples
    ///
    ///   mwskit call Orders ListOrders --param CreatedAfter=2017-04-01T00:00:00Z
    ///   mwskit call Sellers ListMarketplaceParticipations --pretty
    Call(RequestArgs),

    /// Build and sign a request without sending it.
    ///
    /// Prints the verb, full URL, canonical string and headers.
    Sign(RequestArgs),

    /// List marketplaces with their ids and endpoints.
    Marketplaces,
}

/// HTTP verb selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VerbArg {
    Get,
    Post,
}

impl From<VerbArg> for HttpMethod {
    fn from(value: VerbArg) -> Self {
        match value {
            VerbArg::Get => HttpMethod::Get,
            VerbArg::Post => HttpMethod::Post,
        }
    }
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// API category, e.g. Orders or "Fulfillment Inventory".
    pub category: String,

    /// Operation name, e.g. ListOrders.
    pub operation: String,

    /// Scalar parameter as KEY=VALUE. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// List parameter as KEY=V1,V2. Repeatable.
    #[arg(long = "list", value_name = "KEY=V1,V2")]
    pub lists: Vec<String>,

    /// Parameters as a JSON object; arrays become lists, objects records.
    #[arg(long)]
    pub params_json: Option<String>,

    /// HTTP verb for this request.
    #[arg(long, value_enum)]
    pub verb: Option<VerbArg>,

    /// API version override.
    #[arg(long)]
    pub version: Option<String>,
}
