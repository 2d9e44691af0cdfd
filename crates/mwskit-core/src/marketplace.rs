use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::ConfigError;

/// MWS marketplaces with their identifiers and regional endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Marketplace {
    #[default]
    Us,
    Ca,
    Mx,
    Br,
    Uk,
    De,
    Fr,
    It,
    Es,
    In,
    Jp,
    Au,
    Cn,
}

impl Marketplace {
    pub const ALL: [Self; 13] = [
        Self::Us,
        Self::Ca,
        Self::Mx,
        Self::Br,
        Self::Uk,
        Self::De,
        Self::Fr,
        Self::It,
        Self::Es,
        Self::In,
        Self::Jp,
        Self::Au,
        Self::Cn,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Ca => "CA",
            Self::Mx => "MX",
            Self::Br => "BR",
            Self::Uk => "UK",
            Self::De => "DE",
            Self::Fr => "FR",
            Self::It => "IT",
            Self::Es => "ES",
            Self::In => "IN",
            Self::Jp => "JP",
            Self::Au => "AU",
            Self::Cn => "CN",
        }
    }

    /// The `MarketplaceId` parameter value.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Us => "ATVPDKIKX0DER",
            Self::Ca => "A2EUQ1WTGCTBG2",
            Self::Mx => "A1AM78C64UM0Y8",
            Self::Br => "A2Q3Y263D00KWC",
            Self::Uk => "A1F83G8C2ARO7P",
            Self::De => "A1PA6795UKMFR9",
            Self::Fr => "A13V1IB3VIYZZH",
            Self::It => "APJ6JRA9NG5V4",
            Self::Es => "A1RKKUPIHCS9HS",
            Self::In => "A21TJRUUN4KGV",
            Self::Jp => "A1VC38T7YXB528",
            Self::Au => "A39IBJ37TRP1C6",
            Self::Cn => "AAHKV2X7AFYLW",
        }
    }

    /// Base URL of the regional MWS endpoint serving this marketplace.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Us | Self::Ca | Self::Mx | Self::Br => "https://mws.amazonservices.com",
            Self::Uk | Self::De | Self::Fr | Self::It | Self::Es => {
                "https://mws-eu.amazonservices.com"
            }
            Self::In => "https://mws.amazonservices.in",
            Self::Jp => "https://mws.amazonservices.jp",
            Self::Au => "https://mws.amazonservices.com.au",
            Self::Cn => "https://mws.amazonservices.com.cn",
        }
    }
}

impl Display for Marketplace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Marketplace {
    type Err = ConfigError;

    /// Accepts a country code (`US`, `gb` is an alias of `UK`) or a marketplace id.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let upper = trimmed.to_ascii_uppercase();
        let code = if upper == "GB" { "UK" } else { upper.as_str() };

        Self::ALL
            .into_iter()
            .find(|marketplace| marketplace.code() == code || marketplace.id() == trimmed)
            .ok_or_else(|| ConfigError::UnknownMarketplace {
                value: trimmed.to_owned(),
            })
    }
}
