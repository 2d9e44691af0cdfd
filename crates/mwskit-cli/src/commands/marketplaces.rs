use mwskit_core::Marketplace;
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct MarketplaceData {
    code: &'static str,
    id: &'static str,
    endpoint: &'static str,
}

pub fn run() -> Result<Value, CliError> {
    let marketplaces: Vec<MarketplaceData> = Marketplace::ALL
        .into_iter()
        .map(|marketplace| MarketplaceData {
            code: marketplace.code(),
            id: marketplace.id(),
            endpoint: marketplace.endpoint(),
        })
        .collect();

    Ok(serde_json::to_value(marketplaces)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_marketplace() {
        let data = run().expect("serializable");
        let entries = data.as_array().expect("array");

        assert_eq!(entries.len(), Marketplace::ALL.len());
        assert_eq!(entries[0]["code"], "US");
        assert_eq!(entries[0]["id"], "ATVPDKIKX0DER");
    }
}
