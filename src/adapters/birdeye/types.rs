//! Birdeye response types

use serde::Deserialize;

use crate::domain::TokenInfo;

/// `{success, data}` envelope used by every Birdeye endpoint
#[derive(Debug, Deserialize)]
pub struct BirdeyeResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOverview {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "mc")]
    pub market_cap: Option<f64>,
    #[serde(default, rename = "v24hUSD")]
    pub volume_24h_usd: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<f64>,
}

impl From<TokenOverview> for TokenInfo {
    fn from(o: TokenOverview) -> Self {
        TokenInfo {
            address: o.address,
            symbol: o.symbol,
            name: o.name,
            decimals: o.decimals,
            logo_uri: o.logo_uri,
            price: o.price,
            market_cap: o.market_cap,
            volume_24h: o.volume_24h_usd,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub value: f64,
    #[serde(default)]
    pub update_unix_time: Option<i64>,
    #[serde(default, rename = "priceChange24h")]
    pub price_change_24h: Option<f64>,
}
