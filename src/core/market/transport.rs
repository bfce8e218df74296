//! Market vendor transport.
//!
//! The [`VendorTransport`] trait is the seam between the market client and
//! the vendor's HTTP surface: two endpoints per symbol, `quote` (current
//! price) and `profile` (company name, shares outstanding and vendor market
//! capitalization, both in millions). [`FinnhubTransport`] is the shipped
//! implementation.
//!
//! The quote price travels as a raw JSON fragment rather than an `f64` so
//! that non-numeric vendor payloads reach the sanitizer in the client
//! instead of failing deserialization.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

/// Raw quote for one symbol.
#[derive(Debug, Clone, Default)]
pub struct Quote {
    /// Current price as reported, unvalidated.
    pub price: Option<serde_json::Value>,
}

/// Raw company profile for one symbol.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub company_name: Option<String>,
    /// Shares outstanding, in millions.
    pub shares_outstanding_millions: Option<f64>,
    /// Vendor-reported market capitalization, in millions.
    pub market_cap_millions: Option<f64>,
}

/// Vendor HTTP surface: one `quote` and one `profile` call per symbol.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote>;
    async fn profile(&self, symbol: &str) -> Result<Profile>;

    /// Vendor identifier recorded on every [`MarketValue`](crate::core::domain::MarketValue).
    fn vendor(&self) -> &'static str;
}

const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// HTTP transport for the Finnhub REST API.
pub struct FinnhubTransport {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl FinnhubTransport {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: FINNHUB_BASE_URL.into(),
            api_key: api_key.into(),
        }
    }

    /// Point the transport at a different base URL (local stubs, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price (`c` in the vendor payload).
    #[serde(default)]
    c: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    share_outstanding: Option<f64>,
    #[serde(default)]
    market_capitalization: Option<f64>,
}

#[async_trait]
impl VendorTransport for FinnhubTransport {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let url = format!(
            "{}/quote?symbol={}&token={}",
            self.base_url, symbol, self.api_key
        );
        debug!(symbol = %symbol, "Fetching quote");

        let response: QuoteResponse = self.get(&url).await?;
        Ok(Quote { price: response.c })
    }

    async fn profile(&self, symbol: &str) -> Result<Profile> {
        let url = format!(
            "{}/stock/profile2?symbol={}&token={}",
            self.base_url, symbol, self.api_key
        );
        debug!(symbol = %symbol, "Fetching profile");

        let response: ProfileResponse = self.get(&url).await?;
        Ok(Profile {
            company_name: response.name,
            shares_outstanding_millions: response.share_outstanding,
            market_cap_millions: response.market_capitalization,
        })
    }

    fn vendor(&self) -> &'static str {
        "finnhub"
    }
}
