//! Market vendor fakes and snapshot builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::core::domain::{units, MarketValue, Value};
use crate::core::market::{MarketSnapshot, Profile, Quote, VendorTransport};
use crate::error::{Error, Result};

/// Build a quote with a raw JSON price payload.
#[must_use]
pub fn quote(price: impl Into<serde_json::Value>) -> Quote {
    Quote {
        price: Some(price.into()),
    }
}

/// Build a profile; share count and market cap are in vendor millions.
#[must_use]
pub fn profile(
    name: Option<&str>,
    shares_millions: Option<f64>,
    cap_millions: Option<f64>,
) -> Profile {
    Profile {
        company_name: name.map(str::to_string),
        shares_outstanding_millions: shares_millions,
        market_cap_millions: cap_millions,
    }
}

/// Transport that replays scripted per-symbol responses and counts vendor
/// round-trips per endpoint.
#[derive(Default)]
pub struct ScriptedTransport {
    companies: RwLock<HashMap<String, (Quote, Profile)>>,
    quote_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_company(self, symbol: &str, quote: Quote, profile: Profile) -> Self {
        self.companies
            .write()
            .insert(symbol.to_uppercase(), (quote, profile));
        self
    }

    /// Vendor round-trips against the quote endpoint so far.
    #[must_use]
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    /// Vendor round-trips against the profile endpoint so far.
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, symbol: &str) -> Result<(Quote, Profile)> {
        self.companies
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| Error::Market(format!("no scripted response for {symbol}")))
    }
}

#[async_trait]
impl VendorTransport for ScriptedTransport {
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(symbol).map(|(quote, _)| quote)
    }

    async fn profile(&self, symbol: &str) -> Result<Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(symbol).map(|(_, profile)| profile)
    }

    fn vendor(&self) -> &'static str {
        "scripted"
    }
}

/// Transport whose calls never complete; for deadline tests.
#[derive(Default)]
pub struct HangingTransport;

#[async_trait]
impl VendorTransport for HangingTransport {
    async fn quote(&self, _symbol: &str) -> Result<Quote> {
        std::future::pending().await
    }

    async fn profile(&self, _symbol: &str) -> Result<Profile> {
        std::future::pending().await
    }

    fn vendor(&self) -> &'static str {
        "hanging"
    }
}

/// Ready-made snapshot with a vendor-reported market cap, a 100.0 quote,
/// and 1e9 shares outstanding.
#[must_use]
pub fn snapshot_with_cap(symbol: &str, market_cap: f64) -> MarketSnapshot {
    let fetched_at = Utc::now();
    MarketSnapshot {
        symbol: symbol.to_uppercase(),
        company_name: Some(format!("{symbol} Inc")),
        price: MarketValue::new(
            Some(100.0),
            units::USD_PER_SHARE,
            "scripted",
            "quote",
            fetched_at,
        ),
        shares_outstanding: MarketValue::new(
            Some(1.0e9),
            units::SHARES,
            "scripted",
            "profile",
            fetched_at,
        ),
        market_cap: Value::Market(MarketValue::new(
            Some(market_cap),
            units::USD,
            "scripted",
            "profile",
            fetched_at,
        )),
        fetched_at,
    }
}
