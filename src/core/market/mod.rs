//! Market-data client: vendor transport, TTL cache, bounded concurrency.
//!
//! One [`MarketClient::fetch_snapshot`] call resolves a symbol to a
//! [`MarketSnapshot`] holding price, shares outstanding, and market cap as
//! provenance-typed values. Vendor calls are bounded by a shared semaphore
//! and memoized in a whole-snapshot TTL cache.

mod cache;
mod transport;

pub use cache::SnapshotCache;
pub use transport::{FinnhubTransport, Profile, Quote, VendorTransport};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::core::domain::{units, ComputedValue, MarketValue, Value};
use crate::error::{Error, Result};

/// Live market state for one symbol.
///
/// `market_cap` is a [`Value::Market`] when the vendor reports a positive
/// capitalization directly, and a [`Value::Computed`] product otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub price: MarketValue,
    pub shares_outstanding: MarketValue,
    pub market_cap: Value,
    pub fetched_at: DateTime<Utc>,
}

/// Client for the market vendor with caching and bounded concurrency.
///
/// Cheap to clone; the cache and semaphore are shared across clones, so one
/// permit pool bounds all vendor calls in an engine invocation.
#[derive(Clone)]
pub struct MarketClient {
    transport: Arc<dyn VendorTransport>,
    cache: Arc<SnapshotCache>,
    semaphore: Arc<Semaphore>,
}

impl MarketClient {
    #[must_use]
    pub fn new(transport: Arc<dyn VendorTransport>, ttl: Duration, concurrency: usize) -> Self {
        Self {
            transport,
            cache: Arc::new(SnapshotCache::new(ttl)),
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Fetch quote and profile for a symbol and assemble a snapshot.
    ///
    /// Symbols are keyed uppercase; a cached, unexpired snapshot is returned
    /// without touching the vendor. Transport or HTTP errors from either
    /// endpoint surface as a single error.
    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let key = symbol.trim().to_uppercase();
        if key.is_empty() {
            return Err(Error::InvalidInput("empty market symbol".into()));
        }

        if let Some(snapshot) = self.cache.get(&key) {
            debug!(symbol = %key, "Market cache hit");
            return Ok(snapshot);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| Error::Market("market semaphore closed".into()))?;

        let (quote, profile) = tokio::try_join!(
            self.transport.quote(&key),
            self.transport.profile(&key)
        )?;

        let snapshot = self.assemble(&key, quote, profile, Utc::now());
        self.cache.insert(key.clone(), snapshot.clone());

        info!(
            symbol = %key,
            price = ?snapshot.price.value,
            market_cap = ?snapshot.market_cap.value(),
            "Market snapshot fetched"
        );

        Ok(snapshot)
    }

    fn assemble(
        &self,
        symbol: &str,
        quote: Quote,
        profile: Profile,
        fetched_at: DateTime<Utc>,
    ) -> MarketSnapshot {
        let vendor = self.transport.vendor();

        let sanitized = sanitize_price(quote.price.as_ref());
        let mut price = MarketValue::new(
            sanitized,
            units::USD_PER_SHARE,
            vendor,
            "quote",
            fetched_at,
        );
        if let Some(raw) = quote.price {
            price = price.with_raw(raw);
        }
        if sanitized.is_none() {
            price = price.with_warning("invalid quote price");
        }

        let shares_outstanding = MarketValue::new(
            profile
                .shares_outstanding_millions
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|millions| millions * 1.0e6),
            units::SHARES,
            vendor,
            "profile",
            fetched_at,
        );

        // Prefer the vendor-reported capitalization: for ADRs the vendor
        // share count may reflect underlying shares while the quote is
        // per-ADR, so the price * shares product can be wildly off.
        let vendor_cap = profile
            .market_cap_millions
            .filter(|v| v.is_finite() && *v > 0.0);
        let market_cap = match vendor_cap {
            Some(millions) => Value::Market(MarketValue::new(
                Some(millions * 1.0e6),
                units::USD,
                vendor,
                "profile",
                fetched_at,
            )),
            None => {
                let product = match (price.value, shares_outstanding.value) {
                    (Some(p), Some(s)) => Some(p * s),
                    _ => None,
                };
                Value::Computed(ComputedValue::new(
                    "price * shares_outstanding",
                    units::USD,
                    product,
                    vec![
                        ("price".into(), Arc::new(price.clone().into())),
                        (
                            "shares_outstanding".into(),
                            Arc::new(shares_outstanding.clone().into()),
                        ),
                    ],
                ))
            }
        };

        MarketSnapshot {
            symbol: symbol.to_string(),
            company_name: profile.company_name,
            price,
            shares_outstanding,
            market_cap,
            fetched_at,
        }
    }
}

/// A quote price is usable only when it is a finite, strictly positive
/// number. Non-numeric, null, zero, or negative payloads yield `None`.
fn sanitize_price(raw: Option<&serde_json::Value>) -> Option<f64> {
    raw.and_then(serde_json::Value::as_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
}
