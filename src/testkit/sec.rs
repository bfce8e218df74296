//! Canned SEC providers and cited-value builders.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::core::domain::CitedValue;
use crate::core::sec::{Period, SecMetrics, SecProvider};
use crate::error::{Error, Result};

/// Build a plausible cited value for one normalized metric.
#[must_use]
pub fn cited(metric: &str, value: f64, unit: &str) -> CitedValue {
    CitedValue {
        value: Some(value),
        unit: unit.to_string(),
        warnings: Vec::new(),
        concept: concept_for(metric),
        metric: metric.to_string(),
        fiscal_year: Some(2024),
        fiscal_period: Some("FY".into()),
        period_end: NaiveDate::from_ymd_opt(2024, 12, 31),
        form_type: Some("10-K".into()),
        filed: NaiveDate::from_ymd_opt(2025, 2, 15),
        accession: Some("0000000000-25-000001".into()),
        cik: Some("0000320193".into()),
        filing_url: Some(
            "https://www.sec.gov/Archives/edgar/data/320193/000000000025000001.htm".into(),
        ),
    }
}

/// Build a USD metric mapping from (name, value) pairs. Per-share metrics
/// get per-share units.
#[must_use]
pub fn metrics_from(pairs: &[(&str, f64)]) -> SecMetrics {
    pairs
        .iter()
        .map(|(metric, value)| {
            let unit = if matches!(*metric, "eps_diluted" | "dividends_per_share") {
                "USD/shares"
            } else {
                "USD"
            };
            ((*metric).to_string(), cited(metric, *value, unit))
        })
        .collect()
}

fn concept_for(metric: &str) -> String {
    metric
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Provider that replays canned metric mappings per (ticker, period).
///
/// Unknown combinations fail the way a real extraction miss would.
#[derive(Default)]
pub struct CannedSecProvider {
    responses: RwLock<HashMap<(String, String), SecMetrics>>,
}

impl CannedSecProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metrics(self, ticker: &str, period: Period, metrics: SecMetrics) -> Self {
        self.responses
            .write()
            .insert((ticker.to_uppercase(), period.to_string()), metrics);
        self
    }
}

#[async_trait]
impl SecProvider for CannedSecProvider {
    async fn fetch_metrics(&self, ticker: &str, period: Period) -> Result<SecMetrics> {
        self.responses
            .read()
            .get(&(ticker.to_uppercase(), period.to_string()))
            .cloned()
            .ok_or_else(|| Error::Sec(format!("no canned metrics for {ticker} ({period})")))
    }
}

/// Provider whose fetches never complete; for deadline tests.
#[derive(Default)]
pub struct HangingSecProvider;

#[async_trait]
impl SecProvider for HangingSecProvider {
    async fn fetch_metrics(&self, _ticker: &str, _period: Period) -> Result<SecMetrics> {
        std::future::pending().await
    }
}
