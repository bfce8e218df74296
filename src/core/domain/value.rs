//! Provenance-typed value variants.
//!
//! Every number handspread emits is one of three variants sharing a common
//! header (`value`, `unit`, `warnings`): a [`MarketValue`] fetched from the
//! vendor, a [`CitedValue`] extracted from a specific filing concept, or a
//! [`ComputedValue`] derived from other values. A `value` of `None` is legal
//! for any variant; downstream code must tolerate it.
//!
//! [`ComputedValue`] components are shared via `Arc`, so the provenance
//! graph is acyclic by construction: a computed value is sealed at creation
//! from components that already exist.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unit strings used across the analysis.
pub mod units {
    pub const USD: &str = "USD";
    pub const USD_PER_SHARE: &str = "USD/shares";
    pub const SHARES: &str = "shares";
    /// Plain ratios (margins, expense ratios, growth).
    pub const PURE: &str = "pure";
    /// Valuation multiples.
    pub const MULTIPLE: &str = "x";
    /// Yields, expressed as decimal fractions (0.017 means 1.7%).
    pub const PERCENT: &str = "%";
    /// Margin deltas, expressed in percentage points.
    pub const PERCENTAGE_POINTS: &str = "pp";

    /// Per-share unit for an arbitrary currency, e.g. `"CNY/shares"`.
    pub fn per_share(currency: &str) -> String {
        format!("{currency}/shares")
    }
}

/// A datapoint taken directly from the market vendor.
///
/// Equality is structural across `value` and `unit`; fetch metadata and
/// warnings never participate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketValue {
    pub value: Option<f64>,
    pub unit: String,
    pub warnings: Vec<String>,
    /// Vendor identifier, e.g. `"finnhub"`.
    pub vendor: String,
    /// Vendor endpoint the datapoint came from, e.g. `"quote"`.
    pub endpoint: String,
    pub fetched_at: DateTime<Utc>,
    /// Raw payload fragment backing the value, when kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl MarketValue {
    #[must_use]
    pub fn new(
        value: Option<f64>,
        unit: impl Into<String>,
        vendor: impl Into<String>,
        endpoint: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            value,
            unit: unit.into(),
            warnings: Vec::new(),
            vendor: vendor.into(),
            endpoint: endpoint.into(),
            fetched_at,
            raw: None,
        }
    }

    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        push_unique(&mut self.warnings, warning.into());
        self
    }
}

impl PartialEq for MarketValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.unit == other.unit
    }
}

/// A datapoint extracted from an SEC filing by the external XBRL library.
///
/// Equality is structural across `value` and `unit`; citation metadata and
/// warnings never participate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitedValue {
    pub value: Option<f64>,
    pub unit: String,
    pub warnings: Vec<String>,
    /// XBRL tag actually resolved, e.g. `"Revenues"`.
    pub concept: String,
    /// Normalized metric name, e.g. `"revenue"`.
    pub metric: String,
    pub fiscal_year: Option<i32>,
    pub fiscal_period: Option<String>,
    pub period_end: Option<NaiveDate>,
    pub form_type: Option<String>,
    pub filed: Option<NaiveDate>,
    pub accession: Option<String>,
    pub cik: Option<String>,
    pub filing_url: Option<String>,
}

impl CitedValue {
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        push_unique(&mut self.warnings, warning.into());
        self
    }

    /// Whether any attached warning contains the given phrase.
    ///
    /// Used to spot upstream data-quality markers such as
    /// `"Possible stock split contamination"`.
    #[must_use]
    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}

impl PartialEq for CitedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.unit == other.unit
    }
}

/// A derived datapoint with a human-readable formula and links to the
/// values it was computed from.
///
/// The constructor collects component warnings (deduplicated, insertion
/// order) so data-quality notes propagate to every consumer of the derived
/// number. Warnings never change a numeric result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedValue {
    pub value: Option<f64>,
    pub unit: String,
    pub warnings: Vec<String>,
    /// Human-readable formula, e.g. `"enterprise_value / revenue"`.
    pub formula: String,
    /// Role name to source value, in bridge/formula order.
    pub components: Vec<(String, Arc<Value>)>,
}

impl ComputedValue {
    /// Seal a computed value from already-existing components.
    #[must_use]
    pub fn new(
        formula: impl Into<String>,
        unit: impl Into<String>,
        value: Option<f64>,
        components: Vec<(String, Arc<Value>)>,
    ) -> Self {
        let mut warnings = Vec::new();
        for (_, component) in &components {
            for warning in component.warnings() {
                push_unique(&mut warnings, warning.clone());
            }
        }
        Self {
            value,
            unit: unit.into(),
            warnings,
            formula: formula.into(),
            components,
        }
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.push_warning(warning);
        self
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        push_unique(&mut self.warnings, warning.into());
    }

    /// Look up a component by role name.
    #[must_use]
    pub fn component(&self, role: &str) -> Option<&Arc<Value>> {
        self.components
            .iter()
            .find(|(name, _)| name == role)
            .map(|(_, value)| value)
    }
}

impl PartialEq for ComputedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.unit == other.unit
            && self.formula == other.formula
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|((role_a, a), (role_b, b))| {
                    role_a == role_b && (Arc::ptr_eq(a, b) || a == b)
                })
    }
}

/// Any value in an analysis: vendor-sourced, filing-cited, or derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    Market(MarketValue),
    Cited(CitedValue),
    Computed(ComputedValue),
}

impl Value {
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Value::Market(v) => v.value,
            Value::Cited(v) => v.value,
            Value::Computed(v) => v.value,
        }
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        match self {
            Value::Market(v) => &v.unit,
            Value::Cited(v) => &v.unit,
            Value::Computed(v) => &v.unit,
        }
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        match self {
            Value::Market(v) => &v.warnings,
            Value::Cited(v) => &v.warnings,
            Value::Computed(v) => &v.warnings,
        }
    }
}

impl From<MarketValue> for Value {
    fn from(v: MarketValue) -> Self {
        Value::Market(v)
    }
}

impl From<CitedValue> for Value {
    fn from(v: CitedValue) -> Self {
        Value::Cited(v)
    }
}

impl From<ComputedValue> for Value {
    fn from(v: ComputedValue) -> Self {
        Value::Computed(v)
    }
}

fn push_unique(warnings: &mut Vec<String>, warning: String) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
