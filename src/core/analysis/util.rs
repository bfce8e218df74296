//! Shared extraction and computation helpers for the analysis components.

use std::sync::Arc;

use crate::core::domain::{units, CitedValue, ComputedValue, Value};
use crate::core::market::MarketSnapshot;
use crate::core::sec::{metrics, SecMetrics};

/// Look up a cited metric by normalized name. Absence is not an error.
#[must_use]
pub fn extract_sec_value<'a>(metrics: &'a SecMetrics, name: &str) -> Option<&'a CitedValue> {
    metrics.get(name)
}

/// Currency code of a unit string, if it carries one.
///
/// `"USD"` and `"USD/shares"` resolve to `USD`; dimensionless units
/// (`"pure"`, `"x"`, `"%"`, `"shares"`) resolve to `None`.
#[must_use]
pub fn currency_of_unit(unit: &str) -> Option<&str> {
    let head = unit.split('/').next().unwrap_or_default();
    (head.len() == 3 && head.bytes().all(|b| b.is_ascii_uppercase())).then_some(head)
}

/// Result of scanning a filing mapping for its reporting currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyDetection {
    pub code: Option<String>,
    pub warnings: Vec<String>,
}

/// Detect the reporting currency of a cited-metric mapping.
///
/// Mixed currencies within one company resolve to the majority code with a
/// warning; an empty or currency-free mapping yields `None`.
#[must_use]
pub fn detect_sec_currency(metrics: &SecMetrics) -> CurrencyDetection {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for cited in metrics.values() {
        if let Some(code) = currency_of_unit(&cited.unit) {
            match counts.iter_mut().find(|(c, _)| *c == code) {
                Some((_, n)) => *n += 1,
                None => counts.push((code, 1)),
            }
        }
    }

    let majority = counts
        .iter()
        .max_by_key(|(_, n)| *n)
        .map(|(code, _)| (*code).to_string());

    let warnings = if counts.len() > 1 {
        // Unwrap is safe under counts.len() > 1, but stay in Option-land.
        majority
            .as_deref()
            .map(|code| vec![format!("mixed SEC currencies; using majority {code}")])
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    CurrencyDetection {
        code: majority,
        warnings,
    }
}

/// Whether dividing a USD market value by this SEC-derived value would
/// cross a currency boundary. Callers check this before any market/SEC
/// division.
///
/// An absent snapshot still counts as USD context: every market input this
/// crate produces is USD-denominated.
#[must_use]
pub fn is_cross_currency(market: Option<&MarketSnapshot>, sec_value: &Value) -> bool {
    let market_is_usd = market.map_or(true, |m| {
        currency_of_unit(m.market_cap.unit()) == Some(units::USD)
            || currency_of_unit(&m.price.unit) == Some(units::USD)
    });
    let sec_currency = currency_of_unit(sec_value.unit());
    market_is_usd && sec_currency.is_some_and(|ccy| ccy != units::USD)
}

/// GAAP EBITDA: operating income plus depreciation and amortization.
#[must_use]
pub fn compute_ebitda(
    operating_income: Option<&CitedValue>,
    dna: Option<&CitedValue>,
) -> ComputedValue {
    let (value, unit, components) = sum_cited(&[
        (metrics::OPERATING_INCOME, operating_income),
        (metrics::DEPRECIATION_AMORTIZATION, dna),
    ]);
    ComputedValue::new("OI + D&A", unit, value, components)
}

/// SBC-adjusted EBITDA: operating income plus D&A plus stock-based
/// compensation.
///
/// A missing SBC citation degrades to GAAP EBITDA with a warning; a missing
/// operating income or D&A nulls the result.
#[must_use]
pub fn compute_adjusted_ebitda(
    operating_income: Option<&CitedValue>,
    dna: Option<&CitedValue>,
    sbc: Option<&CitedValue>,
) -> ComputedValue {
    let (base, unit, mut components) = sum_cited(&[
        (metrics::OPERATING_INCOME, operating_income),
        (metrics::DEPRECIATION_AMORTIZATION, dna),
    ]);

    let sbc_value = sbc.and_then(|v| v.value);
    if let Some(cited) = sbc {
        components.push((
            metrics::STOCK_BASED_COMPENSATION.to_string(),
            Arc::new(Value::Cited(cited.clone())),
        ));
    }

    let value = match (base, sbc_value) {
        (Some(base), Some(sbc)) => Some(base + sbc),
        (base, None) => base,
        (None, _) => None,
    };

    let mut adjusted = ComputedValue::new("OI + D&A + SBC", unit, value, components);
    if base.is_some() && sbc_value.is_none() {
        adjusted.push_warning("SBC unavailable; adjusted EBITDA ≈ GAAP EBITDA");
    }
    adjusted
}

/// Divide tolerating missing, zero, and non-finite inputs.
#[must_use]
pub(crate) fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if n.is_finite() && d.is_finite() && d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Sum cited values into (total, unit, components); any missing value nulls
/// the total, and the unit follows the first citation that carries one.
fn sum_cited(
    items: &[(&str, Option<&CitedValue>)],
) -> (Option<f64>, String, Vec<(String, Arc<Value>)>) {
    let mut total = Some(0.0);
    let mut unit = None;
    let mut components = Vec::new();

    for (role, cited) in items {
        match cited {
            Some(cited) => {
                if unit.is_none() {
                    unit = Some(cited.unit.clone());
                }
                components.push(((*role).to_string(), Arc::new(Value::Cited((*cited).clone()))));
                total = match (total, cited.value) {
                    (Some(t), Some(v)) if v.is_finite() => Some(t + v),
                    _ => None,
                };
            }
            None => total = None,
        }
    }

    (total, unit.unwrap_or_else(|| units::USD.to_string()), components)
}
