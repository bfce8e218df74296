//! Year-over-year growth and margin deltas.
//!
//! Growth compares two parallel metric mappings (LTM vs LTM-1) with the
//! relative-change formula `(current - prior) / |prior|`. The core never
//! knows whether the windows are trailing-twelve-month or annual; the
//! period selection happened upstream. Per-share metrics whose sources
//! carry the upstream split-contamination marker are skipped rather than
//! reported as nonsense swings.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::domain::{units, ComputedValue, Value};
use crate::core::sec::{metrics, SecMetrics, SPLIT_CONTAMINATION_MARKER};

use super::util::{compute_adjusted_ebitda, compute_ebitda, extract_sec_value, safe_div};

const GROWTH_FORMULA: &str = "(current - prior) / |prior|";

/// Metrics tracked year over year, in emission order.
const GROWTH_METRICS: &[&str] = &[
    metrics::REVENUE,
    metrics::GROSS_PROFIT,
    metrics::OPERATING_INCOME,
    "ebitda",
    "adjusted_ebitda",
    metrics::NET_INCOME,
    metrics::EPS_DILUTED,
    metrics::DEPRECIATION_AMORTIZATION,
    metrics::FREE_CASH_FLOW,
];

const PER_SHARE_METRICS: &[&str] = &[metrics::EPS_DILUTED, metrics::DIVIDENDS_PER_SHARE];

/// Compute YoY growth for the standard metric set plus margin deltas.
#[must_use]
pub fn build_growth(
    current: &SecMetrics,
    prior: &SecMetrics,
) -> BTreeMap<String, ComputedValue> {
    let mut growth = BTreeMap::new();

    for &metric in GROWTH_METRICS {
        let current_side = period_value(current, metric);
        let prior_side = period_value(prior, metric);
        growth.insert(metric.to_string(), yoy(metric, current_side, prior_side));
    }

    growth.insert(
        "gross_margin_delta".to_string(),
        margin_delta(
            period_margin(current, metrics::GROSS_PROFIT, "gross_profit / revenue"),
            period_margin(prior, metrics::GROSS_PROFIT, "gross_profit / revenue"),
        ),
    );
    growth.insert(
        "ebitda_margin_delta".to_string(),
        margin_delta(
            period_margin(current, "ebitda", "ebitda / revenue"),
            period_margin(prior, "ebitda", "ebitda / revenue"),
        ),
    );
    growth.insert(
        "adjusted_ebitda_margin_delta".to_string(),
        margin_delta(
            period_margin(current, "adjusted_ebitda", "adjusted_ebitda / revenue"),
            period_margin(prior, "adjusted_ebitda", "adjusted_ebitda / revenue"),
        ),
    );

    growth
}

/// Resolve one period's side of a growth comparison: a citation for plain
/// metrics, a derived value for the EBITDA variants.
fn period_value(period: &SecMetrics, metric: &str) -> Option<Arc<Value>> {
    match metric {
        "ebitda" => Some(Arc::new(Value::Computed(compute_ebitda(
            extract_sec_value(period, metrics::OPERATING_INCOME),
            extract_sec_value(period, metrics::DEPRECIATION_AMORTIZATION),
        )))),
        "adjusted_ebitda" => Some(Arc::new(Value::Computed(compute_adjusted_ebitda(
            extract_sec_value(period, metrics::OPERATING_INCOME),
            extract_sec_value(period, metrics::DEPRECIATION_AMORTIZATION),
            extract_sec_value(period, metrics::STOCK_BASED_COMPENSATION),
        )))),
        name => extract_sec_value(period, name).map(|v| Arc::new(Value::Cited(v.clone()))),
    }
}

fn yoy(metric: &str, current: Option<Arc<Value>>, prior: Option<Arc<Value>>) -> ComputedValue {
    let mut components = Vec::new();
    if let Some(ref side) = current {
        components.push(("current".to_string(), Arc::clone(side)));
    }
    if let Some(ref side) = prior {
        components.push(("prior".to_string(), Arc::clone(side)));
    }

    if PER_SHARE_METRICS.contains(&metric) && is_split_contaminated(&current, &prior) {
        let mut skipped = ComputedValue::new(GROWTH_FORMULA, units::PURE, None, components);
        skipped.push_warning("skipped: stock split contamination");
        return skipped;
    }

    let current_value = current.as_ref().and_then(|v| v.value());
    let prior_value = prior.as_ref().and_then(|v| v.value());

    let mut zero_prior = false;
    let value = match (current_value, prior_value) {
        (Some(_), Some(p)) if p == 0.0 => {
            zero_prior = true;
            None
        }
        (Some(c), Some(p)) if c.is_finite() && p.is_finite() => Some((c - p) / p.abs()),
        _ => None,
    };

    let mut computed = ComputedValue::new(GROWTH_FORMULA, units::PURE, value, components);
    if zero_prior {
        computed.push_warning("prior period is zero");
    }
    computed
}

fn is_split_contaminated(current: &Option<Arc<Value>>, prior: &Option<Arc<Value>>) -> bool {
    [current, prior].iter().any(|side| {
        side.as_ref().is_some_and(|value| {
            value
                .warnings()
                .iter()
                .any(|w| w.contains(SPLIT_CONTAMINATION_MARKER))
        })
    })
}

/// One period's margin on revenue as a computed value. The numerator may be
/// a citation or one of the derived EBITDA variants.
fn period_margin(period: &SecMetrics, numerator: &str, formula: &str) -> ComputedValue {
    ratio_on_revenue(period, period_value(period, numerator), numerator, formula)
}

fn ratio_on_revenue(
    period: &SecMetrics,
    numerator: Option<Arc<Value>>,
    role: &str,
    formula: &str,
) -> ComputedValue {
    let revenue =
        extract_sec_value(period, metrics::REVENUE).map(|v| Arc::new(Value::Cited(v.clone())));

    let mut components = Vec::new();
    if let Some(ref side) = numerator {
        components.push((role.to_string(), Arc::clone(side)));
    }
    if let Some(ref side) = revenue {
        components.push((metrics::REVENUE.to_string(), Arc::clone(side)));
    }

    let value = safe_div(
        numerator.as_ref().and_then(|v| v.value()),
        revenue.as_ref().and_then(|v| v.value()),
    );
    ComputedValue::new(formula, units::PURE, value, components)
}

/// Change in a margin between the two periods, in percentage points.
fn margin_delta(current: ComputedValue, prior: ComputedValue) -> ComputedValue {
    let value = match (current.value, prior.value) {
        (Some(c), Some(p)) if c.is_finite() && p.is_finite() => Some((c - p) * 100.0),
        _ => None,
    };
    ComputedValue::new(
        "(current_margin - prior_margin) * 100",
        units::PERCENTAGE_POINTS,
        value,
        vec![
            ("current_margin".to_string(), Arc::new(Value::Computed(current))),
            ("prior_margin".to_string(), Arc::new(Value::Computed(prior))),
        ],
    )
}
