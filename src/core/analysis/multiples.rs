//! Valuation multiples and yields.
//!
//! Every multiple divides a market-anchored numerator by a cited
//! denominator (or the reverse, for yields). Divisions never raise: a
//! missing, zero, or non-finite denominator nulls the value, and a non-USD
//! cited side blocks the division with a currency-mismatch warning.
//! Negative denominators flow through (negative multiples are meaningful
//! for loss-making companies).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::domain::{units, ComputedValue, Value};
use crate::core::market::MarketSnapshot;
use crate::core::sec::{metrics, SecMetrics};

use super::util::{currency_of_unit, extract_sec_value, is_cross_currency, safe_div};

/// Compute the full multiple set. All nine names are always emitted;
/// unavailable inputs yield null values, never absent keys.
#[must_use]
pub fn build_multiples(
    ev: &ComputedValue,
    market: Option<&MarketSnapshot>,
    sec_ltm: &SecMetrics,
    ebitda: &ComputedValue,
    adjusted_ebitda: &ComputedValue,
) -> BTreeMap<String, ComputedValue> {
    let ev_side = Some(Arc::new(Value::Computed(ev.clone())));
    let market_cap = market.map(|m| Arc::new(m.market_cap.clone()));
    let price = market.map(|m| Arc::new(Value::Market(m.price.clone())));

    let cited = |name: &str| {
        extract_sec_value(sec_ltm, name).map(|v| Arc::new(Value::Cited(v.clone())))
    };

    let mut multiples = BTreeMap::new();
    let mut put = |name: &str, value: ComputedValue| {
        multiples.insert(name.to_string(), value);
    };

    put(
        "ev_revenue",
        ratio(
            "enterprise_value / revenue",
            units::MULTIPLE,
            market,
            ("enterprise_value", ev_side.clone()),
            (metrics::REVENUE, cited(metrics::REVENUE)),
        ),
    );
    put(
        "ev_ebitda",
        ratio(
            "enterprise_value / adjusted_ebitda",
            units::MULTIPLE,
            market,
            ("enterprise_value", ev_side.clone()),
            (
                "adjusted_ebitda",
                Some(Arc::new(Value::Computed(adjusted_ebitda.clone()))),
            ),
        ),
    );
    put(
        "ev_ebitda_gaap",
        ratio(
            "enterprise_value / ebitda",
            units::MULTIPLE,
            market,
            ("enterprise_value", ev_side.clone()),
            ("ebitda", Some(Arc::new(Value::Computed(ebitda.clone())))),
        ),
    );
    put(
        "ev_ebit",
        ratio(
            "enterprise_value / operating_income",
            units::MULTIPLE,
            market,
            ("enterprise_value", ev_side.clone()),
            (metrics::OPERATING_INCOME, cited(metrics::OPERATING_INCOME)),
        ),
    );
    put(
        "ev_fcf",
        ratio(
            "enterprise_value / free_cash_flow",
            units::MULTIPLE,
            market,
            ("enterprise_value", ev_side),
            (metrics::FREE_CASH_FLOW, cited(metrics::FREE_CASH_FLOW)),
        ),
    );
    put(
        "pe",
        ratio(
            "market_cap / net_income",
            units::MULTIPLE,
            market,
            ("market_cap", market_cap.clone()),
            (metrics::NET_INCOME, cited(metrics::NET_INCOME)),
        ),
    );
    put(
        "pb",
        ratio(
            "market_cap / stockholders_equity",
            units::MULTIPLE,
            market,
            ("market_cap", market_cap.clone()),
            (
                metrics::STOCKHOLDERS_EQUITY,
                cited(metrics::STOCKHOLDERS_EQUITY),
            ),
        ),
    );
    put(
        "fcf_yield",
        ratio(
            "free_cash_flow / market_cap",
            units::PERCENT,
            market,
            (metrics::FREE_CASH_FLOW, cited(metrics::FREE_CASH_FLOW)),
            ("market_cap", market_cap),
        ),
    );
    put(
        "dividend_yield",
        ratio(
            "dividends_per_share / price",
            units::PERCENT,
            market,
            (
                metrics::DIVIDENDS_PER_SHARE,
                cited(metrics::DIVIDENDS_PER_SHARE),
            ),
            ("price", price),
        ),
    );

    multiples
}

/// One market/SEC division with the currency gate applied.
///
/// The cited side is whichever component [`is_cross_currency`] flags; USD
/// market inputs never trip the gate on their own.
fn ratio(
    formula: &str,
    unit: &str,
    market: Option<&MarketSnapshot>,
    numerator: (&str, Option<Arc<Value>>),
    denominator: (&str, Option<Arc<Value>>),
) -> ComputedValue {
    let mut components = Vec::new();
    let mut mismatch = None;

    for (role, side) in [&numerator, &denominator] {
        if let Some(value) = side {
            if is_cross_currency(market, value) {
                mismatch = currency_of_unit(value.unit()).map(str::to_string);
            }
            components.push((role.to_string(), Arc::clone(value)));
        }
    }

    let value = safe_div(
        numerator.1.as_ref().and_then(|v| v.value()),
        denominator.1.as_ref().and_then(|v| v.value()),
    );

    let mut computed = ComputedValue::new(formula, unit, value, components);
    if let Some(ccy) = mismatch {
        computed.value = None;
        computed.push_warning(format!("currency mismatch: {ccy} cited vs USD market"));
    }
    computed
}
