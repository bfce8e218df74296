//! Enterprise-value bridge.
//!
//! Anchored on market capitalization, the bridge adds debt-like claims and
//! subtracts cash-like offsets per the configured [`EvPolicy`]. The output
//! is a single [`ComputedValue`] whose formula lists the operators in
//! bridge order and whose components map role names to source values.

use std::sync::Arc;

use crate::core::domain::{units, CitedValue, ComputedValue, DebtMode, EvPolicy, Value};
use crate::core::market::MarketSnapshot;
use crate::core::sec::{metrics, SecMetrics};

use super::util::{currency_of_unit, detect_sec_currency, extract_sec_value, is_cross_currency};

const FORMULA_ANCHOR: &str = "market_cap";

/// Assemble the EV bridge from market and SEC inputs under a policy.
///
/// Missing cited components contribute zero and are omitted; a null
/// `market_cap` nulls the whole bridge. A non-USD filing currency blocks
/// the bridge entirely (no partial bridge is emitted).
#[must_use]
pub fn build_ev_bridge(
    market: Option<&MarketSnapshot>,
    sec_ltm: &SecMetrics,
    policy: &EvPolicy,
) -> ComputedValue {
    let detection = detect_sec_currency(sec_ltm);
    if let Some(ccy) = detection.code.as_deref() {
        // A citation carrying the majority currency stands in for the whole
        // mapping against the market side.
        let representative = sec_ltm
            .values()
            .find(|cited| currency_of_unit(&cited.unit) == Some(ccy))
            .map(|cited| Value::Cited(cited.clone()));
        if representative.is_some_and(|value| is_cross_currency(market, &value)) {
            return ComputedValue::new(FORMULA_ANCHOR, units::USD, None, Vec::new())
                .with_warning(format!("EV bridge blocked: SEC currency {ccy} ≠ USD market"));
        }
    }

    let mut bridge = Bridge::new(market);

    match policy.debt_mode {
        DebtMode::TotalOnly => {
            bridge.add(metrics::TOTAL_DEBT, extract_sec_value(sec_ltm, metrics::TOTAL_DEBT));
        }
        DebtMode::Split => bridge.add_split_debt(sec_ltm),
        DebtMode::TotalPlusShortTerm => {
            bridge.add(metrics::TOTAL_DEBT, extract_sec_value(sec_ltm, metrics::TOTAL_DEBT));
            bridge.add(
                metrics::SHORT_TERM_DEBT,
                extract_sec_value(sec_ltm, metrics::SHORT_TERM_DEBT),
            );
        }
    }

    if policy.include_leases {
        bridge.add(
            metrics::OPERATING_LEASE_LIABILITIES,
            extract_sec_value(sec_ltm, metrics::OPERATING_LEASE_LIABILITIES),
        );
    }
    if policy.include_preferred {
        bridge.add(
            metrics::PREFERRED_STOCK,
            extract_sec_value(sec_ltm, metrics::PREFERRED_STOCK),
        );
    }
    if policy.include_nci {
        bridge.add(
            metrics::NONCONTROLLING_INTERESTS,
            extract_sec_value(sec_ltm, metrics::NONCONTROLLING_INTERESTS),
        );
    }
    if policy.subtract_cash {
        bridge.subtract(metrics::CASH, extract_sec_value(sec_ltm, metrics::CASH));
    }
    if policy.subtract_marketable_securities {
        bridge.subtract(
            metrics::MARKETABLE_SECURITIES,
            extract_sec_value(sec_ltm, metrics::MARKETABLE_SECURITIES),
        );
    }
    if policy.subtract_equity_method_investments {
        bridge.subtract(
            metrics::EQUITY_METHOD_INVESTMENTS,
            extract_sec_value(sec_ltm, metrics::EQUITY_METHOD_INVESTMENTS),
        );
    }

    let mut computed = bridge.seal();
    for warning in detection.warnings {
        computed.push_warning(warning);
    }
    computed
}

/// Accumulates the bridge: running total, formula text, component list.
struct Bridge {
    total: Option<f64>,
    formula: String,
    components: Vec<(String, Arc<Value>)>,
}

impl Bridge {
    fn new(market: Option<&MarketSnapshot>) -> Self {
        let mut components = Vec::new();
        let total = match market {
            Some(snapshot) => {
                components.push((
                    FORMULA_ANCHOR.to_string(),
                    Arc::new(snapshot.market_cap.clone()),
                ));
                snapshot.market_cap.value()
            }
            None => None,
        };

        Self {
            total,
            formula: FORMULA_ANCHOR.to_string(),
            components,
        }
    }

    fn add(&mut self, role: &str, cited: Option<&CitedValue>) {
        self.apply(role, cited, 1.0);
    }

    fn subtract(&mut self, role: &str, cited: Option<&CitedValue>) {
        self.apply(role, cited, -1.0);
    }

    fn apply(&mut self, role: &str, cited: Option<&CitedValue>, sign: f64) {
        let Some(cited) = cited else {
            return;
        };
        self.formula
            .push_str(if sign < 0.0 { " - " } else { " + " });
        self.formula.push_str(role);
        self.components
            .push((role.to_string(), Arc::new(Value::Cited(cited.clone()))));

        // A citation with a null value still contributes zero.
        if let Some(v) = cited.value.filter(|v| v.is_finite()) {
            self.total = self.total.map(|t| t + sign * v);
        }
    }

    /// `short_term_debt` plus a derived `long_term_debt`
    /// (`total_debt - short_term_debt`); degrades to the plain total when no
    /// short-term citation exists.
    fn add_split_debt(&mut self, sec_ltm: &SecMetrics) {
        let total_debt = extract_sec_value(sec_ltm, metrics::TOTAL_DEBT);
        let short_term = extract_sec_value(sec_ltm, metrics::SHORT_TERM_DEBT);

        let (Some(total_debt), Some(short_term)) = (total_debt, short_term) else {
            if let Some(total_debt) = total_debt {
                self.add(metrics::TOTAL_DEBT, Some(total_debt));
            } else if let Some(short_term) = short_term {
                self.add(metrics::SHORT_TERM_DEBT, Some(short_term));
            }
            return;
        };

        let long_term_value = match (total_debt.value, short_term.value) {
            (Some(t), Some(s)) => Some(t - s),
            _ => None,
        };
        let long_term = ComputedValue::new(
            "total_debt - short_term_debt",
            total_debt.unit.clone(),
            long_term_value,
            vec![
                (
                    metrics::TOTAL_DEBT.to_string(),
                    Arc::new(Value::Cited(total_debt.clone())),
                ),
                (
                    metrics::SHORT_TERM_DEBT.to_string(),
                    Arc::new(Value::Cited(short_term.clone())),
                ),
            ],
        );

        self.apply(metrics::SHORT_TERM_DEBT, Some(short_term), 1.0);
        self.formula.push_str(" + long_term_debt");
        self.components.push((
            "long_term_debt".to_string(),
            Arc::new(Value::Computed(long_term.clone())),
        ));
        if let Some(v) = long_term.value.filter(|v| v.is_finite()) {
            self.total = self.total.map(|t| t + v);
        }
    }

    fn seal(self) -> ComputedValue {
        ComputedValue::new(self.formula, units::USD, self.total, self.components)
    }
}
