//! Operating metrics: margins, expense ratios, revenue per share, ROIC.
//!
//! Arithmetic here is SEC-only (share count and tax rate aside), so a
//! non-USD filer still gets its margins; only `revenue_per_share` crosses
//! contexts, and it warns rather than blocks.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::domain::{units, ComputedValue, Value};
use crate::core::market::MarketSnapshot;
use crate::core::sec::{metrics, SecMetrics};

use super::util::{currency_of_unit, extract_sec_value, safe_div};

/// Compute the operating metric set.
///
/// `tax_rate` is the engine parameter feeding ROIC; `ebitda` and
/// `adjusted_ebitda` are the derived LTM values shared with the multiples.
#[must_use]
pub fn build_operating(
    sec_ltm: &SecMetrics,
    market: Option<&MarketSnapshot>,
    ebitda: &ComputedValue,
    adjusted_ebitda: &ComputedValue,
    tax_rate: f64,
) -> BTreeMap<String, ComputedValue> {
    let revenue =
        extract_sec_value(sec_ltm, metrics::REVENUE).map(|v| Arc::new(Value::Cited(v.clone())));

    let cited = |name: &str| {
        extract_sec_value(sec_ltm, name).map(|v| Arc::new(Value::Cited(v.clone())))
    };

    let on_revenue = |role: &str, numerator: Option<Arc<Value>>, formula: &str| {
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
    };

    let mut operating = BTreeMap::new();
    let mut put = |name: &str, value: ComputedValue| {
        operating.insert(name.to_string(), value);
    };

    put(
        "gross_margin",
        on_revenue(
            metrics::GROSS_PROFIT,
            cited(metrics::GROSS_PROFIT),
            "gross_profit / revenue",
        ),
    );
    put(
        "ebitda_margin",
        on_revenue(
            "ebitda",
            Some(Arc::new(Value::Computed(ebitda.clone()))),
            "ebitda / revenue",
        ),
    );
    put(
        "adjusted_ebitda_margin",
        on_revenue(
            "adjusted_ebitda",
            Some(Arc::new(Value::Computed(adjusted_ebitda.clone()))),
            "adjusted_ebitda / revenue",
        ),
    );
    put(
        "net_margin",
        on_revenue(
            metrics::NET_INCOME,
            cited(metrics::NET_INCOME),
            "net_income / revenue",
        ),
    );
    put(
        "fcf_margin",
        on_revenue(
            metrics::FREE_CASH_FLOW,
            cited(metrics::FREE_CASH_FLOW),
            "free_cash_flow / revenue",
        ),
    );
    put(
        "rd_to_revenue",
        on_revenue(
            metrics::RESEARCH_DEVELOPMENT,
            cited(metrics::RESEARCH_DEVELOPMENT),
            "research_development / revenue",
        ),
    );
    put(
        "sga_to_revenue",
        on_revenue(
            metrics::SELLING_GENERAL_ADMINISTRATIVE,
            cited(metrics::SELLING_GENERAL_ADMINISTRATIVE),
            "selling_general_administrative / revenue",
        ),
    );
    put(
        "capex_to_revenue",
        on_revenue(metrics::CAPEX, cited(metrics::CAPEX), "capex / revenue"),
    );
    put("revenue_per_share", revenue_per_share(sec_ltm, market));
    put("roic", roic(sec_ltm, tax_rate));

    operating
}

/// Revenue over the market share count.
///
/// The unit follows the filing currency; a non-USD filer still computes,
/// with a cross-context warning, because the share count is a pure count.
fn revenue_per_share(sec_ltm: &SecMetrics, market: Option<&MarketSnapshot>) -> ComputedValue {
    let revenue = extract_sec_value(sec_ltm, metrics::REVENUE);
    let shares = market.map(|m| &m.shares_outstanding);

    let currency = revenue
        .and_then(|v| currency_of_unit(&v.unit))
        .unwrap_or(units::USD)
        .to_string();

    let mut components = Vec::new();
    if let Some(cited) = revenue {
        components.push((
            metrics::REVENUE.to_string(),
            Arc::new(Value::Cited(cited.clone())),
        ));
    }
    if let Some(market_value) = shares {
        components.push((
            "shares_outstanding".to_string(),
            Arc::new(Value::Market(market_value.clone())),
        ));
    }

    let value = safe_div(
        revenue.and_then(|v| v.value),
        shares.and_then(|v| v.value),
    );

    let mut computed = ComputedValue::new(
        "revenue / shares_outstanding",
        units::per_share(&currency),
        value,
        components,
    );
    if currency != units::USD {
        computed.push_warning(format!(
            "cross-context: SEC {currency} revenue vs market share count"
        ));
    }
    computed
}

/// After-tax operating return on invested capital (debt plus equity).
fn roic(sec_ltm: &SecMetrics, tax_rate: f64) -> ComputedValue {
    let operating_income = extract_sec_value(sec_ltm, metrics::OPERATING_INCOME);
    let total_debt = extract_sec_value(sec_ltm, metrics::TOTAL_DEBT);
    let equity = extract_sec_value(sec_ltm, metrics::STOCKHOLDERS_EQUITY);

    let mut components = Vec::new();
    for (role, cited) in [
        (metrics::OPERATING_INCOME, operating_income),
        (metrics::TOTAL_DEBT, total_debt),
        (metrics::STOCKHOLDERS_EQUITY, equity),
    ] {
        if let Some(cited) = cited {
            components.push((role.to_string(), Arc::new(Value::Cited(cited.clone()))));
        }
    }

    // Either citation alone can carry the invested-capital base; the other
    // contributes zero. Both absent means no base at all.
    let invested = match (
        total_debt.and_then(|v| v.value),
        equity.and_then(|v| v.value),
    ) {
        (None, None) => None,
        (debt, equity) => Some(debt.unwrap_or(0.0) + equity.unwrap_or(0.0)),
    };

    let value = safe_div(
        operating_income
            .and_then(|v| v.value)
            .map(|oi| oi * (1.0 - tax_rate)),
        invested,
    );

    ComputedValue::new(
        "operating_income * (1 - tax_rate) / (total_debt + stockholders_equity)",
        units::PURE,
        value,
        components,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::{compute_adjusted_ebitda, compute_ebitda};
    use crate::testkit::market::snapshot_with_cap;
    use crate::testkit::sec::{cited, metrics_from};

    fn derive(sec: &SecMetrics) -> (ComputedValue, ComputedValue) {
        let oi = sec.get(metrics::OPERATING_INCOME);
        let dna = sec.get(metrics::DEPRECIATION_AMORTIZATION);
        let sbc = sec.get(metrics::STOCK_BASED_COMPENSATION);
        (compute_ebitda(oi, dna), compute_adjusted_ebitda(oi, dna, sbc))
    }

    #[test]
    fn margins_divide_by_revenue() {
        let sec = metrics_from(&[
            ("revenue", 200.0),
            ("gross_profit", 120.0),
            ("net_income", 30.0),
            ("free_cash_flow", 50.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        assert_eq!(operating["gross_margin"].value, Some(0.6));
        assert_eq!(operating["net_margin"].value, Some(0.15));
        assert_eq!(operating["fcf_margin"].value, Some(0.25));
        assert_eq!(operating["gross_margin"].unit, "pure");
    }

    #[test]
    fn expense_ratios_cover_rd_sga_capex() {
        let sec = metrics_from(&[
            ("revenue", 200.0),
            ("research_development", 40.0),
            ("selling_general_administrative", 30.0),
            ("capex", 10.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        assert_eq!(operating["rd_to_revenue"].value, Some(0.2));
        assert_eq!(operating["sga_to_revenue"].value, Some(0.15));
        assert_eq!(operating["capex_to_revenue"].value, Some(0.05));
    }

    #[test]
    fn missing_revenue_nulls_the_ratios() {
        let sec = metrics_from(&[("gross_profit", 120.0)]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        assert_eq!(operating["gross_margin"].value, None);
    }

    #[test]
    fn revenue_per_share_uses_market_share_count() {
        let market = snapshot_with_cap("TEST", 1_000.0e9);
        let sec = metrics_from(&[("revenue", 100.0e9)]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, Some(&market), &ebitda, &adjusted, 0.21);

        let rps = &operating["revenue_per_share"];
        // Testkit snapshots carry 1e9 shares.
        assert_eq!(rps.value, Some(100.0));
        assert_eq!(rps.unit, "USD/shares");
        assert!(rps.warnings.is_empty());
    }

    #[test]
    fn non_usd_revenue_per_share_warns_but_computes() {
        let market = snapshot_with_cap("BABA", 1_000.0e9);
        let mut sec = SecMetrics::new();
        sec.insert("revenue".into(), cited("revenue", 200.0e9, "CNY"));
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, Some(&market), &ebitda, &adjusted, 0.21);

        let rps = &operating["revenue_per_share"];
        assert_eq!(rps.value, Some(200.0));
        assert_eq!(rps.unit, "CNY/shares");
        assert!(rps
            .warnings
            .contains(&"cross-context: SEC CNY revenue vs market share count".to_string()));
    }

    #[test]
    fn roic_applies_the_tax_rate() {
        let sec = metrics_from(&[
            ("operating_income", 100.0),
            ("total_debt", 150.0),
            ("stockholders_equity", 250.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        // 100 * 0.79 / 400.
        let roic = operating["roic"].value.unwrap();
        assert!((roic - 0.1975).abs() < 1e-12);
    }

    #[test]
    fn roic_nulls_on_zero_invested_capital() {
        let sec = metrics_from(&[
            ("operating_income", 100.0),
            ("total_debt", 200.0),
            ("stockholders_equity", -200.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        assert_eq!(operating["roic"].value, None);
    }

    #[test]
    fn roic_tolerates_a_missing_debt_citation() {
        let sec = metrics_from(&[
            ("operating_income", 100.0),
            ("stockholders_equity", 500.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        let roic = operating["roic"].value.unwrap();
        assert!((roic - 0.158).abs() < 1e-12);
    }

    #[test]
    fn negative_equity_flows_through_signed() {
        let sec = metrics_from(&[
            ("operating_income", 100.0),
            ("total_debt", 100.0),
            ("stockholders_equity", -300.0),
        ]);
        let (ebitda, adjusted) = derive(&sec);

        let operating = build_operating(&sec, None, &ebitda, &adjusted, 0.21);

        // Invested capital is -200: the ratio is negative, not null.
        let roic = operating["roic"].value.unwrap();
        assert!(roic < 0.0);
    }
}
