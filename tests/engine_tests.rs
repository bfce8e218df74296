//! Engine-level behavior over the public API: fan-out, failure isolation,
//! ordering, and the analysis invariants that span components.

use std::sync::Arc;
use std::time::Duration;

use handspread::testkit::market::{profile, quote, ScriptedTransport};
use handspread::testkit::sec::{cited, metrics_from, CannedSecProvider, HangingSecProvider};
use handspread::{
    AnalysisStage, AnalyzeOptions, Engine, Error, MarketClient, Period, SecMetrics, SecProvider,
};

fn tickers(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| (*s).to_string()).collect()
}

fn engine_with(sec: impl SecProvider + 'static, transport: ScriptedTransport) -> Engine {
    Engine::new(
        Arc::new(sec),
        MarketClient::new(Arc::new(transport), Duration::from_secs(300), 8),
    )
}

fn nvda_sec_ltm() -> SecMetrics {
    metrics_from(&[
        ("revenue", 187.0e9),
        ("gross_profit", 130.0e9),
        ("operating_income", 110.0e9),
        ("depreciation_amortization", 4.0e9),
        ("stock_based_compensation", 5.0e9),
        ("net_income", 95.0e9),
        ("free_cash_flow", 72.0e9),
        ("total_debt", 8.5e9),
        ("cash", 11.5e9),
        ("marketable_securities", 49.1e9),
        ("stockholders_equity", 65.0e9),
    ])
}

fn nvda_sec_prior() -> SecMetrics {
    metrics_from(&[
        ("revenue", 130.0e9),
        ("gross_profit", 95.0e9),
        ("operating_income", 81.0e9),
        ("depreciation_amortization", 3.0e9),
        ("net_income", 73.0e9),
        ("free_cash_flow", 60.0e9),
    ])
}

fn nvda_transport() -> ScriptedTransport {
    ScriptedTransport::new().with_company(
        "NVDA",
        quote(183.16),
        profile(Some("NVIDIA Corp"), Some(24_400.0), Some(4_422_600.0)),
    )
}

#[tokio::test]
async fn empty_ticker_list_is_rejected() {
    let engine = engine_with(CannedSecProvider::new(), ScriptedTransport::new());

    let result = engine.analyze_comps(&[], &AnalyzeOptions::default()).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn out_of_range_tax_rate_is_rejected() {
    let engine = engine_with(CannedSecProvider::new(), ScriptedTransport::new());
    let options = AnalyzeOptions {
        tax_rate: 1.5,
        ..AnalyzeOptions::default()
    };

    let result = engine.analyze_comps(&tickers(&["NVDA"]), &options).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn happy_path_assembles_bridge_multiples_growth_and_operating() {
    let sec = CannedSecProvider::new()
        .with_metrics("NVDA", Period::Ltm, nvda_sec_ltm())
        .with_metrics("NVDA", Period::LtmMinus1, nvda_sec_prior());
    let engine = engine_with(sec, nvda_transport());

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    assert_eq!(analyses.len(), 1);
    let analysis = &analyses[0];
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(analysis.company_name.as_deref(), Some("NVIDIA Corp"));
    assert!(analysis.cik.is_some());

    // market_cap + total_debt - cash - marketable_securities
    assert_eq!(analysis.ev_bridge.value, Some(4_370.5e9));

    let ev_revenue = analysis.multiples["ev_revenue"].value.unwrap();
    assert!((ev_revenue - 23.37).abs() < 0.01, "got {ev_revenue}");

    let revenue_growth = analysis.growth["revenue"].value.unwrap();
    assert!((revenue_growth - 0.438).abs() < 0.001);

    let gross_margin = analysis.operating["gross_margin"].value.unwrap();
    assert!((gross_margin - 0.695).abs() < 0.001);
}

#[tokio::test]
async fn results_come_back_in_input_order() {
    let sec = CannedSecProvider::new()
        .with_metrics("BBB", Period::Ltm, metrics_from(&[("revenue", 10.0)]))
        .with_metrics("BBB", Period::LtmMinus1, metrics_from(&[("revenue", 8.0)]))
        .with_metrics("AAA", Period::Ltm, metrics_from(&[("revenue", 20.0)]))
        .with_metrics("AAA", Period::LtmMinus1, metrics_from(&[("revenue", 16.0)]));
    let transport = ScriptedTransport::new()
        .with_company("BBB", quote(10.0), profile(Some("B Corp"), Some(1.0), Some(10.0)))
        .with_company("AAA", quote(20.0), profile(Some("A Corp"), Some(1.0), Some(20.0)));
    let engine = engine_with(sec, transport);

    let analyses = engine
        .analyze_comps(&tickers(&["BBB", "ZZZ", "AAA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    let symbols: Vec<_> = analyses.iter().map(|a| a.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BBB", "ZZZ", "AAA"]);
}

#[tokio::test]
async fn unknown_ticker_fails_every_stream_but_still_returns() {
    let engine = engine_with(CannedSecProvider::new(), ScriptedTransport::new());

    let analyses = engine
        .analyze_comps(&tickers(&["GHOST"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    assert_eq!(analyses.len(), 1);
    let analysis = &analyses[0];
    assert_eq!(analysis.errors.len(), 3);
    assert!(analysis.market.is_none());
    assert!(analysis.sec_ltm.is_empty());
    assert_eq!(analysis.ev_bridge.value, None);
    assert!(analysis.multiples.values().all(|m| m.value.is_none()));
}

#[tokio::test]
async fn market_failure_leaves_sec_streams_intact() {
    let sec = CannedSecProvider::new()
        .with_metrics("NVDA", Period::Ltm, nvda_sec_ltm())
        .with_metrics("NVDA", Period::LtmMinus1, nvda_sec_prior());
    // No scripted market response for NVDA: the market stream fails.
    let engine = engine_with(sec, ScriptedTransport::new());

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    let analysis = &analyses[0];
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].stage, AnalysisStage::Market);
    assert!(analysis.market.is_none());

    // SEC-only arithmetic survives.
    assert!(analysis.operating["gross_margin"].value.is_some());
    assert!(analysis.growth["revenue"].value.is_some());

    // Everything market-anchored is null.
    assert_eq!(analysis.ev_bridge.value, None);
    assert!(analysis.multiples.values().all(|m| m.value.is_none()));
}

#[tokio::test]
async fn sec_failure_leaves_market_stream_intact() {
    let engine = engine_with(CannedSecProvider::new(), nvda_transport());

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    let analysis = &analyses[0];
    assert_eq!(analysis.errors.len(), 2);
    assert!(analysis.market.is_some());
    assert_eq!(analysis.market.as_ref().unwrap().market_cap.value(), Some(4.4226e12));
    assert!(analysis.sec_ltm.is_empty());
}

#[tokio::test]
async fn failures_do_not_cross_ticker_boundaries() {
    let sec = CannedSecProvider::new()
        .with_metrics("GOOD", Period::Ltm, metrics_from(&[("revenue", 10.0)]))
        .with_metrics("GOOD", Period::LtmMinus1, metrics_from(&[("revenue", 8.0)]));
    let transport = ScriptedTransport::new().with_company(
        "GOOD",
        quote(10.0),
        profile(Some("Good Corp"), Some(1.0), Some(10.0)),
    );
    let engine = engine_with(sec, transport);

    let analyses = engine
        .analyze_comps(&tickers(&["BAD", "GOOD"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    assert!(!analyses[0].errors.is_empty());
    assert!(analyses[1].errors.is_empty());
}

#[tokio::test]
async fn shared_deadline_records_timeouts_and_keeps_settled_streams() {
    let transport = nvda_transport();
    let engine = engine_with(HangingSecProvider, transport);
    let options = AnalyzeOptions {
        timeout: Duration::from_millis(50),
        ..AnalyzeOptions::default()
    };

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &options)
        .await
        .unwrap();

    let analysis = &analyses[0];
    let timed_out: Vec<_> = analysis
        .errors
        .iter()
        .filter(|e| e.message.starts_with("timeout"))
        .map(|e| e.stage)
        .collect();
    assert!(timed_out.contains(&AnalysisStage::SecLtm));
    assert!(timed_out.contains(&AnalysisStage::SecLtmMinus1));

    // The market stream settled before the deadline and survives.
    assert!(analysis.market.is_some());
}

#[tokio::test]
async fn split_contamination_marker_nulls_per_share_growth() {
    let mut ltm = nvda_sec_ltm();
    ltm.insert(
        "eps_diluted".into(),
        cited("eps_diluted", 3.80, "USD/shares")
            .with_warning("Possible stock split contamination (LTM vs FY ratio 9.8)"),
    );
    let mut prior = nvda_sec_prior();
    prior.insert("eps_diluted".into(), cited("eps_diluted", 29.5, "USD/shares"));

    let sec = CannedSecProvider::new()
        .with_metrics("NVDA", Period::Ltm, ltm)
        .with_metrics("NVDA", Period::LtmMinus1, prior);
    let engine = engine_with(sec, nvda_transport());

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    let eps_growth = &analyses[0].growth["eps_diluted"];
    assert_eq!(eps_growth.value, None);
    assert!(eps_growth
        .warnings
        .contains(&"skipped: stock split contamination".to_string()));

    // Non-per-share growth is unaffected.
    assert!(analyses[0].growth["revenue"].value.is_some());
}

#[tokio::test]
async fn non_usd_filer_blocks_bridge_and_market_multiples_only() {
    let mut ltm = SecMetrics::new();
    ltm.insert("revenue".into(), cited("revenue", 941.0e9, "CNY"));
    ltm.insert("gross_profit".into(), cited("gross_profit", 380.0e9, "CNY"));
    let mut prior = SecMetrics::new();
    prior.insert("revenue".into(), cited("revenue", 869.0e9, "CNY"));

    let sec = CannedSecProvider::new()
        .with_metrics("BABA", Period::Ltm, ltm)
        .with_metrics("BABA", Period::LtmMinus1, prior);
    let transport = ScriptedTransport::new().with_company(
        "BABA",
        quote(120.0),
        profile(Some("Alibaba Group"), Some(2_400.0), Some(288_000.0)),
    );
    let engine = engine_with(sec, transport);

    let analyses = engine
        .analyze_comps(&tickers(&["BABA"]), &AnalyzeOptions::default())
        .await
        .unwrap();

    let analysis = &analyses[0];
    assert_eq!(analysis.ev_bridge.value, None);
    assert!(analysis
        .ev_bridge
        .warnings
        .contains(&"EV bridge blocked: SEC currency CNY ≠ USD market".to_string()));

    let ev_revenue = &analysis.multiples["ev_revenue"];
    assert_eq!(ev_revenue.value, None);
    assert!(ev_revenue
        .warnings
        .contains(&"currency mismatch: CNY cited vs USD market".to_string()));

    // SEC-only arithmetic is not blocked.
    assert!(analysis.operating["gross_margin"].value.is_some());
    assert!(analysis.growth["revenue"].value.is_some());
}

#[tokio::test]
async fn annual_period_compares_consecutive_fiscal_years() {
    let sec = CannedSecProvider::new()
        .with_metrics("NVDA", Period::Annual(2024), metrics_from(&[("revenue", 120.0)]))
        .with_metrics("NVDA", Period::Annual(2023), metrics_from(&[("revenue", 100.0)]));
    let engine = engine_with(sec, nvda_transport());
    let options = AnalyzeOptions {
        period: Period::Annual(2024),
        ..AnalyzeOptions::default()
    };

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &options)
        .await
        .unwrap();

    assert_eq!(analyses[0].growth["revenue"].value, Some(0.2));
}

#[tokio::test]
async fn ltm_minus_1_request_has_no_prior_window() {
    let sec = CannedSecProvider::new().with_metrics(
        "NVDA",
        Period::LtmMinus1,
        metrics_from(&[("revenue", 100.0)]),
    );
    let engine = engine_with(sec, nvda_transport());
    let options = AnalyzeOptions {
        period: Period::LtmMinus1,
        ..AnalyzeOptions::default()
    };

    let analyses = engine
        .analyze_comps(&tickers(&["NVDA"]), &options)
        .await
        .unwrap();

    let analysis = &analyses[0];
    assert!(analysis.errors.is_empty());
    assert!(analysis.sec_ltm_minus_1.is_empty());
    assert_eq!(analysis.growth["revenue"].value, None);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.contains("no prior window")));
}
