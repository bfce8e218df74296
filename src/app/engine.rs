//! Per-ticker analysis engine.
//!
//! For each requested ticker the engine fans out three concurrent streams
//! (SEC LTM metrics, SEC LTM-1 metrics, market snapshot) under one shared
//! deadline, then runs the analysis components in a fixed order on whatever
//! settled: EV bridge, multiples, growth, operating. Failures never cross
//! ticker boundaries, and results come back in input order.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::core::analysis::{
    build_ev_bridge, build_growth, build_multiples, build_operating, compute_adjusted_ebitda,
    compute_ebitda, extract_sec_value,
};
use crate::core::domain::{AnalysisError, AnalysisStage, CompanyAnalysis, EvPolicy};
use crate::core::market::MarketClient;
use crate::core::sec::{metrics, Period, SecProvider};
use crate::error::{Error, Result};

/// Knobs for one [`Engine::analyze_comps`] invocation.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub period: Period,
    pub ev_policy: EvPolicy,
    /// Shared deadline for the whole fan-out.
    pub timeout: Duration,
    /// Effective tax rate feeding ROIC.
    pub tax_rate: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            period: Period::Ltm,
            ev_policy: EvPolicy::default(),
            timeout: Duration::from_secs(60),
            tax_rate: 0.21,
        }
    }
}

/// The comps engine: an SEC provider plus a market client.
pub struct Engine {
    sec: Arc<dyn SecProvider>,
    market: MarketClient,
}

impl Engine {
    #[must_use]
    pub fn new(sec: Arc<dyn SecProvider>, market: MarketClient) -> Self {
        Self { sec, market }
    }

    /// Analyze a list of tickers into one [`CompanyAnalysis`] each.
    ///
    /// Only invalid input escapes as an error; upstream failures and
    /// timeouts are recorded on the affected ticker and the call always
    /// returns one result per input ticker, in input order.
    pub async fn analyze_comps(
        &self,
        tickers: &[String],
        options: &AnalyzeOptions,
    ) -> Result<Vec<CompanyAnalysis>> {
        if tickers.is_empty() {
            return Err(Error::InvalidInput("ticker list is empty".into()));
        }
        if !options.tax_rate.is_finite() || !(0.0..1.0).contains(&options.tax_rate) {
            return Err(Error::InvalidInput(format!(
                "tax_rate must be within [0, 1), got {}",
                options.tax_rate
            )));
        }

        info!(
            tickers = tickers.len(),
            period = %options.period,
            timeout_secs = options.timeout.as_secs_f64(),
            "Starting comps analysis"
        );

        let deadline = Instant::now() + options.timeout;
        let analyses = join_all(
            tickers
                .iter()
                .map(|ticker| self.analyze_ticker(ticker, options, deadline)),
        )
        .await;

        Ok(analyses)
    }

    async fn analyze_ticker(
        &self,
        symbol: &str,
        options: &AnalyzeOptions,
        deadline: Instant,
    ) -> CompanyAnalysis {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let prior_period = options.period.prior();
        let prior_fetch = async {
            match prior_period {
                Some(period) => Some(self.sec.fetch_metrics(symbol, period).await),
                None => None,
            }
        };

        let (ltm_outcome, prior_outcome, market_outcome) = tokio::join!(
            timeout_at(deadline, self.sec.fetch_metrics(symbol, options.period)),
            timeout_at(deadline, prior_fetch),
            timeout_at(deadline, self.market.fetch_snapshot(symbol)),
        );

        let timeout_secs = options.timeout.as_secs_f64();
        let sec_ltm = settle(ltm_outcome, AnalysisStage::SecLtm, timeout_secs, &mut errors)
            .unwrap_or_default();
        let sec_ltm_minus_1 = match prior_outcome {
            Ok(Some(outcome)) => settle(
                Ok(outcome),
                AnalysisStage::SecLtmMinus1,
                timeout_secs,
                &mut errors,
            )
            .unwrap_or_default(),
            Ok(None) => {
                warnings.push(format!(
                    "no prior window for period {}; growth unavailable",
                    options.period
                ));
                Default::default()
            }
            Err(elapsed) => {
                settle::<()>(
                    Err(elapsed),
                    AnalysisStage::SecLtmMinus1,
                    timeout_secs,
                    &mut errors,
                );
                Default::default()
            }
        };
        let market = settle(
            market_outcome,
            AnalysisStage::Market,
            timeout_secs,
            &mut errors,
        );

        // Derived LTM EBITDA values are shared by multiples and operating.
        let ebitda = compute_ebitda(
            extract_sec_value(&sec_ltm, metrics::OPERATING_INCOME),
            extract_sec_value(&sec_ltm, metrics::DEPRECIATION_AMORTIZATION),
        );
        let adjusted_ebitda = compute_adjusted_ebitda(
            extract_sec_value(&sec_ltm, metrics::OPERATING_INCOME),
            extract_sec_value(&sec_ltm, metrics::DEPRECIATION_AMORTIZATION),
            extract_sec_value(&sec_ltm, metrics::STOCK_BASED_COMPENSATION),
        );

        let ev_bridge = build_ev_bridge(market.as_ref(), &sec_ltm, &options.ev_policy);
        let multiples =
            build_multiples(&ev_bridge, market.as_ref(), &sec_ltm, &ebitda, &adjusted_ebitda);
        let growth = build_growth(&sec_ltm, &sec_ltm_minus_1);
        let operating = build_operating(
            &sec_ltm,
            market.as_ref(),
            &ebitda,
            &adjusted_ebitda,
            options.tax_rate,
        );

        let company_name = market.as_ref().and_then(|m| m.company_name.clone());
        let cik = sec_ltm.values().find_map(|v| v.cik.clone());
        let fiscal_year_end = sec_ltm.values().filter_map(|v| v.period_end).max();

        if errors.is_empty() {
            info!(symbol = %symbol, "Ticker analysis complete");
        } else {
            warn!(
                symbol = %symbol,
                errors = errors.len(),
                "Ticker analysis completed partially"
            );
        }

        CompanyAnalysis {
            symbol: symbol.to_string(),
            company_name,
            cik,
            fiscal_year_end,
            market,
            sec_ltm,
            sec_ltm_minus_1,
            ev_bridge,
            multiples,
            growth,
            operating,
            errors,
            warnings,
        }
    }
}

/// Fold one stream outcome into either its value or an error entry.
fn settle<T>(
    outcome: std::result::Result<Result<T>, tokio::time::error::Elapsed>,
    stage: AnalysisStage,
    timeout_secs: f64,
    errors: &mut Vec<AnalysisError>,
) -> Option<T> {
    match outcome {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            errors.push(AnalysisError::new(stage, err.to_string()));
            None
        }
        Err(_) => {
            let elapsed = Error::Timeout {
                seconds: timeout_secs,
            };
            errors.push(AnalysisError::new(stage, elapsed.to_string()));
            None
        }
    }
}
