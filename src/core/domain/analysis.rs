//! Per-ticker analysis output.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::market::MarketSnapshot;
use crate::core::sec::SecMetrics;

use super::value::ComputedValue;

/// Which stream or analysis step produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    SecLtm,
    SecLtmMinus1,
    Market,
    EvBridge,
    Multiples,
    Growth,
    Operating,
}

/// Structured error descriptor recorded on a single ticker.
///
/// Failures never cross ticker boundaries; they land here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisError {
    pub stage: AnalysisStage,
    pub message: String,
}

impl AnalysisError {
    #[must_use]
    pub fn new(stage: AnalysisStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Complete analysis for one ticker, immutable once assembled.
///
/// Streams that failed leave their slots empty (`None` market, empty metric
/// maps) and record an [`AnalysisError`]; the other streams' contributions
/// stay intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub symbol: String,
    pub company_name: Option<String>,
    pub cik: Option<String>,
    pub fiscal_year_end: Option<NaiveDate>,
    pub market: Option<MarketSnapshot>,
    pub sec_ltm: SecMetrics,
    pub sec_ltm_minus_1: SecMetrics,
    pub ev_bridge: ComputedValue,
    pub multiples: BTreeMap<String, ComputedValue>,
    pub growth: BTreeMap<String, ComputedValue>,
    pub operating: BTreeMap<String, ComputedValue>,
    pub errors: Vec<AnalysisError>,
    pub warnings: Vec<String>,
}
