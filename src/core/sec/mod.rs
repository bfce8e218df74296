//! Seam to the external SEC XBRL extraction library.
//!
//! Handspread never parses filings itself: an implementation of
//! [`SecProvider`] (supplied by the embedding application) returns, for one
//! ticker and one [`Period`], a mapping from normalized metric name to
//! [`CitedValue`]. Records carry the resolving concept, accession, filing
//! dates, and any upstream data-quality warnings, including the
//! `"Possible stock split contamination"` marker this crate reacts to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::core::domain::CitedValue;
use crate::error::{Error, Result};

/// Normalized metric names shared with the XBRL library.
pub mod metrics {
    pub const REVENUE: &str = "revenue";
    pub const GROSS_PROFIT: &str = "gross_profit";
    pub const OPERATING_INCOME: &str = "operating_income";
    pub const NET_INCOME: &str = "net_income";
    pub const EPS_DILUTED: &str = "eps_diluted";
    pub const DEPRECIATION_AMORTIZATION: &str = "depreciation_amortization";
    pub const STOCK_BASED_COMPENSATION: &str = "stock_based_compensation";
    pub const FREE_CASH_FLOW: &str = "free_cash_flow";
    pub const TOTAL_DEBT: &str = "total_debt";
    pub const SHORT_TERM_DEBT: &str = "short_term_debt";
    pub const CASH: &str = "cash";
    pub const MARKETABLE_SECURITIES: &str = "marketable_securities";
    pub const OPERATING_LEASE_LIABILITIES: &str = "operating_lease_liabilities";
    pub const PREFERRED_STOCK: &str = "preferred_stock";
    pub const NONCONTROLLING_INTERESTS: &str = "noncontrolling_interests";
    pub const EQUITY_METHOD_INVESTMENTS: &str = "equity_method_investments";
    pub const STOCKHOLDERS_EQUITY: &str = "stockholders_equity";
    pub const DIVIDENDS_PER_SHARE: &str = "dividends_per_share";
    pub const RESEARCH_DEVELOPMENT: &str = "research_development";
    pub const SELLING_GENERAL_ADMINISTRATIVE: &str = "selling_general_administrative";
    pub const CAPEX: &str = "capex";
}

/// Warning marker attached upstream when an LTM per-share value diverges
/// from the latest annual by more than the library's split threshold.
pub const SPLIT_CONTAMINATION_MARKER: &str = "Possible stock split contamination";

/// Per-company metric mapping, keyed by normalized metric name.
pub type SecMetrics = BTreeMap<String, CitedValue>;

/// Reporting window selector passed through to the XBRL library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Last trailing twelve months.
    Ltm,
    /// The LTM window shifted back one year.
    LtmMinus1,
    /// A specific fiscal year.
    Annual(u16),
}

impl Period {
    /// The same window shifted back one year, when one exists.
    #[must_use]
    pub fn prior(self) -> Option<Period> {
        match self {
            Period::Ltm => Some(Period::LtmMinus1),
            Period::LtmMinus1 => None,
            Period::Annual(year) => year.checked_sub(1).map(Period::Annual),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Ltm => write!(f, "ltm"),
            Period::LtmMinus1 => write!(f, "ltm-1"),
            Period::Annual(year) => write!(f, "annual:{year}"),
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ltm" => Ok(Period::Ltm),
            "ltm-1" => Ok(Period::LtmMinus1),
            other => match other.strip_prefix("annual:") {
                Some(year) => year
                    .parse()
                    .map(Period::Annual)
                    .map_err(|_| Error::InvalidInput(format!("unknown period {other:?}"))),
                None => Err(Error::InvalidInput(format!("unknown period {other:?}"))),
            },
        }
    }
}

/// Source of cited financial metrics, one company and period at a time.
///
/// Implementations are assumed safe for concurrent requests; the engine
/// issues the LTM and LTM-1 fetches for a ticker in parallel.
#[async_trait]
pub trait SecProvider: Send + Sync {
    async fn fetch_metrics(&self, ticker: &str, period: Period) -> Result<SecMetrics>;
}
