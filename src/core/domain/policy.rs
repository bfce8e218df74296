//! Enterprise-value bridge policy.

use serde::{Deserialize, Serialize};

/// Which combination of `total_debt` and `short_term_debt` feeds the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtMode {
    /// Use `total_debt` alone; an overlapping `short_term_debt` citation is
    /// ignored.
    #[default]
    TotalOnly,
    /// Present `short_term_debt` plus a derived `long_term_debt`
    /// (`total_debt - short_term_debt`). Same total as [`DebtMode::TotalOnly`],
    /// component-level presentation.
    Split,
    /// Add `total_debt` and `short_term_debt`, for filers whose total-debt
    /// concept excludes the short-term portion.
    TotalPlusShortTerm,
}

/// Enumerated options driving [`build_ev_bridge`](crate::core::analysis::build_ev_bridge).
///
/// The bridge is a pure function of (inputs, policy); the policy is plain
/// data, not behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvPolicy {
    pub debt_mode: DebtMode,
    pub subtract_cash: bool,
    pub subtract_marketable_securities: bool,
    pub include_leases: bool,
    pub include_preferred: bool,
    pub include_nci: bool,
    pub subtract_equity_method_investments: bool,
}

impl Default for EvPolicy {
    fn default() -> Self {
        Self {
            debt_mode: DebtMode::TotalOnly,
            subtract_cash: true,
            subtract_marketable_securities: true,
            include_leases: false,
            include_preferred: true,
            include_nci: true,
            subtract_equity_method_investments: false,
        }
    }
}
