//! Handspread - comparable-company analysis from SEC filings and market data.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── core/             # Reusable library components
//! │   ├── domain/       # Provenance-typed values, policy, analysis output
//! │   ├── market/       # Vendor transport, TTL cache, market client
//! │   ├── sec/          # Seam to the external XBRL extraction library
//! │   └── analysis/     # EV bridge, multiples, growth, operating metrics
//! └── app/              # Engine orchestration + configuration
//! ```
//!
//! The single entry point is [`Engine::analyze_comps`]: for each requested
//! ticker it fans out three concurrent streams (SEC LTM, SEC LTM-1, market
//! snapshot) under a shared deadline, then assembles an EV bridge, valuation
//! multiples, year-over-year growth, and operating metrics. Every output
//! number is a [`Value`] carrying its provenance back to a vendor response
//! or a specific filing concept.
//!
//! # Features
//!
//! - `testkit` - Shared fakes (scripted vendor transport, canned SEC
//!   provider) for integration tests

pub mod app;
pub mod core;
pub mod error;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use crate::app::config::Config;
pub use crate::app::engine::{AnalyzeOptions, Engine};
pub use crate::core::domain::{
    AnalysisError, AnalysisStage, CitedValue, CompanyAnalysis, ComputedValue, DebtMode, EvPolicy,
    MarketValue, Value,
};
pub use crate::core::market::{MarketClient, MarketSnapshot};
pub use crate::core::sec::{Period, SecMetrics, SecProvider};
pub use crate::error::{Error, Result};
