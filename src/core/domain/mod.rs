//! Core domain types for handspread.
//!
//! ## Value Types
//!
//! - [`MarketValue`] - Datapoint fetched from the market vendor
//! - [`CitedValue`] - Datapoint cited from a specific SEC filing concept
//! - [`ComputedValue`] - Derived datapoint with a formula and component links
//! - [`Value`] - Sum type over the three; consumers pattern-match
//!
//! ## Analysis Types
//!
//! - [`CompanyAnalysis`] - Per-ticker output assembled by the engine
//! - [`AnalysisError`] - Structured per-stream error descriptor
//! - [`AnalysisStage`] - Which stream or step produced an error
//!
//! ## Policy Types
//!
//! - [`EvPolicy`] - Enumerated options driving the EV bridge
//! - [`DebtMode`] - Which debt combination feeds the bridge

mod analysis;
mod policy;
mod value;

pub use analysis::{AnalysisError, AnalysisStage, CompanyAnalysis};
pub use policy::{DebtMode, EvPolicy};
pub use value::{units, CitedValue, ComputedValue, MarketValue, Value};
