//! Analysis computations: utilities, EV bridge, multiples, growth,
//! operating metrics.
//!
//! Everything here is a total function over its inputs: missing or
//! degenerate data nulls the affected value and attaches a warning, it
//! never raises. Runtime faults belong to the streams, not to these
//! computations.

mod ev_bridge;
mod growth;
mod multiples;
mod operating;
mod util;

pub use ev_bridge::build_ev_bridge;
pub use growth::build_growth;
pub use multiples::build_multiples;
pub use operating::build_operating;
pub use util::{
    compute_adjusted_ebitda, compute_ebitda, currency_of_unit, detect_sec_currency,
    extract_sec_value, is_cross_currency, CurrencyDetection,
};
