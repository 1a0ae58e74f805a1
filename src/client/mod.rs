//! HTTP clients for upstream market data
//!
//! This module provides interfaces to the two APIs the analyzer depends on:
//! - Kamino API: lending market reserve snapshots
//! - Jupiter Ultra API: swap quotes with route breakdowns
//!
//! Both clients share one retrying transport layer ([`http`]).

pub mod http;
mod jupiter;
mod kamino;
#[cfg(test)]
pub(crate) mod mock;

pub use jupiter::{route_concentration, route_summary, JupiterClient};
pub use kamino::{filter_to_symbols, KaminoClient};

use rust_decimal::prelude::*;
use serde_json::Value;

/// Best-effort conversion of a JSON value to a [`Decimal`]
///
/// The upstream APIs are inconsistent about whether numeric fields arrive
/// as JSON numbers or strings, and price fields occasionally use scientific
/// notation. Anything unconvertible becomes `None`.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}
