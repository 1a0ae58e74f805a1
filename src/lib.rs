//! Kamino Liquidity Depth Analyzer
//!
//! Estimates how much liquidation-driven selling the market could absorb for
//! each volatile collateral asset of a Kamino lending market, by probing
//! Jupiter swap quotes across a ladder of USD trade sizes.

pub mod analyzer;
pub mod client;
pub mod config;
pub mod error;
pub mod report;
pub mod risk;
pub mod types;
pub mod units;
