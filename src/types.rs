//! Core domain types shared across clients and analysis

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A collateral reserve of the lending market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reserve {
    /// Token symbol, uppercased
    pub symbol: String,
    /// Mint address of the collateral token
    pub mint_address: String,
    /// Native decimals of the mint
    pub decimals: u32,
    /// Total deposits in token units
    pub total_deposits: Decimal,
    /// Oracle price in USD
    pub price_usd: Decimal,
    /// Deposits valued in USD (total_deposits * price_usd)
    pub tvl_usd: Decimal,
    /// On-chain reserve account, when the API provides one
    pub address: Option<String>,
}

/// One step of an aggregator route plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Venue (DEX) label, when reported
    pub venue_label: Option<String>,
    /// Share of the trade routed through this step, in percent
    pub percent: Option<Decimal>,
}

/// Normalized swap quote from the aggregator
///
/// Failures are carried as data: `success == false` with `error` set and
/// every numeric field at its neutral value. Absent upstream fields stay
/// `None` rather than being coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Absolute price impact in percent (2.5 means 2.5%)
    pub price_impact_pct: Option<Decimal>,
    /// Output amount in the output token's native units
    pub out_amount_native: u128,
    pub slippage_bps: u32,
    pub router: Option<String>,
    pub route_plan: Vec<RouteStep>,
    /// Short human-readable route description (first three venues)
    pub route_summary: Option<String>,
    /// Largest single-step share of the route, in percent
    pub route_concentration_pct: Option<Decimal>,
    pub success: bool,
    pub error: Option<String>,
}

impl QuoteResult {
    /// Quote that never produced usable data
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            price_impact_pct: None,
            out_amount_native: 0,
            slippage_bps: 0,
            router: None,
            route_plan: Vec::new(),
            route_summary: None,
            route_concentration_pct: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// One measured point on an asset's liquidity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityDepthPoint {
    /// Requested trade size in USD
    pub swap_size_usd: Decimal,
    /// Trade size in the input token's native units
    pub swap_size_native: u128,
    /// Trade size in whole tokens
    pub swap_size_tokens: Decimal,
    pub price_impact_pct: Option<Decimal>,
    /// USD value actually received, zero when the quote failed
    pub output_usd: Decimal,
    /// output_usd / swap_size_tokens, zero when undefined
    pub effective_price: Decimal,
    pub slippage_bps: u32,
    pub router: Option<String>,
    pub route_summary: Option<String>,
    pub route_concentration_pct: Option<Decimal>,
    pub success: bool,
    pub error: Option<String>,
}
