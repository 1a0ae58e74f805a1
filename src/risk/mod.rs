//! Risk flag evaluation
//!
//! Applies the per-point liquidity risk checks:
//! - Failed quotes
//! - High price impact
//! - Route concentrated on one venue
//! - TVL thin relative to the trade size


use crate::config::RiskThresholds;
use crate::types::{LiquidityDepthPoint, Reserve};
use rust_decimal::Decimal;
use std::fmt;

/// One triggered risk condition on a depth point
#[derive(Debug, Clone, PartialEq)]
pub enum RiskFlag {
    /// No usable quote at this size
    QuoteFailed,
    /// Price impact above the configured ceiling
    HighImpact { impact_pct: Decimal },
    /// One venue carries too much of the route
    ConcentratedRoute { concentration_pct: Decimal },
    /// Reserve TVL is a small multiple of the trade size
    LowTvlRatio { ratio: Decimal },
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFlag::QuoteFailed => write!(f, "QUOTE_FAILED"),
            RiskFlag::HighImpact { impact_pct } => write!(f, "HIGH_IMPACT_{impact_pct:.1}%"),
            RiskFlag::ConcentratedRoute { concentration_pct } => {
                write!(f, "CONCENTRATED_ROUTE_{concentration_pct:.0}%")
            }
            RiskFlag::LowTvlRatio { ratio } => write!(f, "LOW_TVL_RATIO_{ratio:.1}x"),
        }
    }
}

/// Evaluates configured thresholds against measured depth points
pub struct RiskFlagEvaluator {
    thresholds: RiskThresholds,
}

impl RiskFlagEvaluator {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Flags for one (reserve, depth point) pair
    ///
    /// A failed quote is flagged alone: without a quote the other checks
    /// have nothing to measure. Thresholds are strict (a value exactly at
    /// the limit does not flag), and absent measurements never flag.
    pub fn evaluate(&self, reserve: &Reserve, point: &LiquidityDepthPoint) -> Vec<RiskFlag> {
        if !point.success {
            return vec![RiskFlag::QuoteFailed];
        }

        let mut flags = Vec::new();

        if let Some(impact) = point.price_impact_pct {
            if impact > self.thresholds.high_price_impact_pct {
                flags.push(RiskFlag::HighImpact { impact_pct: impact });
            }
        }

        if let Some(concentration) = point.route_concentration_pct {
            if concentration > self.thresholds.route_concentration_pct {
                flags.push(RiskFlag::ConcentratedRoute {
                    concentration_pct: concentration,
                });
            }
        }

        // Zero-TVL reserves are already visibly empty; flagging the ratio
        // would only add noise.
        if reserve.tvl_usd > Decimal::ZERO {
            if let Some(ratio) = reserve.tvl_usd.checked_div(point.swap_size_usd) {
                if ratio < self.thresholds.min_tvl_multiple {
                    flags.push(RiskFlag::LowTvlRatio { ratio });
                }
            }
        }

        flags
    }
}
