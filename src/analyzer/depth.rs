//! Liquidity depth measurement
//!
//! Walks the configured ladder of USD trade sizes for one reserve and
//! records what the aggregator would actually pay at each size. Every rung
//! produces a point; failures are points too.

use crate::client::JupiterClient;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::types::{LiquidityDepthPoint, Reserve};
use crate::units;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

/// Sweeps the trade-size ladder against the aggregator
pub struct DepthAnalyzer {
    jupiter: JupiterClient,
    output_mint: String,
    output_decimals: u32,
    output_price_usd: Decimal,
    swap_sizes_usd: Vec<Decimal>,
    rate_limit_delay: Duration,
}

impl DepthAnalyzer {
    pub fn new(jupiter: JupiterClient, analysis: &AnalysisConfig) -> Self {
        Self {
            jupiter,
            output_mint: analysis.output_mint.clone(),
            output_decimals: analysis.output_decimals,
            output_price_usd: analysis.output_price_usd,
            swap_sizes_usd: analysis.swap_size_bands_usd.clone(),
            rate_limit_delay: Duration::from_secs_f64(analysis.rate_limit_delay_secs.max(0.0)),
        }
    }

    /// Measure the full ladder for one reserve, in ascending size order
    ///
    /// A size that cannot be converted to native units becomes a failed
    /// point without spending a quote. Every actual quote, successful or
    /// not, is followed by the configured pacing delay.
    pub async fn measure(&self, reserve: &Reserve) -> Vec<LiquidityDepthPoint> {
        let mut points = Vec::with_capacity(self.swap_sizes_usd.len());

        for &size_usd in &self.swap_sizes_usd {
            info!("Analyzing swap size: {}", units::format_usd(size_usd));

            let amount_native =
                match units::usd_to_native(size_usd, reserve.price_usd, reserve.decimals) {
                    Ok(amount) => amount,
                    Err(e) => {
                        warn!(
                            "Size conversion failed for {} at {}: {}",
                            reserve.symbol,
                            units::format_usd(size_usd),
                            e
                        );
                        points.push(Self::conversion_failure_point(size_usd, e));
                        continue;
                    }
                };

            // Token size mirrors the truncated native amount actually quoted
            let swap_size_tokens =
                match units::native_to_tokens(amount_native, reserve.decimals) {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        warn!(
                            "Size conversion failed for {} at {}: {}",
                            reserve.symbol,
                            units::format_usd(size_usd),
                            e
                        );
                        points.push(Self::conversion_failure_point(size_usd, e));
                        continue;
                    }
                };

            let quote = self
                .jupiter
                .quote(&reserve.mint_address, &self.output_mint, amount_native)
                .await;

            let (output_usd, effective_price) = if quote.success && quote.out_amount_native > 0 {
                let output_usd = match units::native_to_usd(
                    quote.out_amount_native,
                    self.output_price_usd,
                    self.output_decimals,
                ) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Output conversion failed for {}: {}", reserve.symbol, e);
                        Decimal::ZERO
                    }
                };
                (output_usd, units::effective_price(output_usd, swap_size_tokens))
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };

            points.push(LiquidityDepthPoint {
                swap_size_usd: size_usd,
                swap_size_native: amount_native,
                swap_size_tokens,
                price_impact_pct: quote.price_impact_pct,
                output_usd,
                effective_price,
                slippage_bps: quote.slippage_bps,
                router: quote.router,
                route_summary: quote.route_summary,
                route_concentration_pct: quote.route_concentration_pct,
                success: quote.success,
                error: quote.error,
            });

            tokio::time::sleep(self.rate_limit_delay).await;
        }

        points
    }

    fn conversion_failure_point(size_usd: Decimal, error: AnalysisError) -> LiquidityDepthPoint {
        LiquidityDepthPoint {
            swap_size_usd: size_usd,
            swap_size_native: 0,
            swap_size_tokens: Decimal::ZERO,
            price_impact_pct: None,
            output_usd: Decimal::ZERO,
            effective_price: Decimal::ZERO,
            slippage_bps: 0,
            router: None,
            route_summary: None,
            route_concentration_pct: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}
