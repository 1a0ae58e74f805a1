//! Liquidity analysis orchestration
//!
//! Ties the pipeline together:
//! - Fetch market reserves from Kamino
//! - Filter to the volatile collateral set
//! - Sweep each reserve through the trade-size ladder
//! - Evaluate risk flags and assemble the report

mod depth;

pub use depth::DepthAnalyzer;

use crate::client::{filter_to_symbols, JupiterClient, KaminoClient};
use crate::config::Config;
use crate::error::Result;
use crate::report::{self, LiquidityReport};
use crate::risk::RiskFlagEvaluator;
use crate::units;
use chrono::Utc;
use tracing::{info, warn};

/// End-to-end market liquidity analyzer
pub struct LiquidityAnalyzer {
    config: Config,
    kamino: KaminoClient,
    depth: DepthAnalyzer,
    evaluator: RiskFlagEvaluator,
}

impl LiquidityAnalyzer {
    /// Build the analyzer with live HTTP clients
    pub fn new(config: Config) -> Result<Self> {
        let kamino = KaminoClient::new(&config)?;
        let jupiter = JupiterClient::new(&config)?;
        Ok(Self::with_clients(config, kamino, jupiter))
    }

    /// Build the analyzer over injected clients
    pub fn with_clients(config: Config, kamino: KaminoClient, jupiter: JupiterClient) -> Self {
        let depth = DepthAnalyzer::new(jupiter, &config.analysis);
        let evaluator = RiskFlagEvaluator::new(config.thresholds.clone());
        Self {
            config,
            kamino,
            depth,
            evaluator,
        }
    }

    /// Run the full analysis for the configured market
    ///
    /// `asset_filter` replaces the configured volatile set when given.
    /// A market that cannot be fetched is an error; an analyzable market
    /// with no matching reserves yields an empty report.
    pub async fn generate_report(
        &self,
        asset_filter: Option<&[String]>,
    ) -> Result<LiquidityReport> {
        let market = &self.config.analysis.market_pubkey;
        info!("Starting liquidity depth analysis for market {}", market);

        let reserves = self.kamino.fetch_market_reserves(market).await?;

        let targets = match asset_filter {
            Some(symbols) => filter_to_symbols(reserves, symbols),
            None => filter_to_symbols(reserves, &self.config.analysis.volatile_assets),
        };

        if targets.is_empty() {
            warn!("No matching volatile reserves in market {}", market);
            return Ok(LiquidityReport {
                market_pubkey: market.clone(),
                generated_at: Utc::now(),
                rows: Vec::new(),
            });
        }

        // One timestamp for the whole run; every row shares it
        let run_timestamp = Utc::now();
        let mut rows = Vec::new();
        for reserve in &targets {
            info!(
                "Analyzing {} (TVL {}, price ${})",
                reserve.symbol,
                units::format_usd(reserve.tvl_usd),
                reserve.price_usd
            );

            let points = self.depth.measure(reserve).await;
            let flags = points
                .iter()
                .map(|p| self.evaluator.evaluate(reserve, p))
                .collect();
            rows.extend(report::build_rows(reserve, points, flags, run_timestamp));
        }

        let report = LiquidityReport {
            market_pubkey: market.clone(),
            generated_at: run_timestamp,
            rows,
        };
        let stats = report.stats();
        let flagged = report.rows.iter().filter(|r| !r.risk_flags.is_empty()).count();
        info!(
            "Analysis complete: {}/{} quotes succeeded across {} assets, {} flagged",
            stats.successful,
            stats.total_points,
            targets.len(),
            flagged
        );
        Ok(report)
    }
}
