//! Configuration management

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

/// Liquid-staking and wrapped SOL variants treated as volatile collateral
const SOL_BASED_ASSETS: &[&str] = &[
    "SOL",
    "MSOL",
    "JITOSOL",
    "BSOL",
    "STSOL",
    "JSOL",
    "BNSOL",
    "HBSOL",
    "COMPASSSOL",
    "SUPSOL",
    "INF",
];

/// Wrapped BTC variants
const BTC_BASED_ASSETS: &[&str] = &["WBTC", "LBTC", "TBTC", "SBTC"];

/// Wrapped and staked ETH variants
const ETH_BASED_ASSETS: &[&str] = &["WETH", "STETH", "RETH", "CBETH"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub retry: RetryConfig,
    pub thresholds: RiskThresholds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Kamino lending API endpoint
    pub kamino_base_url: String,
    /// Jupiter Ultra endpoint (free tier)
    pub jupiter_base_url: String,
    /// Jupiter Ultra endpoint (paid tier)
    pub jupiter_paid_base_url: String,
    /// API key for the Jupiter paid tier
    pub jupiter_api_key: Option<String>,
    /// Force the paid endpoint even without an API key
    pub use_paid_tier: bool,
    /// Optional taker wallet forwarded on order quotes
    pub taker_address: Option<String>,
    /// Per-attempt HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lending market pubkey (defaults to the Kamino main market)
    pub market_pubkey: String,
    /// Lending program ID passed on reserve fetches
    pub program_id: String,
    /// Output mint quotes settle into (USDC)
    pub output_mint: String,
    /// Decimals of the output mint
    pub output_decimals: u32,
    /// USD price of the output mint
    pub output_price_usd: Decimal,
    /// USD trade-size ladder, one quote per entry per asset
    pub swap_size_bands_usd: Vec<Decimal>,
    /// Pause between aggregator quotes in seconds
    pub rate_limit_delay_secs: f64,
    /// Symbols analyzed when no explicit asset filter is given
    pub volatile_assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total request attempts per call
    pub max_attempts: u32,
    /// Exponential backoff base in seconds
    pub backoff_base: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Price impact above this percentage is flagged
    pub high_price_impact_pct: Decimal,
    /// Single-venue route share above this percentage is flagged
    pub route_concentration_pct: Decimal,
    /// Reserve TVL below this multiple of the trade size is flagged
    pub min_tvl_multiple: Decimal,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("KAMINO"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Load from default locations, falling back to built-in defaults
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "~/.config/kamino-liquidity/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        Ok(Config::default())
    }
}

impl ApiConfig {
    /// Effective Jupiter endpoint: paid when a key is present or forced
    pub fn jupiter_base(&self) -> &str {
        if self.use_paid_tier || self.jupiter_api_key.is_some() {
            &self.jupiter_paid_base_url
        } else {
            &self.jupiter_base_url
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            kamino_base_url: "https://api.kamino.finance".to_string(),
            jupiter_base_url: "https://lite-api.jup.ag/ultra/v1".to_string(),
            jupiter_paid_base_url: "https://api.jup.ag/ultra/v1".to_string(),
            jupiter_api_key: None,
            use_paid_tier: false,
            taker_address: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            market_pubkey: "7u3HeHxYDLhnCoErrtycNokbQYbWGzLs6JSDqGAv5PfF".to_string(),
            program_id: "KLend2g3cP87fffoy8q1mQqGKjrxjC8boSyAYavgmjD".to_string(),
            output_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            output_decimals: 6,
            output_price_usd: Decimal::ONE,
            swap_size_bands_usd: vec![
                dec!(1_000_000),
                dec!(5_000_000),
                dec!(10_000_000),
                dec!(20_000_000),
                dec!(50_000_000),
                dec!(100_000_000),
            ],
            rate_limit_delay_secs: 0.5,
            volatile_assets: SOL_BASED_ASSETS
                .iter()
                .chain(BTC_BASED_ASSETS)
                .chain(ETH_BASED_ASSETS)
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: 2.0,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_price_impact_pct: dec!(5.0),
            route_concentration_pct: dec!(70.0),
            min_tvl_multiple: dec!(5.0),
        }
    }
}
