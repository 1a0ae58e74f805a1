//! Kamino lending API client
//!
//! Fetches reserve records for a market and normalizes them into [`Reserve`]
//! values. Upstream field names vary between deployments, so parsing falls
//! back through known aliases and skips records it cannot make sense of.

use crate::client::http::{HttpTransport, ReqwestTransport, RetryPolicy, RetryingClient};
use crate::client::decimal_from_value;
use crate::config::Config;
use crate::error::{AnalysisError, Result};
use crate::types::Reserve;
use crate::units;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Client for the Kamino lending API
pub struct KaminoClient {
    client: RetryingClient,
    base_url: String,
    program_id: String,
}

impl KaminoClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.api.request_timeout_secs),
            None,
        )?;
        Ok(Self::with_transport(
            Arc::new(transport),
            RetryPolicy::from_config(&config.retry),
            &config.api.kamino_base_url,
            &config.analysis.program_id,
        ))
    }

    /// Create a client over an injected transport
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        policy: RetryPolicy,
        base_url: &str,
        program_id: &str,
    ) -> Self {
        Self {
            client: RetryingClient::new(transport, policy),
            base_url: base_url.trim_end_matches('/').to_string(),
            program_id: program_id.to_string(),
        }
    }

    /// Fetch all reserves of a lending market
    ///
    /// Exhausted retries are fatal here: without reserves there is nothing
    /// to analyze.
    pub async fn fetch_market_reserves(&self, market_pubkey: &str) -> Result<Vec<Reserve>> {
        let url = format!("{}/kamino-market/{}", self.base_url, market_pubkey);
        let params = vec![("programId".to_string(), self.program_id.clone())];

        info!("Fetching market data from Kamino API: {}", market_pubkey);

        let data = self
            .client
            .get_json(&url, &params)
            .await
            .map_err(|e| AnalysisError::FetchFailed(format!("{market_pubkey}: {e}")))?;

        let reserves = Self::parse_reserves(&data);
        info!("Successfully fetched {} reserves", reserves.len());
        Ok(reserves)
    }

    /// Extract reserve records from either known body shape
    fn parse_reserves(data: &Value) -> Vec<Reserve> {
        // Top-level `reserves`, with `data.reserves` as the fallback shape.
        // An empty top-level array also falls through.
        let records = data
            .get("reserves")
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
            .or_else(|| {
                data.get("data")
                    .and_then(|d| d.get("reserves"))
                    .and_then(Value::as_array)
            });

        let Some(records) = records else {
            return Vec::new();
        };

        records.iter().filter_map(Self::parse_reserve).collect()
    }

    /// Normalize one raw reserve record, or skip it with a warning
    fn parse_reserve(raw: &Value) -> Option<Reserve> {
        let Some(obj) = raw.as_object() else {
            warn!("Reserve record is not an object, skipping");
            return None;
        };

        let symbol = obj
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_uppercase();
        let mint_address = obj
            .get("mintAddress")
            .or_else(|| obj.get("mint"))
            .and_then(Value::as_str);

        let (symbol, mint_address) = match (symbol.is_empty(), mint_address) {
            (false, Some(mint)) => (symbol, mint.to_string()),
            _ => {
                warn!("Missing symbol or mint address in reserve data");
                return None;
            }
        };

        let decimals = match obj.get("decimals") {
            None => 0,
            Some(v) => match v.as_u64() {
                Some(d) => d as u32,
                None => {
                    warn!("Unparseable decimals for reserve {}", symbol);
                    return None;
                }
            },
        };

        let price_usd = match obj.get("assetPriceUSD") {
            None => Decimal::ZERO,
            Some(v) => match decimal_from_value(v) {
                Some(p) => p,
                None => {
                    warn!("Unparseable price for reserve {}", symbol);
                    return None;
                }
            },
        };

        let wads = match obj
            .get("totalLiquidityWads")
            .or_else(|| obj.get("totalDepositsWads"))
        {
            None => 0u128,
            Some(v) => match Self::wads_from_value(v) {
                Some(w) => w,
                None => {
                    warn!("Unparseable deposit amount for reserve {}", symbol);
                    return None;
                }
            },
        };

        let total_deposits = match units::native_to_tokens(wads, decimals) {
            Ok(d) => d,
            Err(e) => {
                warn!("Deposit conversion failed for reserve {}: {}", symbol, e);
                return None;
            }
        };

        let Some(tvl_usd) = total_deposits.checked_mul(price_usd) else {
            warn!("TVL overflow for reserve {}", symbol);
            return None;
        };

        Some(Reserve {
            symbol,
            mint_address,
            decimals,
            total_deposits,
            price_usd,
            tvl_usd,
            address: obj
                .get("reserve")
                .or_else(|| obj.get("address"))
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    /// Deposits arrive as integer wads, sometimes string-encoded
    fn wads_from_value(value: &Value) -> Option<u128> {
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(u as u128)
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f.trunc() as u128)
                }
            }
            Value::String(s) => s.parse::<u128>().ok(),
            _ => None,
        }
    }
}

/// Keep only reserves whose symbol is in the target set, preserving order
pub fn filter_to_symbols(reserves: Vec<Reserve>, symbols: &[String]) -> Vec<Reserve> {
    let wanted: HashSet<String> = symbols.iter().map(|s| s.to_uppercase()).collect();

    let total = reserves.len();
    let filtered: Vec<Reserve> = reserves
        .into_iter()
        .filter(|r| wanted.contains(&r.symbol.to_uppercase()))
        .collect();

    info!(
        "Filtered {} reserves to {} volatile assets",
        total,
        filtered.len()
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_top_level_reserves() {
        let body = json!({
            "reserves": [
                {
                    "symbol": "SOL",
                    "mintAddress": "So11111111111111111111111111111111111111112",
                    "decimals": 9,
                    "assetPriceUSD": "200",
                    "totalLiquidityWads": "250000000000000",
                    "reserve": "Res1111"
                }
            ]
        });

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 1);

        let sol = &reserves[0];
        assert_eq!(sol.symbol, "SOL");
        assert_eq!(sol.decimals, 9);
        assert_eq!(sol.total_deposits, dec!(250_000));
        assert_eq!(sol.price_usd, dec!(200));
        assert_eq!(sol.tvl_usd, dec!(50_000_000));
        assert_eq!(sol.address.as_deref(), Some("Res1111"));
    }

    #[test]
    fn test_parse_nested_reserves() {
        let body = json!({
            "data": {
                "reserves": [
                    {"symbol": "JITOSOL", "mint": "Jito1111", "decimals": 9,
                     "assetPriceUSD": 220.5, "totalDepositsWads": 1000000000u64}
                ]
            }
        });

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].symbol, "JITOSOL");
        assert_eq!(reserves[0].mint_address, "Jito1111");
        assert_eq!(reserves[0].total_deposits, dec!(1));
    }

    #[test]
    fn test_empty_top_level_falls_through_to_nested() {
        let body = json!({
            "reserves": [],
            "data": {
                "reserves": [
                    {"symbol": "WBTC", "mintAddress": "Btc1111", "decimals": 8,
                     "assetPriceUSD": "60000", "totalLiquidityWads": "100000000"}
                ]
            }
        });

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].symbol, "WBTC");
        assert_eq!(reserves[0].total_deposits, dec!(1));
    }

    #[test]
    fn test_neither_shape_yields_empty() {
        let reserves = KaminoClient::parse_reserves(&json!({"status": "ok"}));
        assert!(reserves.is_empty());
    }

    #[test]
    fn test_malformed_record_skipped_valid_kept() {
        let body = json!({
            "reserves": [
                {"symbol": "SOL", "mintAddress": "Mint1", "decimals": 9,
                 "assetPriceUSD": "200", "totalLiquidityWads": "1000000000"},
                {"decimals": 6},
                "not even an object",
                {"symbol": "MSOL", "mintAddress": "Mint2", "decimals": 9,
                 "assetPriceUSD": "230", "totalLiquidityWads": "2000000000"}
            ]
        });

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 2);
        assert_eq!(reserves[0].symbol, "SOL");
        assert_eq!(reserves[1].symbol, "MSOL");
    }

    #[test]
    fn test_symbol_uppercased_and_required() {
        let body = json!({
            "reserves": [
                {"symbol": "jitoSol", "mintAddress": "Mint1", "decimals": 9,
                 "assetPriceUSD": 1, "totalLiquidityWads": 0},
                {"symbol": "", "mintAddress": "Mint2", "decimals": 9},
                {"mintAddress": "Mint3", "decimals": 9}
            ]
        });

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].symbol, "JITOSOL");
    }

    #[test]
    fn test_mint_required() {
        let body = json!({"reserves": [{"symbol": "SOL", "decimals": 9}]});
        assert!(KaminoClient::parse_reserves(&body).is_empty());
    }

    #[test]
    fn test_missing_numeric_fields_default_to_zero() {
        let body = json!({"reserves": [{"symbol": "SOL", "mintAddress": "Mint1"}]});

        let reserves = KaminoClient::parse_reserves(&body);
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].decimals, 0);
        assert_eq!(reserves[0].price_usd, Decimal::ZERO);
        assert_eq!(reserves[0].total_deposits, Decimal::ZERO);
        assert_eq!(reserves[0].tvl_usd, Decimal::ZERO);
        assert!(reserves[0].address.is_none());
    }

    #[test]
    fn test_unparseable_price_skips_record() {
        let body = json!({
            "reserves": [
                {"symbol": "SOL", "mintAddress": "Mint1", "decimals": 9,
                 "assetPriceUSD": "not-a-number", "totalLiquidityWads": "1"}
            ]
        });
        assert!(KaminoClient::parse_reserves(&body).is_empty());
    }

    #[test]
    fn test_wads_accept_number_and_string() {
        assert_eq!(
            KaminoClient::wads_from_value(&json!("123456789012345678901")),
            Some(123_456_789_012_345_678_901)
        );
        assert_eq!(KaminoClient::wads_from_value(&json!(5_000_000_000u64)), Some(5_000_000_000));
        assert_eq!(KaminoClient::wads_from_value(&json!(1.5e9)), Some(1_500_000_000));
        assert_eq!(KaminoClient::wads_from_value(&json!(-5)), None);
        assert_eq!(KaminoClient::wads_from_value(&json!("wads")), None);
    }

    #[test]
    fn test_filter_case_insensitive_preserves_order() {
        let make = |symbol: &str| Reserve {
            symbol: symbol.to_string(),
            mint_address: format!("{symbol}_mint"),
            decimals: 9,
            total_deposits: dec!(100),
            price_usd: dec!(1),
            tvl_usd: dec!(100),
            address: None,
        };
        let reserves = vec![make("SOL"), make("USDC"), make("JITOSOL"), make("WBTC")];

        let filtered = filter_to_symbols(
            reserves,
            &["sol".to_string(), "wbtc".to_string(), "jitosol".to_string()],
        );

        let symbols: Vec<&str> = filtered.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SOL", "JITOSOL", "WBTC"]);
    }

    #[test]
    fn test_filter_empty_target_set() {
        let reserves = vec![Reserve {
            symbol: "SOL".to_string(),
            mint_address: "m".to_string(),
            decimals: 9,
            total_deposits: dec!(1),
            price_usd: dec!(1),
            tvl_usd: dec!(1),
            address: None,
        }];
        assert!(filter_to_symbols(reserves, &[]).is_empty());
    }
}
