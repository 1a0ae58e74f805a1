//! Jupiter Ultra API client
//!
//! Queries swap quotes for one (input mint, amount) pair at a time and
//! normalizes the response into a [`QuoteResult`]. Transport and parse
//! failures become failed results rather than errors, so a single bad quote
//! never aborts a batch.

use crate::client::decimal_from_value;
use crate::client::http::{HttpTransport, ReqwestTransport, RetryPolicy, RetryingClient};
use crate::config::Config;
use crate::error::{AnalysisError, Result};
use crate::types::{QuoteResult, RouteStep};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Client for the Jupiter Ultra order API
pub struct JupiterClient {
    client: RetryingClient,
    base_url: String,
    taker_address: Option<String>,
}

impl JupiterClient {
    /// Create a client from configuration
    ///
    /// An API key switches to the paid endpoint and authenticates every
    /// request with a bearer header.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.api.request_timeout_secs),
            config.api.jupiter_api_key.as_deref(),
        )?;
        Ok(Self::with_transport(
            Arc::new(transport),
            RetryPolicy::from_config(&config.retry),
            config.api.jupiter_base(),
            config.api.taker_address.clone(),
        ))
    }

    /// Create a client over an injected transport
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        policy: RetryPolicy,
        base_url: &str,
        taker_address: Option<String>,
    ) -> Self {
        Self {
            client: RetryingClient::new(transport, policy),
            base_url: base_url.trim_end_matches('/').to_string(),
            taker_address,
        }
    }

    /// Query one swap quote
    ///
    /// Infallible at this boundary: retries are exhausted inside, and
    /// whatever went wrong is carried in the returned result.
    pub async fn quote(&self, input_mint: &str, output_mint: &str, amount_native: u128) -> QuoteResult {
        let url = format!("{}/order", self.base_url);
        let mut params = vec![
            ("inputMint".to_string(), input_mint.to_string()),
            ("outputMint".to_string(), output_mint.to_string()),
            ("amount".to_string(), amount_native.to_string()),
        ];
        if let Some(taker) = &self.taker_address {
            params.push(("taker".to_string(), taker.clone()));
        }

        debug!(
            "Querying Jupiter for swap: {}... -> {}...",
            input_mint.get(..8).unwrap_or(input_mint),
            output_mint.get(..8).unwrap_or(output_mint)
        );

        match self.client.get_json(&url, &params).await {
            Ok(data) => Self::parse_quote_response(&data),
            Err(e) => QuoteResult::failed(e.to_string()),
        }
    }

    /// Normalize a raw order response; parse problems become failed results
    fn parse_quote_response(data: &Value) -> QuoteResult {
        match Self::try_parse_quote(data) {
            Ok(quote) => quote,
            Err(msg) => {
                error!("Failed to parse Jupiter response: {}", msg);
                QuoteResult::failed(AnalysisError::Parse(msg).to_string())
            }
        }
    }

    fn try_parse_quote(data: &Value) -> std::result::Result<QuoteResult, String> {
        if !data.is_object() {
            return Err("response body is not an object".to_string());
        }

        // Upstream reports impact as a signed fraction; flip to an absolute
        // percentage. Absent stays absent, it is not the same as zero.
        let price_impact_pct = match data.get("priceImpact") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                decimal_from_value(v)
                    .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED))
                    .map(|d| d.abs())
                    .ok_or_else(|| format!("unparseable priceImpact: {v}"))?,
            ),
        };

        let out_amount_native = match data.get("outAmount") {
            None | Some(Value::Null) => 0,
            Some(Value::String(s)) => s
                .parse::<u128>()
                .map_err(|e| format!("unparseable outAmount {s:?}: {e}"))?,
            Some(Value::Number(n)) => n
                .as_u64()
                .map(u128::from)
                .ok_or_else(|| format!("unparseable outAmount: {n}"))?,
            Some(other) => return Err(format!("unparseable outAmount: {other}")),
        };

        let slippage_bps = data
            .get("slippageBps")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .min(u32::MAX as u64) as u32;

        let router = data
            .get("router")
            .and_then(Value::as_str)
            .map(String::from);

        let route_plan = Self::parse_route_plan(data.get("routePlan"))?;

        Ok(QuoteResult {
            price_impact_pct,
            out_amount_native,
            slippage_bps,
            router,
            route_summary: Some(route_summary(&route_plan)),
            route_concentration_pct: route_concentration(&route_plan),
            route_plan,
            success: true,
            error: None,
        })
    }

    /// Normalize route-plan steps, resolving the known field aliases
    ///
    /// Steps that are not objects, or whose swap info is present but not an
    /// object, carry no usable data and are dropped. A step without swap
    /// info still counts as an unknown venue. An absent or null percent is
    /// tolerated; a present one must parse or the whole quote fails.
    fn parse_route_plan(value: Option<&Value>) -> std::result::Result<Vec<RouteStep>, String> {
        let Some(steps) = value.and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut plan = Vec::new();
        for step in steps {
            let Some(obj) = step.as_object() else { continue };

            match obj.get("swapInfo").or_else(|| obj.get("swap_info")) {
                None => plan.push(RouteStep {
                    venue_label: None,
                    percent: None,
                }),
                Some(Value::Object(info)) => {
                    let venue_label = info
                        .get("label")
                        .and_then(Value::as_str)
                        .or_else(|| info.get("ammKey").and_then(Value::as_str))
                        .map(String::from);
                    let percent = match info.get("percent").or_else(|| info.get("percentage")) {
                        None | Some(Value::Null) => None,
                        Some(v) => Some(
                            decimal_from_value(v)
                                .ok_or_else(|| format!("unparseable route percent: {v}"))?,
                        ),
                    };
                    plan.push(RouteStep { venue_label, percent });
                }
                Some(_) => continue,
            }
        }
        Ok(plan)
    }
}

/// First three distinct venue labels, joined for display
pub fn route_summary(route_plan: &[RouteStep]) -> String {
    let mut venues: Vec<&str> = Vec::new();
    for step in route_plan {
        let label = step.venue_label.as_deref().unwrap_or("Unknown");
        if !label.is_empty() && !venues.contains(&label) {
            venues.push(label);
        }
    }

    if venues.is_empty() {
        "Unknown".to_string()
    } else {
        venues[..venues.len().min(3)].join(", ")
    }
}

/// Largest single-step share of the route, in percent
///
/// A concentration proxy, not a sum: one pool carrying 85% of a trade is
/// fragile no matter how many others carry the rest.
pub fn route_concentration(route_plan: &[RouteStep]) -> Option<Decimal> {
    route_plan.iter().filter_map(|s| s.percent).max()
}
