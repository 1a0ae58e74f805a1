//! Report assembly and rendering
//!
//! Flattens measured depth points into per-(asset, size) rows, derives the
//! pivot and summary statistics, and renders the console tables and CSV
//! export.

use crate::risk::RiskFlag;
use crate::types::{LiquidityDepthPoint, Reserve};
use crate::units;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One (asset, trade size) observation with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub asset: String,
    pub mint: String,
    pub reserve_address: Option<String>,
    pub total_deposits: Decimal,
    pub price_usd: Decimal,
    pub tvl_usd: Decimal,
    pub swap_size_usd: Decimal,
    pub swap_size_native: u128,
    pub swap_size_tokens: Decimal,
    pub price_impact_pct: Option<Decimal>,
    pub output_usd: Decimal,
    pub effective_price: Decimal,
    pub slippage_bps: u32,
    pub router: Option<String>,
    pub route_summary: Option<String>,
    pub route_concentration_pct: Option<Decimal>,
    pub success: bool,
    pub error: Option<String>,
    pub risk_flags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Full analysis output for one market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub market_pubkey: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

impl LiquidityReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> ImpactSummary {
        ImpactSummary::from_rows(&self.rows)
    }

    pub fn stats(&self) -> ImpactStats {
        ImpactStats::from_rows(&self.rows)
    }
}

/// Join one reserve's depth points and their flags into report rows
pub fn build_rows(
    reserve: &Reserve,
    points: Vec<LiquidityDepthPoint>,
    flags_per_point: Vec<Vec<RiskFlag>>,
    timestamp: DateTime<Utc>,
) -> Vec<ReportRow> {
    points
        .into_iter()
        .zip(flags_per_point)
        .map(|(point, flags)| ReportRow {
            asset: reserve.symbol.clone(),
            mint: reserve.mint_address.clone(),
            reserve_address: reserve.address.clone(),
            total_deposits: reserve.total_deposits,
            price_usd: reserve.price_usd,
            tvl_usd: reserve.tvl_usd,
            swap_size_usd: point.swap_size_usd,
            swap_size_native: point.swap_size_native,
            swap_size_tokens: point.swap_size_tokens,
            price_impact_pct: point.price_impact_pct,
            output_usd: point.output_usd,
            effective_price: point.effective_price,
            slippage_bps: point.slippage_bps,
            router: point.router,
            route_summary: point.route_summary,
            route_concentration_pct: point.route_concentration_pct,
            success: point.success,
            error: point.error,
            risk_flags: flags.iter().map(ToString::to_string).collect(),
            timestamp,
        })
        .collect()
}

/// Pivot of price impact by asset and trade size
///
/// Assets keep first-appearance order, sizes are ascending. Cells come from
/// successful rows, first one wins; a cell attempted only by failed rows
/// stays empty and renders as FAIL.
pub struct ImpactSummary {
    pub assets: Vec<String>,
    pub sizes: Vec<Decimal>,
    cells: BTreeMap<(String, Decimal), Option<Decimal>>,
    attempted: BTreeSet<(String, Decimal)>,
}

impl ImpactSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut assets: Vec<String> = Vec::new();
        let mut sizes: Vec<Decimal> = Vec::new();
        let mut cells = BTreeMap::new();
        let mut attempted = BTreeSet::new();

        for row in rows {
            if !assets.contains(&row.asset) {
                assets.push(row.asset.clone());
            }
            if !sizes.contains(&row.swap_size_usd) {
                sizes.push(row.swap_size_usd);
            }
            attempted.insert((row.asset.clone(), row.swap_size_usd));
            if row.success {
                cells
                    .entry((row.asset.clone(), row.swap_size_usd))
                    .or_insert(row.price_impact_pct);
            }
        }
        sizes.sort();

        Self {
            assets,
            sizes,
            cells,
            attempted,
        }
    }

    /// Impact at one cell; `None` for failed or impact-less quotes
    pub fn impact(&self, asset: &str, size: Decimal) -> Option<Decimal> {
        self.cells
            .get(&(asset.to_string(), size))
            .copied()
            .flatten()
    }

    fn has_cell(&self, asset: &str, size: Decimal) -> bool {
        self.attempted.contains(&(asset.to_string(), size))
    }
}

/// Aggregate quote statistics across a report
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactStats {
    pub total_points: usize,
    pub successful: usize,
    pub failed: usize,
    pub mean_impact_pct: Option<Decimal>,
    pub median_impact_pct: Option<Decimal>,
    pub max_impact_pct: Option<Decimal>,
}

impl ImpactStats {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let total_points = rows.len();
        let successful = rows.iter().filter(|r| r.success).count();

        let mut impacts: Vec<Decimal> = rows
            .iter()
            .filter(|r| r.success)
            .filter_map(|r| r.price_impact_pct)
            .collect();
        impacts.sort();

        let count = impacts.len();
        let mean_impact_pct = if count > 0 {
            let sum: Decimal = impacts.iter().sum();
            sum.checked_div(Decimal::from(count))
        } else {
            None
        };
        let median_impact_pct = match count {
            0 => None,
            n if n % 2 == 1 => Some(impacts[n / 2]),
            n => impacts[n / 2 - 1]
                .checked_add(impacts[n / 2])
                .and_then(|s| s.checked_div(Decimal::TWO)),
        };
        let max_impact_pct = impacts.last().copied();

        Self {
            total_points,
            successful,
            failed: total_points - successful,
            mean_impact_pct,
            median_impact_pct,
            max_impact_pct,
        }
    }
}

const CSV_HEADER: &str = "asset,mint,reserve_address,total_deposits,price_usd,tvl_usd,\
swap_size_usd,swap_size_native,swap_size_tokens,price_impact_pct,output_usd,effective_price,\
slippage_bps,router,route_summary,route_concentration_pct,success,error,risk_flags,timestamp";

/// Render rows as CSV, risk flags pipe-joined in one column
pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for row in rows {
        let fields = [
            row.asset.clone(),
            row.mint.clone(),
            row.reserve_address.clone().unwrap_or_default(),
            row.total_deposits.to_string(),
            row.price_usd.to_string(),
            row.tvl_usd.to_string(),
            row.swap_size_usd.to_string(),
            row.swap_size_native.to_string(),
            row.swap_size_tokens.to_string(),
            row.price_impact_pct.map(|d| d.to_string()).unwrap_or_default(),
            row.output_usd.to_string(),
            row.effective_price.to_string(),
            row.slippage_bps.to_string(),
            row.router.clone().unwrap_or_default(),
            row.route_summary.clone().unwrap_or_default(),
            row.route_concentration_pct
                .map(|d| d.to_string())
                .unwrap_or_default(),
            row.success.to_string(),
            row.error.clone().unwrap_or_default(),
            row.risk_flags.join("|"),
            row.timestamp.to_rfc3339(),
        ];
        let encoded: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&encoded.join(","));
        out.push('\n');
    }

    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn impact_cell(row: &ReportRow) -> String {
    if !row.success {
        return "FAIL".to_string();
    }
    match row.price_impact_pct {
        Some(i) => format!("{i:.2}%"),
        None => "N/A".to_string(),
    }
}

/// Render the per-row detail table for the console
pub fn render_detail_table(rows: &[ReportRow]) -> String {
    let mut out = format!(
        "{:<12} {:>10} {:>8} {:>12} {:>12} {:<28} {}\n",
        "ASSET", "SIZE", "IMPACT", "OUTPUT", "EFF PRICE", "ROUTE", "FLAGS"
    );

    for row in rows {
        let flags = if row.risk_flags.is_empty() {
            "-".to_string()
        } else {
            row.risk_flags.join(" ")
        };
        out.push_str(&format!(
            "{:<12} {:>10} {:>8} {:>12} {:>12} {:<28} {}\n",
            row.asset,
            units::format_usd(row.swap_size_usd),
            impact_cell(row),
            units::format_usd(row.output_usd),
            format!("{:.2}", row.effective_price),
            row.route_summary.as_deref().unwrap_or("Unknown"),
            flags
        ));
    }

    out
}

/// Render the flagged-scenario section, capped at ten rows
///
/// Empty string when nothing is flagged so callers can skip the section.
pub fn render_high_risk(rows: &[ReportRow]) -> String {
    let flagged: Vec<&ReportRow> = rows.iter().filter(|r| !r.risk_flags.is_empty()).collect();
    if flagged.is_empty() {
        return String::new();
    }

    let mut out = format!("High-risk scenarios: {}\n", flagged.len());
    for row in flagged.iter().take(10) {
        out.push_str(&format!(
            "{:<12} {:>10}  impact {:<8} {}\n",
            row.asset,
            units::format_usd(row.swap_size_usd),
            impact_cell(row),
            row.risk_flags.join(", ")
        ));
    }
    if flagged.len() > 10 {
        out.push_str(&format!("... and {} more\n", flagged.len() - 10));
    }

    out
}

/// Render the asset-by-size impact pivot for the console
pub fn render_summary_table(summary: &ImpactSummary) -> String {
    let mut out = format!("{:<12}", "ASSET");
    for size in &summary.sizes {
        out.push_str(&format!(" {:>10}", units::format_usd(*size)));
    }
    out.push('\n');

    for asset in &summary.assets {
        out.push_str(&format!("{asset:<12}"));
        for size in &summary.sizes {
            let cell = match summary.impact(asset, *size) {
                Some(i) => format!("{i:.2}%"),
                None if summary.has_cell(asset, *size) => "FAIL".to_string(),
                None => "-".to_string(),
            };
            out.push_str(&format!(" {cell:>10}"));
        }
        out.push('\n');
    }

    out
}
