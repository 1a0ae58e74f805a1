//! Kamino Liquidity Depth Analyzer
//!
//! Command-line entry point for measuring how deep on-chain liquidity runs
//! for the volatile collateral of a Kamino lending market.

use clap::{ArgAction, Args, Parser, Subcommand};
use kamino_liquidity::{
    analyzer::LiquidityAnalyzer,
    client::{filter_to_symbols, KaminoClient},
    config::Config,
    report, units,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kamino-liquidity")]
#[command(about = "Liquidity depth analysis for Kamino lending collateral")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: config.toml, then ~/.config/kamino-liquidity/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the liquidity depth analysis
    Analyze(AnalyzeArgs),
    /// List the market's reserves without spending quotes
    Reserves {
        /// List every reserve, not just the volatile set
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Only analyze these symbols (comma-separated)
    #[arg(long, value_delimiter = ',')]
    assets: Option<Vec<String>>,

    /// Override the USD trade-size ladder (comma-separated)
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<Decimal>>,

    /// Override the market to analyze
    #[arg(long)]
    market: Option<String>,

    /// Jupiter API key (enables the paid tier)
    #[arg(long)]
    api_key: Option<String>,

    /// Write the full report to a CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print only the impact pivot
    #[arg(long)]
    summary: bool,

    /// Keep failed quotes in the CSV export
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    include_failed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the flag-selected level
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    match cli.command {
        Commands::Analyze(args) => run_analysis(config, args).await,
        Commands::Reserves { all } => show_reserves(config, all).await,
    }
}

async fn run_analysis(mut config: Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    if let Some(market) = args.market {
        config.analysis.market_pubkey = market;
    }
    if let Some(sizes) = args.sizes {
        config.analysis.swap_size_bands_usd = sizes;
    }
    if args.api_key.is_some() {
        config.api.jupiter_api_key = args.api_key;
    }

    let asset_filter: Option<Vec<String>> = args
        .assets
        .map(|list| list.iter().map(|s| s.trim().to_uppercase()).collect());

    let analyzer = LiquidityAnalyzer::new(config)?;
    let report = analyzer.generate_report(asset_filter.as_deref()).await?;

    if report.is_empty() {
        println!(
            "\nNo matching reserves found in market {}",
            report.market_pubkey
        );
        return Ok(());
    }

    println!("\n📊 Liquidity Depth Report: {}\n", report.market_pubkey);

    if !args.summary {
        print!("{}", report::render_detail_table(&report.rows));
        println!();
    }

    println!("Price impact by trade size:\n");
    print!("{}", report::render_summary_table(&report.summary()));

    let stats = report.stats();
    println!();
    println!(
        "Quotes: {} total, {} ok, {} failed",
        stats.total_points, stats.successful, stats.failed
    );
    if let (Some(mean), Some(median), Some(max)) = (
        stats.mean_impact_pct,
        stats.median_impact_pct,
        stats.max_impact_pct,
    ) {
        println!("Impact: mean {mean:.2}%, median {median:.2}%, max {max:.2}%");
    }

    let high_risk = report::render_high_risk(&report.rows);
    if !high_risk.is_empty() {
        println!("\n⚠️  {}", high_risk.trim_end());
    }

    if let Some(path) = args.output {
        let csv = if args.include_failed {
            report::to_csv(&report.rows)
        } else {
            let ok_rows: Vec<_> = report.rows.iter().filter(|r| r.success).cloned().collect();
            report::to_csv(&ok_rows)
        };
        std::fs::write(&path, csv)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

async fn show_reserves(config: Config, all: bool) -> anyhow::Result<()> {
    let kamino = KaminoClient::new(&config)?;
    let reserves = kamino
        .fetch_market_reserves(&config.analysis.market_pubkey)
        .await?;

    let shown = if all {
        reserves
    } else {
        filter_to_symbols(reserves, &config.analysis.volatile_assets)
    };

    println!("\n🏦 Reserves in market {}\n", config.analysis.market_pubkey);
    println!(
        "{:<12} {:>16} {:>12} {:>10}  {}",
        "ASSET", "DEPOSITS", "PRICE", "TVL", "MINT"
    );
    println!("{}", "-".repeat(100));

    for reserve in &shown {
        println!(
            "{:<12} {:>16.2} {:>12} {:>10}  {}",
            reserve.symbol,
            reserve.total_deposits,
            format!("${:.2}", reserve.price_usd),
            units::format_usd(reserve.tvl_usd),
            reserve.mint_address
        );
    }

    println!("\n{} reserves", shown.len());
    Ok(())
}
