//! Command line interface for the CLMM keeper.
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use clmm_keeper_data::{DexScreenerProvider, JupiterClient, TokenInfoProvider};
use clmm_keeper_domain::enums::{AutoCheckAction, LiquidityShape};
use clmm_keeper_domain::format::format_compact;
use clmm_keeper_domain::value_objects::Lamports;
use clmm_keeper_execution::prelude::*;
use clmm_keeper_protocols::instructions::TOKEN_PROGRAM_ID;
use clmm_keeper_protocols::rpc::{ConnectionPool, RpcProvider};
use dotenv::dotenv;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

mod config;
mod logging;

use config::{DEFAULT_CONFIG_PATH, KeeperConfig};

#[derive(Parser)]
#[command(name = "clmm-keeper")]
#[command(about = "Wallet consolidation and position auto-check keeper", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, env = "KEEPER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Selection {
    /// Comma-separated wallet ids
    #[arg(long, value_delimiter = ',')]
    wallets: Vec<u32>,

    /// Every configured wallet
    #[arg(long, conflicts_with = "wallets")]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Move every non-dust token balance into the main wallet
    ConsolidateTokens {
        #[command(flatten)]
        selection: Selection,
    },
    /// Move SOL above the reserve into the main wallet
    ConsolidateSol {
        #[command(flatten)]
        selection: Selection,
    },
    /// Split SOL from the main wallet evenly across the selected wallets
    DistributeSol {
        #[command(flatten)]
        selection: Selection,

        /// Total amount in SOL
        #[arg(long)]
        amount: Decimal,
    },
    /// Watch positions and close or reopen them when out of range
    AutoCheck {
        #[command(flatten)]
        selection: Selection,

        /// Whirlpool address
        #[arg(long)]
        pool: Pubkey,

        /// close | reopen
        #[arg(long, default_value = "close")]
        action: AutoCheckAction,

        /// spot | curve | bid-ask
        #[arg(long, default_value = "spot")]
        shape: LiquidityShape,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Look up a token on DexScreener
    TokenInfo {
        #[arg(long)]
        mint: String,
    },
    /// Show SOL and token balances
    Balances {
        #[command(flatten)]
        selection: Selection,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    if let Commands::TokenInfo { mint } = &cli.command {
        return token_info(mint).await;
    }

    let config = KeeperConfig::load(&cli.config)?;
    let registry = config.wallet_registry()?;
    let pool = Arc::new(
        ConnectionPool::initialize(
            &config.rpc.endpoints,
            &config.rpc.proxies,
            &config.rpc.pool_config(),
        )
        .context("Failed to build connection pool")?,
    );
    info!(slots = pool.len(), wallets = registry.len(), "Keeper ready");

    let liquidator = JupiterLiquidator::new(JupiterClient::new()?, config.fees.liquidation_lamports)
        .with_slippage_bps(config.liquidation.slippage_bps);
    let engine = TransferEngine::new(Arc::new(liquidator))
        .with_fees(config.fees)
        .with_pacing(config.pacing.policy());

    match cli.command {
        Commands::ConsolidateTokens { selection } => {
            let sources = select(&registry, &selection, false)?;
            let target = registry.main()?;
            println!("📦 Consolidating tokens from {} wallets into {}", sources.len(), target.short());
            let report = engine.consolidate_tokens_batch(&pool, &sources, &target).await;
            print_batch(&report);
        }
        Commands::ConsolidateSol { selection } => {
            let sources = select(&registry, &selection, false)?;
            let target = registry.main()?;
            println!("📦 Consolidating SOL from {} wallets into {}", sources.len(), target.short());
            let report = engine.consolidate_native_batch(&pool, &sources, &target).await;
            print_batch(&report);
        }
        Commands::DistributeSol { selection, amount } => {
            let total = Lamports::from_sol(amount)?;
            let targets: Vec<Pubkey> = select(&registry, &selection, false)?
                .iter()
                .map(|w| w.address())
                .collect();
            let source = registry.main()?;
            println!("💸 Distributing {total} from {} to {} wallets", source.short(), targets.len());
            let report = engine
                .distribute_native(pool.get_connection(), source, &targets, total)
                .await;
            print_batch(&report);
        }
        Commands::AutoCheck {
            selection,
            pool: pool_address,
            action,
            shape,
            ticks,
        } => {
            let wallets = select(&registry, &selection, true)?;
            let manager = WhirlpoolPositionManager::new(config.auto_check.confirmation(), config.fees);
            let (tx, mut rx) = mpsc::unbounded_channel();
            let checker = Arc::new(
                AutoChecker::new(pool.clone(), Arc::new(manager), config.auto_check.config(ticks))
                    .with_reports(tx),
            );

            let stopper = checker.clone();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, finishing current tick");
                    stopper.stop();
                }
            });
            let printer = tokio::spawn(async move {
                while let Some(report) = rx.recv().await {
                    print_tick(&report);
                }
            });

            let summary = checker
                .run_auto_check(&wallets, action, pool_address, shape)
                .await?;
            // The report channel closes once every checker handle is gone.
            interrupt.abort();
            let _ = interrupt.await;
            drop(checker);
            let _ = printer.await;
            println!(
                "🏁 {} ticks, {} actions, {} wallet failures",
                summary.ticks, summary.actions, summary.wallet_failures
            );
        }
        Commands::Balances { selection } => {
            for wallet in select(&registry, &selection, true)? {
                let rpc = pool.get_connection();
                let lamports = Lamports(rpc.get_balance(&wallet.address()).await?);
                let tokens = rpc
                    .get_token_balances(&wallet.address(), &TOKEN_PROGRAM_ID)
                    .await?;
                println!("👛 #{} {}: {}", wallet.id(), wallet.address(), lamports);
                for token in tokens.iter().filter(|t| t.amount > 0) {
                    println!("     {:<44} {}", token.mint, format_compact(token.ui_amount()));
                }
            }
        }
        Commands::TokenInfo { .. } => {}
    }

    Ok(())
}

/// Resolves the wallet selection. `--all` means every wallet but the main one
/// unless `include_main` is set.
fn select(
    registry: &WalletRegistry,
    selection: &Selection,
    include_main: bool,
) -> Result<Vec<Arc<Wallet>>> {
    let wallets = if selection.all {
        if include_main {
            registry.all()
        } else {
            registry.all_except_main()
        }
    } else {
        registry.select(&selection.wallets)?
    };
    if wallets.is_empty() {
        bail!("no wallets selected, pass --wallets <ids> or --all");
    }
    Ok(wallets)
}

async fn token_info(mint: &str) -> Result<()> {
    let provider = DexScreenerProvider::new()?;
    let info = provider.token_info(mint).await;
    if info.is_unknown() {
        println!("❌ No market data for {mint}");
        return Ok(());
    }
    let sol_usd = provider.sol_price_usd().await;
    println!("🪙 {} ({})", info.symbol, info.address);
    println!("   Price:      {} SOL / ${}", info.price_native, info.price_usd);
    println!("   Market cap: ${}", format_compact(info.market_cap));
    println!("   SOL/USD:    ${sol_usd}");
    Ok(())
}

fn print_batch(report: &BatchReport) {
    for wallet in &report.wallets {
        let mark = if wallet.is_failed() { "❌" } else { "✅" };
        println!("{mark} {}", wallet.wallet);
        for item in &wallet.items {
            match &item.status {
                OutcomeStatus::Succeeded { signature } => {
                    println!("     {:<12} sent {signature}", item.label);
                }
                OutcomeStatus::Skipped { reason } => println!("     {:<12} skipped: {reason}", item.label),
                OutcomeStatus::Failed { error } => println!("     {:<12} failed: {error}", item.label),
            }
        }
        if let Some(error) = &wallet.error {
            println!("     error: {error}");
        }
        if let Some(liquidation) = &wallet.liquidation {
            let sold = liquidation.items.iter().filter(|i| i.is_succeeded()).count();
            println!("     liquidated {sold}/{} tokens", liquidation.items.len());
        }
    }
    println!("📊 {report}");
}

fn print_tick(report: &TickReport) {
    println!("⏱  tick {}", report.tick);
    for check in &report.wallets {
        let decision = check.decision.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        match (&check.error, &check.signature) {
            (Some(error), _) => println!("     {} {}: {error}", check.wallet, check.state),
            (None, Some(signature)) => {
                println!("     {} {decision}: {signature}", check.wallet);
            }
            (None, None) => println!("     {} {} ({decision})", check.wallet, check.state),
        }
    }
}
