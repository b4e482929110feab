//! Future-ledger inspection tool
//!
//! Prints the cached summary and the first page of scheduled credits for
//! one (owner, asset), plus approximate store statistics.
//!
//! Usage: `future-ledger-inspect <owner> [token-id]`
//! (configuration comes from `FUTURE_LEDGER_*` environment variables)

use anyhow::Context;
use future_ledger::{AccountId, AssetId, Config, Ledger};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let owner = args
        .next()
        .context("usage: future-ledger-inspect <owner> [token-id]")?;
    let asset = match args.next() {
        Some(token) => AssetId::token(token),
        None => AssetId::Coin,
    };
    let owner = AccountId::new(owner);

    let config = Config::from_env()?;
    let ledger = Ledger::open(config)?;

    match ledger.future_summary(&owner, &asset)? {
        Some(summary) => {
            println!(
                "{} / {}: {} scheduled credits, total {}, days {}..={}",
                owner,
                asset,
                summary.count,
                summary.total_value,
                summary.lower_bound,
                summary.upper_bound
            );
        }
        None => {
            println!("{} / {}: no scheduled credits", owner, asset);
        }
    }

    let page = ledger.query_page(&owner, &asset, 0, 100)?;
    for item in &page.items {
        println!(
            "  day {} ({}): {}",
            item.day, item.available_at, item.balance
        );
    }
    println!(
        "spendable balance: {}",
        ledger.spendable_balance(&owner, &asset)?
    );

    let stats = ledger.stats()?;
    tracing::info!(
        accounts = stats.accounts,
        coin_ticks = stats.coin_ticks,
        token_ticks = stats.token_ticks,
        "store statistics"
    );

    Ok(())
}
