//! Main ledger orchestration layer
//!
//! This is the surface the transaction-execution framework calls after it
//! has authorized and fee-charged a request. It dispatches by asset to the
//! coin or token instantiation of the same [`FutureLedger`] algorithms.
//!
//! # Example
//!
//! ```no_run
//! use future_ledger::{AccountId, AssetId, Config, Ledger};
//!
//! fn main() -> future_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default())?;
//!
//!     let alice = AccountId::new("alice");
//!     let released = ledger.withdraw_matured(&alice, &AssetId::Coin, chrono::Utc::now())?;
//!     println!("released {}", released);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    account::Account,
    future::FutureLedger,
    storage::{CoinTicks, StorageStats, TokenTicks},
    types::{AccountId, AssetId, FuturePage, FutureSummary},
    Config, Result, Storage,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Shared storage
    storage: Arc<Storage>,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = Arc::new(Storage::open(&config)?);
        Ok(Self { storage, config })
    }

    fn coin_futures(&self) -> FutureLedger<CoinTicks> {
        FutureLedger::new(
            CoinTicks::new(self.storage.clone()),
            self.storage.clone(),
            self.config.ledger.bucket_granularity_ms,
            self.config.ledger.max_page_size,
        )
    }

    fn token_futures(&self) -> FutureLedger<TokenTicks> {
        FutureLedger::new(
            TokenTicks::new(self.storage.clone()),
            self.storage.clone(),
            self.config.ledger.bucket_granularity_ms,
            self.config.ledger.max_page_size,
        )
    }

    /// Schedule a credit for `owner` that becomes spendable at `available_at`
    ///
    /// The caller has already authorized the transfer, checked the sender's
    /// solvency, and charged fees.
    pub fn schedule_credit(
        &self,
        owner: &AccountId,
        asset: &AssetId,
        amount: u64,
        available_at: DateTime<Utc>,
    ) -> Result<()> {
        match asset {
            AssetId::Coin => self.coin_futures().insert(owner, asset, amount, available_at),
            AssetId::Token(_) => self.token_futures().insert(owner, asset, amount, available_at),
        }
    }

    /// Release all of `owner`'s credits matured at or before `now`
    ///
    /// Returns the released amount; 0 when nothing has matured.
    pub fn withdraw_matured(
        &self,
        owner: &AccountId,
        asset: &AssetId,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        match asset {
            AssetId::Coin => self.coin_futures().withdraw(owner, asset, now),
            AssetId::Token(_) => self.token_futures().withdraw(owner, asset, now),
        }
    }

    /// Read one page of `owner`'s scheduled credits (read-only, no fee)
    pub fn query_page(
        &self,
        owner: &AccountId,
        asset: &AssetId,
        page_index: u64,
        page_size: u64,
    ) -> Result<FuturePage> {
        match asset {
            AssetId::Coin => self
                .coin_futures()
                .paginate(owner, asset, page_index, page_size),
            AssetId::Token(_) => self
                .token_futures()
                .paginate(owner, asset, page_index, page_size),
        }
    }

    /// Cached aggregate for (owner, asset): O(1), never touches a tick
    pub fn future_summary(
        &self,
        owner: &AccountId,
        asset: &AssetId,
    ) -> Result<Option<FutureSummary>> {
        Ok(self
            .storage
            .get_account(owner)?
            .and_then(|account| account.future_summary(asset).cloned()))
    }

    /// Spendable balance for (owner, asset)
    pub fn spendable_balance(&self, owner: &AccountId, asset: &AssetId) -> Result<u64> {
        Ok(self
            .storage
            .get_account(owner)?
            .map(|account| account.spendable_balance(asset))
            .unwrap_or(0))
    }

    /// Full account record, if it exists
    pub fn get_account(&self, owner: &AccountId) -> Result<Option<Account>> {
        self.storage.get_account(owner)
    }

    /// Storage statistics (approximate, diagnostic only)
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }
}
