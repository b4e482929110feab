//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account records with embedded summaries (key: owner address)
//! - `coin_ticks` - Maturity buckets for the native coin (key: tick key)
//! - `token_ticks` - Maturity buckets for fungible tokens (key: tick key)
//!
//! Every ledger path uses point get/put/delete only. The doubly linked tick
//! chain is navigated through the keys stored inside each tick, never
//! through a range scan.

use crate::{
    account::Account,
    error::{Error, Result},
    types::{AccountId, Tick, TickKey},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_COIN_TICKS: &str = "coin_ticks";
const CF_TOKEN_TICKS: &str = "token_ticks";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

/// Pending writes of one ledger operation, committed atomically
///
/// Every insert/withdraw stages all of its tick and account mutations here
/// and commits once. An error anywhere before the commit leaves the store
/// untouched, which is the all-or-nothing behavior the host transaction
/// model expects.
pub struct LedgerBatch {
    inner: WriteBatch,
}

impl LedgerBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self {
            inner: WriteBatch::default(),
        }
    }
}

impl Default for LedgerBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-addressed store holding one asset kind's ticks
///
/// The future ledger is generic over this seam; the coin and token
/// instantiations differ only in which column family backs them.
pub trait TickStore {
    /// Point lookup of one tick
    fn get(&self, key: &TickKey) -> Result<Option<Tick>>;

    /// Stage a tick write into a batch
    fn stage_put(&self, batch: &mut LedgerBatch, key: &TickKey, tick: &Tick) -> Result<()>;

    /// Stage a tick deletion into a batch
    fn stage_delete(&self, batch: &mut LedgerBatch, key: &TickKey) -> Result<()>;
}

/// Tick store for the native coin
pub struct CoinTicks {
    storage: Arc<Storage>,
}

impl CoinTicks {
    /// Create a handle over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl TickStore for CoinTicks {
    fn get(&self, key: &TickKey) -> Result<Option<Tick>> {
        self.storage.get_tick(CF_COIN_TICKS, key)
    }

    fn stage_put(&self, batch: &mut LedgerBatch, key: &TickKey, tick: &Tick) -> Result<()> {
        self.storage.stage_put_tick(CF_COIN_TICKS, batch, key, tick)
    }

    fn stage_delete(&self, batch: &mut LedgerBatch, key: &TickKey) -> Result<()> {
        self.storage.stage_delete_tick(CF_COIN_TICKS, batch, key)
    }
}

/// Tick store for fungible tokens
pub struct TokenTicks {
    storage: Arc<Storage>,
}

impl TokenTicks {
    /// Create a handle over shared storage
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl TickStore for TokenTicks {
    fn get(&self, key: &TickKey) -> Result<Option<Tick>> {
        self.storage.get_tick(CF_TOKEN_TICKS, key)
    }

    fn stage_put(&self, batch: &mut LedgerBatch, key: &TickKey, tick: &Tick) -> Result<()> {
        self.storage.stage_put_tick(CF_TOKEN_TICKS, batch, key, tick)
    }

    fn stage_delete(&self, batch: &mut LedgerBatch, key: &TickKey) -> Result<()> {
        self.storage.stage_delete_tick(CF_TOKEN_TICKS, batch, key)
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_accounts()),
            ColumnFamilyDescriptor::new(CF_COIN_TICKS, Self::cf_options_ticks()),
            ColumnFamilyDescriptor::new(CF_TOKEN_TICKS, Self::cf_options_ticks()),
        ];

        // Open database
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        // Accounts are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_ticks() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Tick access is pure point lookup, bloom filters pay for themselves
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Account operations

    /// Get account by address
    pub fn get_account(&self, owner: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;

        match self.db.get_cf(cf, owner.as_str().as_bytes())? {
            Some(value) => {
                let account: Account = bincode::deserialize(&value)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    /// Put account (single, unbatched)
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        self.db.put_cf(cf, account.address.as_str().as_bytes(), &value)?;
        Ok(())
    }

    /// Stage an account write into a batch
    pub fn stage_account(&self, batch: &mut LedgerBatch, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        batch
            .inner
            .put_cf(cf, account.address.as_str().as_bytes(), &value);
        Ok(())
    }

    // Tick operations (shared by both tick stores)

    fn get_tick(&self, cf_name: &str, key: &TickKey) -> Result<Option<Tick>> {
        let cf = self.cf_handle(cf_name)?;

        match self.db.get_cf(cf, key.as_bytes())? {
            Some(value) => {
                let tick: Tick = bincode::deserialize(&value)?;
                Ok(Some(tick))
            }
            None => Ok(None),
        }
    }

    fn stage_put_tick(
        &self,
        cf_name: &str,
        batch: &mut LedgerBatch,
        key: &TickKey,
        tick: &Tick,
    ) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        let value = bincode::serialize(tick)?;
        batch.inner.put_cf(cf, key.as_bytes(), &value);

        tracing::debug!(key = %key, day = tick.day.index(), balance = tick.balance, "tick staged");

        Ok(())
    }

    fn stage_delete_tick(&self, cf_name: &str, batch: &mut LedgerBatch, key: &TickKey) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        batch.inner.delete_cf(cf, key.as_bytes());

        tracing::debug!(key = %key, "tick delete staged");

        Ok(())
    }

    /// Atomically commit one operation's staged writes
    pub fn commit(&self, batch: LedgerBatch) -> Result<()> {
        self.db.write(batch.inner)?;
        Ok(())
    }

    // Statistics

    /// Get storage statistics (approximate, diagnostic only)
    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            accounts: self.approximate_count(CF_ACCOUNTS)?,
            coin_ticks: self.approximate_count(CF_COIN_TICKS)?,
            token_ticks: self.approximate_count(CF_TOKEN_TICKS)?,
        })
    }

    fn approximate_count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf_handle(cf_name)?;

        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate number of account records
    pub accounts: u64,
    /// Approximate number of coin ticks
    pub coin_ticks: u64,
    /// Approximate number of token ticks
    pub token_ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, MaturityDay};
    use tempfile::TempDir;

    fn test_storage() -> (Arc<Storage>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Arc::new(Storage::open(&config).unwrap()), temp_dir)
    }

    #[test]
    fn test_storage_open() {
        let (storage, _temp) = test_storage();
        assert!(storage.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(storage.db.cf_handle(CF_COIN_TICKS).is_some());
        assert!(storage.db.cf_handle(CF_TOKEN_TICKS).is_some());
    }

    #[test]
    fn test_account_roundtrip() {
        let (storage, _temp) = test_storage();

        let owner = AccountId::new("alice");
        assert!(storage.get_account(&owner).unwrap().is_none());

        let mut account = Account::new(owner.clone());
        account.balance = 250;
        storage.put_account(&account).unwrap();

        let retrieved = storage.get_account(&owner).unwrap().unwrap();
        assert_eq!(retrieved, account);
    }

    #[test]
    fn test_tick_batch_commit_and_delete() {
        let (storage, _temp) = test_storage();
        let ticks = CoinTicks::new(storage.clone());

        let owner = AccountId::new("alice");
        let day = MaturityDay::from_index(7);
        let key = TickKey::derive(&owner, &AssetId::Coin, day).unwrap();
        let tick = Tick {
            day,
            balance: 100,
            prev: None,
            next: None,
        };

        // Nothing visible before commit
        let mut batch = LedgerBatch::new();
        ticks.stage_put(&mut batch, &key, &tick).unwrap();
        assert!(ticks.get(&key).unwrap().is_none());

        storage.commit(batch).unwrap();
        assert_eq!(ticks.get(&key).unwrap().unwrap(), tick);

        let mut batch = LedgerBatch::new();
        ticks.stage_delete(&mut batch, &key).unwrap();
        storage.commit(batch).unwrap();
        assert!(ticks.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_coin_and_token_ticks_isolated() {
        let (storage, _temp) = test_storage();
        let coin = CoinTicks::new(storage.clone());
        let token = TokenTicks::new(storage.clone());

        let owner = AccountId::new("alice");
        let day = MaturityDay::from_index(7);
        let key = TickKey::derive(&owner, &AssetId::Coin, day).unwrap();
        let tick = Tick {
            day,
            balance: 100,
            prev: None,
            next: None,
        };

        let mut batch = LedgerBatch::new();
        coin.stage_put(&mut batch, &key, &tick).unwrap();
        storage.commit(batch).unwrap();

        // Same key bytes, different column family
        assert!(coin.get(&key).unwrap().is_some());
        assert!(token.get(&key).unwrap().is_none());
    }
}
