//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `wallets` - Wallet balances (key: address, value: 16-byte decimal)
//! - `transactions` - Append-only transfer log (key: big-endian sequence)
//! - `meta` - Counters (key: `next_sequence`)
//!
//! The database is opened as a pessimistic [`TransactionDB`]. All mutations
//! go through a [`UnitOfWork`], which rolls back on drop unless committed.

use crate::{
    config::SeedConfig,
    error::StoreError,
    types::{TransactionRecord, Wallet, WalletAddress},
    Config,
};
use chrono::Utc;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, SingleThreaded, Transaction,
    TransactionDB, TransactionDBOptions, TransactionOptions, WriteOptions,
};
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;

type Result<T> = std::result::Result<T, StoreError>;

/// Column families are fixed at open, so handles are plain borrows
type Db = TransactionDB<SingleThreaded>;

/// Column family names
const CF_WALLETS: &str = "wallets";
const CF_TRANSACTIONS: &str = "transactions";
const CF_META: &str = "meta";

const KEY_NEXT_SEQUENCE: &[u8] = b"next_sequence";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Db,
    path: PathBuf,
    lock_timeout_ms: i64,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.path)
            .field("lock_timeout_ms", &self.lock_timeout_ms)
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let mut txn_db_opts = TransactionDBOptions::default();
        txn_db_opts.set_txn_lock_timeout(config.engine.lock_timeout_ms);
        txn_db_opts.set_default_lock_timeout(config.engine.lock_timeout_ms);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_wallets()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db: Db =
            Db::open_cf_descriptors(&db_opts, &txn_db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB transaction store");

        Ok(Self {
            db,
            path: path.clone(),
            lock_timeout_ms: config.engine.lock_timeout_ms,
        })
    }

    // Column family options

    fn cf_options_wallets() -> Options {
        let mut opts = Options::default();
        // Point lookups by address dominate
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or(StoreError::MissingColumnFamily(name))
    }

    /// Begin a unit of work
    pub fn begin(&self) -> UnitOfWork<'_> {
        let mut txn_opts = TransactionOptions::default();
        txn_opts.set_lock_timeout(self.lock_timeout_ms);
        txn_opts.set_deadlock_detect(true);

        let txn = self.db.transaction_opt(&WriteOptions::default(), &txn_opts);
        UnitOfWork {
            storage: self,
            txn: Some(txn),
        }
    }

    // Read operations

    /// Committed balance of one wallet
    pub fn balance(&self, address: &WalletAddress) -> Result<Option<Decimal>> {
        let cf = self.cf_handle(CF_WALLETS)?;
        self.db
            .get_cf(cf, address.as_bytes())?
            .map(|value| decode_balance(address, &value))
            .transpose()
    }

    /// Up to `limit` records, most recent first
    pub fn recent_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;

        let mut records = Vec::with_capacity(limit.min(1024));
        for item in self.db.iterator_cf(cf, IteratorMode::End).take(limit) {
            let (_, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }

        Ok(records)
    }

    /// Every wallet, from one point-in-time iterator
    pub fn wallets(&self) -> Result<Vec<Wallet>> {
        let cf = self.cf_handle(CF_WALLETS)?;

        let mut wallets = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let address = WalletAddress::new(String::from_utf8_lossy(&key).into_owned());
            let balance = decode_balance(&address, &value)?;
            wallets.push(Wallet { address, balance });
        }

        Ok(wallets)
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for wallet in self.wallets()? {
            total = total
                .checked_add(wallet.balance)
                .ok_or(StoreError::Overflow(wallet.address))?;
        }
        Ok(total)
    }

    /// Wallet table has no rows
    pub fn is_empty(&self) -> Result<bool> {
        let cf = self.cf_handle(CF_WALLETS)?;
        match self.db.iterator_cf(cf, IteratorMode::Start).next() {
            Some(item) => item.map(|_| false).map_err(StoreError::from),
            None => Ok(true),
        }
    }

    // Bootstrap

    /// Create one wallet (bootstrap only)
    pub fn create_wallet(&self, address: &WalletAddress, balance: Decimal) -> Result<Wallet> {
        let uow = self.begin();
        uow.insert_wallet(address, balance)?;
        uow.commit()?;

        tracing::debug!(address = %address, balance = %balance, "Wallet created");

        Ok(Wallet {
            address: address.clone(),
            balance,
        })
    }

    /// Seed `wallet-1..=wallet-N` when the wallet table is empty.
    ///
    /// Returns the number of wallets created.
    pub fn seed_wallets(&self, seed: &SeedConfig) -> Result<u32> {
        if !self.is_empty()? {
            tracing::debug!("Wallet table not empty, skipping seed");
            return Ok(0);
        }

        let uow = self.begin();
        for i in 1..=seed.wallet_count {
            let address = WalletAddress::new(format!("wallet-{}", i));
            uow.insert_wallet(&address, seed.initial_balance)?;
        }
        uow.commit()?;

        tracing::info!(
            wallet_count = seed.wallet_count,
            initial_balance = %seed.initial_balance,
            "Seeded wallets"
        );

        Ok(seed.wallet_count)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

/// All-or-nothing group of reads and writes.
///
/// Rows read through [`UnitOfWork::lock_wallet`] stay exclusively locked
/// until the unit of work ends. Dropping it without [`UnitOfWork::commit`]
/// rolls back every write.
pub struct UnitOfWork<'a> {
    storage: &'a Storage,
    txn: Option<Transaction<'a, Db>>,
}

impl fmt::Debug for UnitOfWork<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("open", &self.txn.is_some())
            .finish()
    }
}

impl<'a> UnitOfWork<'a> {
    fn txn(&self) -> &Transaction<'a, Db> {
        // Only `commit` takes the transaction, and it consumes `self`.
        self.txn
            .as_ref()
            .unwrap_or_else(|| unreachable!("unit of work used after commit"))
    }

    /// Read a balance and hold an exclusive lock on the row
    pub fn lock_wallet(&self, address: &WalletAddress) -> Result<Option<Decimal>> {
        let cf = self.storage.cf_handle(CF_WALLETS)?;
        self.txn()
            .get_for_update_cf(cf, address.as_bytes(), true)?
            .map(|value| decode_balance(address, &value))
            .transpose()
    }

    /// Overwrite a balance
    pub fn set_balance(&self, address: &WalletAddress, balance: Decimal) -> Result<()> {
        let cf = self.storage.cf_handle(CF_WALLETS)?;
        self.txn()
            .put_cf(cf, address.as_bytes(), balance.serialize())?;
        Ok(())
    }

    /// Create a wallet that must not exist yet
    pub fn insert_wallet(&self, address: &WalletAddress, balance: Decimal) -> Result<()> {
        if balance.is_sign_negative() {
            return Err(StoreError::NegativeBalance(address.clone()));
        }
        if self.lock_wallet(address)?.is_some() {
            return Err(StoreError::WalletExists(address.clone()));
        }
        self.set_balance(address, balance)
    }

    /// Append a log record under the next sequence number.
    ///
    /// Locks the sequence counter; callers must lock wallet rows first.
    pub fn append_record(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        let cf_meta = self.storage.cf_handle(CF_META)?;
        let cf_transactions = self.storage.cf_handle(CF_TRANSACTIONS)?;
        let txn = self.txn();

        let sequence = match txn.get_for_update_cf(cf_meta, KEY_NEXT_SEQUENCE, true)? {
            Some(value) => decode_sequence(&value)?,
            None => 1,
        };

        let record = TransactionRecord {
            sequence,
            from: from.clone(),
            to: to.clone(),
            amount,
            timestamp: Utc::now(),
        };

        txn.put_cf(
            cf_transactions,
            sequence.to_be_bytes(),
            bincode::serialize(&record)?,
        )?;
        txn.put_cf(cf_meta, KEY_NEXT_SEQUENCE, (sequence + 1).to_be_bytes())?;

        Ok(record)
    }

    /// Make every write visible atomically
    pub fn commit(mut self) -> Result<()> {
        match self.txn.take() {
            Some(txn) => txn.commit().map_err(StoreError::from),
            None => Ok(()),
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            if let Err(err) = txn.rollback() {
                tracing::warn!(error = %err, "Unit of work rollback failed");
            }
        }
    }
}

fn decode_balance(address: &WalletAddress, value: &[u8]) -> Result<Decimal> {
    let bytes: [u8; 16] = value.try_into().map_err(|_| StoreError::Corrupt {
        key: address.to_string(),
        reason: format!("expected 16 balance bytes, found {}", value.len()),
    })?;
    Ok(Decimal::deserialize(bytes))
}

fn decode_sequence(value: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::Corrupt {
        key: String::from_utf8_lossy(KEY_NEXT_SEQUENCE).into_owned(),
        reason: format!("expected 8 sequence bytes, found {}", value.len()),
    })?;
    Ok(u64::from_be_bytes(bytes))
}
