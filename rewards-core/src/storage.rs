//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `transactions` - Append-only point transaction log (key: transaction id)
//! - `aggregates` - Per-user denormalized state (key: user id)
//! - `indices` - History index
//!   (key: id-length | user id | reversed-timestamp | reversed-txn-id)
//!
//! User ids are opaque strings, so the index key length-prefixes them: a
//! prefix scan for one user can never match a longer id that happens to
//! extend it byte-for-byte. Timestamp and transaction id are stored
//! bitwise-inverted so that a forward prefix scan yields transactions
//! strictly newest-first, equal timestamps included.

use crate::{
    error::{Error, Result},
    types::{PointTransaction, UserAggregate, UserId},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_TRANSACTIONS: &str = "transactions";
const CF_AGGREGATES: &str = "aggregates";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-heavy transaction log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_AGGREGATES, Self::cf_options_aggregates()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?} with 3 column families", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        // Transactions are written once and rarely read, compress hard
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_aggregates() -> Options {
        let mut opts = Options::default();
        // Aggregates are read on every award and leaderboard query, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::StoreUnavailable(format!("Column family {} not found", name)))
    }

    // Transaction operations

    /// Get transaction by ID
    pub fn get_transaction(&self, id: Uuid) -> Result<PointTransaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::TransactionNotFound(id.to_string()))?;

        let txn: PointTransaction = bincode::deserialize(&value)?;
        Ok(txn)
    }

    /// Get a user's transactions, newest-first
    ///
    /// `limit = None` returns the full history. Each call re-scans the index;
    /// no cursor state is retained between calls.
    pub fn user_history(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<PointTransaction>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let prefix = Self::index_prefix(user_id);
        let iter = self.db.prefix_iterator_cf(cf_indices, &prefix);

        let mut txns = Vec::new();
        for item in iter {
            let (key, _) = item?;

            if !key.starts_with(&prefix) {
                break;
            }

            // inverted txn id is the last 16 bytes of the key
            if key.len() < prefix.len() + 8 + 16 {
                continue;
            }
            let inverted: Vec<u8> = key[key.len() - 16..].iter().map(|b| !b).collect();
            let id_bytes: [u8; 16] = inverted.try_into().unwrap();
            let txn = self.get_transaction(Uuid::from_bytes(id_bytes))?;
            txns.push(txn);

            if let Some(n) = limit {
                if txns.len() >= n {
                    break;
                }
            }
        }

        Ok(txns)
    }

    /// Sum of ledger deltas for a user (reconciliation source of truth)
    pub fn ledger_total(&self, user_id: &UserId) -> Result<i64> {
        let history = self.user_history(user_id, None)?;
        Ok(history.iter().map(|t| t.points).sum())
    }

    // Aggregate operations

    /// Put user aggregate
    pub fn put_aggregate(&self, agg: &UserAggregate) -> Result<()> {
        let cf = self.cf_handle(CF_AGGREGATES)?;
        let value = bincode::serialize(agg)?;
        self.db.put_cf(cf, agg.user_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get user aggregate, erroring when missing
    pub fn get_aggregate(&self, user_id: &UserId) -> Result<UserAggregate> {
        self.get_aggregate_opt(user_id)?
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    /// Get user aggregate, `None` when missing
    pub fn get_aggregate_opt(&self, user_id: &UserId) -> Result<Option<UserAggregate>> {
        let cf = self.cf_handle(CF_AGGREGATES)?;

        match self.db.get_cf(cf, user_id.as_bytes())? {
            Some(value) => {
                let agg: UserAggregate = bincode::deserialize(&value)?;
                Ok(Some(agg))
            }
            None => Ok(None),
        }
    }

    /// Scan all user aggregates (leaderboard source)
    pub fn scan_aggregates(&self) -> Result<Vec<UserAggregate>> {
        let cf = self.cf_handle(CF_AGGREGATES)?;

        let mut aggs = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let agg: UserAggregate = bincode::deserialize(&value)?;
            aggs.push(agg);
        }

        Ok(aggs)
    }

    // Atomic operations

    /// Append transaction, its history index entry, and the updated aggregate
    /// as one write batch
    ///
    /// The three keys commit or fail together, so the ledger can never gain a
    /// row without the matching balance update.
    pub fn apply_award(&self, txn: &PointTransaction, agg: &UserAggregate) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Transaction row
        let cf_txns = self.cf_handle(CF_TRANSACTIONS)?;
        let txn_value = bincode::serialize(txn)?;
        batch.put_cf(cf_txns, txn.id.as_bytes(), &txn_value);

        // 2. History index
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx_key = Self::index_key_history(txn);
        batch.put_cf(cf_indices, &idx_key, &[]);

        // 3. Aggregate
        let cf_aggs = self.cf_handle(CF_AGGREGATES)?;
        let agg_value = bincode::serialize(agg)?;
        batch.put_cf(cf_aggs, agg.user_id.as_bytes(), &agg_value);

        self.db.write(batch)?;

        tracing::debug!(
            txn_id = %txn.id,
            user_id = %txn.user_id,
            points = txn.points,
            kind = %txn.kind,
            "Transaction appended"
        );

        Ok(())
    }

    // Index key helpers

    /// `id-length (u32 BE) | user_id`
    ///
    /// The length prefix keeps opaque ids unambiguous: a scan for user
    /// `"a"` cannot match keys of a user whose id merely starts with `a`.
    fn index_prefix(user_id: &UserId) -> Vec<u8> {
        let id = user_id.as_bytes();
        let mut prefix = Vec::with_capacity(4 + id.len());
        prefix.extend_from_slice(&(id.len() as u32).to_be_bytes());
        prefix.extend_from_slice(id);
        prefix
    }

    /// `index_prefix | (MAX - timestamp_nanos) | !txn_id`
    ///
    /// Inverting the timestamp and the transaction id bytes makes
    /// lexicographic order equal strict newest-first order under a forward
    /// prefix scan, equal timestamps included (UUIDv7 ids ascend with time).
    fn index_key_history(txn: &PointTransaction) -> Vec<u8> {
        let ts = txn.timestamp.timestamp_nanos_opt().unwrap_or(0).max(0) as u64;

        let mut key = Self::index_prefix(&txn.user_id);
        key.extend_from_slice(&(u64::MAX - ts).to_be_bytes());
        key.extend(txn.id.as_bytes().iter().map(|b| !b));
        key
    }

    // Statistics

    /// Approximate number of transactions in the log
    pub fn transaction_count(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let count = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(count)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}
