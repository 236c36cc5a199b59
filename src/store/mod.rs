//! Store Module
//!
//! The key-value layer the CLI talks to.
//!
//! ## Responsibilities
//! - Resolve and open the backing file
//! - Map raw keys to fixed-width digests
//! - Keep the key index (`k`) and value table (`kv`) in step
//! - Serialize writers across processes with the advisory lock
//!
//! ## Layout
//! ```text
//!   bucket "k"  : raw key  → digest     (enumerated by list)
//!   bucket "kv" : digest   → value      (read by get)
//! ```
//! Both entries for a key are written by the same commit.

mod digest;

use std::path::Path;

use tracing::debug;

use crate::command::{Command, Reply};
use crate::config::{lock_path_for, Config};
use crate::db::Db;
use crate::error::{KvError, Result};
use crate::lock::FileLock;

pub use digest::{hash_key, Digest, DIGEST_LEN};

/// Bucket mapping digests to values
pub const VALUE_BUCKET: &[u8] = b"kv";

/// Bucket mapping raw keys to digests
pub const KEY_BUCKET: &[u8] = b"k";

/// Persistent key-value store
///
/// ## Concurrency Model
/// - `set` takes the cross-process lock non-blocking and fails fast with
///   `LockHeld` if another writer has it.
/// - `get` and `list` take no lock; they read the latest fully written
///   commit.
pub struct Store {
    db: Db,
    lock: FileLock,
}

impl Store {
    /// Open or create the store described by `config`
    ///
    /// The lock path is derived here but the lock is only taken by `set`.
    pub fn open(config: &Config) -> Result<Self> {
        let db_path = config.resolve_db_path()?;
        let db = Db::open(&db_path, config.sync_writes)?;
        let lock = FileLock::new(lock_path_for(&db_path));

        debug!(
            db = %db_path.display(),
            lock = %lock.path().display(),
            "store opened"
        );

        Ok(Self { db, lock })
    }

    /// Open with a path (convenience method)
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(&Config::builder().db_path(path).build())
    }

    /// Execute a command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(Reply::Done)
            }
            Command::Get { key } => self.get(&key).map(Reply::Value),
            Command::List => self.list().map(Reply::Keys),
        }
    }

    /// Set a key-value pair
    ///
    /// Steps:
    /// 1. Take the lock (fail fast if held)
    /// 2. In one commit: ensure both buckets, index the key, store the value
    /// 3. Release the lock, whatever happened in step 2
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let guard = self.lock.try_acquire()?;

        let updated = self.db.update(|tx| {
            tx.create_bucket_if_not_exists(VALUE_BUCKET)?;
            tx.create_bucket_if_not_exists(KEY_BUCKET)?;

            let digest = hash_key(key);
            tx.put(KEY_BUCKET, key, digest.as_bytes())?;
            tx.put(VALUE_BUCKET, digest.as_bytes(), value)
        });

        // An update failure wins; a release failure is still reported when
        // the update committed.
        let released = guard.release();
        updated?;
        released
    }

    /// Get the value most recently set for `key`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.db.view(|tx| {
            let bucket = tx
                .bucket(VALUE_BUCKET)
                .ok_or_else(|| KvError::BucketNotFound("kv".to_string()))?;

            let digest = hash_key(key);
            bucket
                .get(digest.as_bytes())
                .map(|v| v.to_vec())
                .ok_or(KvError::KeyNotFound)
        })
    }

    /// List every raw key ever set, in the key index's native order
    pub fn list(&self) -> Result<Vec<Vec<u8>>> {
        self.db.view(|tx| {
            let bucket = tx
                .bucket(KEY_BUCKET)
                .ok_or_else(|| KvError::BucketNotFound("k".to_string()))?;

            Ok(bucket.iter().map(|(key, _)| key.to_vec()).collect())
        })
    }

    /// Close the store, flushing the backing file
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the backing file
    pub fn db_path(&self) -> &Path {
        self.db.path()
    }

    /// Path of the sibling lock file
    pub fn lock_path(&self) -> &Path {
        self.lock.path()
    }

    /// LSN of the last commit this handle has seen
    pub fn last_lsn(&self) -> u64 {
        self.db.last_lsn()
    }
}
