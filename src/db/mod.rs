//! Embedded Database Module
//!
//! A single-file, append-only store of named buckets. Every update
//! transaction becomes exactly one checksummed commit frame, so both of its
//! writes land together or not at all.
//!
//! ## Responsibilities
//! - Replay the log into in-memory buckets on open
//! - Catch up with commits appended by other processes before each view
//! - Drop torn tails (never visible to readers, truncated by the next writer)
//! - Append one frame per update and fsync it
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Commit 1                                            │
//! │ ┌─────────┬─────────┬─────────┬──────────┬────────┐ │
//! │ │ LSN (8) │ Len (4) │ CRC (4) │ HCRC (4) │ Data   │ │
//! │ └─────────┴─────────┴─────────┴──────────┴────────┘ │
//! ├─────────────────────────────────────────────────────┤
//! │ Commit 2                                            │
//! │ ┌─────────┬─────────┬─────────┬──────────┬────────┐ │
//! │ │ LSN (8) │ Len (4) │ CRC (4) │ HCRC (4) │ Data   │ │
//! │ └─────────┴─────────┴─────────┴──────────┴────────┘ │
//! └─────────────────────────────────────────────────────┘
//! ```
//! Data is a bincode `CommitRecord`. CRC covers Data; HCRC covers LSN, Len
//! and CRC, so a damaged header is corruption rather than a short write.

mod bucket;
mod reader;
mod record;
mod replay;
mod tx;

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;

pub use bucket::{Bucket, Snapshot};
pub use reader::{LogReader, ReadOutcome};
pub use record::{CommitRecord, FrameHeader, Mutation, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use replay::{verify, ReplayStats};
pub use tx::{ReadTx, WriteTx};

/// Committed state plus how much of the file it covers
struct State {
    snapshot: Snapshot,
    applied_len: u64,
    last_lsn: u64,
}

/// Handle on one backing file
///
/// ## Concurrency
/// - In-process: `file` serializes file access, `state` lets views share the
///   snapshot. Lock order is always `file` → `state`.
/// - Cross-process: readers are safe at any time. Writers must hold an
///   external exclusive lock (see [`crate::lock`]); `update` assumes it.
pub struct Db {
    path: PathBuf,
    file: Mutex<File>,
    state: RwLock<State>,
    sync_writes: bool,
}

impl Db {
    /// Open or create the backing file and replay it
    pub fn open(path: &Path, sync_writes: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path)?;

        let mut snapshot = Snapshot::default();
        let stats = replay::scan(&file, 0, 0, |record| snapshot.apply_commit(&record))?;

        debug!(
            path = %path.display(),
            commits = stats.commits_applied,
            last_lsn = stats.last_lsn,
            torn_tail = stats.torn_tail,
            "opened database"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            state: RwLock::new(State {
                snapshot,
                applied_len: stats.valid_len,
                last_lsn: stats.last_lsn,
            }),
            sync_writes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// LSN of the most recent commit this handle has seen
    pub fn last_lsn(&self) -> u64 {
        self.state.read().last_lsn
    }

    /// Run a read-only transaction against the latest committed state
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTx<'_>) -> Result<T>,
    {
        {
            let file = self.file.lock();
            self.catch_up(&file)?;
        }

        let state = self.state.read();
        f(&ReadTx::new(&state.snapshot))
    }

    /// Run a read-write transaction and commit it as one frame
    ///
    /// If `f` fails nothing is written. The caller must hold the
    /// cross-process write lock.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTx<'_>) -> Result<T>,
    {
        let mut file = self.file.lock();

        let stats = self.catch_up(&file)?;
        if stats.torn_tail {
            warn!(
                path = %self.path.display(),
                valid_len = stats.valid_len,
                "truncating torn tail left by an interrupted write"
            );
            file.set_len(stats.valid_len)?;
        }

        let mut state = self.state.write();

        let mut tx = WriteTx::new(&state.snapshot);
        let value = f(&mut tx)?;
        if tx.is_empty() {
            return Ok(value);
        }

        let record = CommitRecord::new(state.last_lsn + 1, tx.into_mutations());
        let frame = record.encode()?;
        let offset = state.applied_len;

        if let Err(e) = Self::append(&mut file, offset, &frame, self.sync_writes) {
            if let Err(rollback) = file.set_len(offset) {
                warn!(error = %rollback, offset, "failed to roll back partial commit");
            }
            return Err(e);
        }

        state.snapshot.apply_commit(&record)?;
        state.applied_len = offset + frame.len() as u64;
        state.last_lsn = record.lsn;

        debug!(lsn = record.lsn, bytes = frame.len(), "committed");
        Ok(value)
    }

    /// Flush and release the backing file
    pub fn close(self) -> Result<()> {
        let file = self.file.into_inner();
        file.sync_all()?;
        debug!(path = %self.path.display(), "closed database");
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Apply commits appended since the last replay
    fn catch_up(&self, file: &File) -> Result<ReplayStats> {
        let (start, last_lsn) = {
            let state = self.state.read();
            (state.applied_len, state.last_lsn)
        };

        let mut commits = Vec::new();
        let stats = replay::scan(file, start, last_lsn, |record| {
            commits.push(record);
            Ok(())
        })?;

        if !commits.is_empty() {
            let mut state = self.state.write();
            for record in &commits {
                state.snapshot.apply_commit(record)?;
            }
            state.applied_len = stats.valid_len;
            state.last_lsn = stats.last_lsn;
            debug!(
                commits = stats.commits_applied,
                last_lsn = stats.last_lsn,
                "caught up with external commits"
            );
        }

        Ok(stats)
    }

    fn append(file: &mut File, offset: u64, frame: &[u8], sync: bool) -> Result<()> {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(frame)?;
        if sync {
            file.sync_data()?;
        }
        Ok(())
    }
}
