//! Log Replay
//!
//! Rebuilds bucket state from the backing file and catches an open handle
//! up with commits made by other processes.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::{KvError, Result};

use super::bucket::Snapshot;
use super::reader::{LogReader, ReadOutcome};
use super::record::CommitRecord;

/// Result of a replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of commits read in this pass
    pub commits_applied: u64,

    /// LSN of the last valid commit (0 for an empty log)
    pub last_lsn: u64,

    /// Byte length of the valid prefix of the log
    pub valid_len: u64,

    /// Whether an incomplete or checksum-failing final frame was found
    pub torn_tail: bool,
}

/// Read commits from `start`, handing each one to `apply` in LSN order
///
/// `last_lsn` is the LSN of the commit ending at `start`. A torn final
/// frame stops the scan without error; anything else malformed is
/// `Corruption`.
pub(crate) fn scan<F>(file: &File, start: u64, last_lsn: u64, mut apply: F) -> Result<ReplayStats>
where
    F: FnMut(CommitRecord) -> Result<()>,
{
    let mut reader = LogReader::open(file, start)?;
    let mut stats = ReplayStats {
        commits_applied: 0,
        last_lsn,
        valid_len: start,
        torn_tail: false,
    };

    loop {
        match reader.next_record()? {
            ReadOutcome::Commit(record) => {
                if record.lsn != stats.last_lsn + 1 {
                    return Err(KvError::Corruption(format!(
                        "out-of-order commit: expected lsn {}, found {}",
                        stats.last_lsn + 1,
                        record.lsn
                    )));
                }
                stats.last_lsn = record.lsn;
                apply(record)?;
                stats.commits_applied += 1;
                stats.valid_len = reader.position();
            }
            ReadOutcome::End => break,
            ReadOutcome::TornTail { offset, reason } => {
                debug!(offset, %reason, "stopping replay at torn tail");
                stats.torn_tail = true;
                break;
            }
        }
    }

    Ok(stats)
}

/// Verify the integrity of a backing file without opening a database on it
pub fn verify(path: &Path) -> Result<ReplayStats> {
    let file = File::open(path)?;
    let mut snapshot = Snapshot::default();
    scan(&file, 0, 0, |record| snapshot.apply_commit(&record))
}
