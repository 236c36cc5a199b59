//! Buckets
//!
//! In-memory image of the committed log: named buckets of byte keys to
//! byte values. BTreeMap keeps iteration in byte-lexical key order.

use std::collections::BTreeMap;

use crate::error::{KvError, Result};

use super::record::{CommitRecord, Mutation};

/// A named associative collection
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Bucket {
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub(crate) fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }
}

/// All buckets as of the last applied commit
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    buckets: BTreeMap<Vec<u8>, Bucket>,
}

impl Snapshot {
    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        self.buckets.get(name)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Apply every mutation of a commit, in order
    pub fn apply_commit(&mut self, record: &CommitRecord) -> Result<()> {
        for mutation in &record.mutations {
            self.apply(mutation).map_err(|e| match e {
                KvError::BucketNotFound(name) => KvError::Corruption(format!(
                    "commit {} writes to missing bucket {}",
                    record.lsn, name
                )),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Apply one mutation
    pub fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::CreateBucket { name } => {
                self.buckets.entry(name.clone()).or_default();
            }
            Mutation::Put { bucket, key, value } => {
                let target = self
                    .buckets
                    .get_mut(bucket.as_slice())
                    .ok_or_else(|| KvError::BucketNotFound(bucket_name(bucket)))?;
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// Printable bucket name for error messages
pub(crate) fn bucket_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}
