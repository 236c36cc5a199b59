//! Transactions
//!
//! `ReadTx` is a view over a committed snapshot. `WriteTx` stages mutations
//! on top of one; staged writes are visible to the transaction itself and
//! become one commit record when the update closure returns `Ok`.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{KvError, Result};

use super::bucket::{bucket_name, Bucket, Snapshot};
use super::record::Mutation;

/// Read-only transaction
pub struct ReadTx<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> ReadTx<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Look up a bucket by name
    pub fn bucket(&self, name: &[u8]) -> Option<&'a Bucket> {
        self.snapshot.bucket(name)
    }
}

/// Read-write transaction
pub struct WriteTx<'a> {
    base: &'a Snapshot,
    created: BTreeSet<Vec<u8>>,
    staged: BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Vec<u8>>>,
    mutations: Vec<Mutation>,
}

impl<'a> WriteTx<'a> {
    pub(crate) fn new(base: &'a Snapshot) -> Self {
        Self {
            base,
            created: BTreeSet::new(),
            staged: BTreeMap::new(),
            mutations: Vec::new(),
        }
    }

    /// Whether the bucket exists, counting buckets created in this transaction
    pub fn bucket_exists(&self, name: &[u8]) -> bool {
        self.created.contains(name) || self.base.bucket(name).is_some()
    }

    /// Create the bucket unless it already exists
    pub fn create_bucket_if_not_exists(&mut self, name: &[u8]) -> Result<()> {
        if !self.bucket_exists(name) {
            self.created.insert(name.to_vec());
            self.mutations.push(Mutation::CreateBucket {
                name: name.to_vec(),
            });
        }
        Ok(())
    }

    /// Stage a put into an existing bucket
    pub fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        if !self.bucket_exists(bucket) {
            return Err(KvError::BucketNotFound(bucket_name(bucket)));
        }

        self.staged
            .entry(bucket.to_vec())
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        self.mutations.push(Mutation::Put {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    /// Read a key, seeing this transaction's own staged writes first
    pub fn get(&self, bucket: &[u8], key: &[u8]) -> Option<&[u8]> {
        if let Some(value) = self.staged.get(bucket).and_then(|b| b.get(key)) {
            return Some(value.as_slice());
        }
        self.base.bucket(bucket).and_then(|b| b.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub(crate) fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}
