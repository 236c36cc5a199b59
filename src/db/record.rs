//! Commit record definitions
//!
//! One commit record carries every mutation of one update transaction, so a
//! transaction is either entirely in the log or not at all.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Frame header size: LSN (8) + Len (4) + CRC (4) + Header CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Bytes of the header covered by the header CRC
const HEADER_BODY_SIZE: usize = HEADER_SIZE - 4;

/// Largest payload accepted in a single frame (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// A single mutation inside a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Create a named bucket (no-op on replay if it already exists)
    CreateBucket { name: Vec<u8> },

    /// Put a key-value pair into an existing bucket
    Put {
        bucket: Vec<u8>,
        key: Vec<u8>,
        value: Vec<u8>,
    },
}

/// A committed transaction as stored in the backing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Log Sequence Number - monotonically increasing, starts at 1
    pub lsn: u64,

    /// Timestamp (unix millis) when the commit was created
    pub timestamp: u64,

    /// Mutations applied by this commit, in order
    pub mutations: Vec<Mutation>,
}

/// Parsed fixed-size frame header
///
/// `crc` covers the payload; the header's own checksum covers LSN, length
/// and `crc`, so a damaged length is never mistaken for a short payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub lsn: u64,
    pub len: u32,
    pub crc: u32,
}

impl FrameHeader {
    /// Parse and verify a header from the first `HEADER_SIZE` bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(KvError::Corruption(format!(
                "frame header too short: {} bytes",
                bytes.len()
            )));
        }

        let mut body = &bytes[..HEADER_BODY_SIZE];
        let mut stored = &bytes[HEADER_BODY_SIZE..HEADER_SIZE];
        let header_crc = stored.get_u32_le();
        if crc32fast::hash(body) != header_crc {
            return Err(KvError::Corruption(
                "frame header checksum mismatch".to_string(),
            ));
        }

        Ok(Self {
            lsn: body.get_u64_le(),
            len: body.get_u32_le(),
            crc: body.get_u32_le(),
        })
    }

    /// Total frame size (header + payload)
    pub fn frame_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.len as u64
    }

    pub fn checksum_matches(&self, payload: &[u8]) -> bool {
        crc32fast::hash(payload) == self.crc
    }
}

impl CommitRecord {
    /// Create a record stamped with the current time
    pub fn new(lsn: u64, mutations: Vec<Mutation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            timestamp,
            mutations,
        }
    }

    /// Encode into a full frame: `[LSN][Len][CRC][Header CRC][payload]`
    pub fn encode(&self) -> Result<Bytes> {
        let payload = bincode::serialize(self)?;
        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(KvError::Serialization(format!(
                "commit payload of {} bytes exceeds limit of {}",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_u64_le(self.lsn);
        buf.put_u32_le(payload.len() as u32);
        buf.put_u32_le(crc32fast::hash(&payload));
        let header_crc = crc32fast::hash(&buf[..HEADER_BODY_SIZE]);
        buf.put_u32_le(header_crc);
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    /// Decode a full frame, verifying length, checksum and LSN agreement
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let header = FrameHeader::parse(frame)?;
        let payload = &frame[HEADER_SIZE..];
        if payload.len() != header.len as usize {
            return Err(KvError::Corruption(format!(
                "frame length mismatch: header says {}, got {}",
                header.len,
                payload.len()
            )));
        }
        Self::decode_payload(&header, payload)
    }

    /// Decode a payload whose header was read separately
    pub(crate) fn decode_payload(header: &FrameHeader, payload: &[u8]) -> Result<Self> {
        if !header.checksum_matches(payload) {
            return Err(KvError::Corruption(format!(
                "CRC mismatch at lsn {}",
                header.lsn
            )));
        }

        let record: CommitRecord = bincode::deserialize(payload)
            .map_err(|e| KvError::Corruption(format!("undecodable commit payload: {}", e)))?;

        if record.lsn != header.lsn {
            return Err(KvError::Corruption(format!(
                "LSN mismatch: header {}, payload {}",
                header.lsn, record.lsn
            )));
        }

        Ok(record)
    }
}
