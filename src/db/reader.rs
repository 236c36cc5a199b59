//! Log Reader
//!
//! Reads commit frames from the backing file, starting at a byte offset.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};

use crate::error::{KvError, Result};

use super::record::{CommitRecord, FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// What the reader found at its current position
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete, checksummed commit
    Commit(CommitRecord),

    /// Clean end of the log
    End,

    /// An incomplete or checksum-failing final frame starting at `offset`
    TornTail { offset: u64, reason: String },
}

/// Sequential reader over the frames of a backing file
///
/// The file length is captured once when the reader is opened; frames
/// appended afterwards are picked up by the next reader. If the file
/// shrinks underneath the reader, the rest is reported as a torn tail.
pub struct LogReader<'a> {
    reader: BufReader<&'a File>,
    position: u64,
    end: u64,
}

impl<'a> LogReader<'a> {
    /// Open a reader positioned at `offset`
    pub fn open(file: &'a File, offset: u64) -> Result<Self> {
        let end = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset))?;

        Ok(Self {
            reader,
            position: offset,
            end,
        })
    }

    /// Byte offset just past the last frame returned
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next frame
    pub fn next_record(&mut self) -> Result<ReadOutcome> {
        if self.position >= self.end {
            return Ok(ReadOutcome::End);
        }

        let remaining = self.end - self.position;
        if remaining < HEADER_SIZE as u64 {
            return Ok(self.torn(format!("partial header ({} bytes)", remaining)));
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        if !self.fill(&mut header_buf)? {
            return Ok(self.torn("file shrank while reading header".to_string()));
        }
        let header = FrameHeader::parse(&header_buf).map_err(|e| {
            KvError::Corruption(format!("at offset {}: {}", self.position, e))
        })?;

        if header.len > MAX_PAYLOAD_SIZE {
            return Err(KvError::Corruption(format!(
                "frame at offset {} declares {} bytes, limit is {}",
                self.position, header.len, MAX_PAYLOAD_SIZE
            )));
        }

        // The header checked out, so a short payload is a write in progress
        if header.frame_len() > remaining {
            return Ok(self.torn(format!(
                "partial payload ({} of {} bytes)",
                remaining - HEADER_SIZE as u64,
                header.len
            )));
        }

        let mut payload = vec![0u8; header.len as usize];
        if !self.fill(&mut payload)? {
            return Ok(self.torn("file shrank while reading payload".to_string()));
        }

        if !header.checksum_matches(&payload) {
            // Only the final frame can be a write that never finished
            if header.frame_len() == remaining {
                return Ok(self.torn("checksum mismatch on final frame".to_string()));
            }
            return Err(KvError::Corruption(format!(
                "CRC mismatch at offset {} (lsn {})",
                self.position, header.lsn
            )));
        }

        let record = CommitRecord::decode_payload(&header, &payload)?;
        self.position += header.frame_len();
        Ok(ReadOutcome::Commit(record))
    }

    /// Fill `buf` completely; `false` if the file ended first
    ///
    /// A writer may truncate a torn tail while this reader is scanning it.
    fn fill(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn torn(&self, reason: String) -> ReadOutcome {
        ReadOutcome::TornTail {
            offset: self.position,
            reason,
        }
    }
}
