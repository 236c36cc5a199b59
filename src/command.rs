//! Command definitions
//!
//! What a single invocation asks the store to do, and what it gets back.

use crate::error::{KvError, Result};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a key-value pair
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },

    /// List all keys
    List,
}

impl Command {
    /// Reject arguments the store does not guard against itself
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::Set { key, .. } | Command::Get { key } if key.is_empty() => {
                Err(KvError::InvalidArgument("key must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Result of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Mutation committed, nothing to print
    Done,

    /// Value for GET
    Value(Vec<u8>),

    /// Raw keys for LIST
    Keys(Vec<Vec<u8>>),
}

impl Reply {
    /// Lines to print for this reply
    pub fn lines(&self) -> Vec<&[u8]> {
        match self {
            Reply::Done => Vec::new(),
            Reply::Value(value) => vec![value.as_slice()],
            Reply::Keys(keys) => keys.iter().map(|k| k.as_slice()).collect(),
        }
    }
}
