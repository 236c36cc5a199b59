//! # kv
//!
//! A command-line key-value utility with:
//! - A single-file embedded store (append-only, CRC-checked commits)
//! - SHA-256 digest addressing of values
//! - Fail-fast advisory file locking between concurrent writers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     kv binary (clap)                        │
//! │                 set / get / list → Command                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                │
//! │        digest keys · dual write · lock around set           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  FileLock   │          │     Db      │
//!   │ (<db>.lock) │          │  (buckets)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ backing file│
//!                           │  (commits)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod db;
pub mod lock;
pub mod command;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use command::{Command, Reply};
pub use config::Config;
pub use error::{KvError, Result};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
