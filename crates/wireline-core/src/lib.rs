#![warn(missing_docs)]

//! wireline-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core types shared across all layers:
//! - Configuration options
//! - Error handling
//! - Timing and sizing constants
//!
//! The actual machinery lives in specialized crates:
//! - `wireline-codec`: big-endian wire codec and byte buffers
//! - `wireline-sync`: guarded values, rendezvous channels, promises
//! - `wireline-net`: connection engine and acceptor

/// Timing and sizing constants shared across layers.
pub mod constants {
    use std::time::Duration;

    /// Deadline applied to a receive operation when the caller gives none.
    pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);
    /// Read-timeout tick used by the receive worker to re-check deadlines
    /// and the running flag while waiting for data.
    pub const RECEIVE_POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Sleep between accept attempts while the listening socket is idle.
    pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// Backlog passed to `listen`.
    pub const DEFAULT_LISTEN_BACKLOG: i32 = 1024;
    /// Largest payload accepted by a single send or receive task. The OS
    /// transfer size is an `int` on some platforms, so cap uniformly.
    pub const MAX_TRANSFER_SIZE: usize = i32::MAX as usize;
}

/// Configuration options for sockets and worker loops.
pub mod config;
/// Error types and results.
pub mod error;
