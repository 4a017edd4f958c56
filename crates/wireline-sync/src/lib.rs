#![warn(missing_docs)]

//! wireline-sync: thread-coordination primitives.
//!
//! The connection engine in `wireline-net` is built from three small pieces
//! that this crate provides:
//!
//! - [`Guarded`]: a datum bundled with its lock, so every access happens
//!   inside a critical section
//! - a capacity-one rendezvous channel ([`Sender`]/[`Receiver`]) with
//!   explicit open/closed state
//! - [`Promise`]/[`FutureHandle`]: one-shot eventual results layered on top
//!   of the channel

/// Capacity-one rendezvous channel.
pub mod channel;
/// A datum bundled with its lock.
pub mod guarded;
/// One-shot eventual results.
pub mod promise;

pub use channel::{
    bidirectional_channel, channel, BidirectionalChannel, ReceiveError, Receiver, SendError,
    Sender, TrySendError,
};
pub use guarded::Guarded;
pub use promise::{promised, FutureHandle, Promise};
