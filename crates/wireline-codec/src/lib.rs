#![warn(missing_docs)]

//! wireline-codec: conversion between host values and network bytes.
//!
//! Everything that crosses a socket in this workspace is a plain byte
//! sequence; this crate holds the pieces that turn typed values into those
//! bytes and back:
//!
//! - host/network byte-order conversion ([`byte_order`])
//! - fixed-width scalar and tuple codecs ([`wire`])
//! - a growable buffer with append-at-tail / consume-from-head semantics
//!   ([`buffer::WireBuffer`])
//!
//! Integers always travel big-endian, as Internet protocol conventions
//! mandate.

/// Growable byte buffer for assembling and picking apart messages.
pub mod buffer;
/// Host/network byte-order conversion.
pub mod byte_order;
/// Fixed-width scalar and tuple wire codecs.
pub mod wire;

pub use buffer::WireBuffer;
pub use byte_order::{from_network, to_network};
pub use wire::{Wire, WireDecode, WireEncode};
