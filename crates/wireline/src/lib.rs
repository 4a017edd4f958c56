#![warn(missing_docs)]

//! Wireline: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports the types
//! needed to build TCP applications:
//!
//! - Factories and endpoints (`create_server`, `create_client`,
//!   `AddressFamily`, `Endpoint`)
//! - The connection engine (`Connection`, `Server`, `FutureHandle`)
//! - The wire codec (`WireBuffer`, `Wire`, `to_network`, `from_network`)
//! - Core configuration (`Config`)
//!
//! Example
//! ```ignore
//! use wireline::{create_client, create_server, AddressFamily};
//!
//! let server = create_server(AddressFamily::Ipv4, 0, |connection| {
//!     // Runs on the listener thread once per accepted peer; move the
//!     // connection elsewhere if it should outlive this call.
//!     let greeting = connection.receive(64).unwrap().get().unwrap();
//!     println!("-> {}", String::from_utf8_lossy(&greeting));
//! }).unwrap();
//!
//! let client = create_client(
//!     AddressFamily::Ipv4,
//!     "127.0.0.1",
//!     server.local_address().port,
//! ).unwrap();
//! let num_bytes_sent = client.send("hello").unwrap().get().unwrap();
//! assert_eq!(num_bytes_sent, 5);
//! ```

// Core config and errors
pub use wireline_core::{
    config::Config,
    constants,
    error::{ErrorKind, Result},
};
// Codec: byte order, wire traits, buffers
pub use wireline_codec::{from_network, to_network, Wire, WireBuffer, WireDecode, WireEncode};
// Sync: eventual results and the rendezvous channel
pub use wireline_sync::{
    bidirectional_channel, channel, BidirectionalChannel, FutureHandle, Receiver, Sender,
};
// Net: factories, connections, acceptor
pub use wireline_net::{
    create_client, create_client_with_config, create_server, create_server_with_config,
    network_stack, AddressFamily, Connection, Endpoint, NetworkStack, Server, TypedFuture,
};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        create_client, create_server, AddressFamily, Config, Connection, Endpoint, ErrorKind,
        FutureHandle, Result, Server, WireBuffer,
    };
}
