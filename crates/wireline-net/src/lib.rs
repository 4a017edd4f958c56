#![warn(missing_docs)]

//! wireline-net: thread-per-direction TCP connections.
//!
//! The crate exposes two factory functions: [`create_server`] listens and
//! invokes a callback per accepted peer, [`create_client`] opens an outbound
//! [`Connection`]. A connection owns two worker threads (one sending, one
//! receiving); its `send`/`receive` methods enqueue work and return future
//! handles that resolve once the workers are done.
//!
//! Example
//! ```no_run
//! use wireline_net::{create_client, create_server, AddressFamily};
//!
//! let server = create_server(AddressFamily::Ipv4, 0, |connection| {
//!     let reply = connection.receive(32).unwrap().get().unwrap();
//!     println!("peer said: {:?}", reply);
//! }).unwrap();
//!
//! let client = create_client(AddressFamily::Ipv4, "127.0.0.1", server.local_address().port).unwrap();
//! client.send("hello").unwrap().get().unwrap();
//! ```

/// Endpoint descriptions and address resolution.
pub mod address;
/// The per-connection I/O engine.
pub mod connection;
/// The acceptor and its background loop.
pub mod server;
mod socket;
/// Process-wide network stack lifecycle.
pub mod stack;

pub use address::{AddressFamily, Endpoint};
pub use connection::{Connection, TypedFuture};
pub use server::Server;
pub use stack::{network_stack, NetworkStack};

use wireline_core::{
    config::Config,
    error::{ErrorKind, Result},
};

/// Connects to `host:port` and returns the established connection.
///
/// `family` filters the resolver's candidates; [`AddressFamily::Unspecified`]
/// accepts whatever the resolver returns first.
pub fn create_client(family: AddressFamily, host: &str, port: u16) -> Result<Connection> {
    create_client_with_config(family, host, port, Config::default())
}

/// Connects to `host:port` with custom configuration.
pub fn create_client_with_config(
    family: AddressFamily,
    host: &str,
    port: u16,
    config: Config,
) -> Result<Connection> {
    stack::network_stack();
    let address = address::resolve_host(family, host, port)?;
    let stream = socket::connect_stream(address, &config).map_err(ErrorKind::ConnectFailed)?;
    Connection::spawn(stream, config)
}

/// Starts a server on `port`; `callback` runs on the listener thread once per
/// accepted peer.
///
/// Port 0 asks the OS for an ephemeral port, revealed by
/// [`Server::local_address`]. The family must be concrete.
pub fn create_server(
    family: AddressFamily,
    port: u16,
    callback: impl FnMut(Connection) + Send + 'static,
) -> Result<Server> {
    create_server_with_config(family, port, Config::default(), callback)
}

/// Starts a server with custom configuration.
pub fn create_server_with_config(
    family: AddressFamily,
    port: u16,
    config: Config,
    callback: impl FnMut(Connection) + Send + 'static,
) -> Result<Server> {
    Server::start(family, port, config, Box::new(callback))
}
