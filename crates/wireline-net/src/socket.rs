//! Socket construction and option application.

use std::{
    io,
    net::{SocketAddr, TcpListener, TcpStream},
};

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use wireline_core::{
    config::Config,
    error::{ErrorKind, Result},
};

/// Applies the library-wide socket options from configuration.
fn apply_socket_options(socket: &Socket, config: &Config) -> io::Result<()> {
    socket.set_nodelay(config.nodelay)?;

    if config.reuse_address {
        // SO_REUSEPORT where the OS offers it, SO_REUSEADDR elsewhere.
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        #[cfg(not(unix))]
        socket.set_reuse_address(true)?;
    }

    if let Some(size) = config.socket_recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }
    if let Some(size) = config.socket_send_buffer_size {
        socket.set_send_buffer_size(size)?;
    }

    Ok(())
}

/// Creates a TCP socket for the family of `address` with options applied.
fn create_tcp_socket(address: &SocketAddr, config: &Config) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(*address), Type::STREAM, Some(Protocol::TCP))?;
    apply_socket_options(&socket, config)?;
    Ok(socket)
}

/// Connects to `address` and hands back a blocking stream.
pub(crate) fn connect_stream(address: SocketAddr, config: &Config) -> io::Result<TcpStream> {
    let socket = create_tcp_socket(&address, config)?;
    socket.connect(&address.into())?;
    Ok(socket.into())
}

/// Binds and listens on `address`.
///
/// The listener is left non-blocking so the accept loop can interleave accept
/// attempts with stop-flag checks.
pub(crate) fn create_listener(address: SocketAddr, config: &Config) -> Result<TcpListener> {
    let socket = create_tcp_socket(&address, config).map_err(ErrorKind::BindFailed)?;
    socket.bind(&address.into()).map_err(ErrorKind::BindFailed)?;
    socket.listen(config.listen_backlog).map_err(ErrorKind::ListenFailed)?;
    let listener = TcpListener::from(socket);
    listener.set_nonblocking(true).map_err(ErrorKind::ListenFailed)?;
    Ok(listener)
}

/// Restores blocking mode on an accepted peer and re-applies the socket
/// options; accepted sockets do not reliably inherit them from the listener.
pub(crate) fn prepare_accepted(stream: &TcpStream, config: &Config) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    apply_socket_options(&SockRef::from(stream), config)
}
