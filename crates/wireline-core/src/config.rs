use std::{default::Default, time::Duration};

use crate::constants::{
    ACCEPT_POLL_INTERVAL, DEFAULT_LISTEN_BACKLOG, DEFAULT_RECEIVE_TIMEOUT, RECEIVE_POLL_INTERVAL,
};

#[derive(Clone, Debug)]
/// Configuration options to tune socket behavior and worker timing.
pub struct Config {
    /// Disable Nagle's algorithm on every socket (client, listener, accepted peer).
    pub nodelay: bool,
    /// Allow rebinding a recently used address (SO_REUSEPORT on POSIX,
    /// SO_REUSEADDR on Windows).
    pub reuse_address: bool,
    /// Backlog for the listening socket.
    pub listen_backlog: i32,
    /// How long the listener sleeps between accept attempts when idle.
    pub accept_poll_interval: Duration,
    /// Read-timeout tick of the receive worker. Smaller values react faster
    /// to deadlines and shutdown at the cost of more wakeups.
    pub receive_poll_interval: Duration,
    /// Deadline applied to receive operations that carry no explicit timeout.
    pub receive_timeout: Duration,
    /// Socket receive buffer size in bytes (None = system default).
    pub socket_recv_buffer_size: Option<usize>,
    /// Socket send buffer size in bytes (None = system default).
    pub socket_send_buffer_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nodelay: true,
            reuse_address: true,
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            accept_poll_interval: ACCEPT_POLL_INTERVAL,
            receive_poll_interval: RECEIVE_POLL_INTERVAL,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            socket_recv_buffer_size: None, // Use system default
            socket_send_buffer_size: None, // Use system default
        }
    }
}
