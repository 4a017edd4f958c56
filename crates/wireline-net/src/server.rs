//! The acceptor: a listening socket plus its background accept loop.

use std::{
    io,
    net::TcpListener,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, error};
use wireline_core::{config::Config, error::Result};

use crate::{
    address::{wildcard_address, AddressFamily, Endpoint},
    connection::Connection,
    socket::{create_listener, prepare_accepted},
    stack::network_stack,
};

/// A passive endpoint that accepts connections and hands each one to a
/// callback.
///
/// The callback runs on the listener thread, one invocation per accepted
/// peer. Long-running callbacks stall further accepts: move the connection
/// into a worker thread if it should outlive the call.
///
/// Dropping the server stops the listener and joins its thread.
pub struct Server {
    local_address: Endpoint,
    stop_requested: Arc<AtomicBool>,
    listener_thread: Option<JoinHandle<()>>,
}

impl Server {
    pub(crate) fn start(
        family: AddressFamily,
        port: u16,
        config: Config,
        callback: Box<dyn FnMut(Connection) + Send>,
    ) -> Result<Self> {
        network_stack();
        let address = wildcard_address(family, port)?;
        let listener = create_listener(address, &config)?;
        let local_address = Endpoint::from(listener.local_addr()?);

        let stop_requested = Arc::new(AtomicBool::new(false));
        let listener_thread = thread::Builder::new().name("wireline-accept".to_string()).spawn({
            let stop_requested = Arc::clone(&stop_requested);
            move || accept_loop(&listener, &stop_requested, &config, callback)
        })?;

        debug!("server listening on {}", local_address);
        Ok(Self { local_address, stop_requested, listener_thread: Some(listener_thread) })
    }

    /// Asks the listener to stop accepting. Never fails; the thread is joined
    /// when the server is dropped.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// The endpoint the listener is bound to. When created with port 0 this
    /// reveals the ephemeral port the OS picked.
    pub fn local_address(&self) -> &Endpoint {
        &self.local_address
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.listener_thread.take() {
            if thread.join().is_err() {
                error!("listener thread panicked");
            }
        }
    }
}

fn accept_loop(
    listener: &TcpListener,
    stop_requested: &AtomicBool,
    config: &Config,
    mut callback: Box<dyn FnMut(Connection) + Send>,
) {
    while !stop_requested.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, _address)) => {
                if let Err(error) = prepare_accepted(&stream, config) {
                    error!("failed to prepare accepted socket: {}", error);
                    continue;
                }
                match Connection::spawn(stream, config.clone()) {
                    Ok(connection) => callback(connection),
                    Err(error) => error!("failed to start connection workers: {}", error),
                }
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(config.accept_poll_interval);
            }
            Err(error) => {
                error!("error accepting a connection: {}", error);
                thread::sleep(config.accept_poll_interval);
            }
        }
    }
}
