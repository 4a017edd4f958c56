//! Error taxonomy of the library.
//!
//! Construction failures (resolve, bind, listen, connect) surface
//! synchronously from the factory functions. Failures of an in-flight send or
//! receive are stored inside the returned future and raised when the consumer
//! awaits it.

use std::{fmt, io};

/// Convenience alias over [`ErrorKind`].
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// All failures the library can report.
#[derive(Debug)]
pub enum ErrorKind {
    /// Hostname or service resolution produced no usable address.
    ResolveFailed(String),
    /// Binding the listening socket failed.
    BindFailed(io::Error),
    /// Putting the bound socket into listening mode failed.
    ListenFailed(io::Error),
    /// Establishing the outbound connection failed.
    ConnectFailed(io::Error),
    /// The send input was invalid, e.g. an empty payload.
    SendFailed(String),
    /// Receiving failed unrecoverably, or the receive request was invalid.
    ReadFailed(String),
    /// An exact receive did not complete before its deadline.
    TimedOut,
    /// A channel or promise was used after its counterpart was dropped.
    ChannelClosed,
    /// The payload exceeds the transfer size the OS accepts in one call.
    PayloadTooLarge(usize),
    /// Any other OS-level failure.
    IoError(io::Error),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ResolveFailed(msg) => write!(f, "address resolution failed: {}", msg),
            ErrorKind::BindFailed(e) => write!(f, "failed to bind socket: {}", e),
            ErrorKind::ListenFailed(e) => write!(f, "failed to listen on socket: {}", e),
            ErrorKind::ConnectFailed(e) => write!(f, "unable to connect: {}", e),
            ErrorKind::SendFailed(msg) => write!(f, "send failed: {}", msg),
            ErrorKind::ReadFailed(msg) => write!(f, "receive failed: {}", msg),
            ErrorKind::TimedOut => write!(f, "operation timed out"),
            ErrorKind::ChannelClosed => write!(f, "channel has already closed"),
            ErrorKind::PayloadTooLarge(size) => {
                write!(f, "payload of {} bytes exceeds the OS transfer size", size)
            }
            ErrorKind::IoError(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorKind::BindFailed(e)
            | ErrorKind::ListenFailed(e)
            | ErrorKind::ConnectFailed(e)
            | ErrorKind::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(inner: io::Error) -> Self {
        ErrorKind::IoError(inner)
    }
}
