//! One-shot eventual results.
//!
//! A [`Promise`] is the completion side of an asynchronous operation, a
//! [`FutureHandle`] the awaiting side. The pair is a thin layer over the
//! rendezvous channel: the channel's single slot carries the one result, and
//! consuming the promise on completion makes a second completion impossible
//! at the type level.

use wireline_core::error::{ErrorKind, Result};

use crate::channel::{channel, Receiver, Sender};

/// Creates a connected promise/future pair.
pub fn promised<T>() -> (Promise<T>, FutureHandle<T>) {
    let (sender, receiver) = channel();
    (Promise { sender }, FutureHandle { receiver })
}

/// Completion side of an eventual result.
pub struct Promise<T> {
    sender: Sender<Result<T>>,
}

impl<T> Promise<T> {
    /// Completes the operation with a value.
    ///
    /// Completing a detached operation (its handle was dropped) is a no-op.
    pub fn fulfill(self, value: T) {
        let _ = self.sender.try_send(Ok(value));
    }

    /// Completes the operation with an error; the error is raised when the
    /// handle is awaited.
    pub fn fail(self, error: ErrorKind) {
        let _ = self.sender.try_send(Err(error));
    }
}

/// Consumer side of an eventual result.
///
/// Dropping the handle detaches the operation: it still runs, its outcome is
/// discarded.
pub struct FutureHandle<T> {
    receiver: Receiver<Result<T>>,
}

impl<T> FutureHandle<T> {
    /// Blocks until the operation completes and returns its result.
    ///
    /// A promise dropped without completing surfaces as
    /// [`ErrorKind::ChannelClosed`].
    pub fn get(self) -> Result<T> {
        match self.receiver.receive() {
            Ok(result) => result,
            Err(_) => Err(ErrorKind::ChannelClosed),
        }
    }

    /// Polls for the result without blocking.
    pub fn try_get(&self) -> Option<Result<T>> {
        self.receiver.try_receive()
    }
}
