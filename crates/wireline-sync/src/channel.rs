//! Capacity-one rendezvous channel.
//!
//! A [`Sender`]/[`Receiver`] pair shares a slot holding at most one value.
//! The sender blocks while the slot is occupied, the receiver blocks while it
//! is empty. Dropping either endpoint closes the channel and wakes the
//! counterpart; a value already handed over survives the close and can still
//! be received.

use std::{
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
};

/// Creates a connected sender/receiver pair.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let state = Arc::new(State {
        slot: Mutex::new(Slot { value: None, is_open: true }),
        changed: Condvar::new(),
    });
    (Sender { state: Arc::clone(&state) }, Receiver { state })
}

struct Slot<T> {
    value: Option<T>,
    is_open: bool,
}

struct State<T> {
    slot: Mutex<Slot<T>>,
    changed: Condvar,
}

impl<T> State<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        let mut slot = self.lock();
        slot.is_open = false;
        drop(slot);
        self.changed.notify_all();
    }
}

/// The channel closed before the value could be handed over; the value is
/// returned to the caller.
pub struct SendError<T>(pub T);

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendError(..)")
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sending on a closed channel")
    }
}

impl<T> std::error::Error for SendError<T> {}

/// Outcome of a non-blocking send attempt; both variants hand the value back.
pub enum TrySendError<T> {
    /// The slot already holds an undelivered value.
    Full(T),
    /// The channel has closed.
    Closed(T),
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("channel slot is occupied"),
            TrySendError::Closed(_) => f.write_str("sending on a closed channel"),
        }
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// The channel closed with no value left to receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiveError;

impl fmt::Display for ReceiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("receiving on a closed channel")
    }
}

impl std::error::Error for ReceiveError {}

/// Sending half of a rendezvous channel.
pub struct Sender<T> {
    state: Arc<State<T>>,
}

impl<T> Sender<T> {
    /// Hands a value over, blocking while the slot is occupied.
    ///
    /// Waiting ends either when the receiver takes the previous value or when
    /// the channel closes; close wins and the value is returned unsent.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let guard = self.state.lock();
        let mut slot = self
            .state
            .changed
            .wait_while(guard, |slot| slot.is_open && slot.value.is_some())
            .unwrap_or_else(PoisonError::into_inner);
        if !slot.is_open {
            return Err(SendError(value));
        }
        slot.value = Some(value);
        drop(slot);
        self.state.changed.notify_all();
        Ok(())
    }

    /// Attempts to hand a value over without blocking.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut slot = self.state.lock();
        if !slot.is_open {
            return Err(TrySendError::Closed(value));
        }
        if slot.value.is_some() {
            return Err(TrySendError::Full(value));
        }
        slot.value = Some(value);
        drop(slot);
        self.state.changed.notify_all();
        Ok(())
    }

    /// Returns whether both endpoints are still alive.
    pub fn is_open(&self) -> bool {
        self.state.lock().is_open
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.state.close();
    }
}

/// Receiving half of a rendezvous channel.
pub struct Receiver<T> {
    state: Arc<State<T>>,
}

impl<T> Receiver<T> {
    /// Takes the next value, blocking while the slot is empty.
    ///
    /// A value handed over before the close is still delivered; only a closed
    /// and empty channel fails.
    pub fn receive(&self) -> Result<T, ReceiveError> {
        let guard = self.state.lock();
        let mut slot = self
            .state
            .changed
            .wait_while(guard, |slot| slot.is_open && slot.value.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        match slot.value.take() {
            Some(value) => {
                drop(slot);
                self.state.changed.notify_all();
                Ok(value)
            }
            None => Err(ReceiveError),
        }
    }

    /// Takes the value if one is present, without blocking. Drains even after
    /// the channel has closed.
    pub fn try_receive(&self) -> Option<T> {
        let mut slot = self.state.lock();
        let value = slot.value.take();
        if value.is_some() {
            drop(slot);
            self.state.changed.notify_all();
        }
        value
    }

    /// Returns whether both endpoints are still alive.
    pub fn is_open(&self) -> bool {
        self.state.lock().is_open
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.state.close();
    }
}

/// Both directions bundled: each end of a pair can send to and receive from
/// the other.
pub struct BidirectionalChannel<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

/// Creates two crossed endpoints: what one sends, the other receives.
pub fn bidirectional_channel<T>() -> (BidirectionalChannel<T>, BidirectionalChannel<T>) {
    let (sender_a, receiver_a) = channel();
    let (sender_b, receiver_b) = channel();
    (
        BidirectionalChannel { sender: sender_a, receiver: receiver_b },
        BidirectionalChannel { sender: sender_b, receiver: receiver_a },
    )
}

impl<T> BidirectionalChannel<T> {
    /// Hands a value to the other end, blocking while its slot is occupied.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.sender.send(value)
    }

    /// Attempts to hand a value to the other end without blocking.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.sender.try_send(value)
    }

    /// Takes the next value from the other end, blocking while none is there.
    pub fn receive(&self) -> Result<T, ReceiveError> {
        self.receiver.receive()
    }

    /// Takes a value from the other end if one is present.
    pub fn try_receive(&self) -> Option<T> {
        self.receiver.try_receive()
    }

    /// Returns whether both directions are still alive.
    pub fn is_open(&self) -> bool {
        self.sender.is_open() && self.receiver.is_open()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn single_value_crosses_threads() {
        let (sender, receiver) = channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            sender.send(42).unwrap();
        });
        assert_eq!(receiver.receive().unwrap(), 42);
        handle.join().unwrap();
    }

    #[test]
    fn many_values_arrive_in_order() {
        const COUNT: usize = 10_000;
        let (sender, receiver) = channel();
        let handle = thread::spawn(move || {
            for i in 0..COUNT {
                sender.send(i).unwrap();
            }
        });
        for i in 0..COUNT {
            assert_eq!(receiver.receive().unwrap(), i);
        }
        handle.join().unwrap();
    }

    #[test]
    fn closed_channel_rejects_operations() {
        let (sender, receiver) = channel::<u32>();
        drop(receiver);
        assert!(matches!(sender.send(42), Err(SendError(42))));
        assert!(!sender.is_open());

        let (sender, receiver) = channel::<u32>();
        drop(sender);
        assert_eq!(receiver.receive(), Err(ReceiveError));
        assert!(!receiver.is_open());
    }

    #[test]
    fn buffered_value_survives_the_close() {
        let (sender, receiver) = channel();
        sender.send(42).unwrap();
        drop(sender);

        assert!(!receiver.is_open());
        assert_eq!(receiver.receive().unwrap(), 42);
        assert_eq!(receiver.receive(), Err(ReceiveError));
    }

    #[test]
    fn try_receive_drains_after_close() {
        let (sender, receiver) = channel();
        sender.send(7).unwrap();
        drop(sender);

        assert_eq!(receiver.try_receive(), Some(7));
        assert_eq!(receiver.try_receive(), None);
    }

    #[test]
    fn try_send_reports_full_and_closed() {
        let (sender, receiver) = channel();
        sender.try_send(1).unwrap();
        assert!(matches!(sender.try_send(2), Err(TrySendError::Full(2))));

        drop(receiver);
        assert!(matches!(sender.try_send(3), Err(TrySendError::Closed(3))));
    }

    #[test]
    fn blocked_sender_wakes_on_close() {
        let (sender, receiver) = channel();
        sender.send(1).unwrap();

        let handle = thread::spawn(move || sender.send(2));
        thread::sleep(Duration::from_millis(50));
        drop(receiver);

        assert!(handle.join().unwrap().is_err());
    }

    #[test]
    fn bidirectional_pair_exchanges_values() {
        const COUNT: i32 = 1_000;
        let (left, right) = bidirectional_channel();

        let handle = thread::spawn(move || {
            for i in 0..COUNT {
                right.send(i).unwrap();
                assert_eq!(right.receive().unwrap(), i);
            }
        });

        for i in 0..COUNT {
            assert_eq!(left.receive().unwrap(), i);
            left.send(i).unwrap();
        }
        handle.join().unwrap();
    }
}
