//! The per-connection I/O engine.
//!
//! Each connection couples one blocking TCP stream to two worker threads, one
//! per direction. Callers never touch the stream themselves: `send` and the
//! `receive` family enqueue tasks and hand back future handles, and the
//! workers process the tasks in FIFO order, completing each promise exactly
//! once. Closing the connection (or dropping it) stops both workers and
//! resolves every still-pending handle.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    marker::PhantomData,
    net::TcpStream,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, error};
use wireline_codec::{WireBuffer, WireDecode, WireEncode};
use wireline_core::{
    config::Config,
    constants::MAX_TRANSFER_SIZE,
    error::{ErrorKind, Result},
};
use wireline_sync::{promised, FutureHandle, Guarded, Promise};

use crate::address::Endpoint;

/// How a receive task decides it is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReceiveMode {
    /// Deliver whatever has arrived by the deadline, up to the limit.
    UpTo,
    /// Deliver exactly the requested count, or fail.
    Exact,
}

struct SendTask {
    promise: Promise<usize>,
    data: Vec<u8>,
}

impl SendTask {
    /// Sentinel completion for tasks the stopped engine will never process.
    fn complete_stopped(self) {
        self.promise.fulfill(0);
    }
}

struct ReceiveTask {
    promise: Promise<Vec<u8>>,
    max_num_bytes: usize,
    mode: ReceiveMode,
    deadline: Instant,
}

impl ReceiveTask {
    fn complete_stopped(self) {
        match self.mode {
            ReceiveMode::UpTo => self.promise.fulfill(Vec::new()),
            ReceiveMode::Exact => {
                self.promise.fail(ErrorKind::ReadFailed("connection is closed".to_string()))
            }
        }
    }
}

/// State shared between the connection handle and its two workers.
struct Shared {
    running: AtomicBool,
    send_tasks: Guarded<VecDeque<SendTask>>,
    receive_tasks: Guarded<VecDeque<ReceiveTask>>,
    send_ready: Condvar,
    receive_ready: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            send_tasks: Guarded::new(VecDeque::new()),
            receive_tasks: Guarded::new(VecDeque::new()),
            send_ready: Condvar::new(),
            receive_ready: Condvar::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the running flag and wakes both workers.
    ///
    /// The flag is written under each queue lock: a worker that is between
    /// checking its wait predicate and going to sleep holds the lock, so the
    /// transition cannot slip past it.
    fn stop_running(&self) {
        self.send_tasks.apply(|_| self.running.store(false, Ordering::Release));
        self.receive_tasks.apply(|_| self.running.store(false, Ordering::Release));
        self.send_ready.notify_all();
        self.receive_ready.notify_all();
    }

    /// Completes every queued task with its stopped-engine sentinel.
    fn clear_queues(&self) {
        let drained: Vec<_> = self.send_tasks.apply(|tasks| tasks.drain(..).collect());
        for task in drained {
            task.complete_stopped();
        }
        let drained: Vec<_> = self.receive_tasks.apply(|tasks| tasks.drain(..).collect());
        for task in drained {
            task.complete_stopped();
        }
    }
}

/// A full-duplex TCP connection with asynchronous send and receive.
///
/// Obtained from [`create_client`](crate::create_client) or handed to the
/// server callback per accepted peer. `send` and the `receive` family never
/// block the caller beyond a brief queue lock; the returned handles block
/// whoever awaits them.
///
/// Dropping the connection closes it: both workers are joined and every
/// pending operation resolves before the value is gone.
pub struct Connection {
    shared: Arc<Shared>,
    config: Config,
    local_address: Endpoint,
    remote_address: Endpoint,
    send_worker: Option<JoinHandle<()>>,
    receive_worker: Option<JoinHandle<()>>,
}

impl Connection {
    /// Wraps an established stream and spawns the two worker loops.
    pub(crate) fn spawn(stream: TcpStream, config: Config) -> Result<Self> {
        // The read timeout doubles as the receive worker's poll tick.
        stream.set_read_timeout(Some(config.receive_poll_interval))?;
        let local_address = Endpoint::from(stream.local_addr()?);
        // Established streams always have a peer; stay lenient anyway and
        // fall back to an unspecified endpoint.
        let remote_address = stream.peer_addr().map(Endpoint::from).unwrap_or_default();

        let stream = Arc::new(stream);
        let shared = Arc::new(Shared::new());

        let send_worker = thread::Builder::new().name("wireline-send".to_string()).spawn({
            let shared = Arc::clone(&shared);
            let stream = Arc::clone(&stream);
            move || send_loop(&shared, &stream)
        })?;
        let receive_worker = match thread::Builder::new()
            .name("wireline-receive".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || receive_loop(&shared, &stream)
            }) {
            Ok(worker) => worker,
            Err(spawn_error) => {
                // Let the already-running send worker exit instead of leaking it.
                shared.stop_running();
                return Err(spawn_error.into());
            }
        };

        Ok(Self {
            shared,
            config,
            local_address,
            remote_address,
            send_worker: Some(send_worker),
            receive_worker: Some(receive_worker),
        })
    }

    /// Enqueues `data` for transmission and returns a handle to the eventual
    /// number of bytes written.
    ///
    /// Accepts anything convertible into a byte vector: `Vec<u8>`, `&[u8]`,
    /// `&str`, or a [`WireBuffer`]. Empty payloads are rejected with
    /// [`ErrorKind::SendFailed`]. Once the connection is closed the returned
    /// handle resolves immediately to 0.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<FutureHandle<usize>> {
        let data = data.into();
        if data.is_empty() {
            return Err(ErrorKind::SendFailed("cannot send 0 bytes of data".to_string()));
        }

        let (promise, future) = promised();
        let task = SendTask { promise, data };
        let rejected = self.shared.send_tasks.apply(|tasks| {
            if self.shared.is_running() {
                tasks.push_back(task);
                None
            } else {
                Some(task)
            }
        });
        match rejected {
            None => self.shared.send_ready.notify_all(),
            Some(task) => task.complete_stopped(),
        }
        Ok(future)
    }

    /// Serialises the given scalar or tuple big-endian and sends the bytes.
    pub fn send_values<T: WireEncode>(&self, values: T) -> Result<FutureHandle<usize>> {
        let mut buffer = WireBuffer::new();
        buffer.append(values);
        self.send(buffer)
    }

    /// Receives up to `max_num_bytes`, with the default timeout.
    ///
    /// The handle resolves to whatever arrived first: a single chunk of data,
    /// or an empty vector on timeout or peer close. An elapsed deadline is
    /// never an error for this flavor.
    pub fn receive(&self, max_num_bytes: usize) -> Result<FutureHandle<Vec<u8>>> {
        self.enqueue_receive(max_num_bytes, ReceiveMode::UpTo, None)
    }

    /// Receives up to `max_num_bytes` with an explicit timeout.
    pub fn receive_with_timeout(
        &self,
        max_num_bytes: usize,
        timeout: Duration,
    ) -> Result<FutureHandle<Vec<u8>>> {
        self.enqueue_receive(max_num_bytes, ReceiveMode::UpTo, Some(timeout))
    }

    /// Receives exactly `num_bytes`, with the default timeout.
    ///
    /// The handle fails with [`ErrorKind::TimedOut`] if the deadline elapses
    /// first and with [`ErrorKind::ReadFailed`] if the connection dies
    /// mid-read.
    pub fn receive_exact(&self, num_bytes: usize) -> Result<FutureHandle<Vec<u8>>> {
        self.enqueue_receive(num_bytes, ReceiveMode::Exact, None)
    }

    /// Receives exactly `num_bytes` with an explicit timeout.
    pub fn receive_exact_with_timeout(
        &self,
        num_bytes: usize,
        timeout: Duration,
    ) -> Result<FutureHandle<Vec<u8>>> {
        self.enqueue_receive(num_bytes, ReceiveMode::Exact, Some(timeout))
    }

    /// Receives a typed scalar or tuple, with the default timeout.
    ///
    /// Equivalent to an exact receive of the summed value widths followed by
    /// a big-endian decode.
    pub fn receive_values<T: WireDecode>(&self) -> Result<TypedFuture<T>> {
        Ok(TypedFuture::new(self.receive_exact(T::WIDTH)?))
    }

    /// Receives a typed scalar or tuple with an explicit timeout.
    pub fn receive_values_with_timeout<T: WireDecode>(
        &self,
        timeout: Duration,
    ) -> Result<TypedFuture<T>> {
        Ok(TypedFuture::new(self.receive_exact_with_timeout(T::WIDTH, timeout)?))
    }

    fn enqueue_receive(
        &self,
        max_num_bytes: usize,
        mode: ReceiveMode,
        timeout: Option<Duration>,
    ) -> Result<FutureHandle<Vec<u8>>> {
        if max_num_bytes == 0 {
            return Err(ErrorKind::ReadFailed(
                "trying to receive 0 bytes makes no sense".to_string(),
            ));
        }

        let deadline = Instant::now() + timeout.unwrap_or(self.config.receive_timeout);
        let (promise, future) = promised();
        let task = ReceiveTask { promise, max_num_bytes, mode, deadline };
        let rejected = self.shared.receive_tasks.apply(|tasks| {
            if self.shared.is_running() {
                tasks.push_back(task);
                None
            } else {
                Some(task)
            }
        });
        match rejected {
            None => self.shared.receive_ready.notify_all(),
            Some(task) => task.complete_stopped(),
        }
        Ok(future)
    }

    /// Stops the engine.
    ///
    /// Pending operations resolve with their sentinels (0 for sends, empty
    /// bytes for up-to receives, `ReadFailed` for exact receives), as do any
    /// submitted afterwards. Idempotent; never fails.
    pub fn close(&self) {
        self.shared.stop_running();
        self.shared.clear_queues();
    }

    /// Returns whether the engine is still running.
    pub fn is_connected(&self) -> bool {
        self.shared.is_running()
    }

    /// Local endpoint, captured when the connection was established.
    pub fn local_address(&self) -> &Endpoint {
        &self.local_address
    }

    /// Remote endpoint, captured when the connection was established.
    pub fn remote_address(&self) -> &Endpoint {
        &self.remote_address
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
        if let Some(worker) = self.send_worker.take() {
            if worker.join().is_err() {
                error!("send worker panicked");
            }
        }
        if let Some(worker) = self.receive_worker.take() {
            if worker.join().is_err() {
                error!("receive worker panicked");
            }
        }
        debug!("connection to {} closed", self.remote_address);
    }
}

/// Future handle of a typed receive; decodes on `get`.
pub struct TypedFuture<T> {
    inner: FutureHandle<Vec<u8>>,
    _decoded: PhantomData<fn() -> T>,
}

impl<T: WireDecode> TypedFuture<T> {
    fn new(inner: FutureHandle<Vec<u8>>) -> Self {
        Self { inner, _decoded: PhantomData }
    }

    /// Blocks until the bytes arrive and decodes them big-endian.
    pub fn get(self) -> Result<T> {
        let bytes = self.inner.get()?;
        WireBuffer::from(bytes).try_extract::<T>().ok_or_else(|| {
            ErrorKind::ReadFailed("received fewer bytes than the requested values need".to_string())
        })
    }
}

/// Whether the stream is still usable after processing a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskOutcome {
    Completed,
    PeerDead,
}

fn try_dequeue<T>(queue: &Guarded<VecDeque<T>>) -> Option<T> {
    queue.apply(|tasks| tasks.pop_front())
}

fn send_loop(shared: &Shared, stream: &TcpStream) {
    while shared.is_running() {
        match try_dequeue(&shared.send_tasks) {
            Some(task) => {
                if process_send_task(stream, task) == TaskOutcome::PeerDead {
                    shared.stop_running();
                    break;
                }
            }
            None => shared
                .send_tasks
                .wait(&shared.send_ready, |tasks| !shared.is_running() || !tasks.is_empty()),
        }
    }
    shared.clear_queues();
}

fn receive_loop(shared: &Shared, stream: &TcpStream) {
    while shared.is_running() {
        match try_dequeue(&shared.receive_tasks) {
            Some(task) => {
                if process_receive_task(shared, stream, task) == TaskOutcome::PeerDead {
                    shared.stop_running();
                    break;
                }
            }
            None => shared
                .receive_tasks
                .wait(&shared.receive_ready, |tasks| !shared.is_running() || !tasks.is_empty()),
        }
    }
    shared.clear_queues();
}

fn process_send_task(stream: &TcpStream, task: SendTask) -> TaskOutcome {
    let SendTask { promise, data } = task;
    if data.len() > MAX_TRANSFER_SIZE {
        promise.fail(ErrorKind::PayloadTooLarge(data.len()));
        return TaskOutcome::Completed;
    }

    let mut writer = stream;
    let mut num_bytes_sent = 0;
    while num_bytes_sent < data.len() {
        // The Rust runtime ignores SIGPIPE, so writing to a dead peer
        // surfaces as an error here instead of killing the process.
        match writer.write(&data[num_bytes_sent..]) {
            Ok(0) => {
                promise.fulfill(num_bytes_sent);
                return TaskOutcome::PeerDead;
            }
            Ok(written) => num_bytes_sent += written,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => {
                // Connection no longer active. The task reports how much went
                // out before the stream broke.
                promise.fulfill(num_bytes_sent);
                return TaskOutcome::PeerDead;
            }
        }
    }

    promise.fulfill(num_bytes_sent);
    TaskOutcome::Completed
}

fn process_receive_task(shared: &Shared, stream: &TcpStream, task: ReceiveTask) -> TaskOutcome {
    let ReceiveTask { promise, max_num_bytes, mode, deadline } = task;
    if max_num_bytes > MAX_TRANSFER_SIZE {
        promise.fail(ErrorKind::PayloadTooLarge(max_num_bytes));
        return TaskOutcome::Completed;
    }

    let mut reader = stream;
    let mut collected = Vec::with_capacity(max_num_bytes.min(64 * 1024));
    let mut chunk = vec![0u8; max_num_bytes.min(64 * 1024)];
    loop {
        // A close while this task is in flight must not wait out the full
        // deadline; resolve with the stopped-engine sentinel instead.
        if !shared.is_running() {
            return match mode {
                ReceiveMode::Exact => {
                    promise.fail(ErrorKind::ReadFailed("connection is closed".to_string()));
                    TaskOutcome::Completed
                }
                ReceiveMode::UpTo => {
                    promise.fulfill(collected);
                    TaskOutcome::Completed
                }
            };
        }

        if Instant::now() >= deadline {
            return match mode {
                ReceiveMode::Exact => {
                    promise.fail(ErrorKind::TimedOut);
                    TaskOutcome::Completed
                }
                ReceiveMode::UpTo => {
                    promise.fulfill(collected);
                    TaskOutcome::Completed
                }
            };
        }

        let remaining = (max_num_bytes - collected.len()).min(chunk.len());
        match reader.read(&mut chunk[..remaining]) {
            // The stream's read timeout is the poll tick; on expiry just loop
            // back and re-check the deadline.
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Ok(0) | Err(_) => {
                // Graceful close or connection no longer active.
                return match mode {
                    ReceiveMode::Exact => {
                        promise.fail(ErrorKind::ReadFailed(
                            "connection died before all bytes arrived".to_string(),
                        ));
                        TaskOutcome::PeerDead
                    }
                    ReceiveMode::UpTo => {
                        promise.fulfill(collected);
                        TaskOutcome::PeerDead
                    }
                };
            }
            Ok(received) => {
                collected.extend_from_slice(&chunk[..received]);
                if mode == ReceiveMode::UpTo || collected.len() >= max_num_bytes {
                    promise.fulfill(collected);
                    return TaskOutcome::Completed;
                }
            }
        }
    }
}
