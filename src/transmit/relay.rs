//! Relay destination
//!
//! Hands transmissions from the UI thread to a worker thread over an rtrb
//! SPSC ring buffer. The UI side never blocks: when the buffer is full the
//! transmission is dropped. The worker writes each transmission to a
//! `RelaySink`, one JSON object per line.

use std::io::{self, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use super::Transmission;
use crate::error::{ManagerError, ManagerResult};

/// Default number of transmissions the relay queue can hold.
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 1024;

/// How long the worker sleeps when the queue is empty.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Upper bound for connecting to, and writing to, a TCP endpoint.
const TCP_TIMEOUT: Duration = Duration::from_millis(250);

/// Where relayed transmissions end up. Runs on the worker thread.
pub trait RelaySink: Send + 'static {
    fn send(&mut self, transmission: &Transmission) -> io::Result<()>;
}

/// Writes `{"path": "/widget/event", "value": ...}` followed by a newline.
pub fn write_json_line<W: Write>(writer: &mut W, transmission: &Transmission) -> io::Result<()> {
    let line = serde_json::json!({
        "path": transmission.osc_path(),
        "value": transmission.value,
    });
    serde_json::to_writer(&mut *writer, &line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Sends JSON lines to a TCP endpoint (`host:port`).
///
/// Connects on first use. A failed write drops the connection and the
/// transmission; the next transmission reconnects.
pub struct TcpRelaySink {
    endpoint: String,
    stream: Option<BufWriter<TcpStream>>,
}

impl TcpRelaySink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            stream: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RelaySink for TcpRelaySink {
    fn send(&mut self, transmission: &Transmission) -> io::Result<()> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => BufWriter::new(connect(&self.endpoint)?),
        };
        let result = write_json_line(&mut stream, transmission);
        if result.is_ok() {
            self.stream = Some(stream);
        }
        result
    }
}

/// Connects to the first address `endpoint` resolves to.
fn connect(endpoint: &str) -> io::Result<TcpStream> {
    let addr = endpoint.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("no address for {endpoint}"))
    })?;
    let stream = TcpStream::connect_timeout(&addr, TCP_TIMEOUT)?;
    stream.set_write_timeout(Some(TCP_TIMEOUT))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// UI-side handle to a running relay worker.
///
/// Dropping the handle signals the worker and returns at once. The worker
/// finishes the send in progress, if any, and discards whatever is still
/// queued.
pub struct RelayHandle {
    endpoint: String,
    producer: Producer<Transmission>,
    capacity: usize,
    running: Arc<AtomicBool>,
}

impl RelayHandle {
    /// Starts a worker thread feeding `sink`.
    pub fn spawn<S: RelaySink>(
        endpoint: impl Into<String>,
        sink: S,
        capacity: usize,
    ) -> ManagerResult<Self> {
        let endpoint = endpoint.into();
        let (producer, consumer) = RingBuffer::new(capacity);
        let running = Arc::new(AtomicBool::new(true));

        // The join handle is dropped: the worker is never waited on.
        thread::Builder::new()
            .name(format!("relay:{endpoint}"))
            .spawn({
                let running = Arc::clone(&running);
                move || run_worker(consumer, sink, running)
            })
            .map_err(ManagerError::RelaySpawn)?;

        tracing::info!(%endpoint, capacity, "relay worker started");

        Ok(Self {
            endpoint,
            producer,
            capacity,
            running,
        })
    }

    /// Starts a worker writing to a TCP endpoint.
    pub fn connect(endpoint: impl Into<String>) -> ManagerResult<Self> {
        let endpoint = endpoint.into();
        let sink = TcpRelaySink::new(endpoint.clone());
        Self::spawn(endpoint, sink, DEFAULT_RELAY_BUFFER_SIZE)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Queues a transmission.
    /// Returns Err(transmission) if the buffer is full.
    ///
    /// This is a non-blocking operation.
    pub fn send(&mut self, transmission: Transmission) -> Result<(), Transmission> {
        self.producer
            .push(transmission)
            .map_err(|rtrb::PushError::Full(t)| t)
    }

    /// Queues a transmission, dropping it with a warning if the buffer is full.
    pub fn send_lossy(&mut self, transmission: Transmission) {
        if let Err(dropped) = self.send(transmission) {
            tracing::warn!(
                endpoint = %self.endpoint,
                path = %dropped.osc_path(),
                "relay queue full, transmission dropped"
            );
        }
    }

    /// Check how many transmissions can still be queued.
    pub fn slots_available(&self) -> usize {
        self.producer.slots()
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        let discarded = self.capacity.saturating_sub(self.producer.slots());
        if discarded > 0 {
            tracing::debug!(
                endpoint = %self.endpoint,
                discarded,
                "relay stopped with queued transmissions"
            );
        }
    }
}

fn run_worker<S: RelaySink>(
    mut consumer: Consumer<Transmission>,
    mut sink: S,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Acquire) {
        match consumer.pop() {
            Ok(transmission) => {
                if let Err(err) = sink.send(&transmission) {
                    tracing::warn!(
                        path = %transmission.osc_path(),
                        error = %err,
                        "relay send failed"
                    );
                }
            }
            Err(_) => thread::sleep(IDLE_SLEEP),
        }
    }
}
