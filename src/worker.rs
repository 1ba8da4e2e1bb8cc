//! Mux Worker
//!
//! Serializes access from many threads onto one mux.
//!
//! ## Responsibilities
//! - Own the mux on a dedicated thread
//! - Apply requests strictly in arrival order, one at a time
//! - Hand the mux back, flushed, on shutdown
//!
//! ```text
//!  MuxClient ─┐
//!  MuxClient ─┼──▶ bounded queue ──▶ worker thread ──▶ StoreMux
//!  MuxClient ─┘        ▲                   │
//!                      └── reply (1 slot) ◀┘
//! ```

use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::error::{MuxError, Result};
use crate::mux::{Span, StoreMux};
use crate::store::StoreProvider;
use crate::view::ReadableSpace;

type Reply<T> = Sender<Result<T>>;

/// One queued operation and where to send its result
enum Request {
    GetByte { offset: u64, reply: Reply<u8> },
    SetByte { offset: u64, value: u8, reply: Reply<()> },
    Read { span: Span, reply: Reply<Bytes> },
    Write { data: Bytes, span: Span, reply: Reply<()> },
    Flush { reply: Reply<()> },
    Shutdown,
}

/// Owns a mux on a background thread
///
/// Prefer [`MuxWorker::shutdown`], which flushes and reports save errors.
/// Dropping the worker still stops the thread and drops the mux in place,
/// so writes not yet saved are discarded unless `Config::flush_on_drop` is
/// set.
pub struct MuxWorker<P: StoreProvider> {
    client: MuxClient,
    /// Taken by `shutdown` or `drop`
    thread: Option<JoinHandle<StoreMux<P>>>,
}

impl<P> MuxWorker<P>
where
    P: StoreProvider + Send + 'static,
    P::Id: Send + 'static,
    P::Handle: Send + 'static,
{
    /// Move `mux` onto a new worker thread
    ///
    /// Queue capacity comes from `Config::worker_queue_size`.
    pub fn spawn(mux: StoreMux<P>) -> Result<Self> {
        let (requests, inbox) = bounded(mux.config().worker_queue_size);
        let len = mux.len();

        let thread = thread::Builder::new()
            .name("stashmux-worker".to_string())
            .spawn(move || run(mux, inbox))?;

        Ok(Self {
            client: MuxClient { requests, len },
            thread: Some(thread),
        })
    }

    /// A new client handle onto this worker
    pub fn client(&self) -> MuxClient {
        self.client.clone()
    }

    /// Stop the worker after all queued requests and return the mux
    ///
    /// The mux is flushed before it is returned. Requests sent after this
    /// point fail with `WorkerStopped`.
    pub fn shutdown(mut self) -> Result<StoreMux<P>> {
        let thread = self.thread.take().ok_or(MuxError::WorkerStopped)?;

        // The worker may already be gone; join reports that below
        let _ = self.client.requests.send(Request::Shutdown);
        let mut mux = thread.join().map_err(|_| MuxError::WorkerStopped)?;
        mux.flush()?;
        Ok(mux)
    }
}

impl<P: StoreProvider> Drop for MuxWorker<P> {
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        // Other clients may still hold senders, so stop the loop explicitly
        let _ = self.client.requests.send(Request::Shutdown);
        match thread.join() {
            // Dropping the mux here applies its flush-on-drop setting
            Ok(mux) => drop(mux),
            Err(_) => warn!("Mux worker panicked, unsaved writes discarded"),
        }
    }
}

/// Worker loop; ends on `Shutdown` or when every client is dropped
fn run<P: StoreProvider>(mut mux: StoreMux<P>, inbox: Receiver<Request>) -> StoreMux<P> {
    debug!(len = mux.len(), stores = mux.store_count(), "Mux worker started");

    // A failed reply send only means the caller stopped waiting
    for request in inbox.iter() {
        match request {
            Request::GetByte { offset, reply } => {
                let _ = reply.send(mux.get_byte(offset));
            }
            Request::SetByte {
                offset,
                value,
                reply,
            } => {
                let _ = reply.send(mux.set_byte(offset, value));
            }
            Request::Read { span, reply } => {
                let _ = reply.send(mux.read(span));
            }
            Request::Write { data, span, reply } => {
                let _ = reply.send(mux.write_span(&data, span));
            }
            Request::Flush { reply } => {
                let _ = reply.send(mux.flush());
            }
            Request::Shutdown => break,
        }
    }

    debug!("Mux worker stopped");
    mux
}

/// Cloneable handle for submitting requests to a [`MuxWorker`]
///
/// Each call blocks until the worker has applied it.
#[derive(Debug, Clone)]
pub struct MuxClient {
    requests: Sender<Request>,
    /// Address space size, fixed for the worker's lifetime
    len: u64,
}

impl MuxClient {
    /// Total size of the address space
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get_byte(&self, offset: u64) -> Result<u8> {
        self.call(|reply| Request::GetByte { offset, reply })
    }

    pub fn set_byte(&self, offset: u64, value: u8) -> Result<()> {
        self.call(|reply| Request::SetByte {
            offset,
            value,
            reply,
        })
    }

    pub fn read(&self, span: Span) -> Result<Bytes> {
        self.call(|reply| Request::Read { span, reply })
    }

    /// Write all of `data` at `offset`
    pub fn write(&self, data: impl Into<Bytes>, offset: u64) -> Result<()> {
        self.write_span(data, Span::from_offset(offset))
    }

    /// Write the first `span.length` bytes of `data` at `span.offset`
    pub fn write_span(&self, data: impl Into<Bytes>, span: Span) -> Result<()> {
        let data = data.into();
        self.call(|reply| Request::Write { data, span, reply })
    }

    pub fn flush(&self) -> Result<()> {
        self.call(|reply| Request::Flush { reply })
    }

    /// Queue a request and wait for its reply
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, response) = bounded(1);
        self.requests
            .send(make(reply))
            .map_err(|_| MuxError::WorkerStopped)?;
        response.recv().map_err(|_| MuxError::WorkerStopped)?
    }
}

impl ReadableSpace for MuxClient {
    fn len(&self) -> u64 {
        self.len
    }

    fn get_byte(&mut self, offset: u64) -> Result<u8> {
        MuxClient::get_byte(self, offset)
    }

    fn read(&mut self, span: Span) -> Result<Bytes> {
        MuxClient::read(self, span)
    }
}
