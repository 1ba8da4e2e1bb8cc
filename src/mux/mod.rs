//! Store Multiplexer
//!
//! Routes global-offset operations to the backing store that holds them.
//!
//! ## Responsibilities
//! - Translate global offsets to `(store, local offset)`
//! - Keep exactly one store open, flushing it before switching away
//! - Split reads and writes that cross store boundaries
//!
//! ## Store Slot Lifecycle
//! ```text
//!   Closed ──open──▶ Open(clean) ──set/write──▶ Open(dirty)
//!                        ▲                          │
//!                        │      flush (if dirty)    │
//!                        └──── open next store ◀────┘
//! ```

mod span;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::{describe_id, MuxError, Result};
use crate::index::{AddressIndex, IndexBuilder};
use crate::store::{StoreHandle, StoreProvider};

pub use span::Span;
use span::check_bounds;

/// The currently open backing store
struct OpenStoreSlot<H> {
    /// Position of the store in the index
    store: usize,
    handle: H,
    /// Mutated since the last successful save
    dirty: bool,
}

/// Presents an ordered list of backing stores as one address space
///
/// ## Concurrency:
/// Every operation takes `&mut self`, so one operation runs at a time and
/// the open-store slot can never be switched underneath another call.
/// Share a mux between threads through [`crate::worker::MuxWorker`].
pub struct StoreMux<P: StoreProvider> {
    config: Config,

    /// Opens stores on demand
    provider: P,

    /// Immutable after construction
    index: AddressIndex<P::Id>,

    /// At most one open store
    slot: Option<OpenStoreSlot<P::Handle>>,
}

impl<P: StoreProvider> StoreMux<P> {
    /// Index `identifiers` and build a mux with the default config
    pub fn open(provider: P, identifiers: impl IntoIterator<Item = P::Id>) -> Result<Self> {
        Self::with_config(provider, identifiers, Config::default())
    }

    /// Index `identifiers` and build a mux
    ///
    /// Every store is opened once, in order, to learn its length. No store
    /// stays open afterwards.
    pub fn with_config(
        provider: P,
        identifiers: impl IntoIterator<Item = P::Id>,
        config: Config,
    ) -> Result<Self> {
        config.validate()?;
        let index = IndexBuilder::build(&provider, identifiers)?;
        Ok(Self::from_index(provider, index, config))
    }

    /// Build a mux over an existing index
    pub fn from_index(provider: P, index: AddressIndex<P::Id>, config: Config) -> Self {
        Self {
            config,
            provider,
            index,
            slot: None,
        }
    }

    // =========================================================================
    // Byte Access
    // =========================================================================

    /// Read the byte at `offset`
    pub fn get_byte(&mut self, offset: u64) -> Result<u8> {
        check_bounds(offset, 1, self.len())?;
        let (store, local) = self.locate(offset)?;

        self.with_store(store, |slot| slot.handle.get_byte(local))
    }

    /// Overwrite the byte at `offset`
    pub fn set_byte(&mut self, offset: u64, value: u8) -> Result<()> {
        check_bounds(offset, 1, self.len())?;
        let (store, local) = self.locate(offset)?;

        self.with_store(store, |slot| {
            slot.handle.set_byte(local, value)?;
            slot.dirty = true;
            Ok(())
        })
    }

    // =========================================================================
    // Range Access
    // =========================================================================

    /// Read the bytes covered by `span`
    ///
    /// The range is split at store boundaries and the pieces concatenated
    /// in address order. A zero-length read returns an empty buffer without
    /// opening anything.
    pub fn read(&mut self, span: Span) -> Result<Bytes> {
        let (offset, length) = span.for_read(self.len())?;
        if length == 0 {
            return Ok(Bytes::new());
        }

        let mut out = BytesMut::with_capacity(length as usize);
        let mut cursor = offset;
        let mut remaining = length;

        while remaining > 0 {
            let (store, local) = self.locate(cursor)?;

            let chunk = self.with_store(store, |slot| {
                let take = remaining.min(available(&slot.handle, local)?);
                slot.handle.read(local, take)
            })?;

            trace!(store, local, len = chunk.len(), "Read chunk");
            cursor += chunk.len() as u64;
            remaining -= chunk.len() as u64;
            out.extend_from_slice(&chunk);
        }

        Ok(out.freeze())
    }

    /// Read the whole address space
    pub fn read_all(&mut self) -> Result<Bytes> {
        self.read(Span::all())
    }

    /// Read from `offset` to the end
    pub fn read_from(&mut self, offset: u64) -> Result<Bytes> {
        self.read(Span::from_offset(offset))
    }

    /// Read exactly `length` bytes at `offset`
    pub fn read_at(&mut self, offset: u64, length: u64) -> Result<Bytes> {
        self.read(Span::new(offset, length))
    }

    /// Write all of `data` starting at `offset`
    pub fn write(&mut self, data: &[u8], offset: u64) -> Result<()> {
        self.write_span(data, Span::from_offset(offset))
    }

    /// Write the first `span.length` bytes of `data` at `span.offset`
    ///
    /// A write crossing store boundaries fills each store in turn, marking
    /// each one dirty. If a later piece fails, earlier pieces stay applied.
    pub fn write_span(&mut self, data: &[u8], span: Span) -> Result<()> {
        let (offset, length) = span.for_write(data.len() as u64, self.len())?;
        if length == 0 {
            return Ok(());
        }

        let mut pending = &data[..length as usize];
        let mut cursor = offset;

        while !pending.is_empty() {
            let (store, local) = self.locate(cursor)?;

            let written = self.with_store(store, |slot| {
                let take = (pending.len() as u64).min(available(&slot.handle, local)?);
                slot.handle.write(&pending[..take as usize], local)?;
                slot.dirty = true;
                Ok(take)
            })?;

            trace!(store, local, len = written, "Wrote chunk");
            cursor += written;
            pending = &pending[written as usize..];
        }

        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save the open store if it has unsaved changes
    ///
    /// A no-op when nothing is open or the open store is clean.
    pub fn flush(&mut self) -> Result<()> {
        let Some(slot) = self.slot.as_mut() else {
            return Ok(());
        };
        if !slot.dirty {
            return Ok(());
        }

        let entry = &self.index.stores()[slot.store];
        slot.handle.save().map_err(|source| MuxError::StoreSave {
            identifier: describe_id(&entry.identifier),
            source,
        })?;
        slot.dirty = false;

        debug!(store = slot.store, identifier = ?entry.identifier, "Flushed store");
        Ok(())
    }

    /// Flush and release the open store
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.slot = None;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Total size of the address space
    pub fn len(&self) -> u64 {
        self.index.total_length()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of backing stores
    pub fn store_count(&self) -> usize {
        self.index.store_count()
    }

    /// The address index
    pub fn index(&self) -> &AddressIndex<P::Id> {
        &self.index
    }

    /// Index of the currently open store, if any
    pub fn open_store(&self) -> Option<usize> {
        self.slot.as_ref().map(|slot| slot.store)
    }

    /// True if the open store has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.slot.as_ref().is_some_and(|slot| slot.dirty)
    }

    /// The provider stores are opened through
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Map a global offset to `(store, local offset)`
    fn locate(&self, offset: u64) -> Result<(usize, u64)> {
        let store = self
            .index
            .resolve(offset, self.config.resolve_strategy)
            .ok_or_else(|| MuxError::out_of_bounds(offset, 1, self.len()))?;
        let local = offset - self.index.stores()[store].start_offset;
        Ok((store, local))
    }

    /// Make `store` the open store
    ///
    /// A cache hit returns at once with no I/O. Otherwise the current store
    /// is flushed first; if the flush or the open fails, the slot is left
    /// as it was (clean after a successful flush).
    fn ensure_open(&mut self, store: usize) -> Result<&mut OpenStoreSlot<P::Handle>> {
        let slot = match self.slot.take() {
            Some(slot) if slot.store == store => slot,
            previous => {
                // Put the old slot back so flush sees it and failures keep it
                self.slot = previous;
                self.flush()?;
                let handle = self.open_handle(store)?;

                debug!(
                    store,
                    previous = ?self.open_store(),
                    "Switched open store"
                );
                OpenStoreSlot {
                    store,
                    handle,
                    dirty: false,
                }
            }
        };

        Ok(self.slot.insert(slot))
    }

    /// Open `store` through the provider and check its length
    fn open_handle(&self, store: usize) -> Result<P::Handle> {
        let entry = &self.index.stores()[store];
        let handle = self
            .provider
            .open(&entry.identifier)
            .map_err(|source| MuxError::StoreOpen {
                identifier: describe_id(&entry.identifier),
                source,
            })?;

        if self.config.verify_store_lengths && handle.len() != entry.length {
            return Err(MuxError::StoreResized {
                identifier: describe_id(&entry.identifier),
                expected: entry.length,
                actual: handle.len(),
            });
        }

        Ok(handle)
    }

    /// Run `op` against `store`, opening it first if needed
    fn with_store<T>(
        &mut self,
        store: usize,
        op: impl FnOnce(&mut OpenStoreSlot<P::Handle>) -> std::io::Result<T>,
    ) -> Result<T> {
        let slot = self.ensure_open(store)?;
        op(slot).map_err(|source| MuxError::StoreAccess {
            identifier: describe_id(&self.index.stores()[store].identifier),
            source,
        })
    }
}

impl<P: StoreProvider> Drop for StoreMux<P> {
    fn drop(&mut self) {
        if !self.config.flush_on_drop || !self.is_dirty() {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "Flush on drop failed, unsaved writes discarded");
        }
    }
}

/// Bytes a handle can serve from `local` to its end
///
/// Zero means the store is shorter than the index claims; treated as an
/// error so a range loop can never stall.
fn available<H: StoreHandle>(handle: &H, local: u64) -> std::io::Result<u64> {
    match handle.len().checked_sub(local) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("store ends before local offset {local}"),
        )),
    }
}
