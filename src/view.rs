//! Read-only access
//!
//! [`ReadableSpace`] is the read half of the mux surface. [`ReadOnlyMux`]
//! borrows a mux and exposes only that half, so nothing reached through it
//! can mark a store dirty or trigger a save.

use bytes::Bytes;

use crate::error::Result;
use crate::mux::{Span, StoreMux};
use crate::store::StoreProvider;

/// Byte-addressable space that can be read
pub trait ReadableSpace {
    /// Total size of the address space
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the byte at `offset`
    fn get_byte(&mut self, offset: u64) -> Result<u8>;

    /// Read the bytes covered by `span`
    fn read(&mut self, span: Span) -> Result<Bytes>;

    /// Read the whole address space
    fn read_all(&mut self) -> Result<Bytes> {
        self.read(Span::all())
    }
}

impl<P: StoreProvider> ReadableSpace for StoreMux<P> {
    fn len(&self) -> u64 {
        StoreMux::len(self)
    }

    fn get_byte(&mut self, offset: u64) -> Result<u8> {
        StoreMux::get_byte(self, offset)
    }

    fn read(&mut self, span: Span) -> Result<Bytes> {
        StoreMux::read(self, span)
    }
}

/// Read-only view of a mux
pub struct ReadOnlyMux<'a, P: StoreProvider> {
    inner: &'a mut StoreMux<P>,
}

impl<'a, P: StoreProvider> ReadOnlyMux<'a, P> {
    pub fn new(inner: &'a mut StoreMux<P>) -> Self {
        Self { inner }
    }

    /// Number of backing stores
    pub fn store_count(&self) -> usize {
        self.inner.store_count()
    }
}

impl<P: StoreProvider> ReadableSpace for ReadOnlyMux<'_, P> {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn get_byte(&mut self, offset: u64) -> Result<u8> {
        self.inner.get_byte(offset)
    }

    fn read(&mut self, span: Span) -> Result<Bytes> {
        self.inner.read(span)
    }
}

impl<P: StoreProvider> StoreMux<P> {
    /// Borrow this mux as a read-only view
    pub fn read_only(&mut self) -> ReadOnlyMux<'_, P> {
        ReadOnlyMux::new(self)
    }
}
