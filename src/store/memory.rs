//! In-memory backing stores
//!
//! Named byte buffers held behind a shared map. Each handle edits a private
//! working copy and only publishes it on `save()`, so unsaved writes are
//! visible through the handle but not through the provider.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;

use super::{check_range, StoreHandle, StoreProvider};

/// Provider for named in-memory stores
///
/// Cloning is cheap; clones share the same committed contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    /// Committed contents by store name
    stores: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with one zero-filled store per length, named
    /// `store_0`, `store_1`, ... Returns the provider and the names in order.
    pub fn with_lengths(lengths: &[usize]) -> (Self, Vec<String>) {
        let provider = Self::new();
        let names = lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let name = format!("store_{i}");
                provider.insert(name.clone(), vec![0u8; len]);
                name
            })
            .collect();
        (provider, names)
    }

    /// Add or replace a store
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.stores.write().insert(name.into(), data.into());
    }

    /// Committed contents of a store (what the last `save()` published)
    pub fn contents(&self, name: &str) -> Option<Bytes> {
        self.stores.read().get(name).cloned()
    }

    /// Number of stores
    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}

impl StoreProvider for MemoryProvider {
    type Id = String;
    type Handle = MemoryHandle;

    fn open(&self, id: &String) -> io::Result<MemoryHandle> {
        let committed = self.contents(id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no memory store named {id}"))
        })?;

        Ok(MemoryHandle {
            name: id.clone(),
            working: BytesMut::from(&committed[..]),
            pending: false,
            stores: Arc::clone(&self.stores),
        })
    }
}

/// Handle to one opened in-memory store
#[derive(Debug)]
pub struct MemoryHandle {
    name: String,
    /// Private copy, published on save
    working: BytesMut,
    /// Set by any mutation since the last save
    pending: bool,
    stores: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryHandle {
    /// Name this handle was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if there are unsaved mutations
    pub fn has_pending(&self) -> bool {
        self.pending
    }
}

impl StoreHandle for MemoryHandle {
    fn len(&self) -> u64 {
        self.working.len() as u64
    }

    fn get_byte(&mut self, offset: u64) -> io::Result<u8> {
        check_range(offset, 1, self.len())?;
        Ok(self.working[offset as usize])
    }

    fn set_byte(&mut self, offset: u64, value: u8) -> io::Result<()> {
        check_range(offset, 1, self.len())?;
        self.working[offset as usize] = value;
        self.pending = true;
        Ok(())
    }

    fn read(&mut self, offset: u64, length: u64) -> io::Result<Vec<u8>> {
        check_range(offset, length, self.len())?;
        let start = offset as usize;
        Ok(self.working[start..start + length as usize].to_vec())
    }

    fn write(&mut self, data: &[u8], offset: u64) -> io::Result<()> {
        check_range(offset, data.len() as u64, self.len())?;
        let start = offset as usize;
        self.working[start..start + data.len()].copy_from_slice(data);
        self.pending = true;
        Ok(())
    }

    fn save(&mut self) -> io::Result<()> {
        if !self.pending {
            return Ok(());
        }

        let snapshot = Bytes::copy_from_slice(&self.working);
        self.stores.write().insert(self.name.clone(), snapshot);
        self.pending = false;
        Ok(())
    }
}
