//! Backing Store Module
//!
//! The collaborator contract the multiplexer is built on, plus two
//! ready-made implementations.
//!
//! ## Responsibilities
//! - Open a store from an identifier and report its fixed length
//! - Byte and range access at local offsets
//! - Persist pending mutations on `save()`
//!
//! ## Contract
//! ```text
//! ┌──────────────────┐  open(id)   ┌───────────────────────────────┐
//! │  StoreProvider   │ ──────────▶ │ StoreHandle                   │
//! │  (Id → Handle)   │             │   len()                       │
//! └──────────────────┘             │   get_byte / set_byte         │
//!                                  │   read / write                │
//!                                  │   save()  (no-op when clean)  │
//!                                  └───────────────────────────────┘
//! ```
//!
//! How bytes are physically encoded inside one store is entirely up to
//! the implementation. Every method reports failure through `io::Result`;
//! the multiplexer attaches the store identifier when it surfaces them.

mod file;
mod memory;

use std::fmt::Debug;
use std::io;

pub use file::{FileHandle, FileProvider};
pub use memory::{MemoryHandle, MemoryProvider};

/// Opens backing stores by identifier
pub trait StoreProvider {
    /// Opaque token naming one store (path, key, ...)
    type Id: Clone + Debug;

    /// Live handle to an opened store
    type Handle: StoreHandle;

    /// Open the store named by `id`
    fn open(&self, id: &Self::Id) -> io::Result<Self::Handle>;
}

/// A single opened, fixed-length backing store
///
/// Offsets are local to the store. Callers guarantee that
/// `offset + length <= len()` for every range they pass.
pub trait StoreHandle {
    /// Fixed byte length, known as soon as the store is open
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one byte
    fn get_byte(&mut self, offset: u64) -> io::Result<u8>;

    /// Overwrite one byte
    fn set_byte(&mut self, offset: u64, value: u8) -> io::Result<()>;

    /// Read `length` bytes starting at `offset`
    fn read(&mut self, offset: u64, length: u64) -> io::Result<Vec<u8>>;

    /// Overwrite `data.len()` bytes starting at `offset`
    fn write(&mut self, data: &[u8], offset: u64) -> io::Result<()>;

    /// Persist pending mutations; a no-op when nothing is pending
    fn save(&mut self) -> io::Result<()>;
}

/// Check a local range against a store length
pub(crate) fn check_range(offset: u64, length: u64, store_len: u64) -> io::Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= store_len => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range {offset}+{length} outside store of {store_len} bytes"),
        )),
    }
}
