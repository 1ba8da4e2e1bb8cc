//! # stashmux
//!
//! Presents an ordered list of fixed-length backing stores as one
//! contiguous, byte-addressable space:
//! - Address index built once from each store's length
//! - One open store at a time, flushed before switching away
//! - Reads and writes that span store boundaries
//! - Read-only views and a serialized worker queue for shared use
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            MuxClient  (many threads, optional)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bounded queue
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     StoreMux                                │
//! │     get_byte / set_byte / read / write / flush              │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │  AddressIndex   │            │  OpenStoreSlot  │
//!   │ (start offsets) │            │ (handle, dirty) │
//!   └─────────────────┘            └────────┬────────┘
//!                                           │
//!                                           ▼
//!                                  ┌─────────────────┐
//!                                  │  StoreProvider  │
//!                                  │ (memory, file)  │
//!                                  └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use stashmux::{MemoryProvider, StoreMux};
//!
//! let (provider, names) = MemoryProvider::with_lengths(&[4, 4]);
//! let mut mux = StoreMux::open(provider, names)?;
//!
//! mux.write(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE], 2)?;
//! assert_eq!(&mux.read_at(2, 5)?[..], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
//! mux.close()?;
//! # Ok::<(), stashmux::MuxError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod index;
pub mod mux;
pub mod view;
pub mod worker;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, ResolveStrategy};
pub use error::{MuxError, Result};
pub use index::{AddressIndex, BackingStoreRef, IndexBuilder};
pub use mux::{Span, StoreMux};
pub use store::{FileProvider, MemoryProvider, StoreHandle, StoreProvider};
pub use view::{ReadOnlyMux, ReadableSpace};
pub use worker::{MuxClient, MuxWorker};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of stashmux
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
