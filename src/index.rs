//! Address Index
//!
//! Maps the global address space onto the ordered list of backing stores.
//!
//! ## Layout
//! ```text
//!  global:  0          l0          l0+l1              total
//!           ├──store 0──┼───store 1───┼── ... ──store n──┤
//!  start:   0           l0            l0+l1
//! ```
//!
//! Built once, never mutated afterwards.

use tracing::{debug, info};

use crate::config::ResolveStrategy;
use crate::error::{describe_id, MuxError, Result};
use crate::store::{StoreHandle, StoreProvider};

/// One backing store's place in the global address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingStoreRef<I> {
    /// Token handed to the provider to open this store
    pub identifier: I,
    /// First global offset covered by this store
    pub start_offset: u64,
    /// Byte length seen when the index was built
    pub length: u64,
}

impl<I> BackingStoreRef<I> {
    /// One past the last global offset covered by this store
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.length
    }

    /// True if `offset` falls inside this store
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start_offset && offset < self.end_offset()
    }
}

/// Immutable index over all backing stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressIndex<I> {
    /// Stores in ascending start-offset order
    stores: Vec<BackingStoreRef<I>>,
    /// Sum of all store lengths
    total_length: u64,
}

impl<I> AddressIndex<I> {
    /// Build from already-known `(identifier, length)` pairs, in order
    pub fn from_lengths(entries: impl IntoIterator<Item = (I, u64)>) -> Self {
        let mut stores = Vec::new();
        let mut prefix_sum = 0u64;

        for (identifier, length) in entries {
            stores.push(BackingStoreRef {
                identifier,
                start_offset: prefix_sum,
                length,
            });
            prefix_sum += length;
        }

        Self {
            stores,
            total_length: prefix_sum,
        }
    }

    /// Total size of the address space
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn is_empty(&self) -> bool {
        self.total_length == 0
    }

    /// Number of backing stores (zero-length ones included)
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// All entries in address order
    pub fn stores(&self) -> &[BackingStoreRef<I>] {
        &self.stores
    }

    /// Entry at `slot`
    pub fn store(&self, slot: usize) -> Option<&BackingStoreRef<I>> {
        self.stores.get(slot)
    }

    /// Find the store holding `offset`
    ///
    /// Selects the last store whose start offset is `<= offset`, which skips
    /// zero-length stores sharing a start with their successor.
    /// Returns `None` when `offset >= total_length`.
    pub fn resolve(&self, offset: u64, strategy: ResolveStrategy) -> Option<usize> {
        if offset >= self.total_length {
            return None;
        }

        match strategy {
            ResolveStrategy::Linear => self
                .stores
                .iter()
                .rposition(|store| store.start_offset <= offset),
            ResolveStrategy::Binary => {
                let after = self
                    .stores
                    .partition_point(|store| store.start_offset <= offset);
                after.checked_sub(1)
            }
        }
    }
}

/// Builds an [`AddressIndex`] by opening every store once
pub struct IndexBuilder;

impl IndexBuilder {
    /// Open each identifier in order to learn its length
    ///
    /// Stores are opened one at a time, strictly in the given order; the
    /// running prefix sum makes order significant. Handles are dropped as
    /// soon as their length is known.
    pub fn build<P: StoreProvider>(
        provider: &P,
        identifiers: impl IntoIterator<Item = P::Id>,
    ) -> Result<AddressIndex<P::Id>> {
        let mut entries = Vec::new();

        for identifier in identifiers {
            let handle = provider.open(&identifier).map_err(|source| MuxError::StoreOpen {
                identifier: describe_id(&identifier),
                source,
            })?;
            let length = handle.len();
            drop(handle);

            debug!(identifier = ?identifier, length, "Indexed store");
            entries.push((identifier, length));
        }

        let index = AddressIndex::from_lengths(entries);
        info!(
            stores = index.store_count(),
            total_length = index.total_length(),
            "Address index built"
        );
        Ok(index)
    }
}
