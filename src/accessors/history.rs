use std::sync::Arc;

use parking_lot::RwLock;

use super::accessor::{VoxelAccess, VoxelAccessor};
use crate::core::index::Dimensions;
use crate::core::rle::RunTable;
use crate::core::storage::SparseMapStorage;
use crate::core::voxel::Voxel;

/// Source volume shared between its owner and a history overlay.
pub type SharedVoxels<T> = Arc<RwLock<VoxelAccessor<T>>>;

/// Storage used for the original values of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffStoreKind {
    /// Ordered map, suited to scattered edits.
    #[default]
    Map,
    /// Run-length encoded rows, suited to brush strokes and fills.
    Rle,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryConfig {
    pub store: DiffStoreKind,
}

impl HistoryConfig {
    pub fn new(store: DiffStoreKind) -> Self {
        Self { store }
    }
}

/// Original values keyed by linear index. An original of `None` means the
/// source held no data before the edit.
#[derive(Debug, Clone)]
pub enum DiffStore<T: Voxel> {
    Map(SparseMapStorage<Option<T>>),
    Rle(RunTable<Option<T>>),
}

impl<T: Voxel> DiffStore<T> {
    pub fn new(kind: DiffStoreKind, dimensions: Dimensions) -> Self {
        match kind {
            DiffStoreKind::Map => DiffStore::Map(SparseMapStorage::new()),
            DiffStoreKind::Rle => DiffStore::Rle(RunTable::new(dimensions)),
        }
    }

    /// `Some(original)` when `index` is recorded.
    #[inline]
    pub fn original(&self, index: usize) -> Option<Option<T>> {
        match self {
            DiffStore::Map(map) => map.get(index),
            DiffStore::Rle(table) => table.get(index),
        }
    }

    pub fn record(&mut self, index: usize, original: Option<T>) {
        match self {
            DiffStore::Map(map) => {
                map.set(index, original);
            }
            DiffStore::Rle(table) => {
                table.set(index, original);
            }
        }
    }

    pub fn forget(&mut self, index: usize) {
        match self {
            DiffStore::Map(map) => {
                map.remove(index);
            }
            DiffStore::Rle(table) => {
                table.delete(index);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DiffStore::Map(map) => map.len(),
            DiffStore::Rle(table) => table.voxel_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits `(index, original)` in ascending index order.
    pub fn for_each<F: FnMut(usize, Option<T>)>(&self, mut callback: F) {
        match self {
            DiffStore::Map(map) => map
                .iter()
                .for_each(|(index, original)| callback(index, original)),
            DiffStore::Rle(table) => table.for_each(callback),
        }
    }

    pub fn clear(&mut self) {
        match self {
            DiffStore::Map(map) => map.clear(),
            DiffStore::Rle(table) => table.clear(),
        }
    }
}

/// Write-through overlay over a shared source volume.
///
/// Every write goes to the source. The first write that changes an index
/// records the value it replaced; writing that value back removes the record.
/// Reads return the recorded original when there is one and the source's
/// current value otherwise.
#[derive(Debug, Clone)]
pub struct HistoryBackend<T: Voxel> {
    source: SharedVoxels<T>,
    diff: DiffStore<T>,
}

impl<T: Voxel> HistoryBackend<T> {
    pub fn new(source: SharedVoxels<T>, config: &HistoryConfig) -> Self {
        let dimensions = source.read().dimensions();
        Self {
            source,
            diff: DiffStore::new(config.store, dimensions),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.source.read().dimensions()
    }

    pub fn source(&self) -> &SharedVoxels<T> {
        &self.source
    }

    pub fn diff(&self) -> &DiffStore<T> {
        &self.diff
    }

    pub fn diff_len(&self) -> usize {
        self.diff.len()
    }

    pub fn is_recorded(&self, index: usize) -> bool {
        self.diff.original(index).is_some()
    }

    pub fn recorded_indices(&self) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.diff.len());
        self.diff.for_each(|index, _| indices.push(index));
        indices
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        match self.diff.original(index) {
            Some(original) => original,
            None => self.source.read().get_at_index(index),
        }
    }

    /// The source's present value, ignoring recorded originals.
    #[inline]
    pub fn current(&self, index: usize) -> Option<T> {
        self.source.read().get_at_index(index)
    }

    /// Writes through to the source. Returns whether the source changed.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        let mut source = self.source.write();

        match self.diff.original(index) {
            Some(original) => {
                if original == Some(value) {
                    self.diff.forget(index);
                }
                source.set_at_index(index, value)
            }
            None => {
                let original = source.get_at_index(index);
                if original == Some(value) {
                    return false;
                }
                let changed = source.set_at_index(index, value);
                if changed {
                    self.diff.record(index, original);
                }
                changed
            }
        }
    }

    /// Restores the recorded originals into the source and empties the diff.
    /// Returns the number of voxels restored.
    ///
    /// Voxels that held no data before the session keep their edited value,
    /// since backends have no way to unset a voxel.
    pub fn revert(&mut self) -> usize {
        let mut source = self.source.write();
        let mut restored = 0;
        let mut unrestorable = 0;

        self.diff.for_each(|index, original| match original {
            Some(value) => {
                source.set_at_index(index, value);
                restored += 1;
            }
            None => unrestorable += 1,
        });
        self.diff.clear();

        if unrestorable > 0 {
            log::debug!("{unrestorable} edited voxels had no original data to restore");
        }
        log::debug!("reverted {restored} voxels");

        restored
    }

    /// Keeps the edits and forgets the originals. Returns the number of
    /// records dropped.
    pub fn commit(&mut self) -> usize {
        let count = self.diff.len();
        self.diff.clear();

        log::debug!("committed {count} edited voxels");

        count
    }
}
