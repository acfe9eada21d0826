//! Block registry: one render batch per solid block kind.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::InstanceBatch;
use crate::block::BlockKind;

/// Opaque identifier of a render batch owned by the render driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchHandle(pub u32);

/// Allocates render batches on the core's behalf.
///
/// The render driver implements this to create a GPU instance buffer of the
/// requested capacity; headless runs use [`SequentialAllocator`].
pub trait BatchAllocator {
    fn allocate(&mut self, kind: BlockKind, capacity: usize) -> BatchHandle;
}

/// Hands out increasing handles without backing storage.
#[derive(Debug, Default)]
pub struct SequentialAllocator {
    next: u32,
}

impl BatchAllocator for SequentialAllocator {
    fn allocate(&mut self, _kind: BlockKind, _capacity: usize) -> BatchHandle {
        let handle = BatchHandle(self.next);
        self.next += 1;
        handle
    }
}

/// Registry holding the batch of every solid kind, created once at startup.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    batches: Vec<InstanceBatch>,
}

impl BlockRegistry {
    /// Register every solid kind with a batch of `capacity` slots.
    pub fn new(capacity: usize, allocator: &mut dyn BatchAllocator) -> Self {
        let batches = BlockKind::SOLID
            .iter()
            .map(|&kind| {
                let handle = allocator.allocate(kind, capacity);
                debug!(%kind, ?handle, capacity, "registered block batch");
                InstanceBatch::new(kind, handle, capacity)
            })
            .collect();
        Self { batches }
    }

    fn position(kind: BlockKind) -> Option<usize> {
        // SOLID is ordered by id starting at 1.
        kind.as_u8().checked_sub(1).map(usize::from)
    }

    /// Batch for `kind`; `None` for air.
    pub fn batch(&self, kind: BlockKind) -> Option<&InstanceBatch> {
        Self::position(kind).and_then(|i| self.batches.get(i))
    }

    pub(crate) fn batch_mut(&mut self, kind: BlockKind) -> Option<&mut InstanceBatch> {
        Self::position(kind).and_then(|i| self.batches.get_mut(i))
    }

    /// Live slot count for `kind` (0 for air).
    pub fn occupied_count(&self, kind: BlockKind) -> usize {
        self.batch(kind).map_or(0, InstanceBatch::live_count)
    }

    pub fn handle(&self, kind: BlockKind) -> Option<BatchHandle> {
        self.batch(kind).map(InstanceBatch::handle)
    }

    /// All batches in registry order.
    pub fn batches(&self) -> impl Iterator<Item = &InstanceBatch> {
        self.batches.iter()
    }
}
