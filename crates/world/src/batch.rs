//! Fixed-capacity instance batches, one per solid block kind.
//!
//! Live instances are packed into the prefix `0..live_count`. Removal moves
//! the last live instance into the freed slot, so slot order is not stable
//! across edits.

use bytemuck::{Pod, Zeroable};
use glam::IVec3;

use crate::block::BlockKind;
use crate::registry::BatchHandle;

/// Per-instance transform uploaded to the render batch: a cell-centre translation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub translation: [f32; 3],
}

impl InstanceTransform {
    /// Transform placing a unit cube on the cell at `pos`.
    pub fn at(pos: IVec3) -> Self {
        Self {
            translation: pos.as_vec3().to_array(),
        }
    }
}

/// Result of [`InstanceBatch::swap_remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRemoved {
    /// Cell that owned the freed slot.
    pub removed: IVec3,
    /// Cell whose instance was moved into the freed slot, if any.
    pub moved: Option<IVec3>,
}

/// Packed instance list for one block kind.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    kind: BlockKind,
    handle: BatchHandle,
    capacity: usize,
    transforms: Vec<InstanceTransform>,
    /// Slot -> owning cell back-reference, parallel to `transforms`.
    owners: Vec<IVec3>,
}

impl InstanceBatch {
    pub fn new(kind: BlockKind, handle: BatchHandle, capacity: usize) -> Self {
        Self {
            kind,
            handle,
            capacity,
            transforms: Vec::new(),
            owners: Vec::new(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn handle(&self) -> BatchHandle {
        self.handle
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots; the render driver draws this many instances.
    pub fn live_count(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_full(&self) -> bool {
        self.transforms.len() >= self.capacity
    }

    /// Transforms of the live slots, in slot order.
    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    /// Live transforms as raw bytes for buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.transforms)
    }

    /// Cell currently owning `slot`.
    pub fn owner(&self, slot: u32) -> Option<IVec3> {
        self.owners.get(slot as usize).copied()
    }

    /// Append an instance for `pos` at the next free slot.
    pub(crate) fn push(&mut self, pos: IVec3) -> Option<u32> {
        if self.is_full() {
            return None;
        }
        let slot = self.transforms.len() as u32;
        self.transforms.push(InstanceTransform::at(pos));
        self.owners.push(pos);
        Some(slot)
    }

    /// Free `slot` by moving the last live instance into it.
    pub(crate) fn swap_remove(&mut self, slot: u32) -> Option<SwapRemoved> {
        let idx = slot as usize;
        if idx >= self.transforms.len() {
            return None;
        }
        let last = self.transforms.len() - 1;
        self.transforms.swap_remove(idx);
        let removed = self.owners.swap_remove(idx);
        let moved = (idx != last).then(|| self.owners[idx]);
        Some(SwapRemoved { removed, moved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(capacity: usize) -> InstanceBatch {
        InstanceBatch::new(BlockKind::Stone, BatchHandle(0), capacity)
    }

    #[test]
    fn push_fills_sequential_slots() {
        let mut b = batch(4);
        assert_eq!(b.push(IVec3::new(1, 2, 3)), Some(0));
        assert_eq!(b.push(IVec3::new(4, 5, 6)), Some(1));
        assert_eq!(b.live_count(), 2);
        assert_eq!(b.owner(1), Some(IVec3::new(4, 5, 6)));
        assert_eq!(b.transforms()[0].translation, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn push_refuses_when_full() {
        let mut b = batch(1);
        assert_eq!(b.push(IVec3::ZERO), Some(0));
        assert_eq!(b.push(IVec3::ONE), None);
        assert_eq!(b.live_count(), 1);
    }

    #[test]
    fn swap_remove_moves_last_into_hole() {
        let mut b = batch(8);
        let cells = [IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(2, 0, 0)];
        for c in cells {
            b.push(c);
        }

        let out = b.swap_remove(0).unwrap();
        assert_eq!(out.removed, cells[0]);
        assert_eq!(out.moved, Some(cells[2]));
        assert_eq!(b.live_count(), 2);
        assert_eq!(b.owner(0), Some(cells[2]));
        assert_eq!(b.transforms()[0], InstanceTransform::at(cells[2]));
    }

    #[test]
    fn swap_remove_last_moves_nothing() {
        let mut b = batch(8);
        b.push(IVec3::ZERO);
        b.push(IVec3::X);
        let out = b.swap_remove(1).unwrap();
        assert_eq!(out.removed, IVec3::X);
        assert_eq!(out.moved, None);
        assert_eq!(b.swap_remove(5), None);
    }

    #[test]
    fn bytes_cover_live_prefix() {
        let mut b = batch(8);
        b.push(IVec3::ZERO);
        b.push(IVec3::ONE);
        assert_eq!(b.as_bytes().len(), 2 * std::mem::size_of::<InstanceTransform>());
    }
}
