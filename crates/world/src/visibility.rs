//! Visibility and instance-buffer synchronisation.
//!
//! Keeps every solid, non-occluded cell in exactly one slot of its kind's
//! batch and every occluded cell out of all batches. After the initial pass,
//! each edit patches only the edited cell and its six face neighbours.

use glam::IVec3;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::block::BlockKind;
use crate::grid::{VoxelGrid, FACE_OFFSETS};
use crate::registry::BlockRegistry;

/// A broken visibility invariant, reported by [`InstanceSync::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InvariantViolation {
    /// A cell's slot state disagrees with its occlusion state.
    SlotMismatch {
        pos: [i32; 3],
        has_slot: bool,
        should_have_slot: bool,
    },
    /// A batch's live count differs from the number of cells of that kind holding a slot.
    CountMismatch {
        kind: BlockKind,
        live: usize,
        slotted_cells: usize,
    },
    /// A slot's back-reference does not point at a cell claiming that slot.
    BrokenBackReference { kind: BlockKind, slot: u32 },
}

/// Owns the block registry and is the only writer of batch occupancy.
#[derive(Debug, Clone)]
pub struct InstanceSync {
    registry: BlockRegistry,
}

impl InstanceSync {
    pub fn new(registry: BlockRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Populate batches from scratch in x, then y, then z order.
    ///
    /// Expects a grid with no slots assigned (freshly generated).
    #[instrument(skip_all)]
    pub fn initial_sync(&mut self, grid: &mut VoxelGrid) -> usize {
        let mut shown = 0;
        for pos in grid.dims().positions() {
            if self.show_if_visible(grid, pos) {
                shown += 1;
            }
        }
        info!(
            visible = shown,
            volume = grid.dims().volume(),
            "initial visibility sync complete"
        );
        shown
    }

    /// Free the slot of a cell that has become occluded.
    pub fn hide_if_occluded(&mut self, grid: &mut VoxelGrid, pos: IVec3) -> bool {
        let cell = grid.cell(pos);
        if cell.is_air() || !cell.has_slot() || !grid.is_occluded(pos) {
            return false;
        }
        self.release(grid, pos)
    }

    /// Give a slot to a solid cell that is exposed but not yet drawn.
    pub fn show_if_visible(&mut self, grid: &mut VoxelGrid, pos: IVec3) -> bool {
        let cell = grid.cell(pos);
        if cell.is_air() || cell.has_slot() || grid.is_occluded(pos) {
            return false;
        }
        let Some(batch) = self.registry.batch_mut(cell.kind) else {
            return false;
        };
        match batch.push(pos) {
            Some(slot) => {
                grid.set_slot(pos, Some(slot));
                trace!(?pos, kind = %cell.kind, slot, "slot assigned");
                true
            }
            None => {
                warn!(kind = %cell.kind, capacity = batch.capacity(), "instance batch full");
                false
            }
        }
    }

    /// Unconditionally free the slot held by `pos`, relocating the batch's last instance.
    fn release(&mut self, grid: &mut VoxelGrid, pos: IVec3) -> bool {
        let cell = grid.cell(pos);
        let Some(slot) = cell.slot else {
            return false;
        };
        let Some(batch) = self.registry.batch_mut(cell.kind) else {
            return false;
        };
        let Some(removed) = batch.swap_remove(slot) else {
            return false;
        };
        debug_assert_eq!(removed.removed, pos, "slot back-reference out of sync");
        if let Some(moved) = removed.moved {
            grid.set_slot(moved, Some(slot));
        }
        grid.set_slot(pos, None);
        trace!(?pos, kind = %cell.kind, slot, moved = ?removed.moved, "slot released");
        true
    }

    /// Bring one cell's slot state in line with its current occlusion.
    pub fn refresh(&mut self, grid: &mut VoxelGrid, pos: IVec3) {
        if !self.hide_if_occluded(grid, pos) {
            self.show_if_visible(grid, pos);
        }
    }

    /// Write `kind` at `pos` and patch the cell and its six neighbours.
    ///
    /// Returns `false` when `pos` is outside the grid or already holds `kind`.
    pub fn apply_edit(&mut self, grid: &mut VoxelGrid, pos: IVec3, kind: BlockKind) -> bool {
        if !grid.dims().contains(pos) {
            return false;
        }
        let old = grid.cell(pos);
        if old.kind == kind {
            return false;
        }
        // A cell changing kind must leave its old batch before the type is overwritten.
        if old.has_slot() {
            self.release(grid, pos);
        }
        grid.set_type(pos, kind);
        self.show_if_visible(grid, pos);
        for offset in FACE_OFFSETS {
            self.refresh(grid, pos + offset);
        }
        debug!(?pos, from = %old.kind, to = %kind, "block edit applied");
        true
    }

    /// Check both visibility invariants over the whole grid.
    pub fn audit(&self, grid: &VoxelGrid) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut slotted = [0usize; 7];

        for pos in grid.dims().positions() {
            let cell = grid.cell(pos);
            let should_have_slot = !cell.is_air() && !grid.is_occluded(pos);
            if cell.has_slot() != should_have_slot {
                violations.push(InvariantViolation::SlotMismatch {
                    pos: pos.to_array(),
                    has_slot: cell.has_slot(),
                    should_have_slot,
                });
            }
            if cell.has_slot() {
                slotted[cell.kind.as_u8() as usize] += 1;
            }
        }

        for batch in self.registry.batches() {
            let kind = batch.kind();
            let slotted_cells = slotted[kind.as_u8() as usize];
            if batch.live_count() != slotted_cells {
                violations.push(InvariantViolation::CountMismatch {
                    kind,
                    live: batch.live_count(),
                    slotted_cells,
                });
            }
            for slot in 0..batch.live_count() as u32 {
                let intact = batch.owner(slot).is_some_and(|owner| {
                    let cell = grid.cell(owner);
                    cell.kind == kind && cell.slot == Some(slot)
                });
                if !intact {
                    violations.push(InvariantViolation::BrokenBackReference { kind, slot });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDims;
    use crate::registry::SequentialAllocator;

    fn setup(n: usize) -> (VoxelGrid, InstanceSync) {
        let dims = GridDims::new(n, n, n).unwrap();
        let registry = BlockRegistry::new(dims.volume(), &mut SequentialAllocator::default());
        (VoxelGrid::new(dims), InstanceSync::new(registry))
    }

    #[test]
    fn initial_sync_skips_enclosed_cells() {
        let (mut grid, mut sync) = setup(3);
        for pos in grid.dims().positions().collect::<Vec<_>>() {
            grid.set_type(pos, BlockKind::Stone);
        }
        let shown = sync.initial_sync(&mut grid);
        assert_eq!(shown, 26);
        assert!(!grid.cell(IVec3::ONE).has_slot());
        assert_eq!(sync.registry().occupied_count(BlockKind::Stone), 26);
        assert!(sync.audit(&grid).is_empty());
    }

    #[test]
    fn initial_sync_slots_follow_scan_order() {
        let (mut grid, mut sync) = setup(4);
        grid.set_type(IVec3::new(2, 0, 0), BlockKind::Dirt);
        grid.set_type(IVec3::new(0, 3, 1), BlockKind::Dirt);
        sync.initial_sync(&mut grid);
        assert_eq!(grid.cell(IVec3::new(0, 3, 1)).slot, Some(0));
        assert_eq!(grid.cell(IVec3::new(2, 0, 0)).slot, Some(1));
    }

    #[test]
    fn enclosing_hides_and_opening_shows() {
        let (mut grid, mut sync) = setup(4);
        let center = IVec3::ONE;
        sync.apply_edit(&mut grid, center, BlockKind::Stone);
        assert!(grid.cell(center).has_slot());

        let before = sync.registry().occupied_count(BlockKind::Stone);
        for offset in &FACE_OFFSETS[..5] {
            sync.apply_edit(&mut grid, center + *offset, BlockKind::Stone);
        }
        assert!(grid.cell(center).has_slot());
        let with_five = sync.registry().occupied_count(BlockKind::Stone);
        assert_eq!(with_five, before + 5);

        sync.apply_edit(&mut grid, center + FACE_OFFSETS[5], BlockKind::Stone);
        assert!(!grid.cell(center).has_slot());
        // One new neighbour shown, the centre hidden.
        assert_eq!(sync.registry().occupied_count(BlockKind::Stone), with_five);

        sync.apply_edit(&mut grid, center + FACE_OFFSETS[0], BlockKind::Air);
        assert!(grid.cell(center).has_slot());
        assert!(sync.audit(&grid).is_empty());
    }

    #[test]
    fn kind_change_moves_batch() {
        let (mut grid, mut sync) = setup(3);
        let p = IVec3::new(0, 0, 0);
        sync.apply_edit(&mut grid, p, BlockKind::Glass);
        assert_eq!(sync.registry().occupied_count(BlockKind::Glass), 1);
        sync.apply_edit(&mut grid, p, BlockKind::Log);
        assert_eq!(sync.registry().occupied_count(BlockKind::Glass), 0);
        assert_eq!(sync.registry().occupied_count(BlockKind::Log), 1);
        assert_eq!(grid.cell(p).slot, Some(0));
        assert!(sync.audit(&grid).is_empty());
    }

    #[test]
    fn removal_relocates_last_slot_owner() {
        let (mut grid, mut sync) = setup(5);
        let a = IVec3::new(0, 0, 0);
        let b = IVec3::new(2, 2, 2);
        let c = IVec3::new(4, 4, 4);
        for p in [a, b, c] {
            sync.apply_edit(&mut grid, p, BlockKind::Plank);
        }
        assert_eq!(grid.cell(c).slot, Some(2));

        sync.apply_edit(&mut grid, a, BlockKind::Air);
        assert_eq!(grid.cell(c).slot, Some(0));
        assert_eq!(grid.cell(b).slot, Some(1));
        let batch = sync.registry().batch(BlockKind::Plank).unwrap();
        assert_eq!(batch.owner(0), Some(c));
        assert_eq!(batch.live_count(), 2);
    }

    #[test]
    fn edits_outside_or_unchanged_are_noops() {
        let (mut grid, mut sync) = setup(3);
        assert!(!sync.apply_edit(&mut grid, IVec3::new(-1, 0, 0), BlockKind::Stone));
        assert!(!sync.apply_edit(&mut grid, IVec3::ZERO, BlockKind::Air));
        assert!(sync.apply_edit(&mut grid, IVec3::ZERO, BlockKind::Stone));
        assert!(!sync.apply_edit(&mut grid, IVec3::ZERO, BlockKind::Stone));
        assert_eq!(sync.registry().occupied_count(BlockKind::Stone), 1);
    }

    #[test]
    fn audit_reports_tampering() {
        let (mut grid, mut sync) = setup(3);
        sync.apply_edit(&mut grid, IVec3::ZERO, BlockKind::Dirt);
        grid.set_slot(IVec3::ZERO, None);
        let violations = sync.audit(&grid);
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::SlotMismatch { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::CountMismatch { .. })));
    }
}
