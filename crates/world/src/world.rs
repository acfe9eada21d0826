//! The world component: owns the grid and the instance sync, and is the
//! only entry point for edits.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::batch::InstanceBatch;
use crate::block::BlockKind;
use crate::error::WorldError;
use crate::grid::{Cell, GridDims, SolidVoxels, VoxelGrid};
use crate::heightmap::Heightmap;
use crate::raycast::{raycast, Ray, RaycastHit};
use crate::registry::{BatchAllocator, BlockRegistry, SequentialAllocator};
use crate::terrain::{TerrainConfig, TerrainGenerator};
use crate::visibility::{InstanceSync, InvariantViolation};

/// Grid size and terrain parameters, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub terrain: TerrainConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size_x: 64,
            size_y: 32,
            size_z: 64,
            terrain: TerrainConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn dims(&self) -> Result<GridDims, WorldError> {
        GridDims::new(self.size_x, self.size_y, self.size_z)
    }
}

/// Outcome of a successful break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenBlock {
    pub pos: IVec3,
    pub kind: BlockKind,
}

/// Fixed-size block world with render-batch bookkeeping.
pub struct World {
    grid: VoxelGrid,
    sync: InstanceSync,
    heightmap: Option<Heightmap>,
}

impl World {
    /// Generate terrain and run the initial visibility pass.
    #[instrument(skip_all, fields(seed = config.terrain.seed))]
    pub fn generate(
        config: &WorldConfig,
        allocator: &mut dyn BatchAllocator,
    ) -> Result<Self, WorldError> {
        let dims = config.dims()?;
        let generator = TerrainGenerator::new(config.terrain.clone())?;
        let mut grid = VoxelGrid::new(dims);
        let heightmap = generator.generate(&mut grid);
        let mut world = Self::from_grid(grid, allocator);
        world.heightmap = Some(heightmap);
        info!(
            size_x = dims.x,
            size_y = dims.y,
            size_z = dims.z,
            "world generated"
        );
        Ok(world)
    }

    /// Wrap a pre-filled grid and sync its batches. Any slots already on the
    /// grid are discarded and reassigned against the fresh registry.
    pub fn from_grid(mut grid: VoxelGrid, allocator: &mut dyn BatchAllocator) -> Self {
        grid.clear_slots();
        let registry = BlockRegistry::new(grid.dims().volume(), allocator);
        let mut sync = InstanceSync::new(registry);
        sync.initial_sync(&mut grid);
        Self {
            grid,
            sync,
            heightmap: None,
        }
    }

    /// An all-air world with headless batch handles.
    pub fn empty(dims: GridDims) -> Self {
        Self::from_grid(VoxelGrid::new(dims), &mut SequentialAllocator::default())
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn dims(&self) -> GridDims {
        self.grid.dims()
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.sync.registry()
    }

    /// Heightmap from generation, if the world was generated.
    pub fn heightmap(&self) -> Option<&Heightmap> {
        self.heightmap.as_ref()
    }

    /// Read a cell; out-of-bounds reads as air.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Cell {
        self.grid.get(x, y, z)
    }

    pub fn cell(&self, pos: IVec3) -> Cell {
        self.grid.cell(pos)
    }

    pub fn is_occluded(&self, pos: IVec3) -> bool {
        self.grid.is_occluded(pos)
    }

    pub fn has_slot(&self, pos: IVec3) -> bool {
        self.grid.cell(pos).has_slot()
    }

    pub fn batch(&self, kind: BlockKind) -> Option<&InstanceBatch> {
        self.sync.registry().batch(kind)
    }

    pub fn live_count(&self, kind: BlockKind) -> usize {
        self.sync.registry().occupied_count(kind)
    }

    /// Set the block at `pos` and patch visibility around it.
    pub fn set_block(&mut self, pos: IVec3, kind: BlockKind) -> bool {
        self.sync.apply_edit(&mut self.grid, pos, kind)
    }

    /// Remove the block at `pos`. Breaking air (or outside the grid) does nothing.
    pub fn break_block(&mut self, pos: IVec3) -> Option<BrokenBlock> {
        let kind = self.grid.kind(pos);
        if kind.is_air() {
            return None;
        }
        self.set_block(pos, BlockKind::Air)
            .then_some(BrokenBlock { pos, kind })
    }

    /// Place `kind` at `pos` if the cell is in bounds and empty.
    pub fn place_block(&mut self, pos: IVec3, kind: BlockKind) -> bool {
        if kind.is_air() || !self.grid.dims().contains(pos) || !self.grid.kind(pos).is_air() {
            return false;
        }
        self.set_block(pos, kind)
    }

    /// Nearest drawn block along `ray` within `reach`.
    ///
    /// Only cells holding a render slot can be hit, matching what is on screen.
    pub fn pick(&self, ray: Ray, reach: f32) -> Option<RaycastHit> {
        raycast(ray, reach, |pos| self.grid.cell(pos).has_slot())
    }

    /// Break the block under the crosshair.
    pub fn break_at(&mut self, ray: Ray, reach: f32) -> Option<BrokenBlock> {
        let hit = self.pick(ray, reach)?;
        let broken = self.break_block(hit.block);
        debug!(block = ?hit.block, distance = hit.distance, ok = broken.is_some(), "break_at");
        broken
    }

    /// Place `kind` against the face under the crosshair.
    pub fn place_at(&mut self, ray: Ray, kind: BlockKind, reach: f32) -> Option<IVec3> {
        let hit = self.pick(ray, reach)?;
        if hit.face_normal == IVec3::ZERO {
            return None;
        }
        let target = hit.block + hit.face_normal;
        let placed = self.place_block(target, kind);
        debug!(?target, %kind, ok = placed, "place_at");
        placed.then_some(target)
    }

    /// Full audit of the occlusion and slot-count invariants.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        self.sync.audit(&self.grid)
    }

    /// Centre of the highest solid cell's top face in column `(x, z)`, if any.
    pub fn surface_at(&self, x: i32, z: i32) -> Option<Vec3> {
        (0..self.dims().y as i32)
            .rev()
            .find(|&y| !self.grid.get(x, y, z).is_air())
            .map(|y| Vec3::new(x as f32, y as f32 + 0.5, z as f32))
    }
}

impl SolidVoxels for World {
    fn is_solid(&self, pos: IVec3) -> bool {
        self.grid.is_solid(pos)
    }
}
