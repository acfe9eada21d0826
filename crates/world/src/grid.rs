//! Dense voxel grid with implicit-air bounds.
//!
//! The grid is a single flat buffer covering the whole fixed-size world.
//! Reads outside the bounds return [`Cell::AIR`] instead of failing, so
//! neighbour scans never need their own bounds checks.

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::block::BlockKind;
use crate::error::WorldError;

/// The six axis-aligned face neighbour offsets (+x, -x, +y, -y, +z, -z).
pub const FACE_OFFSETS: [IVec3; 6] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

/// Grid extent along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridDims {
    /// Validate and build grid dimensions. Every axis must be at least 1 and
    /// the volume must be addressable by a `u32` slot index.
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self, WorldError> {
        if x == 0 || y == 0 || z == 0 {
            return Err(WorldError::EmptyDimension { x, y, z });
        }
        let volume = x
            .checked_mul(y)
            .and_then(|v| v.checked_mul(z))
            .ok_or(WorldError::TooLarge(usize::MAX))?;
        if volume > u32::MAX as usize || volume > i32::MAX as usize {
            return Err(WorldError::TooLarge(volume));
        }
        Ok(Self { x, y, z })
    }

    /// Total number of cells.
    pub fn volume(&self) -> usize {
        self.x * self.y * self.z
    }

    #[inline]
    pub fn contains(&self, pos: IVec3) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as usize) < self.x
            && (pos.y as usize) < self.y
            && (pos.z as usize) < self.z
    }

    /// Flat index `((x * size_y) + y) * size_z + z`, or `None` outside bounds.
    #[inline]
    pub fn index(&self, pos: IVec3) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        Some(((pos.x as usize * self.y) + pos.y as usize) * self.z + pos.z as usize)
    }

    /// Every in-bounds coordinate in x-major, then y, then z order.
    pub fn positions(&self) -> impl Iterator<Item = IVec3> {
        let (sx, sy, sz) = (self.x as i32, self.y as i32, self.z as i32);
        (0..sx).flat_map(move |x| {
            (0..sy).flat_map(move |y| (0..sz).map(move |z| IVec3::new(x, y, z)))
        })
    }
}

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub kind: BlockKind,
    /// Render slot in the kind's instance batch. Always `None` for air.
    pub slot: Option<u32>,
}

impl Cell {
    /// The implicit value of every unstored or empty cell.
    pub const AIR: Cell = Cell {
        kind: BlockKind::Air,
        slot: None,
    };

    #[inline]
    pub fn is_air(&self) -> bool {
        self.kind.is_air()
    }

    #[inline]
    pub fn has_slot(&self) -> bool {
        self.slot.is_some()
    }
}

/// Read access to solidity, shared by collision and raycasting.
pub trait SolidVoxels {
    /// Whether the cell at `pos` blocks movement. Out-of-bounds is never solid.
    fn is_solid(&self, pos: IVec3) -> bool;
}

/// Fixed-size 3D array of cells; the single source of truth for block placement.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    dims: GridDims,
    cells: Vec<Cell>,
}

impl VoxelGrid {
    /// Allocate a grid filled with air.
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            cells: vec![Cell::AIR; dims.volume()],
        }
    }

    #[inline]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Read a cell; out-of-bounds reads as air.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Cell {
        self.cell(IVec3::new(x, y, z))
    }

    /// [`VoxelGrid::get`] taking a vector.
    #[inline]
    pub fn cell(&self, pos: IVec3) -> Cell {
        match self.dims.index(pos) {
            Some(idx) => self.cells[idx],
            None => Cell::AIR,
        }
    }

    #[inline]
    pub fn kind(&self, pos: IVec3) -> BlockKind {
        self.cell(pos).kind
    }

    /// Overwrite the block kind. Writing air also clears the slot.
    ///
    /// Returns `false` (and does nothing) outside the bounds.
    pub fn set_type(&mut self, pos: IVec3, kind: BlockKind) -> bool {
        let Some(idx) = self.dims.index(pos) else {
            return false;
        };
        let cell = &mut self.cells[idx];
        cell.kind = kind;
        if kind.is_air() {
            cell.slot = None;
        }
        true
    }

    /// Record (or clear) the render slot. Ignored on air cells and outside bounds.
    pub(crate) fn set_slot(&mut self, pos: IVec3, slot: Option<u32>) -> bool {
        let Some(idx) = self.dims.index(pos) else {
            return false;
        };
        let cell = &mut self.cells[idx];
        if cell.is_air() {
            return false;
        }
        cell.slot = slot;
        true
    }

    /// Drop every render slot, leaving block kinds untouched.
    pub(crate) fn clear_slots(&mut self) {
        for cell in &mut self.cells {
            cell.slot = None;
        }
    }

    /// A solid cell is occluded when all six face neighbours are solid.
    /// Out-of-bounds neighbours read as air and therefore keep it visible.
    pub fn is_occluded(&self, pos: IVec3) -> bool {
        !self.cell(pos).is_air()
            && FACE_OFFSETS
                .iter()
                .all(|offset| !self.cell(pos + *offset).is_air())
    }

    /// Number of cells holding `kind`.
    pub fn count(&self, kind: BlockKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind).count()
    }

    /// Borrow the raw cell buffer in flat-index order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl SolidVoxels for VoxelGrid {
    fn is_solid(&self, pos: IVec3) -> bool {
        !self.cell(pos).is_air()
    }
}
