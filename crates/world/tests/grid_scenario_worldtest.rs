//! Small hand-built grids with known visibility outcomes.

use cubeworld_testkit::{run_micro_worldtest, MicroWorldtestConfig};
use cubeworld_world::{BlockKind, GridDims, World, FACE_OFFSETS};
use glam::IVec3;
use serde::Serialize;
use std::path::PathBuf;

fn four_cube() -> World {
    World::empty(GridDims::new(4, 4, 4).unwrap())
}

#[test]
fn lone_block_is_drawn_until_enclosed() {
    let mut world = four_cube();
    let centre = IVec3::new(1, 1, 1);
    world.set_block(centre, BlockKind::Stone);

    assert!(!world.is_occluded(centre));
    assert!(world.has_slot(centre));
    assert_eq!(world.live_count(BlockKind::Stone), 1);

    for (i, offset) in FACE_OFFSETS.iter().enumerate() {
        world.set_block(centre + *offset, BlockKind::Stone);
        // The centre stays drawn until the last face is covered.
        assert_eq!(world.has_slot(centre), i < 5);
    }

    assert!(world.is_occluded(centre));
    assert!(!world.has_slot(centre));
    // Six neighbours drawn, centre released: 7 placed, 6 live.
    assert_eq!(world.live_count(BlockKind::Stone), 6);
    assert!(world.check_invariants().is_empty());
}

#[test]
fn enclosing_with_mixed_kinds_still_occludes() {
    let mut world = four_cube();
    let centre = IVec3::new(2, 2, 2);
    world.set_block(centre, BlockKind::Log);
    let kinds = [
        BlockKind::Dirt,
        BlockKind::Glass,
        BlockKind::Plank,
        BlockKind::Stone,
        BlockKind::Grass,
        BlockKind::Log,
    ];
    for (offset, kind) in FACE_OFFSETS.iter().zip(kinds) {
        world.set_block(centre + *offset, kind);
    }
    assert!(!world.has_slot(centre));
    assert_eq!(world.live_count(BlockKind::Log), 1);
    assert_eq!(world.live_count(BlockKind::Glass), 1);
}

#[test]
fn opening_a_face_redraws_the_hidden_block() {
    let mut world = four_cube();
    let centre = IVec3::new(1, 1, 1);
    world.set_block(centre, BlockKind::Stone);
    for offset in FACE_OFFSETS {
        world.set_block(centre + offset, BlockKind::Dirt);
    }
    assert!(!world.has_slot(centre));

    let opened = world.break_block(centre + IVec3::Y).unwrap();
    assert_eq!(opened.kind, BlockKind::Dirt);
    assert!(world.has_slot(centre));
    assert_eq!(world.live_count(BlockKind::Stone), 1);
    assert_eq!(world.live_count(BlockKind::Dirt), 5);
}

#[test]
fn blocks_on_the_boundary_are_never_occluded() {
    let mut world = four_cube();
    for pos in world.dims().positions().collect::<Vec<_>>() {
        world.set_block(pos, BlockKind::Stone);
    }
    // 4^3 minus the 2^3 interior.
    assert_eq!(world.live_count(BlockKind::Stone), 64 - 8);
    assert!(world.has_slot(IVec3::new(0, 1, 1)));
    assert!(!world.has_slot(IVec3::new(1, 2, 1)));
    assert!(world.check_invariants().is_empty());
}

#[derive(Serialize)]
struct EnclosureFrame {
    centre_has_slot: bool,
    centre_occluded: bool,
    stone_live: usize,
}

#[test]
fn four_cube_enclosure_matches_golden() {
    let centre = IVec3::new(1, 1, 1);
    let mut world = four_cube();
    world.set_block(centre, BlockKind::Stone);

    let config = MicroWorldtestConfig {
        name: "four_cube_enclosure".to_string(),
        ticks: FACE_OFFSETS.len() as u64,
        snapshot_path: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/snapshots/four_cube_enclosure.json"),
    };
    run_micro_worldtest(
        config,
        world,
        |tick, world| {
            world.set_block(centre + FACE_OFFSETS[tick.0 as usize], BlockKind::Stone);
        },
        |_, world| EnclosureFrame {
            centre_has_slot: world.has_slot(centre),
            centre_occluded: world.is_occluded(centre),
            stone_live: world.live_count(BlockKind::Stone),
        },
    )
    .unwrap();
}
