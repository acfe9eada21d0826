//! Discrete collision between the player capsule and the voxel grid.
//!
//! Each fixed sub-step integrates gravity, input and position, then runs a
//! broad phase over the capsule's bounding box, a narrow phase against each
//! solid unit cube, and resolves contacts from shallowest to deepest.

use cubeworld_core::{FixedStep, SimTick};
use cubeworld_world::SolidVoxels;
use glam::{IVec3, Vec3};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::{PhysicsConfig, PhysicsError};
use crate::entity::{EntityState, MoveInput};
use crate::Aabb;

/// Minimum overlap (on both axes) for a stored contact to still count during
/// resolution. Zero-overlap contacts from resting exactly on a cell boundary
/// fall below it and are skipped.
pub const CONTACT_EPSILON: f32 = 1e-5;

/// A penetrating contact between the capsule and one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contact {
    /// Cell that was hit.
    pub block: IVec3,
    /// Closest point on the cell to the capsule axis.
    pub point: Vec3,
    /// Push-out direction (unit length).
    pub normal: Vec3,
    /// Push-out distance along `normal`.
    pub overlap: f32,
}

/// What the last sub-step saw; kept for debug overlays and logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollisionReport {
    /// Solid cells inside the capsule's bounding box.
    pub candidates: Vec<IVec3>,
    /// Contacts found by the narrow phase, in resolution order.
    pub contacts: Vec<Contact>,
    /// Contacts that were still penetrating and got resolved.
    pub resolved: usize,
}

/// Fixed-step capsule physics. Reads the grid, never writes it.
#[derive(Debug, Clone)]
pub struct CollisionEngine {
    config: PhysicsConfig,
    clock: FixedStep,
    last_report: CollisionReport,
    jumps: u64,
}

impl CollisionEngine {
    /// Build an engine; fails on non-positive rates or speeds.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let clock = FixedStep::new(config.sub_step_hz)?.with_max_steps(config.max_steps_per_frame);
        Ok(Self {
            config,
            clock,
            last_report: CollisionReport::default(),
            jumps: 0,
        })
    }

    /// Parameters this engine was built with.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Sub-steps executed so far.
    pub fn tick(&self) -> SimTick {
        self.clock.tick()
    }

    /// Duration of one sub-step in seconds.
    pub fn sub_step(&self) -> f32 {
        self.clock.step_seconds()
    }

    /// Report from the most recent sub-step.
    pub fn last_report(&self) -> &CollisionReport {
        &self.last_report
    }

    /// Jumps started by sub-steps so far.
    pub fn jump_count(&self) -> u64 {
        self.jumps
    }

    /// Advance by one rendered frame, running as many fixed sub-steps as the
    /// accumulated time allows. Returns the corrected state.
    pub fn update<W: SolidVoxels>(
        &mut self,
        frame_dt: f32,
        mut state: EntityState,
        input: &MoveInput,
        world: &W,
    ) -> EntityState {
        let steps = self.clock.advance(frame_dt);
        let dt = self.clock.step_seconds();
        for _ in 0..steps {
            state = self.step(dt, state, input, world);
        }
        state
    }

    /// One fixed sub-step: gravity, input, integration, then collision.
    #[instrument(level = "trace", skip_all)]
    pub fn step<W: SolidVoxels>(
        &mut self,
        dt: f32,
        mut state: EntityState,
        input: &MoveInput,
        world: &W,
    ) -> EntityState {
        state.velocity.y -= self.config.gravity * dt;

        let horizontal = input.local_direction() * self.config.move_speed;
        state.velocity.x = horizontal.x;
        state.velocity.z = horizontal.z;
        if input.jump && state.grounded {
            state.velocity.y += self.config.jump_speed;
            self.jumps += 1;
            debug!(center = ?state.center, "jump");
        }

        state.center += state.world_velocity() * dt;
        state.grounded = false;

        let candidates = broad_phase(&state, world);
        let contacts = narrow_phase(&candidates, &state);
        let (state, resolved) = resolve(state, contacts.clone());

        self.last_report = CollisionReport {
            candidates,
            contacts,
            resolved,
        };
        state
    }
}

/// Every solid cell in the integer range covering the capsule's bounding box.
pub fn broad_phase<W: SolidVoxels>(state: &EntityState, world: &W) -> Vec<IVec3> {
    let (lo, hi) = Aabb::around_capsule(state.center, state.half_height, state.radius).cell_range();
    let mut result = Vec::new();
    for x in lo.x..=hi.x {
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                let pos = IVec3::new(x, y, z);
                if world.is_solid(pos) {
                    result.push(pos);
                }
            }
        }
    }
    result
}

/// Contacts between the capsule and each candidate unit cube, sorted by
/// ascending overlap (shallowest first).
pub fn narrow_phase(candidates: &[IVec3], state: &EntityState) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = candidates
        .iter()
        .filter_map(|&block| contact_with(block, state))
        .collect();
    contacts.sort_by(|a, b| a.overlap.total_cmp(&b.overlap));
    contacts
}

fn contact_with(block: IVec3, state: &EntityState) -> Option<Contact> {
    let cube = block.as_vec3();
    let point = state
        .center
        .clamp(cube - Vec3::splat(0.5), cube + Vec3::splat(0.5));
    if !state.contains_point(point) {
        return None;
    }

    let d = point - state.center;
    let vertical = state.half_height - d.y.abs();
    let horizontal = state.radius - (d.x * d.x + d.z * d.z).sqrt();
    // Pushing up when the point sits below (or level with) the centre.
    let vertical_normal = if d.y > 0.0 { Vec3::NEG_Y } else { Vec3::Y };

    let (normal, overlap) = if vertical < horizontal {
        (vertical_normal, vertical)
    } else {
        match Vec3::new(-d.x, 0.0, -d.z).try_normalize() {
            Some(side) => (side, horizontal),
            // Axis inside the cube's footprint: there is no sideways way out.
            None => (vertical_normal, vertical),
        }
    };

    trace!(?block, ?normal, overlap, "contact");
    Some(Contact {
        block,
        point,
        normal,
        overlap,
    })
}

/// Push the capsule out of each still-penetrating contact and cancel the
/// velocity component into the surface. Returns the new state and how many
/// contacts were applied.
pub fn resolve(mut state: EntityState, mut contacts: Vec<Contact>) -> (EntityState, usize) {
    contacts.sort_by(|a, b| a.overlap.total_cmp(&b.overlap));

    let mut resolved = 0;
    for contact in &contacts {
        let still_penetrating = state
            .penetration(contact.point)
            .is_some_and(|(v, h)| v > CONTACT_EPSILON && h > CONTACT_EPSILON);
        if !still_penetrating {
            continue;
        }

        state.center += contact.normal * contact.overlap;

        let into_surface = state.world_velocity().dot(contact.normal);
        if into_surface < 0.0 {
            state.apply_world_delta_velocity(-contact.normal * into_surface);
        }
        if contact.normal.y > 0.0 {
            state.grounded = true;
        }
        resolved += 1;
    }
    (state, resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Cells(HashSet<IVec3>);

    impl SolidVoxels for Cells {
        fn is_solid(&self, pos: IVec3) -> bool {
            self.0.contains(&pos)
        }
    }

    fn cells(list: &[IVec3]) -> Cells {
        Cells(list.iter().copied().collect())
    }

    fn standing_at(center: Vec3) -> EntityState {
        EntityState {
            center,
            half_height: 0.75,
            radius: 0.25,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            grounded: false,
        }
    }

    #[test]
    fn broad_phase_covers_bounding_box() {
        let world = cells(&[
            IVec3::new(2, 0, 2),
            IVec3::new(3, 2, 3),
            IVec3::new(5, 0, 2),
            IVec3::new(2, -1, 2),
        ]);
        let state = standing_at(Vec3::new(2.0, 1.2, 2.0));
        let found: HashSet<_> = broad_phase(&state, &world).into_iter().collect();
        // x,z in [1, 3], y in [0, 2].
        assert!(found.contains(&IVec3::new(2, 0, 2)));
        assert!(found.contains(&IVec3::new(3, 2, 3)));
        assert!(!found.contains(&IVec3::new(5, 0, 2)));
        assert!(!found.contains(&IVec3::new(2, -1, 2)));
    }

    #[test]
    fn floor_contact_points_up() {
        let state = standing_at(Vec3::new(2.0, 0.5 + 0.75 - 0.01, 2.0));
        let contacts = narrow_phase(&[IVec3::new(2, 0, 2)], &state);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].normal, Vec3::Y);
        assert!((contacts[0].overlap - 0.01).abs() < 1e-4);
    }

    #[test]
    fn ceiling_contact_points_down_without_grounding() {
        let mut state = standing_at(Vec3::new(2.0, 2.0, 2.0));
        state.velocity.y = 4.0;
        // Cell at y=3 spans [2.5, 3.5]; capsule top is at 2.75.
        let contacts = narrow_phase(&[IVec3::new(2, 3, 2)], &state);
        assert_eq!(contacts[0].normal, Vec3::NEG_Y);

        let (after, resolved) = resolve(state, contacts);
        assert_eq!(resolved, 1);
        assert!(!after.grounded);
        assert!(after.velocity.y.abs() < 1e-6);
        assert!((after.center.y + 0.75 - 2.5).abs() < 1e-5);
    }

    #[test]
    fn side_contact_pushes_horizontally() {
        // Wall cell at x=3 spans [2.5, 3.5]; centre at 2.4 overlaps by 0.15.
        let mut state = standing_at(Vec3::new(2.4, 1.25, 2.0));
        state.velocity = Vec3::new(3.0, 0.0, 0.0);
        let contacts = narrow_phase(&[IVec3::new(3, 1, 2)], &state);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].normal - Vec3::NEG_X).length() < 1e-6);

        let (after, _) = resolve(state, contacts);
        assert!((after.center.x - 2.25).abs() < 1e-5);
        assert!(after.velocity.x.abs() < 1e-6);
        assert!(!after.grounded);
    }

    #[test]
    fn far_cells_produce_no_contact() {
        let state = standing_at(Vec3::new(2.0, 1.25, 2.0));
        // Diagonal neighbour: closest corner is ~0.707 away horizontally.
        assert!(narrow_phase(&[IVec3::new(3, 1, 3)], &state).is_empty());
    }

    #[test]
    fn stale_duplicate_floor_contacts_are_skipped() {
        // Straddling two floor cells: both report the same overlap, only one applies.
        let state = standing_at(Vec3::new(2.5, 1.25 - 0.02, 2.0));
        let contacts = narrow_phase(&[IVec3::new(2, 0, 2), IVec3::new(3, 0, 2)], &state);
        assert_eq!(contacts.len(), 2);
        let (after, resolved) = resolve(state, contacts);
        assert_eq!(resolved, 1);
        assert!((after.feet().y - 0.5).abs() < 1e-5);
        assert!(after.grounded);
    }

    #[test]
    fn moving_away_keeps_velocity() {
        let mut state = standing_at(Vec3::new(2.0, 1.24, 2.0));
        state.velocity.y = 5.0;
        let contacts = narrow_phase(&[IVec3::new(2, 0, 2)], &state);
        let (after, _) = resolve(state, contacts);
        assert_eq!(after.velocity.y, 5.0);
    }

    #[test]
    fn engine_rejects_bad_config() {
        let bad = PhysicsConfig {
            sub_step_hz: 0.0,
            ..Default::default()
        };
        assert!(CollisionEngine::new(bad).is_err());
        let bad = PhysicsConfig {
            move_speed: -1.0,
            ..Default::default()
        };
        assert_eq!(
            CollisionEngine::new(bad).unwrap_err(),
            PhysicsError::InvalidParameter {
                field: "move_speed"
            }
        );
    }

    #[test]
    fn falls_and_lands_on_floor() {
        let floor: Vec<_> = (0..5)
            .flat_map(|x| (0..5).map(move |z| IVec3::new(x, 0, z)))
            .collect();
        let world = cells(&floor);
        let mut engine = CollisionEngine::new(PhysicsConfig::default()).unwrap();
        let mut state = standing_at(Vec3::new(2.0, 4.0, 2.0));

        for _ in 0..120 {
            state = engine.update(1.0 / 60.0, state, &MoveInput::default(), &world);
        }
        assert!(state.grounded);
        assert!(state.feet().y > 0.5 - 1e-3);
        assert!(state.feet().y < 0.5 + 1e-3);
        assert!((499..=500).contains(&engine.tick().0));
    }

    #[test]
    fn jump_only_when_grounded() {
        let world = cells(&[IVec3::new(0, 0, 0)]);
        let mut engine = CollisionEngine::new(PhysicsConfig::default()).unwrap();
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };
        let dt = engine.sub_step();

        let airborne = standing_at(Vec3::new(0.0, 5.0, 0.0));
        let after = engine.step(dt, airborne, &jump, &world);
        assert!(after.velocity.y < 0.0);
        assert_eq!(engine.jump_count(), 0);

        let mut grounded = standing_at(Vec3::new(0.0, 1.25, 0.0));
        grounded.grounded = true;
        let after = engine.step(dt, grounded, &jump, &world);
        assert!(after.velocity.y > 9.0);
        assert!(after.center.y > 1.25);
        assert_eq!(engine.jump_count(), 1);
    }

    #[test]
    fn zero_length_frame_never_jumps() {
        let world = cells(&[IVec3::new(0, 0, 0)]);
        let mut engine = CollisionEngine::new(PhysicsConfig::default()).unwrap();
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };
        let mut grounded = standing_at(Vec3::new(0.0, 1.25, 0.0));
        grounded.grounded = true;

        let after = engine.update(0.0, grounded, &jump, &world);
        assert_eq!(after, grounded);
        assert_eq!(engine.jump_count(), 0);
    }

    #[test]
    fn report_tracks_last_step() {
        let world = cells(&[IVec3::new(0, 0, 0)]);
        let mut engine = CollisionEngine::new(PhysicsConfig::default()).unwrap();
        let dt = engine.sub_step();
        engine.step(dt, standing_at(Vec3::new(0.0, 1.25, 0.0)), &MoveInput::default(), &world);
        let report = engine.last_report();
        assert_eq!(report.candidates, vec![IVec3::ZERO]);
        assert_eq!(report.contacts.len(), 1);
        assert_eq!(report.resolved, 1);
    }
}
