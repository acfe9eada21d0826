//! Headless scripted session: a player walks, jumps, breaks and places
//! blocks on a generated world while every edit is checked against the
//! render-batch invariants.

use anyhow::{Context, Result};
use cubeworld_physics::{CollisionEngine, EntityState, MoveInput};
use cubeworld_testkit::{EventRecord, JsonlSink, SessionHeader};
use cubeworld_world::{BlockKind, Ray, SequentialAllocator, World};
use glam::Vec3;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::config::SimConfig;

/// Hold-to-repeat period for break and place.
pub const REPEAT_INTERVAL: f32 = 0.2;

/// Below this many units under the grid the player is put back at spawn.
const FALL_LIMIT: f32 = 16.0;

/// Number-key block selection.
pub const HOTBAR: [BlockKind; 6] = [
    BlockKind::Dirt,
    BlockKind::Log,
    BlockKind::Grass,
    BlockKind::Glass,
    BlockKind::Plank,
    BlockKind::Stone,
];

/// Fires once on press, then every `interval` seconds while held.
#[derive(Debug, Clone)]
pub struct HoldRepeat {
    interval: f32,
    held: bool,
    since_fire: f32,
}

impl HoldRepeat {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            held: false,
            since_fire: 0.0,
        }
    }

    /// Feed one frame of button state; returns how many times to act.
    pub fn update(&mut self, held: bool, dt: f32) -> u32 {
        if !held {
            self.held = false;
            return 0;
        }
        if !self.held {
            self.held = true;
            self.since_fire = 0.0;
            return 1;
        }
        self.since_fire += dt;
        let mut fires = 0;
        while self.since_fire >= self.interval {
            self.since_fire -= self.interval;
            fires += 1;
        }
        fires
    }
}

/// What the scripted "player" is doing during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub movement: MoveInput,
    /// Radians per second.
    pub yaw_rate: f32,
    pub pitch: f32,
    pub breaking: bool,
    pub placing: bool,
    pub hotbar_slot: usize,
}

/// Eight-second loop of settle, walk, jump, turn, dig, build, back off.
pub fn scripted_controls(time: f32) -> Controls {
    let t = time.rem_euclid(8.0);
    let mut c = Controls::default();
    match t {
        t if t < 1.0 => {}
        t if t < 2.5 => c.movement.forward = true,
        t if t < 3.0 => {
            c.movement.forward = true;
            c.movement.jump = true;
        }
        t if t < 4.0 => {
            c.movement.right = true;
            c.yaw_rate = 0.8;
        }
        t if t < 5.0 => {
            c.pitch = -1.2;
            c.breaking = true;
        }
        t if t < 6.0 => {
            c.pitch = -1.2;
            c.placing = true;
            c.hotbar_slot = ((time * 2.0) as usize) % HOTBAR.len();
        }
        t if t < 7.0 => {
            c.movement.backward = true;
            c.movement.left = true;
        }
        _ => {}
    }
    c
}

/// End-of-run numbers, logged and appended to the event log.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub frames: u32,
    pub ticks: u64,
    pub breaks: u32,
    pub places: u32,
    pub jumps: u32,
    pub respawns: u32,
    pub eye: [f32; 3],
    pub grounded: bool,
    pub live_counts: BTreeMap<String, usize>,
    pub invariant_violations: usize,
}

/// World, physics and player, stepped one rendered frame at a time.
pub struct Session {
    config: SimConfig,
    world: World,
    engine: CollisionEngine,
    player: EntityState,
    pitch: f32,
    time: f32,
    frames: u32,
    breaking: HoldRepeat,
    placing: HoldRepeat,
    breaks: u32,
    places: u32,
    jumps: u32,
    respawns: u32,
    sink: Option<JsonlSink>,
}

impl Session {
    #[instrument(skip_all, fields(seed = config.terrain.seed))]
    pub fn new(config: SimConfig, sink: Option<JsonlSink>) -> Result<Self> {
        config.validate()?;
        let world = World::generate(&config.world_config(), &mut SequentialAllocator::default())
            .context("Failed to generate world")?;
        let engine = CollisionEngine::new(config.physics).context("Failed to build physics")?;
        let player = EntityState::spawn(world.dims(), config.player);
        info!(eye = ?player.eye(), "player spawned");

        let mut session = Self {
            config,
            world,
            engine,
            player,
            pitch: 0.0,
            time: 0.0,
            frames: 0,
            breaking: HoldRepeat::new(REPEAT_INTERVAL),
            placing: HoldRepeat::new(REPEAT_INTERVAL),
            breaks: 0,
            places: 0,
            jumps: 0,
            respawns: 0,
            sink,
        };
        if let Some(sink) = session.sink.as_mut() {
            sink.write(&SessionHeader::now("scripted", session.config.terrain.seed))?;
        }
        Ok(session)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &EntityState {
        &self.player
    }

    /// Advance one rendered frame of `dt` seconds using `controls`.
    pub fn frame(&mut self, dt: f32, controls: Controls) -> Result<()> {
        self.player.yaw += controls.yaw_rate * dt;
        self.pitch = controls.pitch;
        let reach = self.config.physics.reach;

        for _ in 0..self.breaking.update(controls.breaking, dt) {
            if let Some(broken) = self.world.break_at(self.crosshair(), reach) {
                self.breaks += 1;
                self.record(
                    "break",
                    json!({ "pos": broken.pos.to_array(), "block": broken.kind }),
                )?;
            }
        }

        let kind = HOTBAR[controls.hotbar_slot % HOTBAR.len()];
        for _ in 0..self.placing.update(controls.placing, dt) {
            if let Some(pos) = self.world.place_at(self.crosshair(), kind, reach) {
                self.places += 1;
                self.record("place", json!({ "pos": pos.to_array(), "block": kind }))?;
            }
        }

        let jumps_before = self.engine.jump_count();
        self.player = self
            .engine
            .update(dt, self.player, &controls.movement, &self.world);
        let jumped = self.engine.jump_count() - jumps_before;
        if jumped > 0 {
            self.jumps += jumped as u32;
            self.record(
                "jump",
                json!({ "eye": self.player.eye().to_array(), "count": jumped }),
            )?;
        }

        if self.player.feet().y < -FALL_LIMIT {
            warn!(eye = ?self.player.eye(), "player fell out of the world, respawning");
            self.player = EntityState::spawn(self.world.dims(), self.config.player);
            self.respawns += 1;
            self.record("respawn", json!({ "eye": self.player.eye().to_array() }))?;
        }

        self.time += dt;
        self.frames += 1;
        debug!(frame = self.frames, eye = ?self.player.eye(), grounded = self.player.grounded, "frame");
        Ok(())
    }

    /// Run `frames` frames of the built-in script.
    pub fn run_script(&mut self, frames: u32, dt: f32) -> Result<()> {
        for _ in 0..frames {
            let controls = scripted_controls(self.time);
            self.frame(dt, controls)?;
        }
        Ok(())
    }

    fn crosshair(&self) -> Ray {
        Ray::new(self.player.eye(), self.player.look_direction(self.pitch))
    }

    fn record(&mut self, kind: &str, payload: serde_json::Value) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.write(&EventRecord {
                tick: self.engine.tick(),
                kind,
                payload,
            })?;
        }
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        let live_counts = BlockKind::SOLID
            .iter()
            .map(|&kind| (kind.name().to_string(), self.world.live_count(kind)))
            .collect();
        SessionSummary {
            seed: self.config.terrain.seed,
            frames: self.frames,
            ticks: self.engine.tick().0,
            breaks: self.breaks,
            places: self.places,
            jumps: self.jumps,
            respawns: self.respawns,
            eye: self.player.eye().to_array(),
            grounded: self.player.grounded,
            live_counts,
            invariant_violations: self.world.check_invariants().len(),
        }
    }

    /// Write the summary to the event log (if any) and flush it.
    pub fn finish(mut self) -> Result<SessionSummary> {
        let summary = self.summary();
        if let Some(sink) = self.sink.as_mut() {
            sink.write(&summary)?;
            sink.flush()?;
        }
        Ok(summary)
    }
}

/// Centre of the spawn column's surface, for logging.
pub fn spawn_surface(world: &World) -> Option<Vec3> {
    let dims = world.dims();
    world.surface_at(dims.x as i32 / 2, dims.z as i32 / 2)
}
