//! Tick-by-tick recording of tiny simulations.
//!
//! A micro-worldtest steps some state a fixed number of ticks and keeps a
//! serializable snapshot of it after every tick. Reports are compared either
//! with a golden file or with another run of the same scenario.

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use cubeworld_core::SimTick;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a golden-file micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Scenario name, written into the report.
    pub name: String,
    /// Ticks to step; the report holds `ticks + 1` frames.
    pub ticks: u64,
    /// Golden JSON location.
    pub snapshot_path: PathBuf,
}

/// State captured after a tick (tick 0 is the untouched initial state).
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Every frame captured by one run.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestReport<S> {
    /// Scenario name.
    pub name: String,
    /// Frames in tick order.
    pub frames: Vec<MicroWorldtestFrame<S>>,
}

impl<S: Serialize> MicroWorldtestReport<S> {
    /// First tick whose snapshot serializes differently from `other`'s.
    pub fn diverges_at(&self, other: &Self) -> Option<u64> {
        let as_json = |s: &S| serde_json::to_value(s).ok();
        let mismatch = self
            .frames
            .iter()
            .zip(&other.frames)
            .find(|(a, b)| as_json(&a.snapshot) != as_json(&b.snapshot))
            .map(|(a, _)| a.tick);
        mismatch.or_else(|| {
            let shorter = self.frames.len().min(other.frames.len());
            (self.frames.len() != other.frames.len()).then_some(shorter as u64)
        })
    }
}

/// Step `state` for `ticks` ticks, snapshotting before the first step and
/// after each one.
pub fn record_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    name: impl Into<String>,
    ticks: u64,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> MicroWorldtestReport<Snapshot>
where
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let initial = MicroWorldtestFrame {
        tick: SimTick::ZERO.0,
        snapshot: snapshot(SimTick::ZERO, &state),
    };
    let stepped = (0..ticks).map(|n| {
        let before = SimTick(n);
        step(before, &mut state);
        let after = before.advance(1);
        MicroWorldtestFrame {
            tick: after.0,
            snapshot: snapshot(after, &state),
        }
    });

    let mut frames = vec![initial];
    frames.extend(stepped);
    MicroWorldtestReport {
        name: name.into(),
        frames,
    }
}

/// Record a scenario and check it against `config.snapshot_path`.
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    state: State,
    step: StepFn,
    snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let report = record_micro_worldtest(config.name, config.ticks, state, step, snapshot);
    assert_json_snapshot(config.snapshot_path, &report)
}
