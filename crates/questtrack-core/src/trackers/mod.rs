//! Event-derivation state machines.
//!
//! Every tracker consumes only stable-state transitions (previous vs.
//! current snapshot), never raw per-frame reads. The one piece of shared
//! mutable state, the [`TriforceLedger`], is owned by the coordinator and
//! lent to each tracker for the duration of its tick, so writes within one
//! coordinator tick are serialized by construction.

pub mod dungeon_exit;
pub mod item_hold;
pub mod staircase;
pub mod warp_death;

pub use dungeon_exit::DungeonExitTracker;
pub use item_hold::ItemHoldTracker;
pub use staircase::StaircaseItemTracker;
pub use warp_death::WarpDeathTracker;

use serde::Serialize;

use crate::events::EventKind;
use crate::state::StableGameState;

/// Which triforce pieces have been inferred so far, plus the one-shot game
/// completion latch. Shared between the dungeon-exit and item-hold
/// trackers: a piece marked by one must never be re-fired by the other.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TriforceLedger {
    bits: u8,
    complete: bool,
}

impl TriforceLedger {
    /// Mark a dungeon's piece as inferred. Returns `false` when the piece
    /// was already marked (the caller must not emit in that case).
    pub fn mark(&mut self, level: u8) -> bool {
        if !(1..=8).contains(&level) {
            return false;
        }
        let bit = 1u8 << (level - 1);
        if self.bits & bit != 0 {
            return false;
        }
        self.bits |= bit;
        true
    }

    pub fn is_inferred(&self, level: u8) -> bool {
        (1..=8).contains(&level) && self.bits & (1 << (level - 1)) != 0
    }

    pub fn count(&self) -> u8 {
        self.bits.count_ones() as u8
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Latch game completion. Returns `true` only the first time.
    pub fn latch_complete(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.complete = true;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One stable-state transition, as seen by every tracker this tick.
pub struct TickContext<'a> {
    pub prev: &'a StableGameState,
    pub curr: &'a StableGameState,
    pub frame_index: u64,
    pub timestamp_ms: u64,
}

/// Events and anomaly notes produced by a single tracker tick.
#[derive(Debug, Default)]
pub struct TrackerOutput {
    pub events: Vec<EventKind>,
    pub anomalies: Vec<String>,
}

impl TrackerOutput {
    pub fn emit(&mut self, kind: EventKind) {
        self.events.push(kind);
    }

    pub fn anomaly(&mut self, message: impl Into<String>) {
        self.anomalies.push(message.into());
    }
}

pub trait Tracker {
    fn name(&self) -> &'static str;

    fn tick(&mut self, ctx: &TickContext<'_>, ledger: &mut TriforceLedger, out: &mut TrackerOutput);

    fn reset(&mut self);
}
