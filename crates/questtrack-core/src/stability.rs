//! Per-field debounce between raw frame reads and the canonical state.
//!
//! Raw reads are noisy: compression artifacts flip digits, sprites blink,
//! overlays occlude tiles for a frame or two. The gate requires N
//! consecutive agreeing reads (N per field, see [`StabilityConfig`]) before
//! a new value replaces the stable one. Undetected reads never start,
//! advance or clear a pending candidate; the stable value simply persists.

use std::fmt::Debug;

use serde::Serialize;

use crate::config::StabilityConfig;
use crate::state::{
    FloorItem, Hearts, KeysReading, MapPosition, RawFrameObservation, ScreenType, StableGameState,
    TriforceReading,
};

/// One field's debounce cell.
#[derive(Debug, Clone)]
pub struct PendingField<T> {
    threshold: u32,
    pending: Option<(T, u32)>,
}

impl<T: PartialEq + Clone + Debug> PendingField<T> {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: None,
        }
    }

    /// Feed one raw read. Returns the newly promoted value, if any.
    ///
    /// - `None` read: ignored entirely.
    /// - Read equals the stable value: any pending candidate is dropped.
    /// - Read matches the pending candidate: count advances, promoting at
    ///   the threshold.
    /// - Read disagrees with the pending candidate: the candidate is
    ///   replaced and the count restarts at 1.
    pub fn observe(&mut self, stable: &T, raw: Option<T>) -> Option<T> {
        let raw = raw?;
        if raw == *stable {
            self.pending = None;
            return None;
        }
        let count = match self.pending.take() {
            Some((candidate, count)) if candidate == raw => count + 1,
            _ => 1,
        };
        if count >= self.threshold {
            return Some(raw);
        }
        self.pending = Some((raw, count));
        None
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    fn snapshot(&self, field: &'static str, stable: &T) -> Option<PendingSnapshot> {
        self.pending.as_ref().map(|(candidate, count)| PendingSnapshot {
            field,
            stable: format!("{stable:?}"),
            candidate: format!("{candidate:?}"),
            count: *count,
            threshold: self.threshold,
        })
    }
}

/// Diagnostic view of one in-flight candidate, for calibration tooling.
#[derive(Debug, Clone, Serialize)]
pub struct PendingSnapshot {
    pub field: &'static str,
    pub stable: String,
    pub candidate: String,
    pub count: u32,
    pub threshold: u32,
}

/// The full set of debounce cells for one tracked entity.
#[derive(Debug)]
pub struct StabilityGate {
    config: StabilityConfig,
    screen_type: PendingField<ScreenType>,
    dungeon_level: PendingField<u8>,
    hearts: PendingField<Hearts>,
    rupees: PendingField<u8>,
    keys: PendingField<KeysReading>,
    bombs: PendingField<u8>,
    b_item: PendingField<Option<String>>,
    sword_level: PendingField<u8>,
    map_position: PendingField<Option<MapPosition>>,
    floor_items: PendingField<Vec<FloorItem>>,
    pedestal_item: PendingField<Option<String>>,
    triforce: PendingField<TriforceReading>,
}

impl StabilityGate {
    pub fn new(config: StabilityConfig) -> Self {
        let d = config.default_threshold;
        Self {
            screen_type: PendingField::new(config.screen_type),
            dungeon_level: PendingField::new(d),
            hearts: PendingField::new(config.hearts),
            rupees: PendingField::new(d),
            keys: PendingField::new(d),
            bombs: PendingField::new(d),
            b_item: PendingField::new(d),
            sword_level: PendingField::new(d),
            map_position: PendingField::new(config.map_position),
            floor_items: PendingField::new(config.floor_items),
            pedestal_item: PendingField::new(config.pedestal),
            triforce: PendingField::new(config.triforce),
            config,
        }
    }

    /// Feed one observation, promoting agreed candidates into `state`.
    /// Returns the names of the fields that changed.
    pub fn apply(
        &mut self,
        obs: &RawFrameObservation,
        state: &mut StableGameState,
    ) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if let Some(v) = self.screen_type.observe(&state.screen_type, obs.screen_type) {
            state.screen_type = v;
            changed.push("screen_type");
        }
        if let Some(v) = self.dungeon_level.observe(&state.dungeon_level, obs.dungeon_level) {
            state.dungeon_level = v;
            changed.push("dungeon_level");
        }
        let stable_hearts = Hearts::new(state.hearts_current, state.hearts_max, state.half_heart);
        if let Some(v) = self.hearts.observe(&stable_hearts, obs.hearts) {
            state.hearts_current = v.current;
            state.hearts_max = v.max;
            state.half_heart = v.half;
            changed.push("hearts");
        }
        if let Some(v) = self.rupees.observe(&state.rupees, obs.rupees) {
            state.rupees = v;
            changed.push("rupees");
        }
        let stable_keys = if state.has_master_key {
            KeysReading::MasterKey
        } else {
            KeysReading::Count(state.keys)
        };
        if let Some(v) = self.keys.observe(&stable_keys, obs.keys) {
            match v {
                KeysReading::Count(n) => {
                    state.keys = n;
                    state.has_master_key = false;
                }
                // The key count is meaningless once the master key shows;
                // leave the last count alone.
                KeysReading::MasterKey => state.has_master_key = true,
            }
            changed.push("keys");
        }
        if let Some(v) = self.bombs.observe(&state.bombs, obs.bombs) {
            state.bombs = v;
            changed.push("bombs");
        }
        if let Some(v) = self.b_item.observe(&state.b_item, obs.b_item.clone()) {
            state.b_item = v;
            changed.push("b_item");
        }
        if let Some(v) = self.sword_level.observe(&state.sword_level, obs.sword_level) {
            state.sword_level = v;
            changed.push("sword_level");
        }
        // The raw reader never reports "definitely nowhere", so the stable
        // position can only move, never vanish.
        if let Some(v) = self
            .map_position
            .observe(&state.map_position, obs.map_position.map(Some))
        {
            state.map_position = v;
            changed.push("map_position");
        }
        if let Some(v) = self.floor_items.observe(&state.floor_items, obs.floor_items.clone()) {
            state.floor_items = v;
            changed.push("floor_items");
        }
        if let Some(v) = self
            .pedestal_item
            .observe(&state.pedestal_item, obs.pedestal_item.clone())
        {
            state.pedestal_item = v;
            changed.push("pedestal_item");
        }
        let stable_triforce = TriforceReading {
            count: state.triforce_count,
            bits: state.triforce_bits,
        };
        if let Some(v) = self.triforce.observe(&stable_triforce, obs.triforce) {
            state.triforce_count = v.count;
            state.triforce_bits = v.bits;
            changed.push("triforce");
        }

        changed
    }

    /// All in-flight candidates with their current stable values, for
    /// diagnostic/calibration tooling.
    pub fn pending_fields(&self, state: &StableGameState) -> Vec<PendingSnapshot> {
        let stable_hearts = Hearts::new(state.hearts_current, state.hearts_max, state.half_heart);
        let stable_keys = if state.has_master_key {
            KeysReading::MasterKey
        } else {
            KeysReading::Count(state.keys)
        };
        let stable_triforce = TriforceReading {
            count: state.triforce_count,
            bits: state.triforce_bits,
        };
        [
            self.screen_type.snapshot("screen_type", &state.screen_type),
            self.dungeon_level.snapshot("dungeon_level", &state.dungeon_level),
            self.hearts.snapshot("hearts", &stable_hearts),
            self.rupees.snapshot("rupees", &state.rupees),
            self.keys.snapshot("keys", &stable_keys),
            self.bombs.snapshot("bombs", &state.bombs),
            self.b_item.snapshot("b_item", &state.b_item),
            self.sword_level.snapshot("sword_level", &state.sword_level),
            self.map_position.snapshot("map_position", &state.map_position),
            self.floor_items.snapshot("floor_items", &state.floor_items),
            self.pedestal_item.snapshot("pedestal_item", &state.pedestal_item),
            self.triforce.snapshot("triforce", &stable_triforce),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Drop every pending candidate and rebuild the cells. Stable state is
    /// owned by the caller and cleared separately.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
