//! Tracker orchestration.
//!
//! The coordinator owns the shared triforce ledger, runs the four trackers
//! in a fixed order each tick, stamps and collects their events, and applies
//! cross-field sanity rules. Contradictions never fail a tick: the earlier
//! tracker's ledger write wins and the contradiction is kept as an anomaly.

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::events::{EventKind, GameEvent};
use crate::state::StableGameState;
use crate::trackers::{
    DungeonExitTracker, ItemHoldTracker, StaircaseItemTracker, TickContext, Tracker,
    TrackerOutput, TriforceLedger, WarpDeathTracker,
};

/// A recorded cross-field or cross-tracker contradiction.
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub frame_index: u64,
    pub source: &'static str,
    pub message: String,
}

pub struct Coordinator {
    entity: String,
    ledger: TriforceLedger,
    dungeon_exit: DungeonExitTracker,
    item_hold: ItemHoldTracker,
    warp_death: WarpDeathTracker,
    staircase: StaircaseItemTracker,
    anomalies: Vec<Anomaly>,
}

impl Coordinator {
    pub fn new(entity: impl Into<String>, config: &TrackerConfig) -> Self {
        Self {
            entity: entity.into(),
            ledger: TriforceLedger::default(),
            dungeon_exit: DungeonExitTracker::new(),
            item_hold: ItemHoldTracker::new(config),
            warp_death: WarpDeathTracker::new(config),
            staircase: StaircaseItemTracker::new(config),
            anomalies: Vec::new(),
        }
    }

    /// Run all trackers against one stable-state transition and return the
    /// ordered event batch.
    pub fn tick(
        &mut self,
        prev: &StableGameState,
        curr: &StableGameState,
        frame_index: u64,
        timestamp_ms: u64,
    ) -> Vec<GameEvent> {
        let ctx = TickContext {
            prev,
            curr,
            frame_index,
            timestamp_ms,
        };

        // Split borrows so the ledger can be lent to each tracker in turn.
        let Self {
            entity,
            ledger,
            dungeon_exit,
            item_hold,
            warp_death,
            staircase,
            anomalies,
        } = self;

        // Evaluation order is a contract: when two trackers would infer the
        // same piece in one tick, the earlier one's write wins.
        let trackers: [&mut dyn Tracker; 4] = [dungeon_exit, item_hold, warp_death, staircase];

        let mut events = Vec::new();
        for tracker in trackers {
            let mut out = TrackerOutput::default();
            tracker.tick(&ctx, ledger, &mut out);
            for kind in out.events {
                events.push(GameEvent {
                    kind,
                    entity: entity.clone(),
                    frame_index,
                    timestamp_ms,
                    source: tracker.name(),
                });
            }
            for message in out.anomalies {
                tracing::warn!(
                    entity = entity.as_str(),
                    source = tracker.name(),
                    frame_index,
                    "tracker anomaly: {message}"
                );
                anomalies.push(Anomaly {
                    frame_index,
                    source: tracker.name(),
                    message,
                });
            }
        }

        self.check_cross_field(&events, prev, curr, frame_index);
        events
    }

    /// Cross-field sanity rules. Contradictions are observability signals,
    /// not rejections: the events stand.
    fn check_cross_field(
        &mut self,
        events: &[GameEvent],
        prev: &StableGameState,
        curr: &StableGameState,
        frame_index: u64,
    ) {
        for event in events {
            if let EventKind::StaircaseItemAcquired { item, .. } = &event.kind {
                if item == "heart_container" && curr.hearts_max <= prev.hearts_max {
                    let message = format!(
                        "heart container acquired but max hearts stayed at {}",
                        curr.hearts_max
                    );
                    tracing::warn!(
                        entity = self.entity.as_str(),
                        frame_index,
                        "cross-field anomaly: {message}"
                    );
                    self.anomalies.push(Anomaly {
                        frame_index,
                        source: "coordinator",
                        message,
                    });
                }
            }
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn ledger(&self) -> &TriforceLedger {
        &self.ledger
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Clear the ledger, every tracker's machine state and the anomaly log.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.dungeon_exit.reset();
        self.item_hold.reset();
        self.warp_death.reset();
        self.staircase.reset();
        self.anomalies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FloorItem, MapPosition, ScreenType};

    fn dungeon(level: u8, hearts: u8) -> StableGameState {
        StableGameState {
            screen_type: ScreenType::Dungeon,
            dungeon_level: level,
            hearts_current: hearts,
            hearts_max: 3,
            map_position: Some(MapPosition::new(3, 4)),
            ..Default::default()
        }
    }

    fn overworld(hearts: u8) -> StableGameState {
        StableGameState {
            screen_type: ScreenType::Overworld,
            hearts_current: hearts,
            hearts_max: 3,
            map_position: Some(MapPosition::new(7, 7)),
            ..Default::default()
        }
    }

    fn run(coord: &mut Coordinator, states: &[StableGameState]) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for (i, pair) in states.windows(2).enumerate() {
            events.extend(coord.tick(&pair[0], &pair[1], i as u64, i as u64 * 250));
        }
        events
    }

    #[test]
    fn test_hold_then_exit_infers_once_with_anomaly_free_dedup() {
        let config = TrackerConfig::default();
        let mut coord = Coordinator::new("p1", &config);

        // Hold the piece overhead long enough for the hold tracker to fire,
        // then leave the dungeon: the exit tracker must not re-fire.
        let mut states = vec![overworld(3), dungeon(4, 3)];
        for _ in 0..4 {
            let mut s = dungeon(4, 3);
            s.floor_items = vec![FloorItem::new("triforce", 120, 40, 0.9)];
            states.push(s);
        }
        states.push(dungeon(4, 3));
        states.push(overworld(3));

        let events = run(&mut coord, &states);
        let inferred: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::TriforceInferred { .. }))
            .collect();
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].source, "item_hold");
        assert!(coord.ledger().is_inferred(4));
    }

    #[test]
    fn test_events_are_stamped_with_entity_and_source() {
        let config = TrackerConfig::default();
        let mut coord = Coordinator::new("racer-2", &config);

        let states = vec![overworld(3), dungeon(1, 3), overworld(3)];
        let events = run(&mut coord, &states);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity, "racer-2");
        assert_eq!(events[0].source, "dungeon_exit");
        assert_eq!(events[0].kind, EventKind::TriforceInferred { level: 1 });
    }

    #[test]
    fn test_heart_container_without_max_increase_is_anomalous() {
        let config = TrackerConfig::default();
        let mut coord = Coordinator::new("p1", &config);

        let mut states = vec![dungeon(7, 3), dungeon(7, 3)];
        for _ in 0..2 {
            let mut s = dungeon(7, 3);
            s.pedestal_item = Some("heart_container".to_string());
            states.push(s);
        }
        for _ in 0..3 {
            states.push(dungeon(7, 3));
        }

        let events = run(&mut coord, &states);
        assert!(events
            .iter()
            .any(|e| matches!(e.kind, EventKind::StaircaseItemAcquired { .. })));
        assert_eq!(coord.anomalies().len(), 1);
        assert_eq!(coord.anomalies()[0].source, "coordinator");
    }

    #[test]
    fn test_reset_clears_ledger_and_machines() {
        let config = TrackerConfig::default();
        let mut coord = Coordinator::new("p1", &config);
        let states = vec![overworld(3), dungeon(2, 3), overworld(3)];
        run(&mut coord, &states);
        assert!(coord.ledger().is_inferred(2));

        coord.reset();
        assert_eq!(coord.ledger().count(), 0);

        // The same run fires again after a reset.
        let events = run(&mut coord, &states);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_quiet_stream_emits_nothing() {
        let config = TrackerConfig::default();
        let mut coord = Coordinator::new("p1", &config);
        let states = vec![overworld(3); 6];
        let events = run(&mut coord, &states);
        assert!(events.is_empty());
    }
}
