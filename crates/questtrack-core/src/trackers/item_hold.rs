//! Overhead item-hold observer.
//!
//! When a triforce piece is picked up the sprite is held above the player's
//! head for a couple of seconds. The tracker waits for a holdable item to
//! appear above the hold line, requires the hold to persist for a minimum
//! number of stable frames, fires once, and rearms only after the held
//! sprite disappears again.

use crate::config::TrackerConfig;
use crate::events::EventKind;
use crate::state::StableGameState;

use super::{TickContext, Tracker, TrackerOutput, TriforceLedger};

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Holding { item: String, frames: u32 },
    Fired { item: String },
}

#[derive(Debug)]
pub struct ItemHoldTracker {
    hold_y_max: u32,
    min_hold_frames: u32,
    holdable: Vec<String>,
    phase: Phase,
}

impl ItemHoldTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            hold_y_max: config.hold_y_max,
            min_hold_frames: config.min_hold_frames.max(1),
            holdable: config.holdable_labels.clone(),
            phase: Phase::Idle,
        }
    }

    fn held_item<'a>(&self, state: &'a StableGameState) -> Option<&'a str> {
        state
            .floor_items
            .iter()
            .find(|item| item.y <= self.hold_y_max && self.holdable.iter().any(|l| l == &item.label))
            .map(|item| item.label.as_str())
    }
}

impl Tracker for ItemHoldTracker {
    fn name(&self) -> &'static str {
        "item_hold"
    }

    fn tick(
        &mut self,
        ctx: &TickContext<'_>,
        ledger: &mut TriforceLedger,
        out: &mut TrackerOutput,
    ) {
        let held = self.held_item(ctx.curr).map(str::to_owned);

        match &mut self.phase {
            Phase::Idle => {
                if let Some(item) = held {
                    self.phase = Phase::Holding { item, frames: 1 };
                }
            }
            Phase::Holding { item, frames } => match held {
                Some(ref h) if h == item => {
                    *frames += 1;
                    if *frames >= self.min_hold_frames {
                        let level = ctx.curr.dungeon_level;
                        if (1..=8).contains(&level) {
                            if ledger.mark(level) {
                                out.emit(EventKind::TriforceInferred { level });
                            } else {
                                out.anomaly(format!(
                                    "hold of {item} in dungeon {level} but piece already inferred"
                                ));
                            }
                        }
                        self.phase = Phase::Fired { item: item.clone() };
                    }
                }
                // The hold broke or a different sprite appeared; start over.
                _ => self.phase = Phase::Idle,
            },
            Phase::Fired { .. } => {
                if held.is_none() {
                    self.phase = Phase::Idle;
                }
            }
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FloorItem, ScreenType};

    fn holding_state(label: Option<&str>, y: u32) -> StableGameState {
        StableGameState {
            screen_type: ScreenType::Dungeon,
            dungeon_level: 4,
            floor_items: label
                .map(|l| vec![FloorItem::new(l, 120, y, 0.9)])
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    fn run(
        tracker: &mut ItemHoldTracker,
        ledger: &mut TriforceLedger,
        states: &[StableGameState],
    ) -> Vec<EventKind> {
        let mut events = Vec::new();
        for pair in states.windows(2) {
            let ctx = TickContext {
                prev: &pair[0],
                curr: &pair[1],
                frame_index: 0,
                timestamp_ms: 0,
            };
            let mut out = TrackerOutput::default();
            tracker.tick(&ctx, ledger, &mut out);
            events.extend(out.events);
        }
        events
    }

    #[test]
    fn test_sustained_hold_fires_exactly_once() {
        let config = TrackerConfig::default();
        let mut tracker = ItemHoldTracker::new(&config);
        let mut ledger = TriforceLedger::default();

        let mut states = vec![holding_state(None, 0)];
        // Six consecutive hold frames, well past the minimum of three.
        for _ in 0..6 {
            states.push(holding_state(Some("triforce"), 40));
        }
        states.push(holding_state(None, 0));

        let events = run(&mut tracker, &mut ledger, &states);
        assert_eq!(events, vec![EventKind::TriforceInferred { level: 4 }]);
        assert!(ledger.is_inferred(4));
    }

    #[test]
    fn test_short_hold_does_not_fire() {
        let config = TrackerConfig::default();
        let mut tracker = ItemHoldTracker::new(&config);
        let mut ledger = TriforceLedger::default();

        let states = vec![
            holding_state(None, 0),
            holding_state(Some("triforce"), 40),
            holding_state(Some("triforce"), 40),
            holding_state(None, 0),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_floor_clutter_below_hold_line_is_ignored() {
        let config = TrackerConfig::default();
        let mut tracker = ItemHoldTracker::new(&config);
        let mut ledger = TriforceLedger::default();

        let mut states = vec![holding_state(None, 0)];
        for _ in 0..6 {
            states.push(holding_state(Some("triforce"), 150));
        }
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_already_inferred_piece_is_not_refired() {
        let config = TrackerConfig::default();
        let mut tracker = ItemHoldTracker::new(&config);
        let mut ledger = TriforceLedger::default();
        // The dungeon-exit tracker inferred this piece earlier.
        ledger.mark(4);

        let mut states = vec![holding_state(None, 0)];
        for _ in 0..6 {
            states.push(holding_state(Some("triforce"), 40));
        }
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
    }
}
