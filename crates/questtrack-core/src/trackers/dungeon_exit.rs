//! Dungeon entry/exit observer.
//!
//! Arms on transition into a dungeon, watches the minimum heart count for
//! the whole stay, and classifies the eventual exit: a death (hearts hit
//! zero, or the death screen was seen) suppresses inference; a normal exit
//! infers the dungeon's triforce piece; a normal exit from level 9 with all
//! eight pieces inferred completes the game, once, forever.

use crate::events::EventKind;
use crate::state::ScreenType;

use super::{TickContext, Tracker, TrackerOutput, TriforceLedger};

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    InDungeon {
        level: u8,
        /// `None` until the hearts meter has actually been read; a stable
        /// `hearts_max` of zero means hearts were never observed, and a
        /// never-observed meter must not count as a zero-heart stay.
        min_hearts: Option<u8>,
        death_seen: bool,
    },
}

#[derive(Debug)]
pub struct DungeonExitTracker {
    phase: Phase,
}

impl DungeonExitTracker {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }
}

impl Default for DungeonExitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker for DungeonExitTracker {
    fn name(&self) -> &'static str {
        "dungeon_exit"
    }

    fn tick(
        &mut self,
        ctx: &TickContext<'_>,
        ledger: &mut TriforceLedger,
        out: &mut TrackerOutput,
    ) {
        let prev = ctx.prev;
        let curr = ctx.curr;

        match &mut self.phase {
            Phase::Idle => {
                if prev.screen_type != ScreenType::Dungeon
                    && curr.screen_type == ScreenType::Dungeon
                {
                    self.phase = Phase::InDungeon {
                        level: curr.dungeon_level,
                        min_hearts: (curr.hearts_max > 0).then_some(curr.hearts_current),
                        death_seen: false,
                    };
                }
            }
            Phase::InDungeon {
                level,
                min_hearts,
                death_seen,
            } => match curr.screen_type {
                ScreenType::Dungeon => {
                    if curr.hearts_max > 0 {
                        *min_hearts = Some(match *min_hearts {
                            Some(min) => min.min(curr.hearts_current),
                            None => curr.hearts_current,
                        });
                    }
                    // The level digit can lag the screen flip by a frame.
                    if curr.dungeon_level != 0 {
                        *level = curr.dungeon_level;
                    }
                }
                // Subscreen checks and room transitions happen inside the
                // dungeon; they do not resolve the exit.
                ScreenType::Subscreen | ScreenType::Transition | ScreenType::Unknown => {}
                ScreenType::Death => {
                    *death_seen = true;
                }
                ScreenType::Overworld | ScreenType::Cave | ScreenType::Title => {
                    let died = *death_seen || *min_hearts == Some(0);
                    let level = *level;
                    if !died && curr.screen_type != ScreenType::Title {
                        if (1..=8).contains(&level) {
                            if !ledger.is_inferred(level) {
                                ledger.mark(level);
                                out.emit(EventKind::TriforceInferred { level });
                            }
                        } else if level == 9 && ledger.count() == 8 && ledger.latch_complete() {
                            out.emit(EventKind::GameComplete);
                        }
                    }
                    self.phase = Phase::Idle;
                }
            },
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StableGameState;

    fn state(screen: ScreenType, level: u8, hearts: u8) -> StableGameState {
        StableGameState {
            screen_type: screen,
            dungeon_level: level,
            hearts_current: hearts,
            hearts_max: 3,
            ..Default::default()
        }
    }

    fn run(
        tracker: &mut DungeonExitTracker,
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
    fn test_normal_exit_infers_triforce_once() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        let states = vec![
            state(ScreenType::Overworld, 0, 3),
            state(ScreenType::Dungeon, 3, 3),
            state(ScreenType::Dungeon, 3, 2),
            state(ScreenType::Overworld, 0, 2),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert_eq!(events, vec![EventKind::TriforceInferred { level: 3 }]);
        assert!(ledger.is_inferred(3));

        // Re-entering and leaving the same dungeon does not re-fire.
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_death_exit_suppresses_inference() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        let states = vec![
            state(ScreenType::Overworld, 0, 3),
            state(ScreenType::Dungeon, 5, 3),
            state(ScreenType::Dungeon, 5, 0),
            state(ScreenType::Death, 0, 0),
            state(ScreenType::Overworld, 0, 3),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
        assert!(!ledger.is_inferred(5));
    }

    #[test]
    fn test_unread_hearts_meter_does_not_read_as_death() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        // The hearts reader never produced a value, so the stable meter is
        // still at its zeroed default for the whole stay.
        let unread = |screen, level| StableGameState {
            screen_type: screen,
            dungeon_level: level,
            hearts_current: 0,
            hearts_max: 0,
            ..Default::default()
        };
        let states = vec![
            unread(ScreenType::Overworld, 0),
            unread(ScreenType::Dungeon, 4),
            unread(ScreenType::Dungeon, 4),
            unread(ScreenType::Overworld, 0),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert_eq!(events, vec![EventKind::TriforceInferred { level: 4 }]);
    }

    #[test]
    fn test_subscreen_does_not_resolve_exit() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        let states = vec![
            state(ScreenType::Overworld, 0, 3),
            state(ScreenType::Dungeon, 2, 3),
            state(ScreenType::Subscreen, 2, 3),
            state(ScreenType::Dungeon, 2, 3),
            state(ScreenType::Overworld, 0, 3),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert_eq!(events, vec![EventKind::TriforceInferred { level: 2 }]);
    }

    #[test]
    fn test_game_complete_latches_once() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        for level in 1..=8 {
            ledger.mark(level);
        }
        let states = vec![
            state(ScreenType::Overworld, 0, 3),
            state(ScreenType::Dungeon, 9, 3),
            state(ScreenType::Overworld, 0, 3),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert_eq!(events, vec![EventKind::GameComplete]);

        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_level_nine_without_all_pieces_is_silent() {
        let mut tracker = DungeonExitTracker::new();
        let mut ledger = TriforceLedger::default();
        ledger.mark(1);
        let states = vec![
            state(ScreenType::Overworld, 0, 3),
            state(ScreenType::Dungeon, 9, 3),
            state(ScreenType::Overworld, 0, 3),
        ];
        let events = run(&mut tracker, &mut ledger, &states);
        assert!(events.is_empty());
        assert!(!ledger.is_complete());
    }
}
