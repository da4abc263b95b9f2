//! Death and Up+A-warp observer.
//!
//! Three running measurements: the hearts-zero streak, the length of the
//! current non-gameplay gap, and the last known map position. A sufficiently
//! long hearts-zero streak (or an observed death screen) arms death
//! detection; the death fires on the next discontinuity that lands at a
//! respawn position. A position jump within the same screen type that is not
//! separated by a natural-transition-sized gap is an Up+A warp instead. The
//! two never both fire for one discontinuity.
//!
//! Warps are not reported on the jump tick. The position and screen-type
//! fields debounce at different rates upstream, so around a screen change
//! the stable position lands a tick or two before (or after) the stable
//! screen type and briefly reads as a same-type jump. A warp therefore has
//! to settle: the jump must persist for `warp_settle_frames` ticks with no
//! screen-type change on either side of it.

use crate::config::TrackerConfig;
use crate::state::{MapPosition, ScreenType, StableGameState};

use super::{TickContext, Tracker, TrackerOutput, TriforceLedger};
use crate::events::EventKind;

#[derive(Debug)]
pub struct WarpDeathTracker {
    death_streak: u32,
    natural_gap: u32,
    settle: u32,
    overworld_start: MapPosition,

    zero_streak: u32,
    armed_death: bool,
    gap: u32,
    last_pos: Option<(ScreenType, MapPosition)>,
    /// Gameplay ticks since the stable screen type last changed.
    since_type_change: u32,
    /// Ticks left before an observed jump is reported as a warp.
    pending_warp: Option<u32>,
}

impl WarpDeathTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            death_streak: config.death_streak.max(1),
            natural_gap: config.natural_transition_gap,
            settle: config.warp_settle_frames,
            overworld_start: config.overworld_start,
            zero_streak: 0,
            armed_death: false,
            gap: 0,
            last_pos: None,
            since_type_change: u32::MAX,
            pending_warp: None,
        }
    }

    /// Whether the current screen/position is a place a death respawn lands.
    /// The overworld respawn cell is fixed; dungeon deaths respawn at the
    /// dungeon's entrance room, which varies per level, so any dungeon
    /// arrival is accepted there.
    fn at_respawn(&self, state: &StableGameState) -> bool {
        match state.screen_type {
            ScreenType::Overworld => state.map_position == Some(self.overworld_start),
            ScreenType::Dungeon => true,
            _ => false,
        }
    }
}

impl Tracker for WarpDeathTracker {
    fn name(&self) -> &'static str {
        "warp_death"
    }

    fn tick(
        &mut self,
        ctx: &TickContext<'_>,
        _ledger: &mut TriforceLedger,
        out: &mut TrackerOutput,
    ) {
        let curr = ctx.curr;

        if curr.screen_type == ScreenType::Death {
            self.armed_death = true;
        }

        if !curr.screen_type.is_gameplay() {
            self.gap += 1;
            // A non-gameplay interlude is a natural transition; whatever
            // jump was settling was part of it.
            self.pending_warp = None;
            return;
        }

        if curr.hearts_current == 0 {
            self.zero_streak += 1;
            if self.zero_streak >= self.death_streak {
                self.armed_death = true;
            }
        } else {
            self.zero_streak = 0;
        }

        let type_change = self
            .last_pos
            .map(|(last_type, _)| last_type != curr.screen_type)
            .unwrap_or(false);
        if type_change {
            self.since_type_change = 0;
            self.pending_warp = None;
        } else {
            self.since_type_change = self.since_type_change.saturating_add(1);
        }

        if let Some(pos) = curr.map_position {
            let (same_type_jump, discontinuity) = match self.last_pos {
                Some((last_type, last_pos)) => {
                    let jump =
                        last_type == curr.screen_type && last_pos.grid_distance(pos) > 1;
                    (jump, type_change || jump || self.gap > 0)
                }
                // No position seen yet: a preceding gap is still an arrival.
                None => (false, self.gap > 0),
            };

            if discontinuity {
                if self.armed_death && self.at_respawn(curr) {
                    out.emit(EventKind::Death);
                    self.armed_death = false;
                    self.zero_streak = 0;
                    self.pending_warp = None;
                } else if same_type_jump
                    && self.gap < self.natural_gap
                    && self.since_type_change > self.settle
                {
                    self.pending_warp = Some(self.settle);
                }
            } else if curr.hearts_current > 0 {
                // Hearts recovered in place (potion, fairy): the streak was
                // not a death after all.
                self.armed_death = false;
            }

            self.last_pos = Some((curr.screen_type, pos));
        }

        if let Some(remaining) = self.pending_warp {
            if remaining == 0 {
                out.emit(EventKind::UpAWarp);
                self.pending_warp = None;
            } else {
                self.pending_warp = Some(remaining - 1);
            }
        }

        self.gap = 0;
    }

    fn reset(&mut self) {
        self.zero_streak = 0;
        self.armed_death = false;
        self.gap = 0;
        self.last_pos = None;
        self.since_type_change = u32::MAX;
        self.pending_warp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gameplay(screen: ScreenType, hearts: u8, pos: (u8, u8)) -> StableGameState {
        StableGameState {
            screen_type: screen,
            hearts_current: hearts,
            hearts_max: 3,
            map_position: Some(MapPosition::new(pos.0, pos.1)),
            ..Default::default()
        }
    }

    fn run(tracker: &mut WarpDeathTracker, states: &[StableGameState]) -> Vec<EventKind> {
        let mut ledger = TriforceLedger::default();
        let mut events = Vec::new();
        for pair in states.windows(2) {
            let ctx = TickContext {
                prev: &pair[0],
                curr: &pair[1],
                frame_index: 0,
                timestamp_ms: 0,
            };
            let mut out = TrackerOutput::default();
            tracker.tick(&ctx, &mut ledger, &mut out);
            events.extend(out.events);
        }
        events
    }

    #[test]
    fn test_exact_streak_then_respawn_is_one_death() {
        let config = TrackerConfig::default(); // death_streak = 3
        let mut tracker = WarpDeathTracker::new(&config);

        let mut states = vec![gameplay(ScreenType::Overworld, 3, (3, 5))];
        for _ in 0..3 {
            states.push(gameplay(ScreenType::Overworld, 0, (3, 5)));
        }
        states.push(gameplay(ScreenType::Overworld, 3, (7, 7)));
        states.push(gameplay(ScreenType::Overworld, 3, (7, 7)));

        let events = run(&mut tracker, &states);
        assert_eq!(events, vec![EventKind::Death]);
    }

    #[test]
    fn test_streak_one_short_yields_nothing() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        let mut states = vec![gameplay(ScreenType::Overworld, 3, (3, 5))];
        for _ in 0..2 {
            states.push(gameplay(ScreenType::Overworld, 0, (3, 5)));
        }
        states.push(gameplay(ScreenType::Overworld, 3, (7, 7)));

        // The discontinuity may still settle into a warp, but a streak one
        // frame short of the threshold never produces a death.
        let events = run(&mut tracker, &states);
        assert!(!events.contains(&EventKind::Death));
    }

    #[test]
    fn test_death_and_warp_are_exclusive_per_discontinuity() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        // Armed streak followed by a same-type jump to the start cell:
        // the death wins, no warp.
        let mut states = vec![gameplay(ScreenType::Overworld, 3, (2, 2))];
        for _ in 0..3 {
            states.push(gameplay(ScreenType::Overworld, 0, (2, 2)));
        }
        states.push(gameplay(ScreenType::Overworld, 3, (7, 7)));

        let events = run(&mut tracker, &states);
        assert_eq!(events, vec![EventKind::Death]);
    }

    #[test]
    fn test_position_jump_without_gap_is_up_a_warp() {
        let config = TrackerConfig::default(); // settle = 2
        let mut tracker = WarpDeathTracker::new(&config);

        // The jump must outlast the settle window before it is reported.
        let states = vec![
            gameplay(ScreenType::Overworld, 3, (12, 2)),
            gameplay(ScreenType::Overworld, 3, (12, 2)),
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Overworld, 3, (7, 7)),
        ];
        let events = run(&mut tracker, &states);
        assert_eq!(events, vec![EventKind::UpAWarp]);
    }

    #[test]
    fn test_jump_settling_into_a_screen_change_is_not_a_warp() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        // The stable position lands one tick before the stable screen type
        // when both change together (the position field debounces faster).
        // The brief same-type jump must not read as a warp.
        let states = vec![
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Overworld, 3, (3, 4)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
        ];
        let events = run(&mut tracker, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_jump_right_after_a_screen_change_is_not_a_warp() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        // The mirror ordering: the stable screen type lands first, the
        // stable position follows a tick later.
        let states = vec![
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Overworld, 3, (7, 7)),
            gameplay(ScreenType::Dungeon, 3, (7, 7)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
            gameplay(ScreenType::Dungeon, 3, (3, 4)),
        ];
        let events = run(&mut tracker, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_adjacent_screen_scroll_is_not_a_warp() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        let states = vec![
            gameplay(ScreenType::Overworld, 3, (4, 4)),
            gameplay(ScreenType::Overworld, 3, (5, 4)),
            gameplay(ScreenType::Overworld, 3, (5, 5)),
        ];
        let events = run(&mut tracker, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_jump_across_long_gap_is_neither() {
        let config = TrackerConfig::default(); // natural gap = 4
        let mut tracker = WarpDeathTracker::new(&config);

        let mut states = vec![
            gameplay(ScreenType::Overworld, 3, (12, 2)),
            gameplay(ScreenType::Overworld, 3, (12, 2)),
        ];
        for _ in 0..5 {
            states.push(StableGameState {
                screen_type: ScreenType::Transition,
                ..Default::default()
            });
        }
        states.push(gameplay(ScreenType::Overworld, 3, (2, 6)));

        let events = run(&mut tracker, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_heal_in_place_disarms() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        let mut states = vec![gameplay(ScreenType::Overworld, 3, (3, 5))];
        for _ in 0..4 {
            states.push(gameplay(ScreenType::Overworld, 0, (3, 5)));
        }
        // A fairy refills the hearts without any discontinuity.
        states.push(gameplay(ScreenType::Overworld, 3, (3, 5)));
        states.push(gameplay(ScreenType::Overworld, 3, (3, 5)));
        // A later ordinary visit to the start cell must not fire.
        states.push(gameplay(ScreenType::Overworld, 3, (4, 5)));
        let events = run(&mut tracker, &states);
        assert!(events.is_empty());
    }

    #[test]
    fn test_death_screen_arms_without_streak() {
        let config = TrackerConfig::default();
        let mut tracker = WarpDeathTracker::new(&config);

        let states = vec![
            gameplay(ScreenType::Overworld, 1, (3, 5)),
            StableGameState {
                screen_type: ScreenType::Death,
                ..Default::default()
            },
            gameplay(ScreenType::Overworld, 3, (7, 7)),
        ];
        let events = run(&mut tracker, &states);
        assert_eq!(events, vec![EventKind::Death]);
    }
}
