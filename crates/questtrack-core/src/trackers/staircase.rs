//! Staircase/pedestal item observer.
//!
//! Basement item rooms show the item on a fixed pedestal cell. The tracker
//! waits for a non-triforce item to sit in the hot zone for a couple of
//! stable frames, then treats a confirmed disappearance (several consecutive
//! empty reads, same room) as the pickup. Occluded reads are withheld by the
//! stability gate upstream, so a player sprite passing through the zone
//! neither starts nor confirms anything here.

use crate::config::TrackerConfig;
use crate::events::EventKind;
use crate::state::{MapPosition, ScreenType};

use super::{TickContext, Tracker, TrackerOutput, TriforceLedger};

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Visible {
        item: String,
        room: Option<MapPosition>,
        gone: u32,
    },
}

#[derive(Debug)]
pub struct StaircaseItemTracker {
    visible_frames: u32,
    gone_frames: u32,
    seen_streak: u32,
    phase: Phase,
}

impl StaircaseItemTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            visible_frames: config.pedestal_visible_frames.max(1),
            gone_frames: config.pedestal_gone_frames.max(1),
            seen_streak: 0,
            phase: Phase::Idle,
        }
    }
}

impl Tracker for StaircaseItemTracker {
    fn name(&self) -> &'static str {
        "staircase_item"
    }

    fn tick(
        &mut self,
        ctx: &TickContext<'_>,
        _ledger: &mut TriforceLedger,
        out: &mut TrackerOutput,
    ) {
        let curr = ctx.curr;

        if curr.screen_type != ScreenType::Dungeon {
            // Pedestal reads only exist on dungeon screens; leaving the
            // dungeon abandons any in-flight observation.
            self.seen_streak = 0;
            self.phase = Phase::Idle;
            return;
        }

        match &mut self.phase {
            Phase::Idle => match curr.pedestal_item.as_deref() {
                // Triforce pieces sit on pedestals too, but those belong to
                // the hold/exit trackers.
                Some(item) if item != "triforce" => {
                    self.seen_streak += 1;
                    if self.seen_streak >= self.visible_frames {
                        self.phase = Phase::Visible {
                            item: item.to_string(),
                            room: curr.map_position,
                            gone: 0,
                        };
                    }
                }
                _ => self.seen_streak = 0,
            },
            Phase::Visible { item, room, gone } => {
                if curr.map_position != *room {
                    // Walked out of the room; the item was not taken.
                    self.seen_streak = 0;
                    self.phase = Phase::Idle;
                    return;
                }
                match curr.pedestal_item.as_deref() {
                    Some(seen) if seen == item => *gone = 0,
                    Some(_) => {
                        // A different sprite on the pedestal: restart.
                        self.seen_streak = 0;
                        self.phase = Phase::Idle;
                    }
                    None => {
                        *gone += 1;
                        if *gone >= self.gone_frames {
                            out.emit(EventKind::StaircaseItemAcquired {
                                item: item.clone(),
                                dungeon_level: curr.dungeon_level,
                            });
                            self.seen_streak = 0;
                            self.phase = Phase::Idle;
                        }
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.seen_streak = 0;
        self.phase = Phase::Idle;
    }
}
