//! Run report assembly for the CLI.

use serde::Serialize;

use questtrack_core::{Anomaly, EventKind, GameEvent, StableGameState};

/// Everything one analysis run produced, serializable as JSON and
/// renderable as a terminal summary.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub entity: String,
    pub frames_processed: u64,
    pub events: Vec<GameEvent>,
    pub anomalies: Vec<Anomaly>,
    pub final_state: StableGameState,
}

impl RunReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let push = |out: &mut String, line: String| {
            out.push_str(&line);
            out.push('\n');
        };

        push(&mut out, format!("entity: {}", self.entity));
        push(
            &mut out,
            format!(
                "frames: {}   events: {}   anomalies: {}",
                self.frames_processed,
                self.events.len(),
                self.anomalies.len()
            ),
        );

        if !self.events.is_empty() {
            push(&mut out, String::new());
            for event in &self.events {
                push(
                    &mut out,
                    format!(
                        "  [{:>8}ms] {} ({})",
                        event.timestamp_ms,
                        describe(&event.kind),
                        event.source
                    ),
                );
            }
        }

        push(&mut out, String::new());
        let s = &self.final_state;
        push(
            &mut out,
            format!(
                "final: {:?} L{}  hearts {}/{}  rupees {}  keys {}{}  bombs {}",
                s.screen_type,
                s.dungeon_level,
                s.hearts_current,
                s.hearts_max,
                s.rupees,
                s.keys,
                if s.has_master_key { " (master)" } else { "" },
                s.bombs
            ),
        );
        push(
            &mut out,
            format!(
                "triforce: {}/8 (bits {:08b})",
                s.triforce_count, s.triforce_bits
            ),
        );
        out
    }
}

fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::Death => "death".to_string(),
        EventKind::UpAWarp => "up+A warp".to_string(),
        EventKind::TriforceInferred { level } => {
            format!("triforce piece inferred (dungeon {level})")
        }
        EventKind::GameComplete => "game complete".to_string(),
        EventKind::StaircaseItemAcquired {
            item,
            dungeon_level,
        } => format!("{item} taken in dungeon {dungeon_level}"),
    }
}
