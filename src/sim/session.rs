/// GameSession: the complete state of one player's play-through.
///
/// ## Field lifetimes
///   - **history**: `score`, `completed_rooms`, `unlocked`: survive room
///     changes; `completed_rooms` also survives `reset_game`.
///   - **attempt**: everything under "Per-attempt" below: reseeded by
///     `begin_attempt` every time a room is selected.
///
/// The session owns a clone of the selected room; the catalog itself is
/// never touched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::domain::achievement::Progress;
use crate::domain::catalog::{Puzzle, Room};
use crate::domain::powerup::PowerUps;
use crate::domain::scoring;
use crate::domain::timer::Countdown;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Menu,
    Playing,
    /// Declared for persisted-state compatibility; nothing enters it.
    #[allow(dead_code)]
    Paused,
    Completed,
}

/// How the last attempt ended, for the completed screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// Every puzzle solved; room recorded and bonus paid.
    Escaped,
    /// Reached the end with skipped puzzles; no record, no bonus.
    Partial,
    TimeUp,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    // ── History ──
    pub phase: Phase,
    pub score: u32,
    pub completed_rooms: BTreeSet<String>,
    pub unlocked: BTreeSet<String>,

    // ── Per-attempt ──
    pub room: Option<Room>,
    pub puzzle_index: usize,
    pub hints: u32,
    pub initial_hints: u32,
    pub hints_used: u32,
    /// Hints revealed for the current puzzle.
    pub revealed_hints: usize,
    pub wrong_attempts: u32,
    pub time_bonus_total: u32,
    pub skipped: BTreeSet<String>,
    pub power_ups: PowerUps,
    pub timer: Countdown,
    /// Seconds since the room was selected; drives power-up expiry.
    pub clock: u64,
    pub outcome: Option<Outcome>,

    pub rules: RulesConfig,
}

impl GameSession {
    pub fn new(rules: RulesConfig) -> Self {
        GameSession {
            phase: Phase::Menu,
            score: 0,
            completed_rooms: BTreeSet::new(),
            unlocked: BTreeSet::new(),
            room: None,
            puzzle_index: 0,
            hints: 3,
            initial_hints: 3,
            hints_used: 0,
            revealed_hints: 0,
            wrong_attempts: 0,
            time_bonus_total: 0,
            skipped: BTreeSet::new(),
            power_ups: PowerUps::new(),
            timer: Countdown::default(),
            clock: 0,
            outcome: None,
            rules,
        }
    }

    /// Reseed every per-attempt field for `room`. Score and history stay.
    pub fn begin_attempt(&mut self, room: &Room) {
        let hints = scoring::initial_hints(room.difficulty);
        self.room = Some(room.clone());
        self.puzzle_index = 0;
        self.hints = hints;
        self.initial_hints = hints;
        self.hints_used = 0;
        self.revealed_hints = 0;
        self.wrong_attempts = 0;
        self.time_bonus_total = 0;
        self.skipped.clear();
        self.power_ups.clear();
        self.timer = Countdown::new(room.time_limit);
        self.clock = 0;
        self.outcome = None;
    }

    /// Drop the room and all per-attempt state.
    pub fn clear_attempt(&mut self) {
        self.room = None;
        self.puzzle_index = 0;
        self.hints_used = 0;
        self.revealed_hints = 0;
        self.wrong_attempts = 0;
        self.time_bonus_total = 0;
        self.skipped.clear();
        self.power_ups.clear();
        self.timer = Countdown::default();
        self.clock = 0;
        self.outcome = None;
    }

    pub fn current_puzzle(&self) -> Option<&Puzzle> {
        self.room.as_ref().and_then(|r| r.puzzle(self.puzzle_index))
    }

    /// Hint texts revealed so far for the current puzzle.
    pub fn revealed(&self) -> &[String] {
        match self.current_puzzle() {
            Some(p) => &p.hints[..self.revealed_hints.min(p.hints.len())],
            None => &[],
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            time_remaining: self.timer.remaining,
            hints_used: self.hints_used,
            wrong_attempts: self.wrong_attempts,
            power_ups_used: self.power_ups.used,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing && self.room.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Difficulty, PowerUpKind, PowerUpTemplate};

    fn room(difficulty: Difficulty) -> Room {
        toml::from_str::<Room>(
            r#"
            id = "r"
            name = "R"
            theme = "space"
            difficulty = "easy"
            base_score = 100
            time_limit = 90

            [[puzzle]]
            id = "p1"
            type = "code"
            question = "?"
            answer = "x"
            hints = ["one", "two"]
            points = 10
            "#,
        )
        .map(|mut r| {
            r.difficulty = difficulty;
            r
        })
        .unwrap()
    }

    #[test]
    fn begin_attempt_resets_attempt_keeps_history() {
        let mut s = GameSession::new(RulesConfig::default());
        s.score = 400;
        s.completed_rooms.insert("old".into());
        s.wrong_attempts = 4;
        s.skipped.insert("p9".into());
        s.power_ups.activate(
            &PowerUpTemplate { kind: PowerUpKind::ExtraHint, duration: None, multiplier: None, description: String::new() },
            0,
        );

        s.begin_attempt(&room(Difficulty::Hard));
        assert_eq!(s.score, 400);
        assert!(s.completed_rooms.contains("old"));
        assert_eq!(s.hints, 2);
        assert_eq!(s.initial_hints, 2);
        assert_eq!(s.wrong_attempts, 0);
        assert!(s.skipped.is_empty());
        assert_eq!(s.power_ups.used, 0);
        assert!(s.power_ups.active.is_empty());
        assert_eq!(s.timer.remaining, 90);
        assert_eq!(s.puzzle_index, 0);
    }

    #[test]
    fn revealed_slices_current_puzzle_hints() {
        let mut s = GameSession::new(RulesConfig::default());
        assert!(s.revealed().is_empty());
        s.begin_attempt(&room(Difficulty::Easy));
        s.revealed_hints = 1;
        assert_eq!(s.revealed(), &["one".to_string()]);
        s.revealed_hints = 5;
        assert_eq!(s.revealed().len(), 2);
    }
}
