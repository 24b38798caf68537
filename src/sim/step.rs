/// Game state machine: every transition the session can make.
///
/// ## Phases
///   `Menu → Playing → Completed → Menu`
///
/// Each operation mutates the session and returns the events it produced.
/// Operations are total: a call that does not apply to the current phase,
/// or that names a puzzle other than the current one, is a no-op and
/// returns no events.
///
/// Achievements are evaluated after every operation that changed state
/// while a room is selected.

use crate::domain::achievement;
use crate::domain::catalog::{AchievementDefinition, PowerUpKind, PowerUpTemplate, Room};
use crate::domain::powerup::ExtraTimeMode;
use crate::domain::scoring;
use crate::domain::timer::TickOutcome;
use super::event::GameEvent;
use super::session::{GameSession, Outcome, Phase};

// ══════════════════════════════════════════════════════════════
// Room selection / menu
// ══════════════════════════════════════════════════════════════

/// Enter `room`. Only valid from the menu.
pub fn select_room(s: &mut GameSession, room: &Room) -> Vec<GameEvent> {
    if s.phase != Phase::Menu {
        return vec![];
    }
    s.begin_attempt(room);
    s.phase = Phase::Playing;
    log::info!("room selected: {} ({}, {} hints)", room.id, room.difficulty.label(), s.hints);

    let mut events = vec![GameEvent::RoomSelected { room_id: room.id.clone() }];
    check_achievements(s, &mut events);
    events
}

/// Abandon the current attempt (or leave the completed screen).
/// Score and history are kept.
pub fn return_to_menu(s: &mut GameSession) -> Vec<GameEvent> {
    if s.phase == Phase::Menu {
        return vec![];
    }
    s.clear_attempt();
    s.phase = Phase::Menu;
    vec![]
}

/// Back to the initial menu state. Completed-room history is kept.
pub fn reset_game(s: &mut GameSession) -> Vec<GameEvent> {
    let rules = s.rules;
    let completed = std::mem::take(&mut s.completed_rooms);
    *s = GameSession::new(rules);
    s.completed_rooms = completed;
    vec![]
}

// ══════════════════════════════════════════════════════════════
// Puzzle actions
// ══════════════════════════════════════════════════════════════

pub fn submit_answer(s: &mut GameSession, puzzle_index: usize, raw: &str) -> Vec<GameEvent> {
    if !s.is_playing() || puzzle_index != s.puzzle_index {
        return vec![];
    }
    let (room_difficulty, puzzle) = match (&s.room, s.current_puzzle()) {
        (Some(r), Some(p)) => (r.difficulty, p.clone()),
        _ => return vec![],
    };

    let mut events = Vec::new();
    if puzzle.accepts(raw) {
        let points = scoring::puzzle_award(puzzle.points, puzzle.difficulty, s.power_ups.multiplier());
        s.score = s.score.saturating_add(points);
        s.time_bonus_total = s
            .time_bonus_total
            .saturating_add(scoring::time_bonus(puzzle.time_bonus, room_difficulty));
        events.push(GameEvent::CorrectAnswer { puzzle_id: puzzle.id, points });
        advance(s, &mut events);
    } else {
        let penalty = scoring::wrong_answer_penalty(puzzle.difficulty);
        s.wrong_attempts = s.wrong_attempts.saturating_add(1);
        s.score = scoring::deduct(s.score, penalty);
        events.push(GameEvent::WrongAnswer { puzzle_id: puzzle.id, penalty });
    }

    check_achievements(s, &mut events);
    events
}

/// Reveal the next hint for the current puzzle, spending one from the budget.
pub fn use_hint(s: &mut GameSession, puzzle_index: usize) -> Vec<GameEvent> {
    if !s.is_playing() || puzzle_index != s.puzzle_index || s.hints == 0 {
        return vec![];
    }
    let (puzzle_id, hint_count) = match s.current_puzzle() {
        Some(p) => (p.id.clone(), p.hints.len()),
        None => return vec![],
    };
    if s.revealed_hints >= hint_count {
        return vec![];
    }

    s.hints -= 1;
    s.hints_used = s.hints_used.saturating_add(1);
    s.score = scoring::deduct(s.score, scoring::HINT_PENALTY);
    let hint_index = s.revealed_hints;
    s.revealed_hints += 1;

    let mut events = vec![GameEvent::HintRevealed {
        puzzle_id,
        hint_index,
        penalty: scoring::HINT_PENALTY,
    }];
    check_achievements(s, &mut events);
    events
}

/// Pass over the current puzzle for zero points. Needs an active skip
/// effect; one instance is consumed.
pub fn skip_puzzle(s: &mut GameSession, puzzle_index: usize) -> Vec<GameEvent> {
    if !s.is_playing() || puzzle_index != s.puzzle_index {
        return vec![];
    }
    if !s.power_ups.is_active(PowerUpKind::SkipPuzzle) {
        return vec![];
    }
    let puzzle_id = match s.current_puzzle() {
        Some(p) => p.id.clone(),
        None => return vec![],
    };

    s.power_ups.consume(PowerUpKind::SkipPuzzle);
    s.skipped.insert(puzzle_id.clone());
    let mut events = vec![GameEvent::PuzzleSkipped { puzzle_id }];
    advance(s, &mut events);
    check_achievements(s, &mut events);
    events
}

/// Move to the next puzzle, or finish the room after the last one.
fn advance(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let (room_id, last) = match &s.room {
        Some(r) => (r.id.clone(), r.is_last_puzzle(s.puzzle_index)),
        None => return,
    };
    if last {
        events.extend(complete_room(s, &room_id));
    } else {
        s.puzzle_index += 1;
        s.revealed_hints = 0;
    }
}

/// Finish the room. The room is recorded as completed, and the completion
/// bonus paid, only when no puzzle was skipped.
pub fn complete_room(s: &mut GameSession, room_id: &str) -> Vec<GameEvent> {
    if !s.is_playing() {
        return vec![];
    }
    let base_score = match &s.room {
        Some(r) if r.id == room_id => r.base_score,
        _ => return vec![],
    };

    let escaped = s.skipped.is_empty();
    let bonus = if escaped {
        let bonus = scoring::completion_bonus(base_score, s.power_ups.multiplier(), s.time_bonus_total);
        s.score = s.score.saturating_add(bonus);
        s.completed_rooms.insert(room_id.to_string());
        s.outcome = Some(Outcome::Escaped);
        bonus
    } else {
        s.outcome = Some(Outcome::Partial);
        0
    };
    s.phase = Phase::Completed;
    log::info!(
        "room {room_id} finished: {} (bonus {bonus}, score {})",
        if escaped { "escaped" } else { "partial" },
        s.score
    );

    vec![GameEvent::RoomCompleted { room_id: room_id.to_string(), escaped, bonus }]
}

// ══════════════════════════════════════════════════════════════
// Power-ups
// ══════════════════════════════════════════════════════════════

pub fn activate_power_up(s: &mut GameSession, template: &PowerUpTemplate) -> Vec<GameEvent> {
    if !s.is_playing() {
        return vec![];
    }
    let granted = s.power_ups.activate(template, s.clock);
    s.hints = s.hints.saturating_add(granted);
    if template.kind == PowerUpKind::ExtraTime && s.rules.extra_time_mode == ExtraTimeMode::AddSeconds {
        s.timer.extend(template.duration.unwrap_or(0));
    }
    log::info!("power-up activated: {}", template.kind.label());

    let mut events = vec![GameEvent::PowerUpActivated { kind: template.kind }];
    check_achievements(s, &mut events);
    events
}

pub fn deactivate_power_up(s: &mut GameSession, kind: PowerUpKind) -> Vec<GameEvent> {
    if !s.is_playing() {
        return vec![];
    }
    (0..s.power_ups.deactivate(kind))
        .map(|_| GameEvent::PowerUpExpired { kind })
        .collect()
}

/// Periodic expiry check, independent of the countdown tick.
pub fn expire_power_ups(s: &mut GameSession) -> Vec<GameEvent> {
    if !s.is_playing() {
        return vec![];
    }
    let expired = s.power_ups.expire(s.rules.expiry_policy, s.clock);
    for kind in &expired {
        log::info!("power-up expired: {}", kind.label());
    }
    expired.into_iter().map(|kind| GameEvent::PowerUpExpired { kind }).collect()
}

// ══════════════════════════════════════════════════════════════
// Timer
// ══════════════════════════════════════════════════════════════

/// One second of play. The countdown is held while an extra-time effect
/// is active (pause mode). Reaching zero ends the attempt.
pub fn tick(s: &mut GameSession) -> Vec<GameEvent> {
    if !s.is_playing() {
        return vec![];
    }
    let held = s.rules.extra_time_mode == ExtraTimeMode::Pause && s.power_ups.holds_timer(s.clock);
    s.clock += 1;

    let mut events = Vec::new();
    if s.timer.tick(held) == TickOutcome::Expired {
        s.phase = Phase::Completed;
        s.outcome = Some(Outcome::TimeUp);
        log::info!("time up at puzzle {} (score {})", s.puzzle_index + 1, s.score);
        events.push(GameEvent::TimeUp);
    }
    check_achievements(s, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Achievements
// ══════════════════════════════════════════════════════════════

fn check_achievements(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let Some(room) = s.room.as_ref() else { return };
    let progress = s.progress();
    let newly: Vec<AchievementDefinition> =
        achievement::evaluate(&room.achievements, &s.unlocked, &progress)
            .into_iter()
            .cloned()
            .collect();

    for def in newly {
        if s.unlocked.insert(def.id.clone()) {
            s.score = s.score.saturating_add(def.reward);
            log::info!("achievement unlocked: {} (+{})", def.name, def.reward);
            events.push(GameEvent::AchievementUnlocked {
                id: def.id,
                name: def.name,
                reward: def.reward,
            });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
