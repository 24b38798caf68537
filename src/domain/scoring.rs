/// Scoring rules. Pure arithmetic, no session access.
///
/// ## Tables
/// ┌────────────┬────────────┬───────────────┬──────────────┐
/// │ Difficulty │ Multiplier │ Wrong penalty │ Hint budget  │
/// ├────────────┼────────────┼───────────────┼──────────────┤
/// │ easy       │ 1.0        │ 25            │ 5            │
/// │ medium     │ 1.5        │ 50            │ 3            │
/// │ hard       │ 2.0        │ 100           │ 2            │
/// └────────────┴────────────┴───────────────┴──────────────┘
///
/// Hints cost a flat `HINT_PENALTY`. Every deduction floors the score at 0.
/// There is no upper bound.

use super::catalog::{Difficulty, PowerUpKind};
use super::powerup::ActivePowerUp;

pub const HINT_PENALTY: u32 = 50;

pub fn difficulty_multiplier(d: Difficulty) -> f64 {
    match d {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 2.0,
    }
}

pub fn wrong_answer_penalty(d: Difficulty) -> u32 {
    match d {
        Difficulty::Easy => 25,
        Difficulty::Medium => 50,
        Difficulty::Hard => 100,
    }
}

/// Hint budget seeded when a room of this difficulty is selected.
pub fn initial_hints(d: Difficulty) -> u32 {
    match d {
        Difficulty::Easy => 5,
        Difficulty::Medium => 3,
        Difficulty::Hard => 2,
    }
}

/// Largest multiplier among active double-points effects; 1 when none.
/// Simultaneous effects never stack.
pub fn power_up_multiplier(active: &[ActivePowerUp]) -> f64 {
    active
        .iter()
        .filter(|p| p.template.kind == PowerUpKind::DoublePoints)
        .filter_map(|p| p.template.multiplier)
        .fold(None, |best: Option<f64>, m| Some(best.map_or(m, |b| b.max(m))))
        .unwrap_or(1.0)
}

/// Points for a correct answer.
pub fn puzzle_award(points: u32, puzzle_difficulty: Difficulty, multiplier: f64) -> u32 {
    to_points(points as f64 * difficulty_multiplier(puzzle_difficulty) * multiplier)
}

/// Time bonus accrued when a puzzle is solved; scaled by the room's difficulty.
pub fn time_bonus(puzzle_bonus: Option<u32>, room_difficulty: Difficulty) -> u32 {
    puzzle_bonus
        .map(|b| to_points(b as f64 * difficulty_multiplier(room_difficulty)))
        .unwrap_or(0)
}

/// Bonus paid once when a room is fully escaped.
pub fn completion_bonus(base_score: u32, multiplier: f64, time_bonus_total: u32) -> u32 {
    to_points(base_score as f64 * multiplier).saturating_add(time_bonus_total)
}

/// Subtract a penalty, flooring at zero.
#[inline]
pub fn deduct(score: u32, penalty: u32) -> u32 {
    score.saturating_sub(penalty)
}

fn to_points(v: f64) -> u32 {
    if v <= 0.0 {
        0
    } else if v >= u32::MAX as f64 {
        u32::MAX
    } else {
        v.round() as u32
    }
}

// ── Player standing (menu dashboard) ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rank {
    Novice,
    Intermediate,
    Advanced,
    Expert,
    MasterEscapist,
}

impl Rank {
    pub fn title(self) -> &'static str {
        match self {
            Rank::Novice => "Novice",
            Rank::Intermediate => "Intermediate",
            Rank::Advanced => "Advanced",
            Rank::Expert => "Expert",
            Rank::MasterEscapist => "Master Escapist",
        }
    }
}

pub fn rank(score: u32) -> Rank {
    match score {
        s if s >= 1000 => Rank::MasterEscapist,
        s if s >= 750 => Rank::Expert,
        s if s >= 500 => Rank::Advanced,
        s if s >= 250 => Rank::Intermediate,
        _ => Rank::Novice,
    }
}

pub fn player_level(score: u32) -> u32 {
    score / 100 + 1
}

/// Rounded percentage of catalog rooms completed.
pub fn completion_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Dashboard badges: (score ≥ 500, three rooms completed, score ≥ 1000).
pub fn badges(score: u32, completed: usize) -> [bool; 3] {
    [score >= 500, completed >= 3, score >= 1000]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::PowerUpTemplate;

    fn active(kind: PowerUpKind, multiplier: Option<f64>) -> ActivePowerUp {
        ActivePowerUp {
            template: PowerUpTemplate {
                kind,
                duration: Some(30),
                multiplier,
                description: String::new(),
            },
            activated_at: 0,
        }
    }

    #[test]
    fn multiplier_defaults_to_one() {
        assert_eq!(power_up_multiplier(&[]), 1.0);
        assert_eq!(power_up_multiplier(&[active(PowerUpKind::ExtraTime, Some(5.0))]), 1.0);
    }

    #[test]
    fn multiplier_takes_max_not_sum() {
        let list = [
            active(PowerUpKind::DoublePoints, Some(2.0)),
            active(PowerUpKind::DoublePoints, Some(3.0)),
            active(PowerUpKind::DoublePoints, None),
        ];
        assert_eq!(power_up_multiplier(&list), 3.0);
    }

    #[test]
    fn award_scales_with_difficulty_and_multiplier() {
        assert_eq!(puzzle_award(100, Difficulty::Easy, 1.0), 100);
        assert_eq!(puzzle_award(150, Difficulty::Medium, 1.0), 225);
        assert_eq!(puzzle_award(100, Difficulty::Hard, 1.0), 200);
        assert_eq!(puzzle_award(100, Difficulty::Easy, 2.0), 200);
    }

    #[test]
    fn time_bonus_rounds() {
        assert_eq!(time_bonus(Some(15), Difficulty::Medium), 23); // 22.5 → 23
        assert_eq!(time_bonus(None, Difficulty::Hard), 0);
    }

    #[test]
    fn completion_bonus_adds_time_total() {
        assert_eq!(completion_bonus(1000, 1.0, 40), 1040);
        assert_eq!(completion_bonus(1000, 2.0, 0), 2000);
    }

    #[test]
    fn deduct_floors_at_zero() {
        assert_eq!(deduct(30, HINT_PENALTY), 0);
        assert_eq!(deduct(120, wrong_answer_penalty(Difficulty::Medium)), 70);
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(rank(0), Rank::Novice);
        assert_eq!(rank(250), Rank::Intermediate);
        assert_eq!(rank(749), Rank::Advanced);
        assert_eq!(rank(750), Rank::Expert);
        assert_eq!(rank(1000).title(), "Master Escapist");
        assert_eq!(player_level(0), 1);
        assert_eq!(player_level(250), 3);
    }

    #[test]
    fn completion_percent_rounds() {
        assert_eq!(completion_percent(0, 3), 0);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(1, 0), 0);
    }
}
