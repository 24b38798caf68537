/// Achievement conditions and the unlock evaluator.
///
/// Conditions are a closed set of typed variants. `evaluate` is the single
/// dispatch point; it only reports which definitions are newly satisfied.
/// Granting (recording the id, paying the reward) is done by the caller so
/// the unlocked set stays the one source of idempotence.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::catalog::AchievementDefinition;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Condition {
    /// Time remaining strictly exceeds `seconds`.
    TimeRemainingAbove { seconds: u32 },
    /// No hint has been spent since the room was selected.
    HintsUnused,
    NoWrongAttempts,
    NoPowerUps,
}

/// Read-only view of the session fields conditions may look at.
#[derive(Clone, Copy, Debug, Default)]
pub struct Progress {
    pub time_remaining: u32,
    pub hints_used: u32,
    pub wrong_attempts: u32,
    pub power_ups_used: u32,
}

impl Condition {
    pub fn holds(&self, p: &Progress) -> bool {
        match *self {
            Condition::TimeRemainingAbove { seconds } => p.time_remaining > seconds,
            Condition::HintsUnused => p.hints_used == 0,
            Condition::NoWrongAttempts => p.wrong_attempts == 0,
            Condition::NoPowerUps => p.power_ups_used == 0,
        }
    }
}

/// Definitions whose condition holds and whose id is not yet unlocked.
pub fn evaluate<'a>(
    defs: &'a [AchievementDefinition],
    unlocked: &BTreeSet<String>,
    progress: &Progress,
) -> Vec<&'a AchievementDefinition> {
    defs.iter()
        .filter(|d| !unlocked.contains(&d.id))
        .filter(|d| d.condition.holds(progress))
        .collect()
}
