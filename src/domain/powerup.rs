/// Power-up engine: the list of effects currently in force.
///
/// ## Expiry policies
///   - `NextCheck`: every periodic check removes every duration-bearing
///     effect, however long it has actually been active. An activation
///     therefore lasts until the next check.
///   - `Elapsed`: an effect is removed once `now - activated_at >= duration`.
///
/// Effects without a duration never expire; they leave only by explicit
/// deactivation or by being consumed (skip).
///
/// `now` is the session clock in whole seconds, advanced by the timer tick.

use serde::Deserialize;

use super::catalog::{PowerUpKind, PowerUpTemplate};
use super::scoring;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryPolicy {
    #[default]
    NextCheck,
    Elapsed,
}

/// What an `extraTime` activation does to the countdown.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraTimeMode {
    /// Hold the countdown while the effect is active.
    #[default]
    Pause,
    /// Add `duration` seconds to the countdown once, at activation.
    AddSeconds,
}

#[derive(Clone, Debug)]
pub struct ActivePowerUp {
    pub template: PowerUpTemplate,
    pub activated_at: u64,
}

impl ActivePowerUp {
    pub fn kind(&self) -> PowerUpKind {
        self.template.kind
    }

    /// Seconds left under elapsed-time accounting. `None` = unbounded.
    pub fn remaining(&self, now: u64) -> Option<u32> {
        self.template.duration.map(|d| {
            let elapsed = now.saturating_sub(self.activated_at);
            (d as u64).saturating_sub(elapsed) as u32
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct PowerUps {
    pub active: Vec<ActivePowerUp>,
    /// Activations since the room was selected.
    pub used: u32,
}

impl PowerUps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect. Returns the number of hints the activation grants:
    /// the skip effect refunds one, the extra-hint effect grants one.
    ///
    /// Activating a kind that is already active is allowed and stacks a
    /// second instance.
    pub fn activate(&mut self, template: &PowerUpTemplate, now: u64) -> u32 {
        self.active.push(ActivePowerUp {
            template: template.clone(),
            activated_at: now,
        });
        self.used += 1;
        match template.kind {
            PowerUpKind::SkipPuzzle | PowerUpKind::ExtraHint => 1,
            PowerUpKind::ExtraTime | PowerUpKind::DoublePoints => 0,
        }
    }

    /// Remove every instance of `kind`. Returns how many were removed.
    pub fn deactivate(&mut self, kind: PowerUpKind) -> usize {
        let before = self.active.len();
        self.active.retain(|p| p.kind() != kind);
        before - self.active.len()
    }

    /// Remove a single instance of `kind` (the oldest). Returns true if one existed.
    pub fn consume(&mut self, kind: PowerUpKind) -> bool {
        match self.active.iter().position(|p| p.kind() == kind) {
            Some(i) => {
                self.active.remove(i);
                true
            }
            None => false,
        }
    }

    /// Periodic expiry check. Returns the kinds removed, in list order.
    pub fn expire(&mut self, policy: ExpiryPolicy, now: u64) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.active.retain(|p| {
            let gone = match policy {
                ExpiryPolicy::NextCheck => p.template.duration.is_some(),
                ExpiryPolicy::Elapsed => p.remaining(now) == Some(0),
            };
            if gone {
                expired.push(p.kind());
            }
            !gone
        });
        expired
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|p| p.kind() == kind)
    }

    /// True while an extra-time effect with time left is active.
    pub fn holds_timer(&self, now: u64) -> bool {
        self.active.iter().any(|p| {
            p.kind() == PowerUpKind::ExtraTime && p.remaining(now).map_or(false, |r| r > 0)
        })
    }

    pub fn multiplier(&self) -> f64 {
        scoring::power_up_multiplier(&self.active)
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(kind: PowerUpKind, duration: Option<u32>, multiplier: Option<f64>) -> PowerUpTemplate {
        PowerUpTemplate { kind, duration, multiplier, description: String::new() }
    }

    #[test]
    fn activation_counts_and_grants_hints() {
        let mut p = PowerUps::new();
        assert_eq!(p.activate(&template(PowerUpKind::SkipPuzzle, None, None), 0), 1);
        assert_eq!(p.activate(&template(PowerUpKind::ExtraHint, None, None), 0), 1);
        assert_eq!(p.activate(&template(PowerUpKind::DoublePoints, Some(30), Some(2.0)), 0), 0);
        assert_eq!(p.used, 3);
        assert_eq!(p.active.len(), 3);
    }

    #[test]
    fn duplicate_activation_stacks() {
        let mut p = PowerUps::new();
        let t = template(PowerUpKind::DoublePoints, Some(30), Some(2.0));
        p.activate(&t, 0);
        p.activate(&t, 1);
        assert_eq!(p.active.len(), 2);
        assert_eq!(p.deactivate(PowerUpKind::DoublePoints), 2);
        assert!(!p.is_active(PowerUpKind::DoublePoints));
    }

    #[test]
    fn next_check_expires_any_duration_bearing_effect() {
        let mut p = PowerUps::new();
        p.activate(&template(PowerUpKind::ExtraTime, Some(60), None), 10);
        p.activate(&template(PowerUpKind::SkipPuzzle, None, None), 10);
        // no time has passed, still expired
        let gone = p.expire(ExpiryPolicy::NextCheck, 10);
        assert_eq!(gone, vec![PowerUpKind::ExtraTime]);
        assert!(p.is_active(PowerUpKind::SkipPuzzle));
    }

    #[test]
    fn elapsed_policy_waits_for_duration() {
        let mut p = PowerUps::new();
        p.activate(&template(PowerUpKind::DoublePoints, Some(5), Some(2.0)), 10);
        assert!(p.expire(ExpiryPolicy::Elapsed, 14).is_empty());
        assert_eq!(p.expire(ExpiryPolicy::Elapsed, 15), vec![PowerUpKind::DoublePoints]);
    }

    #[test]
    fn timer_hold_requires_time_left() {
        let mut p = PowerUps::new();
        p.activate(&template(PowerUpKind::ExtraTime, Some(3), None), 0);
        assert!(p.holds_timer(0));
        assert!(p.holds_timer(2));
        assert!(!p.holds_timer(3));

        let mut q = PowerUps::new();
        q.activate(&template(PowerUpKind::ExtraTime, Some(0), None), 0);
        assert!(!q.holds_timer(0));
    }

    #[test]
    fn consume_removes_one_instance() {
        let mut p = PowerUps::new();
        let t = template(PowerUpKind::SkipPuzzle, None, None);
        p.activate(&t, 0);
        p.activate(&t, 0);
        assert!(p.consume(PowerUpKind::SkipPuzzle));
        assert!(p.is_active(PowerUpKind::SkipPuzzle));
        assert!(p.consume(PowerUpKind::SkipPuzzle));
        assert!(!p.consume(PowerUpKind::SkipPuzzle));
    }
}
