/// Room countdown. One `tick` = one second.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    Counted,
    /// Decrement skipped (extra-time effect holding the clock).
    Held,
    /// Reached zero on this tick, or was already at zero.
    Expired,
}

/// How urgent the remaining time looks on the HUD.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Urgency {
    Calm,
    Hurry,
    Critical,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Countdown {
    pub remaining: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Countdown { remaining: seconds }
    }

    pub fn tick(&mut self, held: bool) -> TickOutcome {
        if self.remaining == 0 {
            return TickOutcome::Expired;
        }
        if held {
            return TickOutcome::Held;
        }
        self.remaining -= 1;
        if self.remaining == 0 { TickOutcome::Expired } else { TickOutcome::Counted }
    }

    pub fn extend(&mut self, seconds: u32) {
        self.remaining = self.remaining.saturating_add(seconds);
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    pub fn urgency(&self) -> Urgency {
        match self.remaining {
            r if r > 180 => Urgency::Calm,
            r if r > 60 => Urgency::Hurry,
            _ => Urgency::Critical,
        }
    }
}
