//! Match countdown that floors at zero.

use std::time::Duration;

/// Countdown state advanced by session ticks.
#[derive(Clone, Debug)]
pub(crate) struct Countdown {
    remaining_secs: u32,
    running: bool,
    carry: Duration,
}

/// Whole-second progress observed during a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CountdownProgress {
    /// Remaining seconds when at least one whole second elapsed.
    pub(crate) ticked: Option<u32>,
    /// Set when the countdown reached zero during this tick.
    pub(crate) expired: bool,
}

impl Countdown {
    pub(crate) fn new(minutes: u32) -> Self {
        Self {
            remaining_secs: minutes_to_secs(minutes),
            running: false,
            carry: Duration::ZERO,
        }
    }

    pub(crate) fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the countdown; returns `false` when it was already running.
    pub(crate) fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    pub(crate) fn pause(&mut self) {
        self.running = false;
        self.carry = Duration::ZERO;
    }

    pub(crate) fn reset(&mut self, minutes: u32) {
        self.pause();
        self.remaining_secs = minutes_to_secs(minutes);
    }

    pub(crate) fn tick(&mut self, dt: Duration) -> CountdownProgress {
        if !self.running {
            return CountdownProgress::default();
        }

        self.carry = self.carry.saturating_add(dt);
        let whole_secs = self.carry.as_secs();
        self.carry -= Duration::from_secs(whole_secs);
        let elapsed = u32::try_from(whole_secs).unwrap_or(u32::MAX);

        if elapsed == 0 || self.remaining_secs == 0 {
            return CountdownProgress::default();
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(elapsed);
        CountdownProgress {
            ticked: Some(self.remaining_secs),
            expired: self.remaining_secs == 0,
        }
    }
}

fn minutes_to_secs(minutes: u32) -> u32 {
    minutes.saturating_mul(60)
}
