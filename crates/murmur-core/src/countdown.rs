//! Countdown state for the periodic transcript dump.
//!
//! A single integer counts down once per second while enabled. Reaching
//! zero reports a due dump and resets to the full interval. The caller
//! owns the one-second cadence; this type only holds the state, which
//! keeps disable/enable semantics exact: a disabled countdown cannot be
//! ticked, so no stray tick fires after the timer is switched off.

/// Remaining-time state for the dump scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    interval: u32,
    remaining: u32,
    enabled: bool,
    running: bool,
}

impl Countdown {
    /// Create a countdown for the given interval in seconds. The countdown
    /// is enabled but not running until [`Countdown::start`] is called.
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            remaining: interval.max(1),
            enabled: true,
            running: false,
        }
    }

    /// Begin ticking. Has no effect while the countdown is disabled.
    pub fn start(&mut self) {
        if self.enabled {
            self.running = true;
        }
    }

    /// Advance by one second. Returns `true` exactly when the countdown
    /// reaches zero; the remaining time then resets to the full interval.
    pub fn tick(&mut self) -> bool {
        if !(self.enabled && self.running) {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.interval;
            true
        } else {
            false
        }
    }

    /// Reset the remaining time to the full interval, resuming ticking if
    /// the countdown is enabled. Used by the manual dump trigger.
    pub fn reset(&mut self) {
        self.remaining = self.interval;
        if self.enabled {
            self.running = true;
        }
    }

    /// Switch the countdown off. Ticking halts and the remaining time
    /// freezes at its current value.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.running = false;
    }

    /// Switch the countdown back on. The remaining time resets to the full
    /// interval, not to the value at disable time.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.remaining = self.interval;
        self.running = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True while ticks actually advance the countdown.
    pub fn is_ticking(&self) -> bool {
        self.enabled && self.running
    }

    /// Seconds until the next dump.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval_and_resets() {
        let mut countdown = Countdown::new(120);
        countdown.start();

        let mut fires = 0;
        for _ in 0..120 {
            if countdown.tick() {
                fires += 1;
            }
        }
        assert_eq!(fires, 1);
        assert_eq!(countdown.remaining(), 120);
    }

    #[test]
    fn test_short_interval_end_to_end() {
        let mut countdown = Countdown::new(5);
        countdown.start();

        for _ in 0..4 {
            assert!(!countdown.tick());
        }
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), 5);
    }

    #[test]
    fn test_disabled_countdown_does_not_tick() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        countdown.tick();
        countdown.disable();

        let frozen = countdown.remaining();
        for _ in 0..20 {
            assert!(!countdown.tick());
        }
        assert_eq!(countdown.remaining(), frozen);
    }

    #[test]
    fn test_enable_resets_to_full_interval() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        for _ in 0..7 {
            countdown.tick();
        }
        countdown.disable();
        assert_eq!(countdown.remaining(), 3);

        countdown.enable();
        assert_eq!(countdown.remaining(), 10);
        assert!(countdown.is_ticking());
    }

    #[test]
    fn test_manual_reset_restores_full_interval() {
        let mut countdown = Countdown::new(30);
        countdown.start();
        for _ in 0..12 {
            countdown.tick();
        }
        countdown.reset();
        assert_eq!(countdown.remaining(), 30);
    }

    #[test]
    fn test_not_running_until_started() {
        let mut countdown = Countdown::new(10);
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining(), 10);

        countdown.start();
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining(), 9);
    }
}
