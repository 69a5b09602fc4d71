//! Per-encounter countdown with one-second resolution.
//!
//! The timer is driven externally: the event loop feeds it elapsed wall-clock
//! time via [`CountdownTimer::advance`]. Sub-second remainders are carried so a
//! 250 ms tick cadence still decrements exactly once per second.

use std::time::Duration;

/// Lifecycle of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Paused,
    /// Reached zero. Terminal: neither `pause` nor `resume` leave this state.
    Expired,
}

/// Decrementing whole-second counter.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    remaining_secs: u32,
    carry: Duration,
    state: TimerState,
}

impl CountdownTimer {
    /// Starts a running timer. A zero duration is already expired.
    pub fn start(duration_secs: u32) -> Self {
        let state = if duration_secs == 0 {
            TimerState::Expired
        } else {
            TimerState::Running
        };
        Self {
            remaining_secs: duration_secs,
            carry: Duration::ZERO,
            state,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    /// Feeds elapsed time into the countdown.
    ///
    /// Returns `true` exactly once: on the call that moves the timer from
    /// `Running` to `Expired`. Paused or expired timers ignore the input and
    /// discard it (no catch-up after resume).
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.carry += elapsed;
        while self.carry >= Duration::from_secs(1) && self.remaining_secs > 0 {
            self.carry -= Duration::from_secs(1);
            self.remaining_secs -= 1;
        }
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            self.carry = Duration::ZERO;
            return true;
        }
        false
    }
}

/// Formats whole seconds as `m:ss` (minutes are not zero-padded).
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_ticks_accumulate() {
        let mut t = CountdownTimer::start(10);
        for _ in 0..3 {
            assert!(!t.advance(Duration::from_millis(250)));
        }
        assert_eq!(t.remaining_secs(), 10);
        t.advance(Duration::from_millis(250));
        assert_eq!(t.remaining_secs(), 9);
    }

    #[test]
    fn expiry_reported_once() {
        let mut t = CountdownTimer::start(2);
        assert!(!t.advance(Duration::from_secs(1)));
        assert!(t.advance(Duration::from_secs(5)));
        assert_eq!(t.state(), TimerState::Expired);
        assert_eq!(t.remaining_secs(), 0);
        assert!(!t.advance(Duration::from_secs(1)));
    }

    #[test]
    fn paused_timer_does_not_move() {
        let mut t = CountdownTimer::start(5);
        t.pause();
        assert!(!t.advance(Duration::from_secs(30)));
        assert_eq!(t.remaining_secs(), 5);
        t.resume();
        t.advance(Duration::from_secs(1));
        assert_eq!(t.remaining_secs(), 4);
    }

    #[test]
    fn expired_cannot_resume() {
        let mut t = CountdownTimer::start(1);
        assert!(t.advance(Duration::from_secs(1)));
        t.resume();
        assert_eq!(t.state(), TimerState::Expired);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(9), "0:09");
    }
}
