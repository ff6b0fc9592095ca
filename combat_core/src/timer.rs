//! Tick-driven countdown timers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Spawn,
    Action,
}

/// A countdown measured in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    kind: TimerKind,
    ticks_left: u32,
    max_ticks: u32,
    active: bool,
}

impl Timer {
    pub fn new(kind: TimerKind) -> Self {
        Timer {
            kind,
            ticks_left: 0,
            max_ticks: 0,
            active: false,
        }
    }

    /// Start (or restart) the countdown. A timer always runs for at least one tick.
    pub fn start(&mut self, ticks: u32) {
        let ticks = ticks.max(1);
        self.ticks_left = ticks;
        self.max_ticks = ticks;
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.ticks_left = 0;
        self.active = false;
    }

    /// Advance one tick. Returns true on the tick the timer fires.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left == 0 {
            self.active = false;
            return true;
        }
        false
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ticks_left(&self) -> u32 {
        self.ticks_left
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// Fraction of the countdown already elapsed, 0.0 when idle
    pub fn progress(&self) -> f64 {
        if !self.active || self.max_ticks == 0 {
            return 0.0;
        }
        1.0 - self.ticks_left as f64 / self.max_ticks as f64
    }
}

/// Convert a duration to whole ticks, rounding up, never below one tick
pub fn ms_to_ticks(ms: f64, tick_ms: u32) -> u32 {
    if tick_ms == 0 {
        return 1;
    }
    (ms / tick_ms as f64).ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_once() {
        let mut timer = Timer::new(TimerKind::Action);
        timer.start(3);
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert!(timer.tick());
        assert!(!timer.is_active());
        assert!(!timer.tick());
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let mut timer = Timer::new(TimerKind::Spawn);
        timer.start(1);
        timer.stop();
        assert!(!timer.tick());
    }

    #[test]
    fn test_zero_tick_start_runs_one_tick() {
        let mut timer = Timer::new(TimerKind::Spawn);
        timer.start(0);
        assert_eq!(timer.max_ticks(), 1);
        assert!(timer.tick());
    }

    #[test]
    fn test_ms_to_ticks() {
        assert_eq!(ms_to_ticks(3000.0, 50), 60);
        assert_eq!(ms_to_ticks(2410.0, 50), 49);
        assert_eq!(ms_to_ticks(-100.0, 50), 1);
    }
}
