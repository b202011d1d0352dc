//! Tick clock: the runner stamps each tick with wall-clock epoch
//! milliseconds; systems read elapsed time from here instead of sampling the
//! OS clock, which keeps ticks internally consistent and tests fully
//! deterministic.

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone, Copy, Resource)]
pub struct TickClock {
    now_ms: i64,
    last_ms: i64,
    tick: u64,
}

impl TickClock {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            now_ms,
            last_ms: now_ms,
            tick: 0,
        }
    }

    /// Current wall-clock epoch milliseconds. Used by the runner to stamp
    /// each tick.
    pub fn wall_clock_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    pub fn advance_to(&mut self, now_ms: i64) {
        self.last_ms = self.now_ms;
        // Never move backwards, even if the wall clock does.
        self.now_ms = now_ms.max(self.now_ms);
        self.tick += 1;
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds elapsed between the previous tick and this one.
    pub fn delta_secs(&self) -> f64 {
        (self.now_ms - self.last_ms).max(0) as f64 / 1000.0
    }

    pub fn elapsed_secs_since(&self, start_ms: i64) -> f64 {
        (self.now_ms - start_ms).max(0) as f64 / 1000.0
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
