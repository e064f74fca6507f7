use std::time::{Duration, Instant};

/// longest step handed to the simulation, so a stalled window does not teleport spheres
pub const MAX_DELTA: Duration = Duration::from_millis(100);

/// Fixed cadence driver, yields the time since the previous tick once per interval
pub struct FrameClock {
    interval: Duration,
    last_tick: Instant,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        FrameClock {
            interval,
            last_tick: Instant::now(),
        }
    }

    /// Returns the elapsed seconds when a tick is due at `now`
    pub fn tick_at(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.last_tick);
        if elapsed < self.interval {
            return None;
        }
        self.last_tick = now;
        Some(elapsed.min(MAX_DELTA).as_secs_f32())
    }

    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(Instant::now())
    }

    /// When the next tick is due, for `ControlFlow::WaitUntil`
    pub fn next_tick(&self) -> Instant {
        self.last_tick + self.interval
    }
}
