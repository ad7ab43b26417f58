use std::time::{Duration, Instant};

/// High-resolution frame clock.
///
/// `delta` reports seconds since the previous call and folds them into the
/// running total. Time is also banked in a fixed-step accumulator so physics
/// can be advanced in constant increments.
#[derive(Debug, Clone)]
pub struct Clock {
    start_time: Instant,
    old_time: Instant,
    elapsed: Duration,
    running: bool,
    fixed_step: Duration,
    accumulator: Duration,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            old_time: now,
            elapsed: Duration::ZERO,
            running: false,
            fixed_step: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.start_time = now;
        self.old_time = now;
        self.running = true;
    }

    /// Fold pending time into the total, then stop.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        self.delta_at(now);
        self.running = false;
    }

    /// Zero the total and restart the measuring window from now.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.elapsed = Duration::ZERO;
        self.accumulator = Duration::ZERO;
        self.start_time = now;
        self.old_time = now;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Instant the clock was last started or reset.
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Seconds since the previous call; 0 while stopped.
    pub fn delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    pub fn delta_at(&mut self, now: Instant) -> f32 {
        if !self.running {
            return 0.0;
        }
        let diff = now.saturating_duration_since(self.old_time);
        self.old_time = now;
        self.elapsed += diff;
        self.accumulator += diff;
        diff.as_secs_f32()
    }

    /// Total running time in seconds, including time since the last `delta`.
    pub fn elapsed(&mut self) -> f32 {
        self.delta();
        self.elapsed.as_secs_f32()
    }

    /// Total running time in seconds as of the last `delta`.
    pub fn elapsed_recorded(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn fixed_step(&self) -> f32 {
        self.fixed_step.as_secs_f32()
    }

    /// Set the fixed step length in seconds. Non-positive values are ignored.
    pub fn set_fixed_step(&mut self, seconds: f32) {
        if seconds > 0.0 && seconds.is_finite() {
            self.fixed_step = Duration::from_secs_f32(seconds);
        } else {
            log::warn!("ignoring invalid fixed step {}", seconds);
        }
    }

    /// Bank externally measured time for fixed-step updates.
    pub fn accumulate(&mut self, seconds: f32) {
        if seconds > 0.0 && seconds.is_finite() {
            self.accumulator += Duration::from_secs_f32(seconds);
        }
    }

    /// Consume one fixed step if enough time is banked.
    pub fn consume_fixed_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_step {
            self.accumulator -= self.fixed_step;
            true
        } else {
            false
        }
    }

    /// Fraction of a fixed step left in the accumulator, in `[0, 1]`.
    pub fn fixed_alpha(&self) -> f32 {
        if self.fixed_step.as_secs_f32() > 0.0 {
            (self.accumulator.as_secs_f32() / self.fixed_step.as_secs_f32()).min(1.0)
        } else {
            0.0
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
