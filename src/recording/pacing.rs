//! Fixed-rate frame pacing.
//!
//! Deadlines are anchored to the session start (tick k is due at
//! `start + k * interval`), so sleep overshoot never accumulates into drift.
//! A late frame does not cause catch-up bursts: missed ticks are skipped.

use std::time::{Duration, Instant};

/// Remaining time below which the ticker spins instead of sleeping.
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Paces a loop to a fixed number of ticks per second.
#[derive(Debug)]
pub struct FrameTicker {
    start: Instant,
    interval: Duration,
    /// Index of the next tick to wait for.
    next_tick: u64,
}

impl FrameTicker {
    /// Start a ticker at `fps` ticks per second; tick 0 is now.
    pub fn new(fps: u32) -> Self {
        Self::starting_at(fps, Instant::now())
    }

    pub fn starting_at(fps: u32, start: Instant) -> Self {
        Self {
            start,
            interval: tick_interval(fps),
            next_tick: 1,
        }
    }

    /// Block until the next due tick. Returns the number of ticks skipped.
    pub fn wait(&mut self) -> u64 {
        let now = Instant::now();
        let (tick, skipped) = next_due_tick(self.start, self.interval, self.next_tick, now);
        if skipped > 0 {
            tracing::trace!("Frame deadline missed, skipped {} ticks up to tick {}", skipped, tick);
        }
        self.next_tick = tick + 1;
        sleep_until(deadline(self.start, self.interval, tick));
        skipped
    }
}

/// Tick interval for `fps`, never zero.
pub fn tick_interval(fps: u32) -> Duration {
    let nanos = (1_000_000_000f64 / fps.max(1) as f64).round() as u64;
    Duration::from_nanos(nanos.max(1))
}

/// Due time of tick `tick`.
pub fn deadline(start: Instant, interval: Duration, tick: u64) -> Instant {
    let offset = interval.as_nanos().saturating_mul(tick as u128);
    start + Duration::from_nanos(offset.min(u64::MAX as u128) as u64)
}

/// Pick the tick to wait for: `tick` itself if its deadline is still ahead
/// of `now`, otherwise the first tick whose deadline is. Returns the tick
/// and how many ticks were passed over.
pub fn next_due_tick(start: Instant, interval: Duration, tick: u64, now: Instant) -> (u64, u64) {
    if deadline(start, interval, tick) > now {
        return (tick, 0);
    }
    let elapsed_ticks = (now.duration_since(start).as_nanos() / interval.as_nanos()) as u64;
    let next = elapsed_ticks + 1;
    (next, next - tick)
}

/// Coarse sleep until shortly before `target`, then spin out the remainder.
fn sleep_until(target: Instant) {
    loop {
        let now = Instant::now();
        if now >= target {
            return;
        }
        let remaining = target - now;
        if remaining > SPIN_THRESHOLD {
            std::thread::sleep(remaining - SPIN_THRESHOLD);
        } else {
            std::hint::spin_loop();
        }
    }
}
