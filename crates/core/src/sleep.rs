use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Source of "now" for every timed decision the engine makes.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Blocks the calling thread.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Simulated time. Sleeping advances the clock instead of blocking, so a
/// blocking wait and a tick-paced wait can be checked against the same timeline.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Number of blocking sleeps taken so far
    pub fn sleep_count(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

impl Sleeper for ManualClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

/// One pending delay.
///
/// With blocking allowed and preferred, the first poll sleeps for the whole
/// period and resolves. Otherwise the first poll records the start time and
/// every later poll (one per tick) resolves once the elapsed time reaches the
/// period, so resolution always lands on a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wait {
    period: Duration,
    blocking_allowed: bool,
    started: Option<Instant>,
}

impl Wait {
    pub fn new(period: Duration, blocking_allowed: bool) -> Self {
        Self { period, blocking_allowed, started: None }
    }

    /// Returns true once the wait has elapsed.
    pub fn poll(&mut self, clock: &dyn Clock, sleeper: &dyn Sleeper, prefer_blocking: bool) -> bool {
        if self.blocking_allowed && prefer_blocking {
            sleeper.sleep(self.period);
            return true;
        }

        let now = clock.now();
        let started = *self.started.get_or_insert(now);
        now.duration_since(started) >= self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(16);

    #[test]
    fn test_blocking_wait_elapses_before_returning() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(Duration::from_millis(25), true);

        assert!(wait.poll(&clock, &clock, true));
        assert!(clock.elapsed() >= Duration::from_millis(25));
        assert_eq!(clock.sleep_count(), 1);
    }

    #[test]
    fn test_blocking_disallowed_falls_back_to_ticks() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(Duration::from_millis(10), false);

        assert!(!wait.poll(&clock, &clock, true));
        assert_eq!(clock.sleep_count(), 0);
        clock.advance(TICK);
        assert!(wait.poll(&clock, &clock, true));
    }

    #[test]
    fn test_cooperative_wait_resolves_on_first_tick_past_period() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(Duration::from_millis(40), true);
        let mut ticks = 0;

        while !wait.poll(&clock, &clock, false) {
            clock.advance(TICK);
            ticks += 1;
        }

        // 16 * 3 = 48 is the first tick boundary at or after 40ms
        assert_eq!(ticks, 3);
        assert_eq!(clock.elapsed(), Duration::from_millis(48));
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_cooperative_wait_never_resolves_early() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(Duration::from_millis(20), false);

        assert!(!wait.poll(&clock, &clock, false));
        clock.advance(Duration::from_millis(19));
        assert!(!wait.poll(&clock, &clock, false));
        clock.advance(Duration::from_millis(1));
        assert!(wait.poll(&clock, &clock, false));
    }

    #[test]
    fn test_zero_wait_resolves_immediately() {
        let clock = ManualClock::new();
        let mut wait = Wait::new(Duration::ZERO, false);
        assert!(wait.poll(&clock, &clock, false));
    }

    #[test]
    fn test_thread_sleeper_blocks() {
        let start = Instant::now();
        ThreadSleeper.sleep(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
