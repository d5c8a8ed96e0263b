//! Phase timing for simulation steps

use std::time::{Duration, Instant};

/// Lap timer: each [`lap`](Self::lap) returns the time since the previous one
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
    last_lap: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

impl Stopwatch {
    /// Create a stopwatch running from now
    pub fn start_new() -> Self {
        let now = Instant::now();
        Self { started: now, last_lap: now }
    }

    /// Time since the previous lap (or since start), and begin a new lap
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.duration_since(self.last_lap);
        self.last_lap = now;
        lap
    }

    /// [`lap`](Self::lap) in whole microseconds, saturating
    pub fn lap_micros(&mut self) -> u64 {
        micros(self.lap())
    }

    /// Time since start, laps included
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Whole microseconds in `duration`, saturating at `u64::MAX`
pub fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laps_partition_elapsed_time() {
        let mut stopwatch = Stopwatch::start_new();
        std::thread::sleep(Duration::from_millis(2));
        let first = stopwatch.lap();
        let second = stopwatch.lap();

        assert!(first >= Duration::from_millis(2));
        assert!(second < first);
        assert!(stopwatch.elapsed() >= first + second);
    }

    #[test]
    fn test_micros_saturates() {
        assert_eq!(micros(Duration::from_millis(3)), 3000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
