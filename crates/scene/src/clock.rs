use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Source {
    Monotonic { start: Option<Instant> },
    Manual { elapsed: Duration },
}

/// Elapsed-time counter. Starts on first read and is never reset.
///
/// The monotonic clock follows `Instant`; the manual clock only moves when
/// [`Clock::advance`] is called, for headless runs and tests.
#[derive(Debug, Clone)]
pub struct Clock {
    source: Source,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            source: Source::Monotonic { start: None },
        }
    }

    pub fn manual() -> Self {
        Self {
            source: Source::Manual {
                elapsed: Duration::ZERO,
            },
        }
    }

    /// Move a manual clock forward. No effect on a monotonic clock.
    pub fn advance(&mut self, dt: Duration) {
        if let Source::Manual { elapsed } = &mut self.source {
            *elapsed += dt;
        }
    }

    pub fn elapsed(&mut self) -> Duration {
        match &mut self.source {
            Source::Monotonic { start } => start.get_or_insert_with(Instant::now).elapsed(),
            Source::Manual { elapsed } => *elapsed,
        }
    }

    /// Seconds since the first read.
    pub fn elapsed_secs(&mut self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let mut clock = Clock::manual();
        assert_eq!(clock.elapsed_secs(), 0.0);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.elapsed_secs(), 1.5);
        assert_eq!(clock.elapsed_secs(), 1.5);
    }

    #[test]
    fn monotonic_clock_never_decreases() {
        let mut clock = Clock::new();
        let mut last = clock.elapsed();
        for _ in 0..100 {
            let now = clock.elapsed();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn advance_is_ignored_by_monotonic_clock() {
        let mut clock = Clock::new();
        clock.advance(Duration::from_secs(3600));
        assert!(clock.elapsed_secs() < 60.0);
    }
}
