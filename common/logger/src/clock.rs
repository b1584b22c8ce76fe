use chrono::{DateTime, Duration, Local};
use std::sync::{Arc, Mutex};

/// The source of the current time for record timestamps and file rotation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
/// Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.lock() = now;
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.lock();
        *now = *now + duration;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Local>> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.lock()
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_should_move_only_when_advanced() {
        let start = Local.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let shared = clock.clone();

        assert_eq!(start, clock.now());

        shared.advance(Duration::minutes(31));
        assert_eq!(Local.with_ymd_and_hms(2024, 1, 10, 8, 31, 0).unwrap(), clock.now());

        clock.set(start);
        assert_eq!(start, shared.now());
    }
}
