use crate::TimeSource;
use std::time::{SystemTime, UNIX_EPOCH};

/// A time source that reads the system clock on every call.
///
/// Always current, but every call pays for a clock read. Times before the Unix
/// epoch read as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl SystemClock {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        system_millis()
    }
}

#[inline]
pub(crate) fn system_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_tracks_wall_clock() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = SystemClock.current_millis();
        let after = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        assert!(before <= now && now <= after);
    }
}
