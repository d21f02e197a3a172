use crate::{CachedClock, SystemClock, TimeSource};

/// Runtime choice between the direct and the cached clock strategy.
///
/// Configuration selects the strategy with a single flag, so the generator
/// built from configuration is parameterized over this enum instead of a
/// concrete clock type.
#[derive(Clone, Debug)]
pub enum Clock {
    /// Reads the system clock on every call.
    System(SystemClock),
    /// Reads a cell refreshed by a background ticker.
    Cached(CachedClock),
}

impl Clock {
    /// Returns `true` for the cached strategy.
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::System(SystemClock)
    }
}

impl From<SystemClock> for Clock {
    fn from(clock: SystemClock) -> Self {
        Self::System(clock)
    }
}

impl From<CachedClock> for Clock {
    fn from(clock: CachedClock) -> Self {
        Self::Cached(clock)
    }
}

impl TimeSource for Clock {
    #[inline]
    fn current_millis(&self) -> u64 {
        match self {
            Self::System(clock) => clock.current_millis(),
            Self::Cached(clock) => clock.current_millis(),
        }
    }
}
