use crate::{TimeSource, time::system::system_millis};
use core::time::Duration;
use std::{
    sync::{
        Arc, Mutex, OnceLock, PoisonError, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
};

/// Refresh period used by [`CachedClock::default`] and [`CachedClock::global`].
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_millis(1);

/// State shared between clock handles and the ticker thread.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    period: Duration,
    stopped: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// A wall-clock time source refreshed by a background ticker thread.
///
/// The ticker overwrites a shared atomic with the system time once per refresh
/// period, so [`current_millis`] is a single atomic load with no syscall on the
/// hot path. The value lags the system clock by at most one period plus
/// scheduling delay of the ticker thread.
///
/// Handles are cheap to clone and all clones read the same cell. The ticker
/// stops when [`CachedClock::shutdown`] is called on any handle, or on its own
/// once every handle has been dropped. After shutdown the clock keeps
/// returning the last value it stored.
///
/// [`current_millis`]: TimeSource::current_millis
#[derive(Clone, Debug)]
pub struct CachedClock {
    inner: Arc<SharedTickerInner>,
}

impl Default for CachedClock {
    /// Constructs a cached clock refreshed every [`DEFAULT_REFRESH_PERIOD`].
    fn default() -> Self {
        Self::with_period(DEFAULT_REFRESH_PERIOD)
    }
}

impl CachedClock {
    /// Constructs a cached clock and starts its ticker thread.
    ///
    /// The cell is seeded with the current system time before the thread is
    /// spawned, so the first read is never zero. A zero `period` falls back to
    /// [`DEFAULT_REFRESH_PERIOD`].
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the ticker thread.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use tien_id::{CachedClock, SystemClock, TimeSource};
    ///
    /// let clock = CachedClock::with_period(Duration::from_millis(1));
    /// let cached = clock.current_millis();
    /// assert!(cached <= SystemClock.current_millis());
    /// clock.shutdown();
    /// ```
    pub fn with_period(period: Duration) -> Self {
        let period = if period.is_zero() {
            DEFAULT_REFRESH_PERIOD
        } else {
            period
        };

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(system_millis()),
            period,
            stopped: AtomicBool::new(false),
            handle: Mutex::new(None),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::Builder::new()
            .name("tien-clock".into())
            .spawn(move || run_ticker(&weak_inner, period))
            .expect("failed to spawn clock ticker thread");

        *inner.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        #[cfg(feature = "tracing")]
        tracing::debug!(?period, "started cached clock ticker");

        Self { inner }
    }

    /// Returns the process-wide cached clock, starting it on first use.
    ///
    /// Every generator built from configuration with the default refresh period
    /// reads this instance. Calling [`CachedClock::shutdown`] on it stops the
    /// ticker for the whole process.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<CachedClock> = OnceLock::new();
        GLOBAL.get_or_init(Self::default).clone()
    }

    /// Returns the refresh period of the ticker.
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Returns `true` until the ticker has been shut down.
    pub fn is_running(&self) -> bool {
        !self.inner.stopped.load(Ordering::Acquire)
    }

    /// Signals the ticker thread to stop and waits for it to exit.
    ///
    /// Idempotent. Subsequent reads return the last stored time.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::Release);

        let handle = self
            .inner
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!("cached clock ticker panicked before shutdown");
            }
            #[cfg(feature = "tracing")]
            tracing::debug!("stopped cached clock ticker");
        }
    }
}

fn run_ticker(weak_inner: &Weak<SharedTickerInner>, period: Duration) {
    loop {
        {
            // Holding only a weak reference lets the last handle drop stop us.
            let Some(inner) = weak_inner.upgrade() else {
                break;
            };
            if inner.stopped.load(Ordering::Acquire) {
                break;
            }
            inner.current.store(system_millis(), Ordering::Release);
        }
        thread::park_timeout(period);
    }
}

impl TimeSource for CachedClock {
    fn current_millis(&self) -> u64 {
        self.inner.current.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Headroom for the ticker thread being descheduled on a busy test host.
    const SCHEDULER_SLACK_MS: u64 = 25;

    #[test]
    fn first_read_is_seeded() {
        let before = system_millis();
        let clock = CachedClock::default();
        assert!(clock.current_millis() >= before);
        clock.shutdown();
    }

    #[test]
    fn staleness_is_bounded_by_refresh_period() {
        let clock = CachedClock::with_period(Duration::from_millis(1));
        let bound = clock.period().as_millis() as u64 + SCHEDULER_SLACK_MS;

        for _ in 0..200 {
            let truth = system_millis();
            let cached = clock.current_millis();
            let lag = truth.saturating_sub(cached);
            assert!(lag <= bound, "cached clock lagged {lag}ms (bound {bound}ms)");
            thread::sleep(Duration::from_micros(250));
        }

        clock.shutdown();
    }

    #[test]
    fn advances_while_running() {
        let clock = CachedClock::with_period(Duration::from_millis(1));
        let start = clock.current_millis();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.current_millis() > start);
        clock.shutdown();
    }

    #[test]
    fn shutdown_freezes_the_clock() {
        let clock = CachedClock::with_period(Duration::from_millis(1));
        let other = clock.clone();
        assert!(other.is_running());

        clock.shutdown();
        assert!(!other.is_running());
        assert!(clock.inner.handle.lock().unwrap().is_none());

        let frozen = other.current_millis();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(other.current_millis(), frozen);

        // Second shutdown is a no-op.
        other.shutdown();
    }

    #[test]
    fn zero_period_uses_default() {
        let clock = CachedClock::with_period(Duration::ZERO);
        assert_eq!(clock.period(), DEFAULT_REFRESH_PERIOD);
        clock.shutdown();
    }

    #[test]
    fn global_is_shared() {
        let a = CachedClock::global();
        let b = CachedClock::global();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
        assert_eq!(a.period(), DEFAULT_REFRESH_PERIOD);
    }
}
