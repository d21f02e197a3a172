use core::time::Duration;

/// Default epoch: Tuesday, February 27, 2018 14:12:57.809 UTC
///
/// Every deployment sharing one ID space must keep using the same epoch. Moving
/// it forward shrinks the timestamp component of new IDs below that of IDs
/// already issued and breaks their ordering.
pub const TIEN_EPOCH: Duration = Duration::from_millis(1_519_740_777_809);

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// This is the seam through which a generator reads time. Production code uses
/// [`SystemClock`], [`CachedClock`] or the [`Clock`] enum that dispatches
/// between them; tests plug in mocked sources.
///
/// Implementations must not block and must always return a value.
///
/// # Example
///
/// ```
/// use tien_id::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
///
/// [`SystemClock`]: crate::SystemClock
/// [`CachedClock`]: crate::CachedClock
/// [`Clock`]: crate::Clock
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
