//! Wall-clock source used to stamp samples.

/// Timestamp reported while the wall clock is not synchronized
pub const UNSET_TIMESTAMP: u32 = 0;

/// Source of the current wall-clock time in seconds since epoch
///
/// Returns [`UNSET_TIMESTAMP`] until the time is known. The engine never fails
/// on an unset time; it records the sample and the time reads back as `None`.
pub trait Clock {
    fn now(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now(&self) -> u32 {
        self()
    }
}

/// Epoch time captured at the moment of synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyncPoint {
    epoch_secs: u32,
    uptime_secs: u64,
}

/// Wall clock derived from a monotonic uptime counter and one sync point
///
/// Reports [`UNSET_TIMESTAMP`] until [`SyncedClock::sync`] is called (for
/// example once network time has been acquired), and then extrapolates from
/// the uptime elapsed since the sync.
pub struct SyncedClock<U> {
    uptime: U,
    sync_point: Option<SyncPoint>,
}

impl<U> SyncedClock<U>
where
    U: Fn() -> u64,
{
    /// Create an unsynchronized clock over an uptime source in seconds
    pub const fn new(uptime: U) -> Self {
        Self {
            uptime,
            sync_point: None,
        }
    }

    /// Anchor the clock: the current uptime corresponds to `epoch_secs`
    pub fn sync(&mut self, epoch_secs: u32) {
        let uptime_secs = (self.uptime)();
        self.sync_point = Some(SyncPoint {
            epoch_secs,
            uptime_secs,
        });
        log::info!("Wall clock synchronized to {} at uptime {}s", epoch_secs, uptime_secs);
    }

    /// Whether a sync point has been set
    pub fn is_synced(&self) -> bool {
        self.sync_point.is_some()
    }
}

impl<U> Clock for SyncedClock<U>
where
    U: Fn() -> u64,
{
    fn now(&self) -> u32 {
        match self.sync_point {
            None => UNSET_TIMESTAMP,
            Some(point) => {
                let elapsed = (self.uptime)().saturating_sub(point.uptime_secs);
                let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
                point.epoch_secs.saturating_add(elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_unsynced_clock_reports_unset() {
        let clock = SyncedClock::new(|| 500);
        assert!(!clock.is_synced());
        assert_eq!(clock.now(), UNSET_TIMESTAMP);
    }

    #[test]
    fn test_synced_clock_follows_uptime() {
        let uptime = Cell::new(100u64);
        let mut clock = SyncedClock::new(|| uptime.get());
        clock.sync(1_700_000_000);
        assert_eq!(clock.now(), 1_700_000_000);

        uptime.set(130);
        assert_eq!(clock.now(), 1_700_000_030);
    }

    #[test]
    fn test_closure_clock() {
        let clock = || 42u32;
        assert_eq!(Clock::now(&clock), 42);
    }
}
