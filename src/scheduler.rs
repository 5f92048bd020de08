use core::time::Duration;

/// The minimum read interval of a DHT11.
///
/// Note that this can vary a bit by device, so check your device's datasheet to be sure. Try
/// doubling this value if you are encountering problems.
pub const MIN_READ_INTERVAL: Duration = Duration::from_millis(1000);

/// Throttles how often the sensor may be triggered.
///
/// This only gates trigger frequency; retrying is up to the caller. Timestamps come from the
/// same monotonic clock the driver uses.
#[derive(Clone, Copy, Debug)]
pub struct PollScheduler {
    interval: Duration,
    last_poll: Option<Duration>,
}

impl Default for PollScheduler {
    fn default() -> PollScheduler {
        PollScheduler::new(MIN_READ_INTERVAL)
    }
}

impl PollScheduler {
    pub const fn new(interval: Duration) -> PollScheduler {
        PollScheduler {
            interval,
            last_poll: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the sensor may be triggered at `now`.
    ///
    /// The first call always passes. Every pass restarts the interval from `now`.
    pub fn ready_to_poll(&mut self, now: Duration) -> bool {
        if self.time_until_ready(now) > Duration::from_secs(0) {
            return false;
        }
        self.last_poll = Some(now);
        true
    }

    /// How long until [`PollScheduler::ready_to_poll`] would pass. Zero if it would pass now.
    pub fn time_until_ready(&self, now: Duration) -> Duration {
        match self.last_poll {
            None => Duration::from_secs(0),
            Some(last_poll) => {
                let elapsed = now.saturating_sub(last_poll);
                self.interval.saturating_sub(elapsed)
            }
        }
    }
}
