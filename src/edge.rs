use crate::gpio::{Clock, GpioPort};
use core::time::Duration;
use embedded_hal::digital::PinState;

/// A single level transition observed on the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeMeasurement {
    /// The level of the line after the transition.
    pub level: PinState,
    /// Time spent at the previous level, in nanoseconds.
    pub duration_ns: u64,
}

#[derive(Debug, PartialEq)]
pub enum EdgeError<TIoError> {
    /// Wrapped error from the GPIO port.
    Wrapped(TIoError),
    /// The line did not change level within the allowed time.
    Timeout,
}

/// Times the transitions of one GPIO pin by busy-polling it against a monotonic clock.
///
/// The timer remembers the last level it saw and when it saw it change, so consecutive calls to
/// [`EdgeTimer::wait_for_edge`] measure back-to-back pulse widths without losing an edge between
/// calls. The first measurement is taken relative to the moment the timer was created.
pub struct EdgeTimer<'a, TPort, TClock> {
    port: &'a mut TPort,
    clock: &'a TClock,
    pin: u8,
    level: PinState,
    mark: Duration,
}

impl<'a, TPort, TClock, TError> EdgeTimer<'a, TPort, TClock>
where
    TPort: GpioPort<Error = TError>,
    TClock: Clock,
{
    /// Samples the current level of `pin` and starts timing from now.
    pub fn new(
        port: &'a mut TPort,
        clock: &'a TClock,
        pin: u8,
    ) -> Result<EdgeTimer<'a, TPort, TClock>, TError> {
        let level = port.read(pin)?;
        let mark = clock.now();
        Ok(EdgeTimer {
            port,
            clock,
            pin,
            level,
            mark,
        })
    }

    /// The last level seen on the line.
    pub fn level(&self) -> PinState {
        self.level
    }

    /// Time since the last observed edge (or since the timer was created).
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.mark)
    }

    /// Samples the line once.
    ///
    /// Returns [`nb::Error::WouldBlock`] while the level is unchanged.
    pub fn poll_edge(&mut self) -> nb::Result<EdgeMeasurement, TError> {
        let level = self.port.read(self.pin).map_err(nb::Error::Other)?;
        if level == self.level {
            return Err(nb::Error::WouldBlock);
        }
        let now = self.clock.now();
        let duration = now.saturating_sub(self.mark);
        self.level = level;
        self.mark = now;
        Ok(EdgeMeasurement {
            level,
            duration_ns: duration.as_nanos() as u64,
        })
    }

    /// Spins until the line changes level, or fails once `timeout` has passed since the call
    /// started.
    ///
    /// The returned duration is still measured from the previous edge.
    ///
    /// This never sleeps: the DHT11's pulses are tens of microseconds long, well below the
    /// jitter of any scheduler.
    pub fn wait_for_edge(
        &mut self,
        timeout: Duration,
    ) -> Result<EdgeMeasurement, EdgeError<TError>> {
        let start = self.clock.now();
        loop {
            match self.poll_edge() {
                Ok(edge) => return Ok(edge),
                Err(nb::Error::Other(err)) => return Err(EdgeError::Wrapped(err)),
                Err(nb::Error::WouldBlock) => {
                    if self.clock.now().saturating_sub(start) > timeout {
                        return Err(EdgeError::Timeout);
                    }
                }
            }
        }
    }
}

/// Busy-waits for at least `duration`.
pub fn spin_for<TClock: Clock>(clock: &TClock, duration: Duration) {
    let start = clock.now();
    while clock.now().saturating_sub(start) < duration {}
}
