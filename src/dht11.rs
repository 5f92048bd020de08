use crate::error::Error;
use crate::frame::Reading;
use crate::gpio::{Clock, Direction, GpioPort, MAX_PIN};
use crate::handshake::{HandshakeSequencer, Phase, Timings};
use crate::scheduler::{PollScheduler, MIN_READ_INTERVAL};
use core::fmt;
use core::time::Duration;
use embedded_hal::delay::DelayNs;

/// How often the blocking driver re-checks the cool-down while waiting for it to pass.
const READY_POLL_INTERVAL_US: u32 = 100;

/// Options to modify the behavior of the DHT11 driver.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// The minimum time interval that must pass between reads. Cannot be below
    /// [`MIN_READ_INTERVAL`].
    pub min_read_interval: Duration,
    /// The maximum number of read attempts for any call to [`Dht11::read`] or
    /// [`Dht11::read_blocking`].
    ///
    /// Only timing violations and checksum mismatches are retried. Keep in mind the
    /// `min_read_interval` when setting this option: every attempt waits for it.
    pub max_attempts: u8,
    /// Timing windows used during each cycle.
    pub timings: Timings,
}

pub const DEFAULT_OPTIONS: Options = Options {
    min_read_interval: MIN_READ_INTERVAL,
    max_attempts: 1,
    timings: Timings::DHT11,
};

impl Default for Options {
    fn default() -> Options {
        DEFAULT_OPTIONS
    }
}

/// A DHT11 sensor on one GPIO pin.
#[derive(Debug)]
pub struct Dht11<TPort, TClock> {
    port: TPort,
    clock: TClock,
    sequencer: HandshakeSequencer,
    scheduler: PollScheduler,
    options: Options,
}

impl<TPort, TClock, TError> Dht11<TPort, TClock>
where
    TPort: GpioPort<Error = TError>,
    TClock: Clock,
    TError: fmt::Debug,
{
    /// Constructs a DHT11 sensor that reads from `pin` on the given port.
    ///
    /// The pin is immediately configured as an output and driven high, which is the idle state
    /// of the bus. If `options` is `None`, then [`DEFAULT_OPTIONS`] is used.
    ///
    /// The `clock` only needs to be monotonic; see [`Clock`].
    pub fn new(
        mut port: TPort,
        pin: u8,
        clock: TClock,
        options: Option<Options>,
    ) -> Result<Dht11<TPort, TClock>, Error<TError>> {
        let options = match options {
            None => DEFAULT_OPTIONS,
            Some(options) => {
                if options.min_read_interval < MIN_READ_INTERVAL
                    || options.max_attempts < 1
                    || !options.timings.is_valid()
                {
                    return Err(Error::InvalidArgument);
                }
                options
            }
        };
        if pin >= MAX_PIN {
            return Err(Error::InvalidArgument);
        }

        let mut sequencer = HandshakeSequencer::new(pin, options.timings);
        sequencer.idle(&mut port)?;
        Ok(Dht11 {
            port,
            clock,
            sequencer,
            scheduler: PollScheduler::new(options.min_read_interval),
            options,
        })
    }

    pub fn pin(&self) -> u8 {
        self.sequencer.pin()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The direction the pin is currently configured with. Always [`Direction::Output`] between
    /// reads.
    pub fn direction(&self) -> Direction {
        self.sequencer.direction()
    }

    /// The phase the last read attempt ended in.
    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    /// Gives back the GPIO port.
    pub fn release(self) -> TPort {
        self.port
    }

    /// Reads data from the DHT11, waiting out the minimum read interval first.
    ///
    /// This will asynchronously sleep using the provided `delay_fn` until the minimum read
    /// interval has passed, and while holding the request pulse. The provided function needs
    /// to be capable of millisecond precision or better.
    ///
    /// Due to the tight timing necessary to distinguish bits in the DHT11's response, this
    /// busy-waits while receiving data. This blocking portion takes about 4ms (full range:
    /// 3200-4800us, depending on the data).
    pub async fn read<DelayFn, EmptyFuture>(
        &mut self,
        delay_fn: DelayFn,
    ) -> Result<Reading, Error<TError>>
    where
        DelayFn: Fn(Duration) -> EmptyFuture,
        EmptyFuture: core::future::Future<Output = ()>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            loop {
                let now = self.clock.now();
                if self.scheduler.ready_to_poll(now) {
                    break;
                }
                delay_fn(self.scheduler.time_until_ready(now)).await;
            }

            log::debug!("dht11: reading pin {} (attempt {})", self.pin(), attempt);
            let result = match self.sequencer.request(&mut self.port) {
                Ok(()) => {
                    delay_fn(self.options.timings.request_hold).await;
                    self.sequencer.respond(&mut self.port, &self.clock)
                }
                Err(err) => Err(err),
            };

            if let Some(result) = self.settle(result, attempt) {
                return result;
            }
        }
    }

    /// Same as [`Dht11::read`], but blocks on `delay` instead of sleeping asynchronously.
    ///
    /// While waiting for the minimum read interval, the clock is re-checked every 100us.
    pub fn read_blocking<TDelay: DelayNs>(
        &mut self,
        delay: &mut TDelay,
    ) -> Result<Reading, Error<TError>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            while !self.scheduler.ready_to_poll(self.clock.now()) {
                delay.delay_us(READY_POLL_INTERVAL_US);
            }

            log::debug!("dht11: reading pin {} (attempt {})", self.pin(), attempt);
            let result = match self.sequencer.request(&mut self.port) {
                Ok(()) => {
                    delay.delay_us(self.options.timings.request_hold.as_micros() as u32);
                    self.sequencer.respond(&mut self.port, &self.clock)
                }
                Err(err) => Err(err),
            };

            if let Some(result) = self.settle(result, attempt) {
                return result;
            }
        }
    }

    /// Decides whether an attempt's result is final. Returns `None` if another attempt should
    /// be made.
    fn settle(
        &self,
        result: Result<Reading, Error<TError>>,
        attempt: u8,
    ) -> Option<Result<Reading, Error<TError>>> {
        match result {
            Ok(reading) => {
                log::debug!("dht11: {}", reading);
                Some(Ok(reading))
            }
            Err(err) => {
                log::warn!("dht11: attempt {} failed: {}", attempt, err);
                if err.is_retryable() && attempt < self.options.max_attempts {
                    return None;
                }
                Some(Err(err))
            }
        }
    }
}
