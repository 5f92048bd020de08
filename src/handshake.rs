use crate::edge::{spin_for, EdgeError, EdgeMeasurement, EdgeTimer};
use crate::error::Error;
use crate::frame::{BitDecoder, Frame, Reading, PAYLOAD_BITS};
use crate::gpio::{Clock, Direction, GpioPort};
use core::fmt;
use core::time::Duration;
use embedded_hal::digital::PinState;

/// Stages of one reading cycle.
///
/// Errors carry the phase whose edge-wait failed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// The host is holding the line low, then waiting for the sensor to pull it low.
    Requesting,
    /// Measuring the sensor's ~80us low acknowledgement.
    AwaitingResponseLow,
    /// Measuring the sensor's ~80us high acknowledgement.
    AwaitingResponseHigh,
    /// Measuring the 40 data bits.
    ReadingBits,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Requesting => "requesting",
            Phase::AwaitingResponseLow => "awaiting the low response",
            Phase::AwaitingResponseHigh => "awaiting the high response",
            Phase::ReadingBits => "reading bits",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Timing windows of the DHT11 protocol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timings {
    /// How long the host holds the line low to request a reading. Must be within 18-30ms.
    pub request_hold: Duration,
    /// How long the host drives the line high before listening.
    pub release: Duration,
    /// How long the sensor may take to pull the line low once the host listens.
    pub response_timeout: Duration,
    /// Shortest accepted acknowledgement pulse, low or high.
    pub ack_min: Duration,
    /// Longest accepted acknowledgement pulse, low or high.
    pub ack_max: Duration,
    /// Give up on an acknowledgement edge after this long.
    pub ack_timeout: Duration,
    /// High pulses longer than this are a `1`.
    pub bit_threshold: Duration,
    /// Give up on a data edge after this long.
    pub bit_timeout: Duration,
}

impl Timings {
    pub const DHT11: Timings = Timings {
        request_hold: Duration::from_millis(20),
        release: Duration::from_micros(20),
        response_timeout: Duration::from_micros(20),
        ack_min: Duration::from_micros(40),
        ack_max: Duration::from_micros(90),
        ack_timeout: Duration::from_micros(120),
        bit_threshold: Duration::from_micros(35),
        bit_timeout: Duration::from_micros(120),
    };

    /// Whether an acknowledgement pulse of `duration_ns` is within the window, inclusive.
    pub fn accepts_ack(&self, duration_ns: u64) -> bool {
        duration_ns >= self.ack_min.as_nanos() as u64
            && duration_ns <= self.ack_max.as_nanos() as u64
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.request_hold >= Duration::from_millis(18)
            && self.request_hold <= Duration::from_millis(30)
            && self.ack_min <= self.ack_max
            && self.ack_max < self.ack_timeout
            && self.bit_threshold < self.bit_timeout
    }
}

impl Default for Timings {
    fn default() -> Timings {
        Timings::DHT11
    }
}

/// Drives the host side of the DHT11 handshake and collects the data bits.
///
/// Owns the per-sensor bus state: the pin, its current direction and the phase of the current
/// cycle. The port and clock are lent in for each step so the sequencer can live next to them in
/// the driver.
#[derive(Debug)]
pub struct HandshakeSequencer {
    pin: u8,
    timings: Timings,
    decoder: BitDecoder,
    direction: Direction,
    phase: Phase,
}

impl HandshakeSequencer {
    pub fn new(pin: u8, timings: Timings) -> HandshakeSequencer {
        HandshakeSequencer {
            pin,
            timings,
            decoder: BitDecoder::new(timings.bit_threshold.as_nanos() as u64),
            direction: Direction::Input,
            phase: Phase::Idle,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// The direction the pin was last configured with.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The phase the last cycle ended in, or the current phase mid-cycle.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Puts the line in its safe idle state: output, driven high.
    pub fn idle<TPort: GpioPort>(&mut self, port: &mut TPort) -> Result<(), TPort::Error> {
        port.configure(self.pin, Direction::Output)?;
        self.direction = Direction::Output;
        port.write(self.pin, PinState::High)
    }

    /// Starts a cycle by pulling the line low.
    ///
    /// The caller must then hold the line for [`Timings::request_hold`] before calling
    /// [`HandshakeSequencer::respond`].
    pub fn request<TPort, TError>(&mut self, port: &mut TPort) -> Result<(), Error<TError>>
    where
        TPort: GpioPort<Error = TError>,
    {
        self.phase = Phase::Requesting;
        let result = self.drive_low(port);
        if result.is_err() {
            self.abort(port);
        }
        result.map_err(Error::Wrapped)
    }

    fn drive_low<TPort: GpioPort>(&mut self, port: &mut TPort) -> Result<(), TPort::Error> {
        if self.direction != Direction::Output {
            port.configure(self.pin, Direction::Output)?;
            self.direction = Direction::Output;
        }
        port.write(self.pin, PinState::Low)
    }

    /// Releases the line and reads the sensor's answer.
    ///
    /// Blocks for the whole transmission (about 4-5ms). The line is left idle afterwards, whether
    /// or not the cycle succeeded.
    pub fn respond<TPort, TClock, TError>(
        &mut self,
        port: &mut TPort,
        clock: &TClock,
    ) -> Result<Reading, Error<TError>>
    where
        TPort: GpioPort<Error = TError>,
        TClock: Clock,
    {
        match self.receive(port, clock) {
            Ok(reading) => match self.idle(port) {
                Ok(()) => {
                    self.phase = Phase::Done;
                    Ok(reading)
                }
                Err(err) => {
                    self.phase = Phase::Failed;
                    log::warn!("dht11: could not return pin {} to idle", self.pin);
                    Err(Error::Wrapped(err))
                }
            },
            Err(err) => {
                self.abort(port);
                Err(err)
            }
        }
    }

    fn abort<TPort: GpioPort>(&mut self, port: &mut TPort) {
        log::trace!("dht11: aborted while {}", self.phase);
        self.phase = Phase::Failed;
        if self.idle(port).is_err() {
            log::warn!("dht11: could not return pin {} to idle", self.pin);
        }
    }

    fn receive<TPort, TClock, TError>(
        &mut self,
        port: &mut TPort,
        clock: &TClock,
    ) -> Result<Reading, Error<TError>>
    where
        TPort: GpioPort<Error = TError>,
        TClock: Clock,
    {
        let timings = self.timings;
        let pin = self.pin;

        port.write(pin, PinState::High)?;
        spin_for(clock, timings.release);
        port.configure(pin, Direction::Input)?;
        self.direction = Direction::Input;

        let mut timer = EdgeTimer::new(port, clock, pin)?;

        let edge = wait(&mut timer, timings.response_timeout, Phase::Requesting)?;
        if edge.level != PinState::Low
            || edge.duration_ns > timings.response_timeout.as_nanos() as u64
        {
            return Err(violation(Phase::Requesting, edge));
        }
        log::trace!("dht11: sensor answered after {}ns", edge.duration_ns);

        self.phase = Phase::AwaitingResponseLow;
        let edge = wait(&mut timer, timings.ack_timeout, self.phase)?;
        if edge.level != PinState::High || !timings.accepts_ack(edge.duration_ns) {
            return Err(violation(self.phase, edge));
        }

        self.phase = Phase::AwaitingResponseHigh;
        let edge = wait(&mut timer, timings.ack_timeout, self.phase)?;
        if edge.level != PinState::Low || !timings.accepts_ack(edge.duration_ns) {
            return Err(violation(self.phase, edge));
        }

        self.phase = Phase::ReadingBits;
        let mut high_widths = [0u64; PAYLOAD_BITS];
        for width in high_widths.iter_mut() {
            // The level alternates on every edge, so the first wait ends the low half and the
            // second ends the high half.
            wait(&mut timer, timings.bit_timeout, Phase::ReadingBits)?;
            *width = wait(&mut timer, timings.bit_timeout, Phase::ReadingBits)?.duration_ns;
        }

        match self.decoder.decode(&high_widths) {
            Frame::Valid(reading) => Ok(reading),
            Frame::Invalid { expected, actual } => {
                Err(Error::ChecksumMismatch { expected, actual })
            }
        }
    }
}

fn wait<TPort, TClock, TError>(
    timer: &mut EdgeTimer<'_, TPort, TClock>,
    timeout: Duration,
    phase: Phase,
) -> Result<EdgeMeasurement, Error<TError>>
where
    TPort: GpioPort<Error = TError>,
    TClock: Clock,
{
    timer.wait_for_edge(timeout).map_err(|err| match err {
        EdgeError::Wrapped(err) => Error::Wrapped(err),
        EdgeError::Timeout => Error::Timeout(phase),
    })
}

fn violation<TError>(phase: Phase, edge: EdgeMeasurement) -> Error<TError> {
    Error::TimingViolation {
        phase,
        duration_ns: edge.duration_ns,
    }
}
