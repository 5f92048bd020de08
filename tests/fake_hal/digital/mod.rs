use super::concurrent;
use dht11_bus::gpio::{Direction, GpioPort};
use embedded_hal::digital::{self as hal, ErrorType, InputPin, OutputPin, PinState};

#[derive(Debug, PartialEq)]
pub enum Error {
    Broken,
}

impl hal::Error for Error {
    fn kind(&self) -> hal::ErrorKind {
        hal::ErrorKind::Other
    }
}

/// What the sensor drives onto the line after the host releases it, as `(level, duration_ns)`
/// segments. The line floats high once the segments run out.
pub type Waveform = Vec<(PinState, u64)>;

/// The sensor's side of the bus.
///
/// Each request (the host pulling the line low) selects the next waveform; the last one repeats.
/// The waveform starts playing when the host releases the line.
#[derive(Debug)]
struct Replay {
    name: &'static str,
    waveforms: Vec<Waveform>,
    requests: usize,
    origin: Option<u64>,
    latest_offset: u64,
}

impl Replay {
    fn new(name: &'static str) -> Replay {
        concurrent::set_named_value(name, 0);
        Replay {
            name,
            waveforms: Vec::new(),
            requests: 0,
            origin: None,
            latest_offset: 0,
        }
    }

    fn request(&mut self) {
        self.requests += 1;
        self.origin = None;
        self.latest_offset = 0;
    }

    fn release(&mut self) {
        self.origin = Some(concurrent::get_named_value(self.name));
    }

    fn level(&mut self) -> PinState {
        let origin = match self.origin {
            Some(origin) if self.requests > 0 && !self.waveforms.is_empty() => origin,
            _ => return PinState::High,
        };
        let offset = concurrent::get_named_value(self.name) - origin;
        self.latest_offset = self.latest_offset.max(offset);

        let index = (self.requests - 1).min(self.waveforms.len() - 1);
        let mut start = 0;
        for &(level, duration) in self.waveforms[index].iter() {
            if offset < start + duration {
                return level;
            }
            start += duration;
        }
        PinState::High
    }
}

/// A fake [`GpioPort`] with a DHT11 on every pin.
#[derive(Debug)]
pub struct Port {
    replay: Replay,
    output_level: PinState,
    direction: Option<Direction>,
    fail_reads: bool,
    fail_low_writes: bool,
    fail_output_after_input: bool,
    /// Every level written, in order.
    pub writes: Vec<PinState>,
    /// Every direction configured, in order.
    pub configured: Vec<Direction>,
    /// Virtual time of each request pulse.
    pub request_times_ns: Vec<u64>,
}

impl Port {
    pub fn new(name: &'static str) -> Port {
        Port {
            replay: Replay::new(name),
            output_level: PinState::High,
            direction: None,
            fail_reads: false,
            fail_low_writes: false,
            fail_output_after_input: false,
            writes: Vec::new(),
            configured: Vec::new(),
            request_times_ns: Vec::new(),
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.replay.waveforms = vec![waveform];
    }

    pub fn set_waveforms(&mut self, waveforms: Vec<Waveform>) {
        self.replay.waveforms = waveforms;
    }

    pub fn set_fail_reads(&mut self, fail_reads: bool) {
        self.fail_reads = fail_reads;
    }

    /// Makes every attempt to pull the line low fail.
    pub fn set_fail_low_writes(&mut self, fail_low_writes: bool) {
        self.fail_low_writes = fail_low_writes;
    }

    /// Makes switching back to output fail once the line has been released to the sensor.
    pub fn set_fail_output_after_input(&mut self, fail_output_after_input: bool) {
        self.fail_output_after_input = fail_output_after_input;
    }

    /// The furthest point into the current waveform that was sampled.
    pub fn latest_sample_ns(&self) -> u64 {
        self.replay.latest_offset
    }

    pub fn requests(&self) -> usize {
        self.replay.requests
    }
}

impl GpioPort for Port {
    type Error = Error;

    fn configure(&mut self, _pin: u8, direction: Direction) -> Result<(), Error> {
        if self.fail_output_after_input
            && direction == Direction::Output
            && self.direction == Some(Direction::Input)
        {
            return Err(Error::Broken);
        }
        self.configured.push(direction);
        self.direction = Some(direction);
        if direction == Direction::Input {
            self.replay.release();
        }
        Ok(())
    }

    fn read(&mut self, _pin: u8) -> Result<PinState, Error> {
        if self.fail_reads {
            return Err(Error::Broken);
        }
        if self.direction == Some(Direction::Output) {
            return Ok(self.output_level);
        }
        Ok(self.replay.level())
    }

    fn write(&mut self, _pin: u8, state: PinState) -> Result<(), Error> {
        if self.fail_low_writes && state == PinState::Low {
            return Err(Error::Broken);
        }
        self.writes.push(state);
        self.output_level = state;
        if state == PinState::Low {
            self.request_times_ns
                .push(concurrent::get_named_value(self.replay.name));
            self.replay.request();
        }
        Ok(())
    }
}

/// A fake open-drain `embedded-hal` pin with a DHT11 attached.
#[derive(Debug)]
pub struct Line {
    replay: Replay,
    driven_low: bool,
}

impl Line {
    pub fn new(name: &'static str) -> Line {
        Line {
            replay: Replay::new(name),
            driven_low: false,
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.replay.waveforms = vec![waveform];
    }

    pub fn is_driven_low(&self) -> bool {
        self.driven_low
    }
}

impl ErrorType for Line {
    type Error = Error;
}

impl InputPin for Line {
    fn is_high(&mut self) -> Result<bool, Error> {
        if self.driven_low {
            return Ok(false);
        }
        Ok(self.replay.level() == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Error> {
        Ok(!self.is_high()?)
    }
}

impl OutputPin for Line {
    fn set_low(&mut self) -> Result<(), Error> {
        self.driven_low = true;
        self.replay.request();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Error> {
        self.driven_low = false;
        self.replay.release();
        Ok(())
    }
}
