use core::time::Duration;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// The highest pin number (exclusive) addressable through a single register bank.
pub const MAX_PIN: u8 = 32;

/// The GPIO pin used by default when the caller does not pick one.
pub const DEFAULT_PIN: u8 = 22;

/// Direction of a GPIO pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Access to the GPIO lines that the sensor is wired to.
///
/// Implementations are expected to validate pin numbers themselves. The driver only ever calls
/// these with the pin it was constructed with, which it checks against [`MAX_PIN`].
pub trait GpioPort {
    type Error;

    /// Switches `pin` to the given direction.
    fn configure(&mut self, pin: u8, direction: Direction) -> Result<(), Self::Error>;

    /// Samples the current level of `pin`.
    fn read(&mut self, pin: u8) -> Result<PinState, Self::Error>;

    /// Drives `pin` to the given level.
    fn write(&mut self, pin: u8, state: PinState) -> Result<(), Self::Error>;
}

/// A monotonic time source.
///
/// The returned value is measured from an arbitrary origin and must never decrease. It does not
/// need to reflect real dates and times, but the DHT11 handshake needs microsecond precision or
/// better.
///
/// Any `Fn() -> Duration` closure is a clock, e.g. `|| start.elapsed()` with a
/// `std::time::Instant`.
pub trait Clock {
    fn now(&self) -> Duration;
}

impl<F> Clock for F
where
    F: Fn() -> Duration,
{
    fn now(&self) -> Duration {
        self()
    }
}

/// Adapts a single open-drain `embedded-hal` pin to the [`GpioPort`] interface.
///
/// The DHT11 data line is pulled up externally, so "input" simply means releasing the line by
/// driving the open-drain output high. The port only has one line, and every pin number refers
/// to it.
#[derive(Debug)]
pub struct OpenDrainPort<TPin> {
    pin: TPin,
}

impl<TPin, TError> OpenDrainPort<TPin>
where
    TPin: InputPin<Error = TError> + OutputPin<Error = TError>,
{
    pub fn new(pin: TPin) -> OpenDrainPort<TPin> {
        OpenDrainPort { pin }
    }

    /// Gives back the wrapped pin.
    pub fn into_inner(self) -> TPin {
        self.pin
    }
}

impl<TPin, TError> GpioPort for OpenDrainPort<TPin>
where
    TPin: InputPin<Error = TError> + OutputPin<Error = TError>,
{
    type Error = TError;

    fn configure(&mut self, _pin: u8, direction: Direction) -> Result<(), TError> {
        match direction {
            Direction::Input => self.pin.set_high(),
            Direction::Output => Ok(()),
        }
    }

    fn read(&mut self, _pin: u8) -> Result<PinState, TError> {
        Ok(PinState::from(self.pin.is_high()?))
    }

    fn write(&mut self, _pin: u8, state: PinState) -> Result<(), TError> {
        self.pin.set_state(state)
    }
}
