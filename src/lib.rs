#![no_std]

/// Driver for reading from a DHT11 sensor.
pub mod dht11;
/// Timing of level transitions on the data line.
pub mod edge;
pub mod error;
/// Decoding of the 40-bit payload.
pub mod frame;
/// The GPIO and clock interfaces the driver is built on, plus an adapter for `embedded-hal` pins.
pub mod gpio;
/// The request/response handshake that precedes every transmission.
pub mod handshake;
/// Cool-down between consecutive reads.
pub mod scheduler;

pub use dht11::{Dht11, Options, DEFAULT_OPTIONS};
pub use error::Error;
pub use frame::{Frame, Reading};
pub use gpio::{Clock, Direction, GpioPort, OpenDrainPort, DEFAULT_PIN};
