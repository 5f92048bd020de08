use super::concurrent;
use embedded_hal::delay::DelayNs;
use std::future::{ready, Ready};
use std::time::Duration;

/// How far virtual time moves on every clock read.
pub const TICK_NS: u64 = 250;

pub fn now_ns(name: &str) -> u64 {
    concurrent::get_named_value(name)
}

/// A monotonic clock where every read takes one tick.
pub fn clock(name: &'static str) -> impl Fn() -> Duration {
    move || Duration::from_nanos(concurrent::add_to_named_value(name, TICK_NS))
}

/// An async delay that completes immediately after moving virtual time forward.
pub fn delay_fn(name: &'static str) -> impl Fn(Duration) -> Ready<()> {
    move |duration| {
        concurrent::add_to_named_value(name, duration.as_nanos() as u64);
        ready(())
    }
}

/// A blocking delay that moves virtual time forward.
#[derive(Debug)]
pub struct Delay {
    name: &'static str,
}

impl Delay {
    pub fn new(name: &'static str) -> Delay {
        Delay { name }
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        concurrent::add_to_named_value(self.name, ns as u64);
    }
}
