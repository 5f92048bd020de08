use core::fmt;

/// Number of bits in one DHT11 transmission: four data bytes and a checksum byte.
pub const PAYLOAD_BITS: usize = 40;

/// High pulses longer than this encode a `1`; anything up to and including it is a `0`.
///
/// A `0` is sent as a ~26-28us high pulse and a `1` as a ~70us high pulse.
pub const BIT_THRESHOLD_NS: u64 = 35_000;

/// Data read from the DHT11.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    pub humidity: u8,
    pub humidity_decimal: u8,
    pub temperature: u8,
    pub temperature_decimal: u8,
}

impl Reading {
    fn from_raw_bytes(bytes: [u8; 4]) -> Reading {
        Reading {
            humidity: bytes[0],
            humidity_decimal: bytes[1],
            temperature: bytes[2],
            temperature_decimal: bytes[3],
        }
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        self.humidity as f32 + (self.humidity_decimal as f32 * 0.1)
    }

    /// Temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 + (self.temperature_decimal as f32 * 0.1)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RH: {:.1}%, T: {:.1}\u{00B0}C",
            self.relative_humidity(),
            self.celsius()
        )
    }
}

/// A decoded 40-bit transmission.
///
/// A frame whose checksum does not match is never partially trusted: none of its data bytes
/// are exposed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    Valid(Reading),
    Invalid {
        /// Checksum computed from the four data bytes.
        expected: u8,
        /// Checksum byte that was received.
        actual: u8,
    },
}

impl Frame {
    /// Validates five received bytes: humidity, humidity decimal, temperature, temperature
    /// decimal and the checksum.
    pub fn from_bytes(bytes: [u8; 5]) -> Frame {
        let data = [bytes[0], bytes[1], bytes[2], bytes[3]];
        let expected = checksum(&data);
        if expected != bytes[4] {
            return Frame::Invalid {
                expected,
                actual: bytes[4],
            };
        }
        Frame::Valid(Reading::from_raw_bytes(data))
    }

    /// Validates a payload held in the low 40 bits of `payload`, first received bit highest.
    pub fn from_payload(payload: u64) -> Frame {
        let be = payload.to_be_bytes();
        Frame::from_bytes([be[3], be[4], be[5], be[6], be[7]])
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Frame::Valid(_))
    }
}

/// The modular byte-sum that the DHT11 sends as its fifth byte.
pub fn checksum(data: &[u8; 4]) -> u8 {
    data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Turns measured high-pulse widths into a [`Frame`].
///
/// Uses a single fixed threshold with no calibration or hysteresis.
#[derive(Clone, Copy, Debug)]
pub struct BitDecoder {
    threshold_ns: u64,
}

impl Default for BitDecoder {
    fn default() -> BitDecoder {
        BitDecoder::new(BIT_THRESHOLD_NS)
    }
}

impl BitDecoder {
    pub const fn new(threshold_ns: u64) -> BitDecoder {
        BitDecoder { threshold_ns }
    }

    /// Whether a high pulse of `high_ns` nanoseconds encodes a `1`.
    pub fn classify(&self, high_ns: u64) -> bool {
        high_ns > self.threshold_ns
    }

    /// Decodes 40 high-pulse widths, most significant bit first.
    pub fn decode(&self, high_widths: &[u64; PAYLOAD_BITS]) -> Frame {
        let payload = high_widths.iter().fold(0u64, |payload, width| {
            (payload << 1) | self.classify(*width) as u64
        });
        Frame::from_payload(payload)
    }
}
