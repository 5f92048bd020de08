use crate::handshake::Phase;
use core::fmt;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from the GPIO port.
    Wrapped(TIoError),
    /// Invalid argument was provided.
    InvalidArgument,
    /// The line did not change level in time.
    Timeout(Phase),
    /// The line changed level, but outside the window allowed for this phase.
    TimingViolation { phase: Phase, duration_ns: u64 },
    /// All 40 bits arrived, but the checksum byte does not match the data.
    ChecksumMismatch { expected: u8, actual: u8 },
}

impl<TIoError> Error<TIoError> {
    /// Whether another attempt has a reasonable chance of succeeding.
    ///
    /// Timeouts usually mean the sensor is missing or unpowered, so they are not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::TimingViolation { .. } | Error::ChecksumMismatch { .. }
        )
    }
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

impl<TIoError> fmt::Display for Error<TIoError>
where
    TIoError: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Wrapped(err) => write!(f, "GPIO error: {:?}", err),
            Error::InvalidArgument => write!(f, "invalid argument"),
            Error::Timeout(phase) => write!(f, "timed out while {}", phase),
            Error::TimingViolation { phase, duration_ns } => write!(
                f,
                "unexpected {}ns pulse while {}",
                duration_ns, phase
            ),
            Error::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (expected {:#04x}, got {:#04x})",
                expected, actual
            ),
        }
    }
}
