//! Error types for the OLED display driver.

use core::fmt;

/// Errors that can occur during OLED display operations.
///
/// Generic over `E`, the error type reported by the bus transport. For the
/// embedded-hal adapter this is the HAL's I2C error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OledError<E> {
    /// An operation was attempted on a session that never finished
    /// initialisation or has already been torn down.
    NotInitialized,
    /// Geometry passed to [`clear_area`](crate::Display::clear_area) or a
    /// text page is outside the panel.
    InvalidArgument,
    /// The outgoing data frame could not be assembled (payload larger than
    /// the frame buffer capacity).
    OutOfMemory,
    /// The transport reported a failure.
    BusTransactionFailed {
        /// The command or argument byte being sent, `None` for data frames
        /// and bus management calls.
        command: Option<u8>,
        /// Underlying transport error.
        error: E,
    },
}

impl<E> OledError<E> {
    /// Wrap a transport error raised while sending a command frame.
    pub(crate) fn command(command: u8, error: E) -> Self {
        OledError::BusTransactionFailed {
            command: Some(command),
            error,
        }
    }

    /// Wrap a transport error that is not tied to a single command byte.
    pub(crate) fn bus(error: E) -> Self {
        OledError::BusTransactionFailed {
            command: None,
            error,
        }
    }

    /// The failing command byte, if this error came from a command frame.
    pub fn failed_command(&self) -> Option<u8> {
        match self {
            OledError::BusTransactionFailed { command, .. } => *command,
            _ => None,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for OledError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OledError::NotInitialized => write!(f, "Display not initialized"),
            OledError::InvalidArgument => write!(f, "Invalid argument"),
            OledError::OutOfMemory => write!(f, "Data frame too large"),
            OledError::BusTransactionFailed {
                command: Some(c),
                error,
            } => write!(f, "Bus error on command 0x{:02X}: {:?}", c, error),
            OledError::BusTransactionFailed {
                command: None,
                error,
            } => write!(f, "Bus error: {:?}", error),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for OledError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::NotInitialized => defmt::write!(f, "Not initialized"),
            OledError::InvalidArgument => defmt::write!(f, "Invalid argument"),
            OledError::OutOfMemory => defmt::write!(f, "Data frame too large"),
            OledError::BusTransactionFailed {
                command: Some(c),
                error,
            } => defmt::write!(f, "Bus error on command {=u8:#x}: {}", c, error),
            OledError::BusTransactionFailed {
                command: None,
                error,
            } => defmt::write!(f, "Bus error: {}", error),
        }
    }
}

/// A rectangle passed to [`Framebuffer::clear_area`] does not fit the panel
/// or has a zero dimension.
///
/// [`Framebuffer::clear_area`]: crate::Framebuffer::clear_area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AreaOutOfBounds;

impl<E> From<AreaOutOfBounds> for OledError<E> {
    fn from(_: AreaOutOfBounds) -> Self {
        OledError::InvalidArgument
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_command_only_for_command_frames() {
        let e: OledError<u8> = OledError::command(0xAE, 7);
        assert_eq!(e.failed_command(), Some(0xAE));
        assert_eq!(OledError::bus(7u8).failed_command(), None);
        assert_eq!(OledError::<u8>::InvalidArgument.failed_command(), None);
    }

    #[test]
    fn display_names_the_command_byte() {
        let e: OledError<&str> = OledError::command(0x8D, "nack");
        assert_eq!(format!("{}", e), "Bus error on command 0x8D: \"nack\"");
    }

    #[test]
    fn area_error_maps_to_invalid_argument() {
        let e: OledError<()> = AreaOutOfBounds.into();
        assert_eq!(e, OledError::InvalidArgument);
    }
}
