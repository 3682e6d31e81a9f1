//! Bus configuration.
//!
//! [`BusConfig::default()`] reproduces the standard wiring of a 0.96"
//! SSD1306 module: address `0x3C`, 400 kHz fast-mode I2C and a 100 ms
//! per-transaction timeout.

/// Fixed 7-bit I2C address of the panel.
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Bus clock used when the session creates its own bus.
pub const DEFAULT_CLOCK_HZ: u32 = 400_000;

/// Upper bound for a single bus transaction.
pub const DEFAULT_TIMEOUT_MS: u32 = 100;

/// Parameters for attaching to and talking to the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// 7-bit device address. Default: `0x3C`.
    pub address: u8,
    /// SCL frequency in Hz for an owned bus. Default: 400 kHz.
    pub clock_hz: u32,
    /// Timeout handed to the transport for every transaction. Default: 100 ms.
    pub timeout_ms: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            clock_hz: DEFAULT_CLOCK_HZ,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// GPIO assignment for a bus the session creates itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusPins {
    /// Clock line. Default: GPIO 8.
    pub scl: u8,
    /// Data line. Default: GPIO 9.
    pub sda: u8,
}

impl BusPins {
    pub const fn new(scl: u8, sda: u8) -> Self {
        Self { scl, sda }
    }
}

impl Default for BusPins {
    fn default() -> Self {
        Self::new(8, 9)
    }
}
