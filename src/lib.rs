//! Blocking page-mode driver for the SSD1306 (128×64) OLED over I2C.
//!
//! This crate provides [`Display`], a session that keeps a 1 KiB page-mode
//! [`Framebuffer`] in RAM, renders 5×8 ASCII text into it and pushes the
//! whole frame to the panel on demand. The panel sits behind a
//! [`Transport`]: either a device handle the caller already attached
//! (borrowing) or one the session attaches to a bus it creates itself
//! through a [`BusHost`] (owning).
//!
//! # Quick Start
//!
//! ```no_run
//! use visionary_oled::{Display, I2cTransport};
//!
//! # use embedded_hal::i2c::I2c;
//! # use visionary_oled::OledError;
//! # fn example<I2C: I2c>(i2c: I2C) -> Result<(), OledError<I2C::Error>> {
//! let mut oled = Display::new_borrowing(I2cTransport::new(i2c, 0x3C))?;
//!
//! oled.draw_text(0, 0, "Hello World")?; // renders and pushes
//! oled.clear_area(0, 2, 20, 1)?;        // buffer only
//! oled.update_screen()?;
//!
//! oled.deinit()?;
//! # Ok(())
//! # }
//! ```
//!
//! The framebuffer is also an `embedded-graphics` [`DrawTarget`], reachable
//! through [`Display::framebuffer_mut()`].
//!
//! # Crate Features
//!
//! - **`global`** *(default)* — [`SharedDisplay`], a critical-section
//!   protected slot for one process-wide session.
//! - **`defmt`** — structured logging via [`defmt`].
//!
//! [`DrawTarget`]: embedded_graphics::draw_target::DrawTarget
//! [`defmt`]: https://docs.rs/defmt

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod font;
pub mod framebuffer;
#[cfg(feature = "global")]
pub mod global;
#[cfg(test)]
mod mocks;
mod protocol;
pub mod transport;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use config::{BusConfig, BusPins};
pub use driver::{Display, SessionState};
pub use error::{AreaOutOfBounds, OledError};
pub use framebuffer::{Framebuffer, BUFFER_SIZE, HEIGHT, PAGES, WIDTH};
#[cfg(feature = "global")]
pub use global::SharedDisplay;
pub use transport::{Borrowed, BusHost, I2cTransport, OwnedBus, Ownership, Transport};
