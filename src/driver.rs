//! Display session: one panel, one framebuffer, one device handle.
//!
//! [`Display`] owns the framebuffer and the bus protocol and enforces the
//! session lifecycle:
//!
//! ```text
//! Uninitialized ──new_*──▶ Configuring ──ok──▶ Ready ──deinit──▶ Closed
//!                              │
//!                              └──err──▶ (handle released, Err returned)
//! ```
//!
//! Every bus-facing call blocks until the transport returns. Nothing is
//! retried; the first failure is returned to the caller.

use crate::command::{DISPLAY_OFF, DISPLAY_ON, INVERT_DISPLAY, NORMAL_DISPLAY, SET_CONTRAST};
use crate::config::{BusConfig, BusPins};
use crate::error::OledError;
use crate::framebuffer::{Framebuffer, PAGES};
use crate::protocol::BusProtocol;
use crate::transport::{Borrowed, BusHost, OwnedBus, Ownership, Transport};

/// Lifecycle of a display session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No session exists yet, or the last construction attempt failed.
    Uninitialized,
    /// The power-on sequence is being sent.
    Configuring,
    /// Drawing and screen updates are allowed.
    Ready,
    /// Torn down; every operation fails with
    /// [`OledError::NotInitialized`].
    Closed,
}

/// Blocking driver for an SSD1306 128×64 OLED panel.
///
/// `T` is the device handle and `O` decides what teardown does with it:
/// [`Borrowed`] (the default) leaves the bus to its owner, [`OwnedBus`]
/// detaches the device and deletes the bus the session created.
///
/// # Lifecycle
///
/// 1. [`Display::new_borrowing()`] or [`Display::new_owning()`] — zeroes the
///    framebuffer and sends the power-on sequence.
/// 2. Draw with [`draw_text()`](Self::draw_text),
///    [`set_pixel()`](Self::set_pixel), or any `embedded-graphics` primitive
///    via [`framebuffer_mut()`](Self::framebuffer_mut).
/// 3. [`update_screen()`](Self::update_screen) — pushes the framebuffer.
/// 4. [`deinit()`](Self::deinit) — releases the device.
///
/// The session is not reentrant. Callers sharing one panel between tasks
/// must serialize access themselves, e.g. with
/// [`SharedDisplay`](crate::SharedDisplay).
///
/// # Example
///
/// ```no_run
/// use visionary_oled::{Display, I2cTransport};
///
/// # fn example(i2c: impl embedded_hal::i2c::I2c) {
/// let mut oled = Display::new_borrowing(I2cTransport::new(i2c, 0x3C)).unwrap();
/// oled.draw_text(0, 0, "Hello World").unwrap();
/// oled.clear_area(0, 2, 20, 1).unwrap();
/// oled.update_screen().unwrap();
/// oled.deinit().unwrap();
/// # }
/// ```
pub struct Display<T, O = Borrowed>
where
    T: Transport,
{
    /// `Some` while the session holds the device; `None` once closed.
    protocol: Option<BusProtocol<T>>,
    ownership: O,
    framebuffer: Framebuffer,
    state: SessionState,
}

// ── Construction ─────────────────────────────────────────────────────────

impl<T> Display<T, Borrowed>
where
    T: Transport,
{
    /// Start a session on a device attached by someone else.
    ///
    /// The session never creates or deletes the underlying bus; teardown
    /// only drops `device`. Pass `&mut device` to keep using it afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`OledError::BusTransactionFailed`] naming the first
    /// power-on byte the panel did not accept.
    pub fn new_borrowing(device: T) -> Result<Self, OledError<T::Error>> {
        Self::new_borrowing_with_config(device, &BusConfig::default())
    }

    /// [`new_borrowing`](Self::new_borrowing) with a custom transaction
    /// timeout.
    pub fn new_borrowing_with_config(
        device: T,
        config: &BusConfig,
    ) -> Result<Self, OledError<T::Error>> {
        Self::configure(device, Borrowed, config)
    }
}

impl<H> Display<H::Device, OwnedBus<H>>
where
    H: BusHost,
{
    /// Create a bus on `pins`, attach the panel at `0x3C`/400 kHz and start
    /// a session that owns both.
    ///
    /// Whatever fails, nothing stays allocated: a failed attach deletes the
    /// new bus, and a failed power-on sequence detaches the device and
    /// deletes the bus before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`OledError::BusTransactionFailed`] with `command: None` for
    /// bus creation or attach failures, or naming the failing power-on byte.
    pub fn new_owning(host: H, pins: BusPins) -> Result<Self, OledError<H::Error>> {
        Self::new_owning_with_config(host, pins, &BusConfig::default())
    }

    /// [`new_owning`](Self::new_owning) with a custom address, clock rate or
    /// timeout.
    pub fn new_owning_with_config(
        host: H,
        pins: BusPins,
        config: &BusConfig,
    ) -> Result<Self, OledError<H::Error>> {
        let (ownership, device) = OwnedBus::attach(host, pins, config).map_err(OledError::bus)?;
        Self::configure(device, ownership, config)
    }
}

impl<T, O> Display<T, O>
where
    T: Transport,
    O: Ownership<T>,
{
    /// Zero the framebuffer and run the power-on sequence, releasing the
    /// device through `ownership` if it fails.
    fn configure(device: T, ownership: O, config: &BusConfig) -> Result<Self, OledError<T::Error>> {
        let mut display = Self {
            protocol: Some(BusProtocol::new(device, config.timeout_ms)),
            ownership,
            framebuffer: Framebuffer::new(),
            state: SessionState::Configuring,
        };

        let result = display
            .protocol
            .as_mut()
            .ok_or(OledError::NotInitialized)
            .and_then(BusProtocol::initialize);

        if let Err(e) = result {
            display.state = SessionState::Uninitialized;
            if let Some(protocol) = display.protocol.take() {
                if display.ownership.release(protocol.into_transport()).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Releasing bus after failed init also failed");
                }
            }
            return Err(e);
        }

        display.state = SessionState::Ready;
        #[cfg(feature = "defmt")]
        defmt::info!("OLED initialised (owns bus: {})", display.ownership.owns_bus());
        Ok(display)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check whether drawing and updates are currently allowed.
    ///
    /// No I2C traffic is generated.
    pub fn is_initialized(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// `true` if teardown deletes the bus.
    pub fn owns_bus(&self) -> bool {
        self.ownership.owns_bus()
    }

    /// Read-only view of the framebuffer.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Mutable framebuffer for direct drawing, including `embedded-graphics`
    /// [`DrawTarget`] APIs.
    ///
    /// Returns `None` once the session is closed.
    ///
    /// [`DrawTarget`]: embedded_graphics::draw_target::DrawTarget
    pub fn framebuffer_mut(&mut self) -> Option<&mut Framebuffer> {
        if self.is_initialized() {
            Some(&mut self.framebuffer)
        } else {
            None
        }
    }

    fn ensure_ready(&self) -> Result<(), OledError<T::Error>> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(OledError::NotInitialized)
        }
    }

    fn protocol(&mut self) -> Result<&mut BusProtocol<T>, OledError<T::Error>> {
        self.ensure_ready()?;
        self.protocol.as_mut().ok_or(OledError::NotInitialized)
    }

    // ── Framebuffer operations (no bus traffic) ──────────────────────

    /// Light or darken one pixel. Off-panel coordinates are ignored.
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.framebuffer.set_pixel(x, y, on);
        Ok(())
    }

    pub fn get_pixel(&self, x: u8, y: u8) -> Result<bool, OledError<T::Error>> {
        self.ensure_ready()?;
        Ok(self.framebuffer.get_pixel(x, y))
    }

    /// Clear the in-memory framebuffer without touching the panel.
    pub fn clear_buffer(&mut self) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.framebuffer.clear_all();
        Ok(())
    }

    /// Zero a rectangle `width` columns wide and `height` pages tall.
    ///
    /// Only the framebuffer changes; call
    /// [`update_screen()`](Self::update_screen) to show it.
    ///
    /// # Errors
    ///
    /// [`OledError::InvalidArgument`] if the rectangle is empty or does not
    /// fit on the panel. The framebuffer is left untouched.
    pub fn clear_area(
        &mut self,
        x: u8,
        y_page: u8,
        width: u8,
        height: u8,
    ) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.framebuffer.clear_area(x, y_page, width, height)?;
        Ok(())
    }

    // ── Panel operations ─────────────────────────────────────────────

    /// Draw `text` at column `x` of `y_page`, then push the frame.
    ///
    /// Text wraps back to column `x` on the next page; anything below the
    /// last page is dropped without error. Format values first, e.g. with
    /// `write!` into a `heapless::String`.
    ///
    /// # Errors
    ///
    /// [`OledError::InvalidArgument`] if `y_page` is not a panel page, or
    /// any error from [`update_screen()`](Self::update_screen).
    pub fn draw_text(&mut self, x: u8, y_page: u8, text: &str) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        if usize::from(y_page) >= PAGES {
            #[cfg(feature = "defmt")]
            defmt::error!("Invalid text page {}", y_page);
            return Err(OledError::InvalidArgument);
        }
        self.framebuffer.draw_text(text, x, y_page);
        self.update_screen()
    }

    /// Darken the framebuffer and push it.
    pub fn clear_display(&mut self) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        self.framebuffer.clear_all();
        self.update_screen()
    }

    /// Transfer the whole framebuffer to the panel.
    ///
    /// Sends the full column and page window, then one 1025-byte data
    /// frame.
    pub fn update_screen(&mut self) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        let protocol = self.protocol.as_mut().ok_or(OledError::NotInitialized)?;
        protocol.write_frame(&self.framebuffer)
    }

    /// Set panel contrast (0 dimmest, 255 brightest).
    pub fn set_contrast(&mut self, level: u8) -> Result<(), OledError<T::Error>> {
        let protocol = self.protocol()?;
        protocol.send_command(SET_CONTRAST)?;
        protocol.send_command(level)
    }

    /// Swap lit and dark pixels in hardware. The framebuffer is unchanged.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), OledError<T::Error>> {
        let command = if inverted { INVERT_DISPLAY } else { NORMAL_DISPLAY };
        self.protocol()?.send_command(command)
    }

    /// Put the panel to sleep or wake it. Display RAM is retained.
    pub fn set_display_on(&mut self, on: bool) -> Result<(), OledError<T::Error>> {
        let command = if on { DISPLAY_ON } else { DISPLAY_OFF };
        self.protocol()?.send_command(command)
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// End the session and release the device.
    ///
    /// An owning session detaches the device and deletes its bus; a
    /// borrowing session only drops its handle. The session is closed even
    /// if releasing fails.
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`] if already closed, or the bus error
    /// raised while releasing an owned bus.
    pub fn deinit(&mut self) -> Result<(), OledError<T::Error>> {
        self.ensure_ready()?;
        let protocol = self.protocol.take().ok_or(OledError::NotInitialized)?;
        self.state = SessionState::Closed;
        #[cfg(feature = "defmt")]
        defmt::info!("OLED closed (releasing bus: {})", self.ownership.owns_bus());
        self.ownership
            .release(protocol.into_transport())
            .map_err(OledError::bus)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
