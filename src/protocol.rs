//! Low-level SSD1306 bus protocol.
//!
//! Frames every command byte as `[CONTROL_COMMAND, byte]` and pixel data as
//! one `[CONTROL_DATA, ...]` transaction, and sequences the power-on and
//! frame-push command streams.
//!
//! This module is crate-private — consumers interact with
//! [`Display`](crate::Display) instead.

use heapless::Vec;

use crate::command::{CommandStep, CONTROL_COMMAND, CONTROL_DATA, FULL_WINDOW, INIT_SEQUENCE};
use crate::error::OledError;
use crate::framebuffer::{Framebuffer, BUFFER_SIZE};
use crate::transport::Transport;

/// Largest data frame: control byte plus one full framebuffer.
pub(crate) const DATA_FRAME_CAPACITY: usize = BUFFER_SIZE + 1;

/// Owns the device handle and the per-transaction timeout.
pub(crate) struct BusProtocol<T> {
    transport: T,
    timeout_ms: u32,
}

impl<T> BusProtocol<T>
where
    T: Transport,
{
    pub fn new(transport: T, timeout_ms: u32) -> Self {
        Self {
            transport,
            timeout_ms,
        }
    }

    /// Hand the device back for release.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // -----------------------------------------------------------------------
    // Frame primitives
    // -----------------------------------------------------------------------

    /// Send one command (or command argument) byte.
    pub fn send_command(&mut self, command: u8) -> Result<(), OledError<T::Error>> {
        self.transport
            .transmit(&[CONTROL_COMMAND, command], self.timeout_ms)
            .map_err(|e| OledError::command(command, e))
    }

    /// Send `data` to display RAM in a single transaction.
    ///
    /// An empty payload sends nothing.
    pub fn send_data(&mut self, data: &[u8]) -> Result<(), OledError<T::Error>> {
        if data.is_empty() {
            return Ok(());
        }

        let mut frame: Vec<u8, DATA_FRAME_CAPACITY> = Vec::new();
        frame.push(CONTROL_DATA).map_err(|_| OledError::OutOfMemory)?;
        frame.extend_from_slice(data).map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::error!("Data frame of {} bytes exceeds capacity", data.len());
            OledError::OutOfMemory
        })?;

        self.transport
            .transmit(&frame, self.timeout_ms)
            .map_err(OledError::bus)
    }

    // -----------------------------------------------------------------------
    // Sequences
    // -----------------------------------------------------------------------

    /// Send `steps` in order, stopping at the first failed byte.
    pub fn run(&mut self, steps: &[CommandStep]) -> Result<(), OledError<T::Error>> {
        for step in steps {
            match *step {
                CommandStep::Cmd(cmd) => self.send_command(cmd)?,
                CommandStep::CmdArg(cmd, arg) => {
                    self.send_command(cmd)?;
                    self.send_command(arg)?;
                }
                CommandStep::CmdRange(cmd, start, end) => {
                    self.send_command(cmd)?;
                    self.send_command(start)?;
                    self.send_command(end)?;
                }
            }
        }
        Ok(())
    }

    /// Run the power-on sequence.
    pub fn initialize(&mut self) -> Result<(), OledError<T::Error>> {
        if let Err(e) = self.run(INIT_SEQUENCE) {
            #[cfg(feature = "defmt")]
            if let Some(cmd) = e.failed_command() {
                defmt::error!("Failed to send init command {=u8:#x}", cmd);
            }
            return Err(e);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Panel configured");
        Ok(())
    }

    /// Program the full address window, then push the whole framebuffer.
    ///
    /// A failure after the window commands leaves the panel's write pointer
    /// undefined; the next successful call reprograms it.
    pub fn write_frame(&mut self, framebuffer: &Framebuffer) -> Result<(), OledError<T::Error>> {
        self.run(FULL_WINDOW)?;
        let sent = self.send_data(framebuffer.as_bytes());
        #[cfg(feature = "defmt")]
        if sent.is_err() {
            defmt::error!("Failed to send display buffer");
        }
        sent
    }
}
