//! SSD1306 command bytes, bus control bytes and the power-on sequence.
//!
//! Every command and every command argument travels in its own two-byte
//! command frame: `[CONTROL_COMMAND, byte]`. Pixel data travels in a single
//! data frame led by [`CONTROL_DATA`].

use crate::framebuffer::{HEIGHT, PAGES, WIDTH};

// ---------------------------------------------------------------------------
// Control bytes
// ---------------------------------------------------------------------------

/// Control byte announcing that the next byte is a command.
pub const CONTROL_COMMAND: u8 = 0x00;

/// Control byte announcing that all following bytes are display RAM data.
pub const CONTROL_DATA: u8 = 0x40;

// ---------------------------------------------------------------------------
// Fundamental commands
// ---------------------------------------------------------------------------

/// Set contrast; followed by one level byte.
pub const SET_CONTRAST: u8 = 0x81;
/// Resume displaying RAM content.
pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
/// A set RAM bit lights its pixel.
pub const NORMAL_DISPLAY: u8 = 0xA6;
/// A set RAM bit darkens its pixel.
pub const INVERT_DISPLAY: u8 = 0xA7;
/// Sleep mode; RAM is retained.
pub const DISPLAY_OFF: u8 = 0xAE;
/// Wake from sleep.
pub const DISPLAY_ON: u8 = 0xAF;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Memory addressing mode; followed by one mode byte.
pub const MEMORY_MODE: u8 = 0x20;
/// Column window; followed by start and end column.
pub const COLUMN_ADDR: u8 = 0x21;
/// Page window; followed by start and end page.
pub const PAGE_ADDR: u8 = 0x22;

/// Argument for [`MEMORY_MODE`] selecting page addressing.
pub const PAGE_ADDRESSING: u8 = 0x00;

// ---------------------------------------------------------------------------
// Hardware configuration
// ---------------------------------------------------------------------------

/// OR'd with the start line (0–63).
pub const SET_START_LINE: u8 = 0x40;
/// OR'd with 1 to map column 127 to SEG0.
pub const SEG_REMAP: u8 = 0xA0;
/// Multiplex ratio; followed by the row count minus one.
pub const SET_MULTIPLEX: u8 = 0xA8;
/// Scan COM outputs from COM[N-1] down to COM0 (vertical flip).
pub const COM_SCAN_DEC: u8 = 0xC8;
/// Vertical shift; followed by the offset in rows.
pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
/// COM pin hardware layout; followed by one configuration byte.
pub const SET_COM_PINS: u8 = 0xDA;

// ---------------------------------------------------------------------------
// Timing and driving
// ---------------------------------------------------------------------------

/// Oscillator frequency (high nibble) and clock divide ratio (low nibble).
pub const SET_DISPLAY_CLOCK_DIV: u8 = 0xD5;
/// Pre-charge period; followed by phase 1 and phase 2 lengths in one byte.
pub const SET_PRECHARGE: u8 = 0xD9;
/// VCOMH deselect level; followed by one level byte.
pub const SET_VCOM_DETECT: u8 = 0xDB;
/// Internal charge pump; followed by enable (`0x14`) or disable (`0x10`).
pub const CHARGE_PUMP: u8 = 0x8D;
/// Stop any running hardware scroll.
pub const DEACTIVATE_SCROLL: u8 = 0x2E;

/// Contrast programmed during initialisation.
pub const DEFAULT_CONTRAST: u8 = 0xCF;

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// One step of a command sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStep {
    /// A bare command byte.
    Cmd(u8),
    /// A command followed by one argument byte.
    CmdArg(u8, u8),
    /// A command followed by a start and an end argument.
    CmdRange(u8, u8, u8),
}

/// Power-on sequence bringing the panel into page addressing mode with the
/// charge pump enabled and the display lit.
pub const INIT_SEQUENCE: &[CommandStep] = &[
    CommandStep::Cmd(DISPLAY_OFF),
    CommandStep::CmdArg(SET_DISPLAY_CLOCK_DIV, 0x80),
    CommandStep::CmdArg(SET_MULTIPLEX, (HEIGHT - 1) as u8),
    CommandStep::CmdArg(SET_DISPLAY_OFFSET, 0x00),
    CommandStep::Cmd(SET_START_LINE), // line 0
    // 0x14 enables the internal charge pump (no external VCC)
    CommandStep::CmdArg(CHARGE_PUMP, 0x14),
    CommandStep::CmdArg(MEMORY_MODE, PAGE_ADDRESSING),
    CommandStep::Cmd(SEG_REMAP | 0x01),
    CommandStep::Cmd(COM_SCAN_DEC),
    // alternative COM pin layout, required for 64-row panels
    CommandStep::CmdArg(SET_COM_PINS, 0x12),
    CommandStep::CmdArg(SET_CONTRAST, DEFAULT_CONTRAST),
    CommandStep::CmdArg(SET_PRECHARGE, 0xF1),
    CommandStep::CmdArg(SET_VCOM_DETECT, 0x40),
    CommandStep::Cmd(DISPLAY_ALL_ON_RESUME),
    CommandStep::Cmd(NORMAL_DISPLAY),
    CommandStep::Cmd(DEACTIVATE_SCROLL),
    CommandStep::Cmd(DISPLAY_ON),
];

/// Rightmost column address.
pub const LAST_COLUMN: u8 = (WIDTH - 1) as u8;
/// Bottom page address.
pub const LAST_PAGE: u8 = (PAGES - 1) as u8;

/// Address window covering the whole panel, sent before every frame.
pub const FULL_WINDOW: &[CommandStep] = &[
    CommandStep::CmdRange(COLUMN_ADDR, 0, LAST_COLUMN),
    CommandStep::CmdRange(PAGE_ADDR, 0, LAST_PAGE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sequence_starts_off_and_ends_on() {
        assert_eq!(INIT_SEQUENCE.first(), Some(&CommandStep::Cmd(DISPLAY_OFF)));
        assert_eq!(INIT_SEQUENCE.last(), Some(&CommandStep::Cmd(DISPLAY_ON)));
    }

    #[test]
    fn init_sequence_frame_count() {
        let frames: usize = INIT_SEQUENCE
            .iter()
            .map(|step| match step {
                CommandStep::Cmd(_) => 1,
                CommandStep::CmdArg(..) => 2,
                CommandStep::CmdRange(..) => 3,
            })
            .sum();
        assert_eq!(frames, 26);
    }

    #[test]
    fn multiplex_matches_panel_height() {
        assert!(INIT_SEQUENCE.contains(&CommandStep::CmdArg(SET_MULTIPLEX, 63)));
    }

    #[test]
    fn window_bounds_follow_geometry() {
        assert_eq!(LAST_COLUMN, 127);
        assert_eq!(LAST_PAGE, 7);
        assert_eq!(FULL_WINDOW[0], CommandStep::CmdRange(0x21, 0, 127));
        assert_eq!(FULL_WINDOW[1], CommandStep::CmdRange(0x22, 0, 7));
    }
}
