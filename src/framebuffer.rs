//! In-memory mirror of the panel.
//!
//! The buffer uses the SSD1306 page layout: the panel is split into
//! [`PAGES`] horizontal bands of 8 rows, and byte `x + page * WIDTH` holds
//! the 8 vertical pixels of column `x` within that band. Bit `b` of the byte
//! is pixel `(x, page * 8 + b)`.
//!
//! ```text
//!            col 0   col 1        col 127
//!  page 0  [ byte 0 | byte 1 | ... | byte 127 ]   rows 0..8
//!  page 1  [ 128    | 129    | ... | 255      ]   rows 8..16
//!   ...
//!  page 7  [ 896    | 897    | ... | 1023     ]   rows 56..64
//! ```
//!
//! Pixel and glyph writes clamp: anything landing outside the panel is
//! dropped. [`Framebuffer::clear_area`] is strict and rejects rectangles
//! that do not fit.

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::error::AreaOutOfBounds;
use crate::font::{glyph, GLYPH_SPACING, GLYPH_WIDTH};

/// Panel width in pixels.
pub const WIDTH: usize = 128;

/// Panel height in pixels.
pub const HEIGHT: usize = 64;

/// Number of 8-row pages.
pub const PAGES: usize = HEIGHT / 8;

/// Size of the framebuffer in bytes.
pub const BUFFER_SIZE: usize = WIDTH * PAGES;

/// One bit per pixel, byte-packed by page.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    buffer: [u8; BUFFER_SIZE],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let lit = self.buffer.iter().map(|b| b.count_ones()).sum::<u32>();
        f.debug_struct("Framebuffer").field("lit_pixels", &lit).finish()
    }
}

impl Framebuffer {
    /// An all-dark framebuffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
        }
    }

    /// Raw bytes in transmission order.
    pub fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    #[inline]
    fn index(x: usize, page: usize) -> usize {
        x + page * WIDTH
    }

    /// Light or darken pixel `(x, y)`.
    ///
    /// Coordinates outside the panel are ignored.
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) {
        let (x, y) = (usize::from(x), usize::from(y));
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let mask = 1u8 << (y % 8);
        let byte = &mut self.buffer[Self::index(x, y / 8)];
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Read pixel `(x, y)`. Coordinates outside the panel read as dark.
    pub fn get_pixel(&self, x: u8, y: u8) -> bool {
        let (x, y) = (usize::from(x), usize::from(y));
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.buffer[Self::index(x, y / 8)] & (1 << (y % 8)) != 0
    }

    /// Draw one glyph with its left edge at column `x_col` in `y_page`.
    ///
    /// Glyph columns replace the existing bytes (no OR-compositing), so any
    /// pixels already in those columns of the page are erased. Columns past
    /// the right edge are dropped. A page outside the panel draws nothing.
    pub fn draw_char(&mut self, c: char, x_col: u8, y_page: u8) {
        self.blit_glyph(c, usize::from(x_col), usize::from(y_page));
    }

    fn blit_glyph(&mut self, c: char, x_col: usize, y_page: usize) {
        if y_page >= PAGES {
            #[cfg(feature = "defmt")]
            defmt::warn!("draw_char: page {} outside panel", y_page);
            return;
        }
        for (i, &column) in glyph(c).iter().enumerate() {
            let x = x_col + i;
            if x >= WIDTH {
                continue;
            }
            self.buffer[Self::index(x, y_page)] = column;
        }
    }

    /// Lay out `text` starting at column `x` in `y_page`.
    ///
    /// Each glyph advances the cursor by 5 columns plus 1 column of spacing.
    /// Before each glyph, if `cursor + 5 >= WIDTH` the cursor returns to `x`
    /// on the next page. Text that would continue below the last page is
    /// silently dropped.
    ///
    /// Characters outside printable ASCII are drawn as `?`, one glyph per
    /// `char`.
    ///
    /// Returns the number of glyphs drawn.
    pub fn draw_text(&mut self, text: &str, x: u8, y_page: u8) -> usize {
        let start_x = usize::from(x);
        let mut cursor_x = start_x;
        let mut page = usize::from(y_page);
        if page >= PAGES {
            return 0;
        }

        let mut drawn = 0;
        for c in text.chars() {
            if cursor_x + GLYPH_WIDTH >= WIDTH {
                cursor_x = start_x;
                page += 1;
                if page >= PAGES {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Text overflow, {} glyphs dropped", text.chars().count() - drawn);
                    break;
                }
            }
            self.blit_glyph(c, cursor_x, page);
            cursor_x += GLYPH_WIDTH + GLYPH_SPACING;
            drawn += 1;
        }
        drawn
    }

    /// Zero a rectangle `width` columns wide and `height` pages tall.
    ///
    /// # Errors
    ///
    /// Returns [`AreaOutOfBounds`] without touching the buffer if either
    /// dimension is zero or the rectangle extends past the panel.
    pub fn clear_area(
        &mut self,
        x: u8,
        y_page: u8,
        width: u8,
        height: u8,
    ) -> Result<(), AreaOutOfBounds> {
        let (x, y_page) = (usize::from(x), usize::from(y_page));
        let (width, height) = (usize::from(width), usize::from(height));
        if width == 0 || height == 0 || x + width > WIDTH || y_page + height > PAGES {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Invalid clear area: x={} page={} w={} h={}",
                x,
                y_page,
                width,
                height
            );
            return Err(AreaOutOfBounds);
        }

        for page in y_page..y_page + height {
            let row = Self::index(x, page);
            self.buffer[row..row + width].fill(0);
        }
        Ok(())
    }

    /// Darken every pixel.
    pub fn clear_all(&mut self) {
        self.buffer.fill(0);
    }
}

// ── embedded-graphics ────────────────────────────────────────────────────

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Negative or huge coordinates fail the conversion and are dropped.
            if let (Ok(x), Ok(y)) = (u8::try_from(point.x), u8::try_from(point.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(if color.is_on() { 0xFF } else { 0x00 });
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
