//! Pixel color for the monochrome panel
//!
//! Each pixel is one bit in the [`FrameBuffer`](crate::FrameBuffer): a set
//! bit is black, a clear bit white.
//!
//! | Color | Bit | Fill byte |
//! |-------|-----|-----------|
//! | Black | 1   | 0xFF      |
//! | White | 0   | 0x00      |
//!
//! ## Example
//!
//! ```
//! use pdi_epd2in7::Color;
//!
//! assert_eq!(Color::Black.byte(), 0xFF);
//! assert_eq!(Color::from(false), Color::White);
//! ```

/// Colors supported by the panel
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    /// Black pixels
    Black,
    /// White pixels, the cleared state
    #[default]
    White,
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Color {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU1;
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::BinaryColor> for Color {
    fn from(color: embedded_graphics_core::pixelcolor::BinaryColor) -> Self {
        Self::from(color.is_on())
    }
}

impl From<bool> for Color {
    fn from(black: bool) -> Self {
        if black { Self::Black } else { Self::White }
    }
}

impl Color {
    /// Whether this color sets the pixel bit
    pub fn is_black(self) -> bool {
        self == Self::Black
    }

    /// Byte with all eight pixels in this color
    pub fn byte(self) -> u8 {
        match self {
            Self::Black => 0xFF,
            Self::White => 0x00,
        }
    }
}
