//! Bit-packed monochrome frame buffer
//!
//! One bit per pixel, 33 bytes per line, 176 lines. Pixel `(x, y)` lives in
//! bit `x & 7` of byte `(x >> 3) + y * 33`; a set bit is black. A zeroed
//! buffer is all white.
//!
//! Every write goes through clipping: coordinates outside the panel are
//! ignored, never indexed.
//!
//! ```
//! use pdi_epd2in7::FrameBuffer;
//!
//! let mut frame = FrameBuffer::new();
//! frame.set_pixel(10, 20, true);
//! assert!(frame.pixel(10, 20));
//!
//! // Off-panel writes are dropped
//! let before = frame.checksum();
//! frame.set_pixel(-1, 500, true);
//! assert_eq!(frame.checksum(), before);
//! ```

use crate::config::{BITS_PER_LINE, BUFFER_SIZE, BYTES_PER_LINE, LINES};

/// Panel width in pixels
pub const WIDTH: i32 = BITS_PER_LINE as i32;

/// Panel height in pixels
pub const HEIGHT: i32 = LINES as i32;

/// In-memory image for the 2.7 inch panel
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: [u8; BUFFER_SIZE],
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("checksum", &self.checksum())
            .finish()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Create an all-white frame buffer
    pub const fn new() -> Self {
        Self {
            data: [0; BUFFER_SIZE],
        }
    }

    /// Set every pixel white
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Set every pixel to one color
    pub fn fill(&mut self, black: bool) {
        self.data.fill(if black { 0xFF } else { 0x00 });
    }

    /// Set one pixel, ignoring coordinates outside the panel
    pub fn set_pixel(&mut self, x: i32, y: i32, black: bool) {
        let Some((index, mask)) = Self::locate(x, y) else {
            return;
        };
        if black {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Read one pixel; off-panel coordinates read as white
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        Self::locate(x, y).is_some_and(|(index, mask)| self.data[index] & mask != 0)
    }

    /// Raw image bytes in panel order
    pub fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.data
    }

    /// Mutable raw image bytes in panel order
    pub fn as_bytes_mut(&mut self) -> &mut [u8; BUFFER_SIZE] {
        &mut self.data
    }

    /// Bytes of one row, or `None` past the last line
    pub fn row(&self, line: usize) -> Option<&[u8]> {
        let start = line.checked_mul(BYTES_PER_LINE)?;
        self.data.get(start..start.checked_add(BYTES_PER_LINE)?)
    }

    /// Fletcher-16 over the whole image
    ///
    /// Cheap change detection for tests and for skipping redundant refreshes.
    pub fn checksum(&self) -> u16 {
        let (mut a, mut b) = (0u16, 0u16);
        for &byte in &self.data {
            a = (a + u16::from(byte)) % 255;
            b = (b + a) % 255;
        }
        (b << 8) | a
    }

    /// Blit a packed 1bpp bitmap with its top-left corner at `(x0, y0)`
    ///
    /// Rows are `ceil(width / 8)` bytes, least significant bit leftmost, set
    /// bits black. Pixels outside the panel are clipped, rows past the bottom
    /// edge are not consumed. Both colors are written: the bitmap replaces the
    /// rectangle it covers.
    ///
    /// Returns `false` if `bytes` ran out before the visible rows were drawn.
    pub fn load_bitmap<B>(&mut self, x0: i32, y0: i32, width: u32, height: u32, bytes: B) -> bool
    where
        B: IntoIterator<Item = u8>,
    {
        let mut bytes = bytes.into_iter();
        let row_bytes = width.div_ceil(8);

        for row in 0..height {
            let y = y0.saturating_add(row as i32);
            if y >= HEIGHT {
                break;
            }
            let mut bits_left = width;
            let mut x = x0;
            for _ in 0..row_bytes {
                let Some(value) = bytes.next() else {
                    return false;
                };
                let bits = bits_left.min(8);
                if y >= 0 {
                    self.put_bits(x, y, value, bits);
                }
                x = x.saturating_add(bits as i32);
                bits_left -= bits;
            }
        }
        true
    }

    /// Write a full glyph byte at `(x, y)`, straddling into the next byte when
    /// `x` is not byte aligned
    ///
    /// All eight bits are replaced. Bits that would land past the right edge
    /// are dropped.
    pub(crate) fn put_byte(&mut self, x: i32, y: i32, value: u8) {
        if !(0..HEIGHT).contains(&y) || !(0..WIDTH).contains(&x) {
            self.put_bits(x, y, value, 8);
            return;
        }
        let row = y as usize * BYTES_PER_LINE;
        let col = (x >> 3) as usize;
        let shift = (x & 7) as u32;
        let index = row + col;
        if shift == 0 {
            self.data[index] = value;
            return;
        }
        self.data[index] &= 0xFF >> (8 - shift);
        self.data[index] |= value << shift;
        if col + 1 < BYTES_PER_LINE {
            self.data[index + 1] &= 0xFF << shift;
            self.data[index + 1] |= value >> (8 - shift);
        }
    }

    /// Write the low `bits` bits of `value` starting at `(x, y)`
    fn put_bits(&mut self, x: i32, y: i32, value: u8, bits: u32) {
        if bits == 8 && x >= 0 && x & 7 == 0 && x <= WIDTH - 8 && (0..HEIGHT).contains(&y) {
            self.data[(x >> 3) as usize + y as usize * BYTES_PER_LINE] = value;
            return;
        }
        for bit in 0..bits {
            self.set_pixel(x.saturating_add(bit as i32), y, value & (1 << bit) != 0);
        }
    }

    fn locate(x: i32, y: i32) -> Option<(usize, u8)> {
        if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
            return None;
        }
        let index = (x >> 3) as usize + y as usize * BYTES_PER_LINE;
        Some((index, 1 << (x & 7)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_white() {
        let frame = FrameBuffer::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                assert!(!frame.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_bit_layout() {
        let mut frame = FrameBuffer::new();
        frame.set_pixel(9, 2, true);
        assert_eq!(frame.as_bytes()[1 + 2 * 33], 0b0000_0010);
        frame.set_pixel(9, 2, false);
        assert_eq!(frame.as_bytes()[1 + 2 * 33], 0);
    }

    #[test]
    fn test_clipping_leaves_buffer_untouched() {
        let mut frame = FrameBuffer::new();
        frame.set_pixel(5, 5, true);
        let before = frame.checksum();
        for (x, y) in [(-1, 0), (0, -1), (264, 0), (0, 176), (i32::MIN, i32::MAX)] {
            frame.set_pixel(x, y, true);
            frame.set_pixel(x, y, false);
        }
        assert_eq!(frame.checksum(), before);
    }

    #[test]
    fn test_clear_after_fill() {
        let mut frame = FrameBuffer::new();
        frame.fill(true);
        assert!(frame.pixel(263, 175));
        frame.clear();
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_checksum_detects_change() {
        let mut frame = FrameBuffer::new();
        let blank = frame.checksum();
        frame.set_pixel(100, 100, true);
        assert_ne!(frame.checksum(), blank);
    }

    #[test]
    fn test_put_byte_straddles() {
        let mut frame = FrameBuffer::new();
        frame.fill(true);
        frame.put_byte(4, 0, 0x0F);
        // low nibble lands in bits 4..8 of byte 0, high nibble clears bits 0..4 of byte 1
        assert_eq!(frame.as_bytes()[0], 0xFF);
        assert_eq!(frame.as_bytes()[1], 0xF0);
    }

    #[test]
    fn test_put_byte_drops_bits_past_right_edge() {
        let mut frame = FrameBuffer::new();
        frame.put_byte(260, 0, 0xFF);
        assert_eq!(frame.as_bytes()[32], 0xF0);
        // first byte of the next line is untouched
        assert_eq!(frame.as_bytes()[33], 0x00);
    }

    #[test]
    fn test_load_bitmap_unaligned() {
        let mut frame = FrameBuffer::new();
        let complete = frame.load_bitmap(3, 1, 10, 2, [0xFF, 0x03, 0x01, 0x02]);
        assert!(complete);
        for x in 3..13 {
            assert!(frame.pixel(x, 1), "x={x}");
        }
        assert!(!frame.pixel(2, 1));
        assert!(!frame.pixel(13, 1));
        assert!(frame.pixel(3, 2));
        assert!(!frame.pixel(4, 2));
        assert!(frame.pixel(12, 2));
    }

    #[test]
    fn test_load_bitmap_clips_and_stops_at_bottom() {
        let mut frame = FrameBuffer::new();
        let data = [0xFFu8; 8];
        // only two of four rows are on the panel; the rest is not consumed
        let mut iter = data.iter().copied();
        assert!(frame.load_bitmap(260, 174, 16, 4, &mut iter));
        assert_eq!(iter.count(), 4);
        assert!(frame.pixel(263, 175));
    }

    #[test]
    fn test_load_bitmap_reports_short_data() {
        let mut frame = FrameBuffer::new();
        assert!(!frame.load_bitmap(0, 0, 16, 2, [0xFF, 0xFF, 0xFF]));
    }

    #[test]
    fn test_row_access() {
        let mut frame = FrameBuffer::new();
        frame.set_pixel(0, 175, true);
        assert_eq!(frame.row(175).unwrap()[0], 1);
        assert!(frame.row(176).is_none());
        assert!(frame.row(usize::MAX).is_none());
    }

    #[test]
    fn test_row_accessor_and_line_drawing_coexist() {
        let mut frame = FrameBuffer::new();
        frame.line(0, 3, 7, 3, 1, true).unwrap();
        assert_eq!(frame.row(3).unwrap()[0], 0xFF);
    }
}
