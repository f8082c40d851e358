//! XBM image loading
//!
//! [`XbmReader`] parses the two `#define` lines for width and height, then
//! yields the hex bytes between `{` and `}` one at a time. It makes a single
//! forward pass and cannot be restarted.
//!
//! ```
//! use pdi_epd2in7::FrameBuffer;
//!
//! const ARROW: &str = "#define arrow_width 8
//! #define arrow_height 2
//! static unsigned char arrow_bits[] = {
//!    0x0f, 0xf0 };
//! ";
//!
//! let mut frame = FrameBuffer::new();
//! assert!(frame.load_xbm(ARROW, 16, 4).is_ok());
//! assert!(frame.pixel(16, 4));
//! assert!(frame.pixel(23, 5));
//! ```

use crate::error::DrawError;
use crate::framebuffer::FrameBuffer;

/// Lazy decoder for XBM text
#[derive(Clone, Debug)]
pub struct XbmReader<'a> {
    width: u32,
    height: u32,
    rest: &'a str,
    closed: bool,
    malformed: bool,
}

impl<'a> XbmReader<'a> {
    /// Read the header and position at the first data byte
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidBitmap` if either `#define` is missing or not a
    /// number, or there is no `{`.
    pub fn new(text: &'a str) -> Result<Self, DrawError> {
        let mut dims = [0u32; 2];
        let mut found = 0;
        let mut rest = text;
        while found < dims.len() {
            if rest.is_empty() {
                return Err(DrawError::InvalidBitmap);
            }
            let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
            if line.trim_start().starts_with("#define") {
                dims[found] = line
                    .split_whitespace()
                    .last()
                    .and_then(|value| value.parse().ok())
                    .ok_or(DrawError::InvalidBitmap)?;
                found += 1;
            }
            rest = tail;
        }

        let start = rest.find('{').ok_or(DrawError::InvalidBitmap)?;
        Ok(Self {
            width: dims[0],
            height: dims[1],
            rest: &rest[start + 1..],
            closed: false,
            malformed: false,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether a bad token or a missing `}` stopped the byte stream
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// Whether the closing `}` was reached
    pub fn is_complete(&self) -> bool {
        self.closed
    }
}

impl Iterator for XbmReader<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.closed || self.malformed {
            return None;
        }
        let trimmed = self
            .rest
            .trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if let Some(tail) = trimmed.strip_prefix('}') {
            self.rest = tail;
            self.closed = true;
            return None;
        }
        if trimmed.is_empty() {
            self.rest = trimmed;
            self.malformed = true;
            return None;
        }
        let end = trimmed
            .find(|c: char| c == ',' || c == '}' || c.is_whitespace())
            .unwrap_or(trimmed.len());
        let (token, tail) = trimmed.split_at(end);
        self.rest = tail;
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let value = u8::from_str_radix(digits, 16).ok();
        self.malformed = value.is_none();
        value
    }
}

impl FrameBuffer {
    /// Draw an XBM image with its top-left corner at `(x, y)`
    ///
    /// The image is clipped to the panel. Rows below the bottom edge are not
    /// read, so a truncated tail there goes unnoticed.
    ///
    /// # Errors
    ///
    /// `DrawError::InvalidBitmap` if the header is bad or the data is
    /// malformed or too short for the visible rows.
    pub fn load_xbm(&mut self, text: &str, x: i32, y: i32) -> Result<(), DrawError> {
        let mut reader = XbmReader::new(text)?;
        let (width, height) = (reader.width(), reader.height());
        let complete = self.load_bitmap(x, y, width, height, &mut reader);
        if !complete || reader.is_malformed() {
            return Err(DrawError::InvalidBitmap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const SMILE: &str = "#define smile_width 10
#define smile_height 3
static char smile_bits[] = {
   0xff, 0x03,
   0x01, 0x02,
   0xfe, 0x01};
";

    #[test]
    fn test_header_and_bytes() {
        let reader = XbmReader::new(SMILE).unwrap();
        assert_eq!((reader.width(), reader.height()), (10, 3));
        let bytes: Vec<u8> = reader.collect();
        assert_eq!(bytes, [0xFF, 0x03, 0x01, 0x02, 0xFE, 0x01]);
    }

    #[test]
    fn test_reader_reports_completion() {
        let mut reader = XbmReader::new(SMILE).unwrap();
        assert!(!reader.is_complete());
        assert_eq!(reader.by_ref().count(), 6);
        assert!(reader.is_complete());
        assert!(!reader.is_malformed());
    }

    #[test]
    fn test_missing_define() {
        let text = "#define w 8\nstatic char b[] = { 0x00 };";
        assert_eq!(XbmReader::new(text).err(), Some(DrawError::InvalidBitmap));
    }

    #[test]
    fn test_missing_brace() {
        let text = "#define w 8\n#define h 1\nstatic char b[];";
        assert_eq!(XbmReader::new(text).err(), Some(DrawError::InvalidBitmap));
    }

    #[test]
    fn test_bad_token() {
        let text = "#define w 8\n#define h 2\n{ 0x01, zz };";
        let mut reader = XbmReader::new(text).unwrap();
        assert_eq!(reader.next(), Some(0x01));
        assert_eq!(reader.next(), None);
        assert!(reader.is_malformed());
    }

    #[test]
    fn test_load_xbm() {
        let mut frame = FrameBuffer::new();
        frame.load_xbm(SMILE, 0, 0).unwrap();
        for x in 0..10 {
            assert!(frame.pixel(x, 0));
        }
        assert!(frame.pixel(0, 1));
        assert!(frame.pixel(9, 1));
        assert!(!frame.pixel(5, 1));
        assert!(!frame.pixel(0, 2));
        assert!(frame.pixel(8, 2));
    }

    #[test]
    fn test_load_xbm_short_data() {
        let text = "#define w 16\n#define h 2\n{ 0xff, 0xff, 0xff }";
        let mut frame = FrameBuffer::new();
        assert_eq!(frame.load_xbm(text, 0, 0), Err(DrawError::InvalidBitmap));
    }
}
