//! Bitmap fonts
//!
//! Two sources implement the [`Glyph`] capability:
//!
//! - [`FileFont`] reads glyph records from a [`FontStorage`], typically a
//!   file on external flash. The header is validated when the font is opened.
//! - [`MemoryFont`] decodes records from a byte slice compiled into the
//!   firmware.
//!
//! [`Font`] selects one of the two once, at open time.
//!
//! ## File format
//!
//! ```text
//! 0x42 0xE7 width height   header
//! [advance] [rows]         one record per code 32..=126
//! ```
//!
//! Each record is `1 + ceil(width / 8) * height` bytes: the advance width,
//! then `height` rows of `ceil(width / 8)` bytes with the least significant
//! bit leftmost.

use core::convert::Infallible;
use core::fmt::Debug;

use crate::error::FontError;

/// Font file signature
pub const FONT_MAGIC: [u8; 2] = [0x42, 0xE7];

/// Font file header length
pub const FONT_HEADER_LEN: u32 = 4;

/// First character code with a glyph record
pub const FIRST_CHAR: u8 = 32;

/// Last character code with a glyph record
pub const LAST_CHAR: u8 = 126;

/// Number of glyph records in a font
pub const GLYPH_COUNT: usize = (LAST_CHAR - FIRST_CHAR + 1) as usize;

/// Largest glyph bitmap a [`FileFont`] can hold, in bytes
pub const MAX_GLYPH_BYTES: usize = 512;

/// Byte-range reads from font storage
pub trait FontStorage {
    /// Storage error type
    type Error: Debug;

    /// Fill `buf` from `offset`
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// Read past the end of an in-memory font file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfRange;

impl FontStorage for &[u8] {
    type Error = OutOfRange;

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let bytes = start
            .checked_add(buf.len())
            .and_then(|end| self.get(start..end))
            .ok_or(OutOfRange)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }
}

/// Bit order of a glyph bitmap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Rows of `ceil(width / 8)` bytes, least significant bit leftmost
    #[default]
    Horizontal,
    /// Columns of `ceil(height / 8)` bytes, least significant bit topmost
    Vertical,
}

impl Layout {
    /// Bitmap size of one glyph
    pub const fn bitmap_len(self, width: u8, height: u8) -> usize {
        let (width, height) = (width as usize, height as usize);
        match self {
            Self::Horizontal => width.div_ceil(8) * height,
            Self::Vertical => height.div_ceil(8) * width,
        }
    }
}

/// One decoded glyph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphBitmap<'a> {
    /// Cursor advance for variable-pitch text
    pub advance: u8,
    /// Bitmap width in pixels (the font's cell width)
    pub width: u8,
    /// Bitmap height in pixels
    pub height: u8,
    /// Bit order of `data`
    pub layout: Layout,
    /// Bitmap bytes
    pub data: &'a [u8],
}

/// A source of glyph bitmaps for printable ASCII
pub trait Glyph {
    /// Error produced when a glyph cannot be read
    type Error: Debug;

    /// Cell width in pixels
    fn width(&self) -> u8;

    /// Cell height in pixels
    fn height(&self) -> u8;

    /// Advance by the cell width instead of each glyph's own width
    fn monospaced(&self) -> bool;

    /// Bitmap for a character code
    ///
    /// Codes outside `32..=126` render as a space.
    fn glyph(&mut self, code: u8) -> Result<GlyphBitmap<'_>, Self::Error>;
}

fn record_index(code: u8) -> usize {
    if (FIRST_CHAR..=LAST_CHAR).contains(&code) {
        usize::from(code - FIRST_CHAR)
    } else {
        0
    }
}

/// Font read glyph by glyph from storage
///
/// Each glyph costs one storage read into an internal scratch buffer.
pub struct FileFont<S> {
    storage: S,
    width: u8,
    height: u8,
    monospaced: bool,
    bitmap_len: usize,
    scratch: [u8; MAX_GLYPH_BYTES + 1],
}

impl<S: FontStorage> FileFont<S> {
    /// Validate the header and open a font
    ///
    /// Records carry their advance width, so the same file renders either
    /// way; `monospaced` picks the pitch.
    ///
    /// # Errors
    ///
    /// - `FontError::InvalidFontFile` for a bad signature, zero or oversized
    ///   cells, or a file too short to hold every record
    /// - `FontError::Storage` if the header cannot be read
    pub fn open(mut storage: S, monospaced: bool) -> Result<Self, FontError<S::Error>> {
        let mut header = [0u8; FONT_HEADER_LEN as usize];
        storage.read_at(0, &mut header).map_err(FontError::Storage)?;
        let [m0, m1, width, height] = header;
        if [m0, m1] != FONT_MAGIC || width == 0 || height == 0 {
            return Err(FontError::InvalidFontFile);
        }
        let bitmap_len = Layout::Horizontal.bitmap_len(width, height);
        if bitmap_len > MAX_GLYPH_BYTES {
            return Err(FontError::InvalidFontFile);
        }

        // the last record's last byte must exist
        let end = FONT_HEADER_LEN as usize + GLYPH_COUNT * (bitmap_len + 1);
        let mut last = [0u8; 1];
        if storage.read_at((end - 1) as u32, &mut last).is_err() {
            return Err(FontError::InvalidFontFile);
        }

        Ok(Self {
            storage,
            width,
            height,
            monospaced,
            bitmap_len,
            scratch: [0; MAX_GLYPH_BYTES + 1],
        })
    }

    /// Give back the storage
    pub fn close(self) -> S {
        self.storage
    }
}

impl<S: FontStorage> Glyph for FileFont<S> {
    type Error = FontError<S::Error>;

    fn width(&self) -> u8 {
        self.width
    }

    fn height(&self) -> u8 {
        self.height
    }

    fn monospaced(&self) -> bool {
        self.monospaced
    }

    fn glyph(&mut self, code: u8) -> Result<GlyphBitmap<'_>, Self::Error> {
        let record_len = self.bitmap_len + 1;
        let offset = FONT_HEADER_LEN as usize + record_index(code) * record_len;
        let record = &mut self.scratch[..record_len];
        self.storage
            .read_at(offset as u32, record)
            .map_err(FontError::Storage)?;
        Ok(GlyphBitmap {
            advance: record[0],
            width: self.width,
            height: self.height,
            layout: Layout::Horizontal,
            data: &record[1..],
        })
    }
}

/// Font compiled into the firmware
///
/// Records are packed back to back for codes 32..=126. Variable-pitch fonts
/// store the advance width as the first byte of each record; monospaced
/// fonts store the bitmap only.
#[derive(Clone, Copy, Debug)]
pub struct MemoryFont<'a> {
    width: u8,
    height: u8,
    monospaced: bool,
    layout: Layout,
    data: &'a [u8],
}

impl<'a> MemoryFont<'a> {
    /// Wrap packed glyph records
    ///
    /// # Errors
    ///
    /// `FontError::InvalidFontFile` if a dimension is zero or `data` is too
    /// short for every record.
    pub fn new(
        width: u8,
        height: u8,
        monospaced: bool,
        layout: Layout,
        data: &'a [u8],
    ) -> Result<Self, FontError<Infallible>> {
        let font = Self {
            width,
            height,
            monospaced,
            layout,
            data,
        };
        if width == 0 || height == 0 || data.len() < GLYPH_COUNT * font.record_len() {
            return Err(FontError::InvalidFontFile);
        }
        Ok(font)
    }

    fn record_len(&self) -> usize {
        self.layout.bitmap_len(self.width, self.height) + usize::from(!self.monospaced)
    }
}

impl Glyph for MemoryFont<'_> {
    type Error = Infallible;

    fn width(&self) -> u8 {
        self.width
    }

    fn height(&self) -> u8 {
        self.height
    }

    fn monospaced(&self) -> bool {
        self.monospaced
    }

    fn glyph(&mut self, code: u8) -> Result<GlyphBitmap<'_>, Self::Error> {
        let record_len = self.record_len();
        let start = record_index(code) * record_len;
        let record = self.data.get(start..start + record_len).unwrap_or(&[]);
        let (advance, data) = match record.split_first() {
            Some((&advance, rest)) if !self.monospaced => (advance, rest),
            _ => (self.width, record),
        };
        Ok(GlyphBitmap {
            advance,
            width: self.width,
            height: self.height,
            layout: self.layout,
            data,
        })
    }
}

/// Either kind of font, chosen when it is opened
pub enum Font<'a, S = &'a [u8]> {
    /// Read from storage
    File(FileFont<S>),
    /// Compiled in
    Memory(MemoryFont<'a>),
}

impl<S> From<FileFont<S>> for Font<'_, S> {
    fn from(font: FileFont<S>) -> Self {
        Self::File(font)
    }
}

impl<'a, S> From<MemoryFont<'a>> for Font<'a, S> {
    fn from(font: MemoryFont<'a>) -> Self {
        Self::Memory(font)
    }
}

impl<S: FontStorage> Glyph for Font<'_, S> {
    type Error = FontError<S::Error>;

    fn width(&self) -> u8 {
        match self {
            Self::File(font) => font.width(),
            Self::Memory(font) => font.width(),
        }
    }

    fn height(&self) -> u8 {
        match self {
            Self::File(font) => font.height(),
            Self::Memory(font) => font.height(),
        }
    }

    fn monospaced(&self) -> bool {
        match self {
            Self::File(font) => font.monospaced(),
            Self::Memory(font) => font.monospaced(),
        }
    }

    fn glyph(&mut self, code: u8) -> Result<GlyphBitmap<'_>, Self::Error> {
        match self {
            Self::File(font) => font.glyph(code),
            Self::Memory(font) => match font.glyph(code) {
                Ok(glyph) => Ok(glyph),
                Err(never) => match never {},
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Font file where every glyph is a distinct row pattern
    ///
    /// Glyph `c` has advance `c % 8 + 1` and every row set to `c`.
    pub(crate) fn font_file(width: u8, height: u8) -> Vec<u8> {
        let mut file = Vec::from([0x42, 0xE7, width, height]);
        let bitmap_len = Layout::Horizontal.bitmap_len(width, height);
        for code in FIRST_CHAR..=LAST_CHAR {
            file.push(code % 8 + 1);
            file.extend(core::iter::repeat_n(code, bitmap_len));
        }
        file
    }

    #[test]
    fn test_open_rejects_bad_signature() {
        let mut file = font_file(8, 8);
        file[1] = 0xE8;
        let result = FileFont::open(file.as_slice(), false);
        assert!(matches!(result, Err(FontError::InvalidFontFile)));
    }

    #[test]
    fn test_open_rejects_truncated_file() {
        let file = font_file(8, 8);
        let result = FileFont::open(&file[..file.len() - 1], false);
        assert!(matches!(result, Err(FontError::InvalidFontFile)));
    }

    #[test]
    fn test_open_short_header_is_storage_error() {
        let file = [0x42u8, 0xE7];
        let result = FileFont::open(&file[..], false);
        assert!(matches!(result, Err(FontError::Storage(OutOfRange))));
    }

    #[test]
    fn test_file_glyph_lookup() {
        let file = font_file(12, 10);
        let mut font = FileFont::open(file.as_slice(), false).unwrap();
        assert_eq!((font.width(), font.height()), (12, 10));
        let glyph = font.glyph(b'A').unwrap();
        assert_eq!(glyph.advance, b'A' % 8 + 1);
        assert_eq!(glyph.data.len(), 20);
        assert!(glyph.data.iter().all(|&b| b == b'A'));
    }

    #[test]
    fn test_unprintable_code_renders_space() {
        let file = font_file(8, 8);
        let mut font = FileFont::open(file.as_slice(), true).unwrap();
        assert_eq!(font.glyph(7).unwrap().data[0], b' ');
    }

    #[test]
    fn test_memory_font_inline_width_only_for_variable_pitch() {
        // variable pitch: advance byte then 8 column bytes
        let mut data = Vec::new();
        for code in FIRST_CHAR..=LAST_CHAR {
            data.push(5);
            data.extend(core::iter::repeat_n(code, 8));
        }
        let mut variable = MemoryFont::new(8, 8, false, Layout::Vertical, &data).unwrap();
        let glyph = variable.glyph(b'!').unwrap();
        assert_eq!(glyph.advance, 5);
        assert_eq!(glyph.data, &[b'!'; 8]);

        let fixed_data = [0xAAu8; GLYPH_COUNT * 8];
        let mut fixed = MemoryFont::new(8, 8, true, Layout::Horizontal, &fixed_data).unwrap();
        assert_eq!(fixed.glyph(b'~').unwrap().advance, 8);
    }

    #[test]
    fn test_memory_font_rejects_short_data() {
        let data = [0u8; GLYPH_COUNT * 8 - 1];
        let result = MemoryFont::new(8, 8, true, Layout::Horizontal, &data);
        assert!(matches!(result, Err(FontError::InvalidFontFile)));
    }

    #[test]
    fn test_font_enum_dispatch() {
        let file = font_file(8, 8);
        let mut font: Font<'_> = FileFont::open(file.as_slice(), true).unwrap().into();
        assert!(font.monospaced());
        assert_eq!(font.glyph(b'z').unwrap().data[0], b'z');

        let data = [0u8; GLYPH_COUNT * 16];
        let mut font: Font<'_> = MemoryFont::new(8, 16, true, Layout::Vertical, &data)
            .unwrap()
            .into();
        assert_eq!(font.height(), 16);
        assert_eq!(font.glyph(b'a').unwrap().layout, Layout::Vertical);
    }
}
