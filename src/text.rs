//! Text output into a frame buffer
//!
//! A [`TextWriter`] keeps the cursor and, while a [`FontScope`] is alive,
//! the current font. Text written with no font bound fails with
//! [`DrawError::NoFontBound`].
//!
//! ```
//! use pdi_epd2in7::{FrameBuffer, Layout, MemoryFont, TextWriter};
//! use pdi_epd2in7::font::GLYPH_COUNT;
//!
//! static GLYPHS: [u8; GLYPH_COUNT * 8] = [0x18; GLYPH_COUNT * 8];
//!
//! let mut frame = FrameBuffer::new();
//! let mut text = TextWriter::new();
//! let Ok(font) = MemoryFont::new(8, 8, true, Layout::Horizontal, &GLYPHS) else {
//!     return;
//! };
//!
//! text.locate(10, 20);
//! {
//!     let mut scope = text.bind(font);
//!     let _ = scope.puts(&mut frame, "Hi\nthere");
//! }
//! assert!(text.puts(&mut frame, "no font").is_err());
//! ```

use crate::error::DrawError;
use crate::font::{Glyph, GlyphBitmap, Layout};
use crate::framebuffer::{FrameBuffer, HEIGHT, WIDTH};

/// Pixel position of the next glyph's top-left corner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextCursor {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TextCursor {
    fn new_line(&mut self, height: i32) {
        self.x = 0;
        self.y = self.y.saturating_add(height);
        if self.y >= HEIGHT - height {
            self.y = 0;
        }
    }
}

/// Text cursor with an optional current font
pub struct TextWriter<G> {
    cursor: TextCursor,
    font: Option<G>,
}

impl<G> Default for TextWriter<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> TextWriter<G> {
    /// Create a writer at `(0, 0)` with no font
    pub const fn new() -> Self {
        Self {
            cursor: TextCursor { x: 0, y: 0 },
            font: None,
        }
    }

    /// Move the cursor
    pub fn locate(&mut self, x: i32, y: i32) {
        self.cursor = TextCursor { x, y };
    }

    /// Current cursor position
    pub fn location(&self) -> TextCursor {
        self.cursor
    }

    /// Whether a font is bound
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Make `font` current until the returned scope is dropped
    ///
    /// The scope borrows the writer, so a second font cannot be bound while
    /// one is current.
    pub fn bind(&mut self, font: G) -> FontScope<'_, G> {
        self.font = Some(font);
        FontScope { writer: self }
    }
}

impl<G: Glyph> TextWriter<G> {
    /// Write `text` at the cursor
    ///
    /// Printable ASCII (32..=126) is drawn and advances the cursor; `'\n'`
    /// starts a new line; every other character is skipped.
    ///
    /// # Errors
    ///
    /// - `DrawError::NoFontBound` outside a [`FontScope`]
    /// - `DrawError::Font` if the font fails to produce a glyph
    pub fn puts(
        &mut self,
        target: &mut FrameBuffer,
        text: &str,
    ) -> Result<(), DrawError<G::Error>> {
        let Some(font) = self.font.as_mut() else {
            return Err(DrawError::NoFontBound);
        };
        let height = i32::from(font.height());
        for code in text.bytes() {
            match code {
                b'\n' => self.cursor.new_line(height),
                32..=126 => put_char(&mut self.cursor, font, target, code)?,
                _ => {}
            }
        }
        Ok(())
    }
}

fn put_char<G: Glyph>(
    cursor: &mut TextCursor,
    font: &mut G,
    target: &mut FrameBuffer,
    code: u8,
) -> Result<(), DrawError<G::Error>> {
    let height = i32::from(font.height());
    let cell = i32::from(font.width());
    let monospaced = font.monospaced();
    let glyph = font.glyph(code).map_err(DrawError::Font)?;

    let row_pixels = (usize::from(glyph.width).div_ceil(8) * 8) as i32;
    if cursor.x.saturating_add(row_pixels) > WIDTH {
        cursor.x = 0;
        cursor.y = cursor.y.saturating_add(height);
    }
    if cursor.y >= HEIGHT - height {
        cursor.y = 0;
    }

    match glyph.layout {
        Layout::Horizontal => blit_rows(target, *cursor, &glyph),
        Layout::Vertical => blit_columns(target, *cursor, &glyph),
    }
    let advance = if monospaced {
        cell
    } else {
        i32::from(glyph.advance)
    };
    cursor.x = cursor.x.saturating_add(advance);
    Ok(())
}

/// Whole bytes per row; the glyph cell replaces what was under it
fn blit_rows(target: &mut FrameBuffer, at: TextCursor, glyph: &GlyphBitmap<'_>) {
    let row_bytes = usize::from(glyph.width).div_ceil(8);
    if row_bytes == 0 {
        return;
    }
    for (row, bytes) in glyph
        .data
        .chunks(row_bytes)
        .take(usize::from(glyph.height))
        .enumerate()
    {
        let y = at.y.saturating_add(row as i32);
        let mut x = at.x;
        for &byte in bytes {
            target.put_byte(x, y, byte);
            x = x.saturating_add(8);
        }
    }
}

fn blit_columns(target: &mut FrameBuffer, at: TextCursor, glyph: &GlyphBitmap<'_>) {
    let column_bytes = usize::from(glyph.height).div_ceil(8);
    if column_bytes == 0 {
        return;
    }
    for (col, bytes) in glyph
        .data
        .chunks(column_bytes)
        .take(usize::from(glyph.width))
        .enumerate()
    {
        for row in 0..usize::from(glyph.height) {
            let black = bytes
                .get(row / 8)
                .is_some_and(|b| b & (1 << (row % 8)) != 0);
            target.set_pixel(
                at.x.saturating_add(col as i32),
                at.y.saturating_add(row as i32),
                black,
            );
        }
    }
}

/// A font bound to a [`TextWriter`]
///
/// Dropping the scope unbinds the font.
pub struct FontScope<'w, G> {
    writer: &'w mut TextWriter<G>,
}

impl<G: Glyph> FontScope<'_, G> {
    /// Write `text` at the cursor with the bound font
    ///
    /// # Errors
    ///
    /// `DrawError::Font` if the font fails to produce a glyph.
    pub fn puts(
        &mut self,
        target: &mut FrameBuffer,
        text: &str,
    ) -> Result<(), DrawError<G::Error>> {
        self.writer.puts(target, text)
    }

    /// Move the cursor
    pub fn locate(&mut self, x: i32, y: i32) {
        self.writer.locate(x, y);
    }

    /// Current cursor position
    pub fn location(&self) -> TextCursor {
        self.writer.location()
    }
}

impl<G> Drop for FontScope<'_, G> {
    fn drop(&mut self) {
        self.writer.font = None;
    }
}
