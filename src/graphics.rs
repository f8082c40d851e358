//! Graphics support via embedded-graphics
//!
//! [`FrameBuffer`] and [`Display`] implement
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) with
//! [`Color`], so any embedded-graphics primitive, font or image can be drawn
//! into the panel image. Drawing on a [`Display`] goes to its current frame.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_graphics::{
//!     mono_font::{ascii::FONT_6X10, MonoTextStyle},
//!     prelude::*,
//!     primitives::{Circle, PrimitiveStyle, Rectangle},
//!     text::Text,
//! };
//! use pdi_epd2in7::{Color, FrameBuffer};
//!
//! let mut frame = FrameBuffer::new();
//!
//! let _ = Rectangle::new(Point::new(10, 10), Size::new(50, 30))
//!     .into_styled(PrimitiveStyle::with_fill(Color::Black))
//!     .draw(&mut frame);
//!
//! let _ = Circle::new(Point::new(100, 50), 40)
//!     .into_styled(PrimitiveStyle::with_stroke(Color::Black, 2))
//!     .draw(&mut frame);
//!
//! let _ = Text::new(
//!     "Hello, E-Paper!",
//!     Point::new(10, 100),
//!     MonoTextStyle::new(&FONT_6X10, Color::Black),
//! )
//! .draw(&mut frame);
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    prelude::Pixel,
};

use crate::color::Color;
use crate::compensation::TemperatureSensor;
use crate::config::{BITS_PER_LINE, LINES};
use crate::display::Display;
use crate::framebuffer::FrameBuffer;
use crate::interface::CogInterface;
use crate::scheduler::Scheduler;

impl DrawTarget for FrameBuffer {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            self.set_pixel(x, y, color.is_black());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.as_bytes_mut().fill(color.byte());
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(BITS_PER_LINE as u32, LINES as u32)
    }
}

impl<I, T, S> DrawTarget for Display<I, T, S>
where
    I: CogInterface,
    T: TemperatureSensor,
    S: Scheduler,
{
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.frame_mut().draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        DrawTarget::clear(self.frame_mut(), color)
    }
}

impl<I, T, S> OriginDimensions for Display<I, T, S>
where
    I: CogInterface,
    T: TemperatureSensor,
    S: Scheduler,
{
    fn size(&self) -> Size {
        self.frame().size()
    }
}
