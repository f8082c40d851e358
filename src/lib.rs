//! Pervasive Displays 2.7" E-Paper Driver
//!
//! A driver for the 2.7 inch, 264x176 pixel e-paper panel with the G2
//! chip-on-glass (COG) driver.
//!
//! ## Features
//!
//! - `no_std` compatible, no allocation
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Full (three-stage) and fast (partial) refresh
//! - Temperature-compensated waveform timing
//! - Native lines, rectangles, circles, bitmap fonts and XBM images
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use pdi_epd2in7::{Builder, Display, Interface, Scheduler};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiBus for MockSpi {
//! #     fn read(&mut self, _: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn write(&mut self, _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn transfer(&mut self, _: &mut [u8], _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn transfer_in_place(&mut self, _: &mut [u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn flush(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # struct Ticks(u32);
//! # impl Scheduler for Ticks { fn now_ms(&mut self) -> u32 { self.0 += 50; self.0 } }
//! # let (cs, panel_on, border, discharge, rst, busy) =
//! #     (MockPin, MockPin, MockPin, MockPin, MockPin, MockPin);
//! # let mut delay = MockDelay;
//! let interface = Interface::new(MockSpi, cs, panel_on, border, discharge, rst, busy);
//! let config = match Builder::new().build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! // 22 °C from a sensor, milliseconds from a system timer
//! let mut display = Display::new(interface, 22i16, Ticks(0), config);
//!
//! let frame = display.frame_mut();
//! let _ = frame.rect(10, 10, 100, 60, 2, true);
//! let _ = frame.fill_circle(200, 88, 30, true);
//!
//! // Power up, refresh and power down
//! let _ = display.show(&mut delay);
//! ```

#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

/// COG power sequencing and line transmission
pub mod cog;
/// Pixel color for the monochrome panel
pub mod color;
/// COG opcodes, registers and register values
pub mod command;
/// Temperature compensation
pub mod compensation;
/// Panel geometry and driver configuration
pub mod config;
/// Core display operations
pub mod display;
/// Lines, rectangles and circles
pub mod draw;
/// Error types for the driver
pub mod error;
/// Bitmap fonts
pub mod font;
/// Bit-packed monochrome frame buffer
pub mod framebuffer;
/// Hardware interface abstraction
pub mod interface;
/// Wall clock and cooperative yield hook
pub mod scheduler;
/// Text output into a frame buffer
pub mod text;
/// Line codec: frame buffer bytes to COG line payloads
pub mod waveform;
/// XBM image loading
pub mod xbm;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

pub use cog::Cog;
pub use color::Color;
pub use compensation::{CompensationProfile, TemperatureBucket, TemperatureSensor};
pub use config::{BUFFER_SIZE, Builder, Config, LINES, RefreshMode};
pub use display::{Display, Fault, PowerState};
pub use error::{BuilderError, DrawError, Error, FontError};
pub use font::{FileFont, Font, FontStorage, Glyph, Layout, MemoryFont};
pub use framebuffer::{FrameBuffer, HEIGHT, WIDTH};
pub use interface::{CogInterface, ControlPin, Interface, InterfaceError};
pub use scheduler::Scheduler;
pub use text::{FontScope, TextCursor, TextWriter};
pub use waveform::Stage;
pub use xbm::XbmReader;
