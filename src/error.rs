//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`]),
//! COG power and refresh operations ([`Error`]), drawing into the frame buffer
//! ([`DrawError`]) and font access ([`FontError`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors from the COG sequencer
//! - [`DrawError`] - Bad geometry, missing font, malformed bitmap
//! - [`FontError`] - Font validation and storage errors
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! ## Example
//!
//! ```
//! use pdi_epd2in7::{Builder, BuilderError};
//!
//! // A fixed stage time only makes sense for partial refresh
//! let result = Builder::new().stage_time_ms(400).build();
//! assert!(matches!(result, Err(BuilderError::StageTimeInFullMode)));
//! ```

use core::convert::Infallible;
use core::fmt::Debug;

use crate::display::PowerState;
use crate::interface::CogInterface;

/// Errors that can occur when driving the COG
///
/// Generic over the interface type to preserve the specific error type.
/// Every hardware fault is reported only after the power-off tail has run.
#[derive(Debug)]
pub enum Error<I: CogInterface> {
    /// Interface error (SPI/GPIO)
    ///
    /// Wraps the underlying hardware error from the [`CogInterface`] implementation.
    Interface(I::Error),
    /// The COG reported an unexpected device ID
    UnsupportedDevice {
        /// Low nibble of the ID byte read from the COG
        cog_id: u8,
    },
    /// The COG reported a broken panel
    PanelBroken,
    /// The DC/DC converter did not come up, or dropped out before power-down
    DcPowerFailure,
    /// The busy line stayed high past the configured timeout
    PowerUpTimeout,
    /// The operation is not allowed in the current power state
    ///
    /// Fast-mode operations need a powered COG; power-up needs an idle one.
    InvalidState {
        /// State at the time of the call
        state: PowerState,
    },
    /// The operation needs a different [`RefreshMode`](crate::RefreshMode)
    UnsupportedMode,
}

impl<I: CogInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(_) => write!(f, "Interface error"),
            Self::UnsupportedDevice { cog_id } => {
                write!(f, "Unsupported COG device: id {cog_id}")
            }
            Self::PanelBroken => write!(f, "COG reports broken panel"),
            Self::DcPowerFailure => write!(f, "DC/DC power failure"),
            Self::PowerUpTimeout => write!(f, "Timeout waiting for COG ready"),
            Self::InvalidState { state } => write!(f, "Invalid power state: {state:?}"),
            Self::UnsupportedMode => write!(f, "Operation not supported in this refresh mode"),
        }
    }
}

impl<I: CogInterface + Debug> core::error::Error for Error<I> {}

/// Errors raised while drawing into a frame buffer
///
/// `E` is the glyph source error, `Infallible` for shape drawing.
#[derive(Debug, PartialEq, Eq)]
pub enum DrawError<E = Infallible> {
    /// A geometry argument is out of its valid range
    InvalidArgument {
        /// Name of the offending argument
        name: &'static str,
        /// Value that was passed
        value: i32,
    },
    /// Text output was attempted with no font bound
    NoFontBound,
    /// Image data is malformed or ended early
    InvalidBitmap,
    /// The bound font failed to produce a glyph
    Font(E),
}

impl<E: Debug> core::fmt::Display for DrawError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument { name, value } => {
                write!(f, "Invalid argument: {name}={value}")
            }
            Self::NoFontBound => write!(f, "There is no current font"),
            Self::InvalidBitmap => write!(f, "Invalid bitmap data"),
            Self::Font(e) => write!(f, "Font error: {e:?}"),
        }
    }
}

impl<E: Debug> core::error::Error for DrawError<E> {}

/// Errors that can occur when opening or reading a font
#[derive(Debug, PartialEq, Eq)]
pub enum FontError<E> {
    /// Bad signature, bad geometry, or too little data
    InvalidFontFile,
    /// The backing storage failed a read
    Storage(E),
}

impl<E: Debug> core::fmt::Display for FontError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidFontFile => write!(f, "Font file is invalid"),
            Self::Storage(e) => write!(f, "Font storage error: {e:?}"),
        }
    }
}

impl<E: Debug> core::error::Error for FontError<E> {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the display is created.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// A stage time was set but the mode is [`RefreshMode::Full`](crate::RefreshMode::Full)
    StageTimeInFullMode,
    /// Stage time must be non-zero
    InvalidStageTime,
    /// Busy timeout must be non-zero
    InvalidBusyTimeout,
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StageTimeInFullMode => write!(f, "Cannot set stage time in full mode"),
            Self::InvalidStageTime => write!(f, "Stage time must be non-zero"),
            Self::InvalidBusyTimeout => write!(f, "Busy timeout must be non-zero"),
        }
    }
}

impl core::error::Error for BuilderError {}
