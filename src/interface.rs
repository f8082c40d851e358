//! Hardware interface abstraction
//!
//! This module provides the [`CogInterface`] trait and the [`Interface`] struct
//! for communicating with the COG over SPI.
//!
//! ## Hardware Requirements
//!
//! The COG requires:
//! - SPI bus (MOSI + MISO + SCK), mode 3, up to 20MHz
//! - 5 GPIO outputs:
//!   - **CS**: Chip select (active low, driven by the driver)
//!   - **PANEL_ON**: Panel power switch
//!   - **BORDER**: Border control
//!   - **DISCHARGE**: Discharge switch
//!   - **RESET**: Reset (active low)
//! - 1 GPIO input:
//!   - **BUSY**: Busy status (active high)
//!
//! Chip select is a plain [`OutputPin`] instead of being hidden in an
//! `SpiDevice`: the power sequence drives it as a signal line, and a
//! whole line payload must go out in one assertion.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use pdi_epd2in7::{command, CogInterface, ControlPin, Interface};
//! # use core::convert::Infallible;
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
//! // SPI bus, then CS, PANEL_ON, BORDER, DISCHARGE, RESET, BUSY
//! let mut interface = Interface::new(MockSpi, MockPin, MockPin, MockPin, MockPin, MockPin, MockPin);
//!
//! // Switch the panel on
//! let _ = interface.set_pin(ControlPin::PanelOn, true);
//!
//! // Read the device ID
//! let _ = interface.read(&[command::READ_ID, 0x00]);
//! ```

use core::fmt::Debug;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Output lines driven by the power sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlPin {
    /// Panel power switch
    PanelOn,
    /// Border control
    Border,
    /// Discharge switch
    Discharge,
    /// Reset, active low
    Reset,
    /// Chip select, active low
    ChipSelect,
}

/// Trait for hardware interface to the COG
///
/// This trait abstracts over different hardware implementations,
/// allowing the [`Display`](crate::display::Display) to work with any
/// SPI + GPIO implementation that satisfies embedded-hal traits.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. Each `write`,
/// `write_line` and `read` call is exactly one chip-select bracket.
pub trait CogInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send bytes in one chip-select bracket
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn write(&mut self, bytes: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Send a line header and its payload in one chip-select bracket
    ///
    /// Chip select must stay asserted from the first header byte to the last
    /// payload byte.
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn write_line(&mut self, header: &[u8], payload: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Clock bytes out in one bracket and return the last byte clocked in
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn read(&mut self, bytes: &[u8]) -> InterfaceResult<u8, Self::Error>;

    /// Drive a control line
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO fails.
    fn set_pin(&mut self, pin: ControlPin, high: bool) -> InterfaceResult<(), Self::Error>;

    /// Sample the busy line
    ///
    /// # Errors
    ///
    /// Returns an error if the GPIO fails.
    fn is_busy(&mut self) -> InterfaceResult<bool, Self::Error>;
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface implementation for the COG
///
/// Implements [`CogInterface`] for embedded-hal v1.0 SPI bus and GPIO traits.
///
/// ## Type Parameters
///
/// * `SPI` - SPI bus implementing [`SpiBus`]
/// * `CS` - Chip select pin implementing [`OutputPin`]
/// * `ON` - Panel power pin implementing [`OutputPin`]
/// * `BORDER` - Border pin implementing [`OutputPin`]
/// * `DISCHARGE` - Discharge pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `BUSY` - Busy pin implementing [`InputPin`]
///
/// All pins must share one error type.
pub struct Interface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY> {
    /// SPI bus
    spi: SPI,
    /// Chip select (active low)
    cs: CS,
    /// Panel power
    panel_on: ON,
    /// Border control
    border: BORDER,
    /// Discharge switch
    discharge: DISCHARGE,
    /// Reset (active low)
    rst: RST,
    /// Busy (active high)
    busy: BUSY,
}

impl<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY> Interface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY>
where
    SPI: SpiBus,
    CS: OutputPin,
    ON: OutputPin,
    BORDER: OutputPin,
    DISCHARGE: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    /// Create a new Interface
    ///
    /// # Arguments
    ///
    /// * `spi` - SPI bus (must implement [`SpiBus`])
    /// * `cs` - Chip select (output, active low)
    /// * `panel_on` - Panel power switch (output)
    /// * `border` - Border control (output)
    /// * `discharge` - Discharge switch (output)
    /// * `rst` - Reset pin (output, active low)
    /// * `busy` - Busy pin (input, active high)
    pub fn new(
        spi: SPI,
        cs: CS,
        panel_on: ON,
        border: BORDER,
        discharge: DISCHARGE,
        rst: RST,
        busy: BUSY,
    ) -> Self {
        Self {
            spi,
            cs,
            panel_on,
            border,
            discharge,
            rst,
            busy,
        }
    }

    /// Release the bus and pins
    #[allow(clippy::type_complexity)]
    pub fn release(self) -> (SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY) {
        (
            self.spi,
            self.cs,
            self.panel_on,
            self.border,
            self.discharge,
            self.rst,
            self.busy,
        )
    }
}

impl<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, PinErr>
    Interface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY>
where
    SPI: SpiBus,
    CS: OutputPin<Error = PinErr>,
    ON: OutputPin<Error = PinErr>,
    BORDER: OutputPin<Error = PinErr>,
    DISCHARGE: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
{
    /// Run `f` with chip select asserted, releasing it on every exit path
    fn bracket<T>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> Result<T, SPI::Error>,
    ) -> InterfaceResult<T, InterfaceError<SPI::Error, PinErr>> {
        self.cs.set_low().map_err(InterfaceError::Pin)?;
        let result = f(&mut self.spi)
            .and_then(|value| self.spi.flush().map(|()| value));
        let released = self.cs.set_high().map_err(InterfaceError::Pin);
        let value = result.map_err(InterfaceError::Spi)?;
        released?;
        Ok(value)
    }
}

impl<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, PinErr> CogInterface
    for Interface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY>
where
    SPI: SpiBus,
    SPI::Error: Debug,
    CS: OutputPin<Error = PinErr>,
    ON: OutputPin<Error = PinErr>,
    BORDER: OutputPin<Error = PinErr>,
    DISCHARGE: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn write(&mut self, bytes: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.bracket(|spi| spi.write(bytes))
    }

    fn write_line(&mut self, header: &[u8], payload: &[u8]) -> InterfaceResult<(), Self::Error> {
        self.bracket(|spi| {
            spi.write(header)?;
            spi.write(payload)
        })
    }

    fn read(&mut self, bytes: &[u8]) -> InterfaceResult<u8, Self::Error> {
        self.bracket(|spi| {
            let mut last = 0u8;
            for &byte in bytes {
                let mut rx = [0u8];
                spi.transfer(&mut rx, &[byte])?;
                last = rx[0];
            }
            Ok(last)
        })
    }

    fn set_pin(&mut self, pin: ControlPin, high: bool) -> InterfaceResult<(), Self::Error> {
        let result = match (pin, high) {
            (ControlPin::PanelOn, true) => self.panel_on.set_high(),
            (ControlPin::PanelOn, false) => self.panel_on.set_low(),
            (ControlPin::Border, true) => self.border.set_high(),
            (ControlPin::Border, false) => self.border.set_low(),
            (ControlPin::Discharge, true) => self.discharge.set_high(),
            (ControlPin::Discharge, false) => self.discharge.set_low(),
            (ControlPin::Reset, true) => self.rst.set_high(),
            (ControlPin::Reset, false) => self.rst.set_low(),
            (ControlPin::ChipSelect, true) => self.cs.set_high(),
            (ControlPin::ChipSelect, false) => self.cs.set_low(),
        };
        result.map_err(InterfaceError::Pin)
    }

    fn is_busy(&mut self) -> InterfaceResult<bool, Self::Error> {
        self.busy.is_high().map_err(InterfaceError::Pin)
    }
}
