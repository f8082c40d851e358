//! COG G2 register protocol
//!
//! The COG has no data/command pin. Every transfer is its own chip-select
//! bracket that starts with an opcode byte: [`REGISTER_INDEX`] selects a
//! register, [`REGISTER_WRITE`] writes to it, [`REGISTER_READ`] reads it back.
//!
//! ## Command Structure
//!
//! A register write is two brackets:
//! 1. `0x70 <register>`
//! 2. `0x72 <data...>`
//!
//! A line of pixel data keeps chip select asserted for the whole payload:
//! 1. `0x70 0x0A`
//! 2. `0x72 0x00 <odd bytes> <scan bytes> <even bytes>`
//! 3. `0x70 0x02 0x72 0x07` latches the line to the panel
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdi_epd2in7::{command, CogInterface, Interface};
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::{InputPin, OutputPin};
//! # use embedded_hal::spi::SpiBus;
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
//! # let mut interface = Interface::new(MockSpi, MockPin, MockPin, MockPin, MockPin, MockPin, MockPin);
//! // Read the COG ID
//! let _id = interface.read(&[command::READ_ID, 0x00]);
//!
//! // Vcom level
//! let _ = interface.write(&[command::REGISTER_INDEX, command::VCOM_LEVEL]);
//! let _ = interface.write(&[command::REGISTER_WRITE, command::VCOM_LEVEL_2IN7]);
//! ```

// Opcodes (first byte of every bracket)

/// Select the register for the next write or read (0x70)
pub const REGISTER_INDEX: u8 = 0x70;

/// Read the COG device ID (0x71)
pub const READ_ID: u8 = 0x71;

/// Write data to the selected register (0x72)
pub const REGISTER_WRITE: u8 = 0x72;

/// Read the selected register (0x73)
pub const REGISTER_READ: u8 = 0x73;

// Registers

/// Channel select (0x01)
pub const CHANNEL_SELECT: u8 = 0x01;

/// Output enable (0x02)
pub const OUTPUT_ENABLE: u8 = 0x02;

/// Driver latch (0x03)
pub const DRIVER_LATCH: u8 = 0x03;

/// Power control: setting, voltage limit and internal discharge (0x04)
pub const POWER_CONTROL: u8 = 0x04;

/// Charge pump enables (0x05)
pub const CHARGE_PUMP: u8 = 0x05;

/// Oscillator mode (0x07)
pub const OSCILLATOR: u8 = 0x07;

/// Power level (0x08)
pub const POWER_LEVEL: u8 = 0x08;

/// Vcom level (0x09)
pub const VCOM_LEVEL: u8 = 0x09;

/// Line data input (0x0A)
pub const LINE_DATA: u8 = 0x0A;

/// Power saving mode (0x0B)
pub const POWER_SAVING: u8 = 0x0B;

/// Status: breakage and DC/DC flags (0x0F)
pub const STATUS: u8 = 0x0F;

// Values

/// COG G2 device ID (low nibble of the ID byte)
pub const COG_ID_G2: u8 = 0x02;

/// Mask applied to the ID byte before comparison
pub const COG_ID_MASK: u8 = 0x0F;

/// Status bit set on an intact panel
pub const STATUS_PANEL_OK: u8 = 0x80;

/// Status bit set while the DC/DC converter is up
pub const STATUS_DC_OK: u8 = 0x40;

/// Output enable: disable during initialisation
pub const OE_DISABLE_INIT: u8 = 0x40;

/// Output enable: disable after the charge pumps are up
pub const OE_DISABLE: u8 = 0x04;

/// Output enable: drive the latched line to the panel
pub const OE_OUTPUT_LINE: u8 = 0x07;

/// Channel select pattern for the 2.7 inch panel
pub const CHANNEL_SELECT_2IN7: [u8; 8] = [0x00, 0x00, 0x00, 0x7F, 0xFF, 0xFE, 0x00, 0x00];

/// High power oscillator mode
pub const OSCILLATOR_HIGH_POWER: u8 = 0xD1;

/// Oscillator off
pub const OSCILLATOR_OFF: u8 = 0x01;

/// Power level for the 2.7 inch panel
pub const POWER_LEVEL_2IN7: u8 = 0x02;

/// Vcom level for the 2.7 inch panel
pub const VCOM_LEVEL_2IN7: u8 = 0xC2;

/// Power setting applied at power-up
pub const POWER_SETTING: u8 = 0x03;

/// Voltage limit level 0, sent before nothing-frame lines
pub const POWER_VOLTAGE_LIMIT: u8 = 0x00;

/// Internal discharge on
pub const POWER_DISCHARGE: u8 = 0x80;

/// Driver latch on
pub const LATCH_ON: u8 = 0x01;

/// Driver latch off
pub const LATCH_OFF: u8 = 0x00;

/// Power saving mode on
pub const POWER_SAVING_ON: u8 = 0x02;

/// Power saving mode off
pub const POWER_SAVING_OFF: u8 = 0x00;

/// Positive charge pump on (VGH/VDH)
pub const CHARGE_PUMP_POSITIVE: u8 = 0x01;

/// Positive and negative charge pumps on (VGL/VDL)
pub const CHARGE_PUMP_NEGATIVE: u8 = 0x03;

/// All charge pumps on including the Vcom driver
pub const CHARGE_PUMP_VCOM: u8 = 0x0F;

/// All charge pumps off
pub const CHARGE_PUMP_OFF: u8 = 0x00;

// Composite brackets

/// Header of the line payload bracket
pub const LINE_HEADER: [u8; 2] = [REGISTER_WRITE, 0x00];

/// Select the line data register
pub const SELECT_LINE_DATA: [u8; 2] = [REGISTER_INDEX, LINE_DATA];

/// Latch the sent line to the panel, in one bracket
pub const OUTPUT_LINE: [u8; 4] = [
    REGISTER_INDEX,
    OUTPUT_ENABLE,
    REGISTER_WRITE,
    OE_OUTPUT_LINE,
];

/// Reduce the charge pump voltage level, in one bracket
pub const VOLTAGE_LIMIT: [u8; 4] = [
    REGISTER_INDEX,
    POWER_CONTROL,
    REGISTER_WRITE,
    POWER_VOLTAGE_LIMIT,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_brackets() {
        assert_eq!(SELECT_LINE_DATA, [0x70, 0x0A]);
        assert_eq!(LINE_HEADER, [0x72, 0x00]);
        assert_eq!(OUTPUT_LINE, [0x70, 0x02, 0x72, 0x07]);
        assert_eq!(VOLTAGE_LIMIT, [0x70, 0x04, 0x72, 0x00]);
    }

    #[test]
    fn test_charge_pump_stages_are_cumulative() {
        assert_eq!(
            CHARGE_PUMP_NEGATIVE & CHARGE_PUMP_POSITIVE,
            CHARGE_PUMP_POSITIVE
        );
        assert_eq!(
            CHARGE_PUMP_VCOM & CHARGE_PUMP_NEGATIVE,
            CHARGE_PUMP_NEGATIVE
        );
    }
}
