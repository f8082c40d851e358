//! COG power sequencing and line transport
//!
//! [`Cog`] owns the interface and the line buffer. It knows how to bring the
//! chip up, send lines, and take it down again; the refresh disciplines that
//! decide *which* lines to send live in [`Display`](crate::Display).
//!
//! Every fault found while powering up or down runs [`Cog::power_off`] before
//! it is returned, so the panel is never left half powered.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::command::{
    CHANNEL_SELECT, CHANNEL_SELECT_2IN7, CHARGE_PUMP, CHARGE_PUMP_NEGATIVE, CHARGE_PUMP_OFF,
    CHARGE_PUMP_POSITIVE, CHARGE_PUMP_VCOM, COG_ID_G2, COG_ID_MASK, DRIVER_LATCH, LATCH_OFF,
    LATCH_ON, LINE_HEADER, OE_DISABLE, OE_DISABLE_INIT, OSCILLATOR, OSCILLATOR_HIGH_POWER,
    OSCILLATOR_OFF, OUTPUT_ENABLE, OUTPUT_LINE, POWER_CONTROL, POWER_DISCHARGE, POWER_LEVEL,
    POWER_LEVEL_2IN7, POWER_SAVING, POWER_SAVING_OFF, POWER_SAVING_ON, POWER_SETTING, READ_ID,
    REGISTER_INDEX, REGISTER_READ, REGISTER_WRITE, SELECT_LINE_DATA, STATUS, STATUS_DC_OK,
    STATUS_PANEL_OK, VCOM_LEVEL, VCOM_LEVEL_2IN7, VOLTAGE_LIMIT,
};
use crate::config::{LINE_BUFFER_SIZE, LINES};
use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::interface::{CogInterface, ControlPin};
use crate::waveform::{self, DUMMY_LINE, LinePayload, Stage};

type CogResult<I> = core::result::Result<(), Error<I>>;

/// Charge pump bring-up attempts before giving up
pub const DC_RETRIES: u32 = 4;

/// COG driver: register access, power sequencing and line output
pub struct Cog<I> {
    interface: I,
    line: LinePayload,
    busy_timeout_ms: u32,
}

impl<I> Cog<I>
where
    I: CogInterface,
{
    /// Create a new Cog with a bound on the power-up busy wait
    pub fn new(interface: I, busy_timeout_ms: u32) -> Self {
        Self {
            interface,
            line: [0; LINE_BUFFER_SIZE],
            busy_timeout_ms,
        }
    }

    /// Give back the interface
    pub fn release(self) -> I {
        self.interface
    }

    /// Access the interface
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Access the interface mutably
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Power up and configure the COG
    ///
    /// Runs the reset sequence, checks the device ID and panel status, writes
    /// the register script and brings up the charge pumps.
    ///
    /// # Errors
    ///
    /// - [`Error::PowerUpTimeout`] if BUSY never drops
    /// - [`Error::UnsupportedDevice`] if the COG is not a G2
    /// - [`Error::PanelBroken`] if the COG reports a broken panel
    /// - [`Error::DcPowerFailure`] if the charge pumps do not come up
    ///
    /// The panel is powered off before any of these is returned.
    pub fn power_up<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        debug!("COG power up");
        match self.start(delay) {
            Ok(()) => Ok(()),
            Err(error) => Err(self.abort(delay, error)),
        }
    }

    /// Send the closing frames and power the COG down
    ///
    /// # Errors
    ///
    /// Returns [`Error::DcPowerFailure`] if the DC/DC converter dropped out
    /// during the refresh. The panel is powered off in every case.
    pub fn power_down<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        debug!("COG power down");
        match self.shutdown(delay) {
            Ok(()) => self.power_off(delay),
            Err(error) => Err(self.abort(delay, error)),
        }
    }

    /// De-energize the panel and pulse the discharge line
    ///
    /// Safe to call in any state. Every step is attempted even if an earlier
    /// one fails; the first failure is returned.
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        let mut result = Ok(());
        for (pin, high) in [
            (ControlPin::PanelOn, false),
            (ControlPin::Border, false),
            (ControlPin::Reset, false),
            (ControlPin::ChipSelect, false),
            (ControlPin::Discharge, true),
        ] {
            let step = self.interface.set_pin(pin, high);
            if result.is_ok() {
                result = step;
            }
        }
        delay.delay_ms(150);
        let step = self.interface.set_pin(ControlPin::Discharge, false);
        if result.is_ok() {
            result = step;
        }
        debug!("COG powered off");
        result.map_err(Error::Interface)
    }

    /// Send one line of image data
    ///
    /// `history` is the image currently on the panel; with it, unchanged
    /// pixels are driven with the neutral code.
    pub fn send_image_line(
        &mut self,
        line: u16,
        image: &FrameBuffer,
        history: Option<&FrameBuffer>,
        stage: Stage,
    ) -> CogResult<I> {
        let Some(new) = image.row(usize::from(line)) else {
            return Ok(());
        };
        let old = history.and_then(|history| history.row(usize::from(line)));
        waveform::encode_line(&mut self.line, line, new, old, stage);
        self.transmit_line()
    }

    /// Send one line with the same byte in every pixel position
    ///
    /// With `voltage_limit` the charge pump level is reduced first, as the
    /// closing frames require.
    pub fn send_fixed_line(&mut self, line: u16, value: u8, voltage_limit: bool) -> CogResult<I> {
        if voltage_limit {
            self.write(&VOLTAGE_LIMIT)?;
        }
        waveform::encode_fixed(&mut self.line, line, value);
        self.transmit_line()
    }

    /// Send every line of an image, top to bottom
    pub fn send_image_frame(
        &mut self,
        image: &FrameBuffer,
        history: Option<&FrameBuffer>,
        stage: Stage,
    ) -> CogResult<I> {
        for line in 0..LINES as u16 {
            self.send_image_line(line, image, history, stage)?;
        }
        Ok(())
    }

    /// Send a fixed byte on every line, top to bottom
    pub fn send_fixed_frame(&mut self, value: u8) -> CogResult<I> {
        for line in 0..LINES as u16 {
            self.send_fixed_line(line, value, false)?;
        }
        Ok(())
    }

    fn start<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        for pin in [
            ControlPin::Reset,
            ControlPin::PanelOn,
            ControlPin::Discharge,
            ControlPin::Border,
            ControlPin::ChipSelect,
        ] {
            self.set_pin(pin, false)?;
        }
        self.write(&[0x00, 0x00])?;
        delay.delay_ms(5);
        self.set_pin(ControlPin::PanelOn, true)?;
        delay.delay_ms(10);

        self.set_pin(ControlPin::Reset, true)?;
        self.set_pin(ControlPin::Border, true)?;
        self.set_pin(ControlPin::ChipSelect, true)?;
        delay.delay_ms(5);
        self.set_pin(ControlPin::Reset, false)?;
        delay.delay_ms(5);
        self.set_pin(ControlPin::Reset, true)?;
        delay.delay_ms(5);

        self.wait_ready(delay)?;

        let cog_id = self.read(&[READ_ID, 0x00])? & COG_ID_MASK;
        if cog_id != COG_ID_G2 {
            return Err(Error::UnsupportedDevice { cog_id });
        }
        self.write_register(OUTPUT_ENABLE, &[OE_DISABLE_INIT])?;

        if self.read_register(STATUS)? & STATUS_PANEL_OK == 0 {
            return Err(Error::PanelBroken);
        }
        self.write_register(POWER_SAVING, &[POWER_SAVING_ON])?;
        self.write_register(CHANNEL_SELECT, &CHANNEL_SELECT_2IN7)?;
        self.write_register(OSCILLATOR, &[OSCILLATOR_HIGH_POWER])?;
        self.write_register(POWER_LEVEL, &[POWER_LEVEL_2IN7])?;
        self.write_register(VCOM_LEVEL, &[VCOM_LEVEL_2IN7])?;
        self.write_register(POWER_CONTROL, &[POWER_SETTING])?;
        self.write_register(DRIVER_LATCH, &[LATCH_ON])?;
        self.write_register(DRIVER_LATCH, &[LATCH_OFF])?;
        delay.delay_ms(5);

        self.start_charge_pumps(delay)
    }

    fn start_charge_pumps<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        for attempt in 1..=DC_RETRIES {
            self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_POSITIVE])?;
            delay.delay_ms(240);
            self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_NEGATIVE])?;
            delay.delay_ms(40);
            self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_VCOM])?;
            delay.delay_ms(40);

            if self.dc_ok()? {
                self.write_register(OUTPUT_ENABLE, &[OE_DISABLE])?;
                debug!("DC/DC up after {} attempt(s)", attempt);
                return Ok(());
            }
            trace!("DC/DC not ready, attempt {}", attempt);
        }
        self.write_register(OUTPUT_ENABLE, &[OE_DISABLE])?;
        Err(Error::DcPowerFailure)
    }

    fn shutdown<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        // nothing frame, then one dummy line
        for line in 0..LINES as u16 {
            self.send_fixed_line(line, 0x00, true)?;
        }
        self.send_fixed_line(DUMMY_LINE, 0x00, true)?;

        self.set_pin(ControlPin::Border, false)?;
        delay.delay_ms(200);
        self.set_pin(ControlPin::Border, true)?;

        if !self.dc_ok()? {
            return Err(Error::DcPowerFailure);
        }

        self.write_register(POWER_SAVING, &[POWER_SAVING_OFF])?;
        self.write_register(DRIVER_LATCH, &[LATCH_ON])?;
        self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_NEGATIVE])?;
        self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_POSITIVE])?;
        delay.delay_ms(120);
        self.write_register(POWER_CONTROL, &[POWER_DISCHARGE])?;
        self.write_register(CHARGE_PUMP, &[CHARGE_PUMP_OFF])?;
        self.write_register(OSCILLATOR, &[OSCILLATOR_OFF])?;
        delay.delay_ms(50);
        Ok(())
    }

    /// Log a fault, run the power-off tail and hand the fault back
    fn abort<D: DelayNs>(&mut self, delay: &mut D, error: Error<I>) -> Error<I> {
        warn!("COG fault: {}", error);
        if let Err(off) = self.power_off(delay) {
            warn!("power off after fault failed: {}", off);
        }
        error
    }

    fn wait_ready<D: DelayNs>(&mut self, delay: &mut D) -> CogResult<I> {
        let mut waited = 0u32;
        while self.interface.is_busy().map_err(Error::Interface)? {
            if waited >= self.busy_timeout_ms {
                return Err(Error::PowerUpTimeout);
            }
            delay.delay_ms(1);
            waited += 1;
        }
        trace!("COG ready after {} ms", waited);
        Ok(())
    }

    fn dc_ok(&mut self) -> Result<bool, Error<I>> {
        Ok(self.read_register(STATUS)? & STATUS_DC_OK != 0)
    }

    fn transmit_line(&mut self) -> CogResult<I> {
        self.write(&SELECT_LINE_DATA)?;
        self.interface
            .write_line(&LINE_HEADER, &self.line)
            .map_err(Error::Interface)?;
        self.write(&OUTPUT_LINE)
    }

    fn write_register(&mut self, register: u8, data: &[u8]) -> CogResult<I> {
        self.write(&[REGISTER_INDEX, register])?;
        self.interface
            .write_line(&[REGISTER_WRITE], data)
            .map_err(Error::Interface)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error<I>> {
        self.write(&[REGISTER_INDEX, register])?;
        self.read(&[REGISTER_READ, 0x00])
    }

    fn write(&mut self, bytes: &[u8]) -> CogResult<I> {
        self.interface.write(bytes).map_err(Error::Interface)
    }

    fn read(&mut self, bytes: &[u8]) -> Result<u8, Error<I>> {
        self.interface.read(bytes).map_err(Error::Interface)
    }

    fn set_pin(&mut self, pin: ControlPin, high: bool) -> CogResult<I> {
        self.interface.set_pin(pin, high).map_err(Error::Interface)
    }
}
