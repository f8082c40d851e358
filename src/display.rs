//! Core display operations
//!
//! [`Display`] owns the COG, the two frame buffers and the collaborators the
//! refresh loops need: a [`TemperatureSensor`] and a [`Scheduler`].
//!
//! ## Full mode
//!
//! [`Display::show`] powers the COG up, runs the three-stage refresh and
//! powers it down again. Nothing else needs to be managed.
//!
//! ## Fast mode
//!
//! The panel stays powered inside [`Display::with_power`] and is updated by
//! driving it from the previously shown image to the new one. The second
//! frame buffer holds that previous image.
//!
//! ```rust,no_run
//! use embedded_hal::delay::DelayNs;
//! use pdi_epd2in7::{Builder, CogInterface, ControlPin, Display, RefreshMode, Scheduler};
//! # use core::convert::Infallible;
//! # struct Cog;
//! # impl CogInterface for Cog {
//! #     type Error = Infallible;
//! #     fn write(&mut self, _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn write_line(&mut self, _: &[u8], _: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn read(&mut self, _: &[u8]) -> Result<u8, Infallible> { Ok(0xC2) }
//! #     fn set_pin(&mut self, _: ControlPin, _: bool) -> Result<(), Infallible> { Ok(()) }
//! #     fn is_busy(&mut self) -> Result<bool, Infallible> { Ok(false) }
//! # }
//! # struct Clock(u32);
//! # impl Scheduler for Clock { fn now_ms(&mut self) -> u32 { self.0 += 100; self.0 } }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let mut delay = MockDelay;
//! let config = match Builder::new().mode(RefreshMode::Fast).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//! // A fixed 20 °C reading stands in for a sensor
//! let mut display = Display::new(Cog, 20i16, Clock(0), config);
//!
//! let _ = display.with_power(&mut delay, |display, delay| {
//!     display.frame_mut().set_pixel(10, 10, true);
//!     display.show(delay)?;
//!
//!     display.frame_mut().set_pixel(20, 20, true);
//!     display.exchange(delay, true)
//! });
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace, warn};

use crate::cog::Cog;
use crate::compensation::{self, CompensationProfile, StageProfile, TemperatureSensor};
use crate::config::{Config, LINES, RefreshMode};
use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::interface::CogInterface;
use crate::scheduler::Scheduler;
use crate::waveform::Stage;

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Hardware fault that left the COG powered off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The COG ID did not match
    UnsupportedDevice,
    /// The COG reported a broken panel
    PanelBroken,
    /// The DC/DC converter failed
    DcPowerFailure,
    /// BUSY never dropped
    PowerUpTimeout,
    /// The bus or a pin failed
    Interface,
}

impl Fault {
    fn of<I: CogInterface>(error: &Error<I>) -> Self {
        match error {
            Error::UnsupportedDevice { .. } => Self::UnsupportedDevice,
            Error::PanelBroken => Self::PanelBroken,
            Error::DcPowerFailure => Self::DcPowerFailure,
            Error::PowerUpTimeout => Self::PowerUpTimeout,
            Error::Interface(_) | Error::InvalidState { .. } | Error::UnsupportedMode => {
                Self::Interface
            }
        }
    }
}

/// COG power state
///
/// ```text
/// Off -> PoweringUp -> Ready -> Refreshing -> Ready -> PoweringDown -> Off
///                   \-> Faulted                                   \-> Faulted
/// ```
///
/// A faulted COG is powered off and may be powered up again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PowerState {
    /// Unpowered
    #[default]
    Off,
    /// Running the power-up sequence
    PoweringUp,
    /// Powered and idle
    Ready,
    /// Sending a waveform
    Refreshing,
    /// Running the power-down sequence
    PoweringDown,
    /// Powered off after a fault
    Faulted(Fault),
}

/// What a timed fast-mode stage sends each frame
#[derive(Clone, Copy, Debug)]
enum FrameSource {
    /// The same byte everywhere
    Fixed(u8),
    /// The current image, optionally against the previous one
    Image { history: bool },
}

/// Display driver for the 2.7 inch G2 panel
///
/// ## Type Parameters
///
/// * `I` - Interface implementing [`CogInterface`]
/// * `T` - Temperature source implementing [`TemperatureSensor`]
/// * `S` - Clock and yield hook implementing [`Scheduler`]
pub struct Display<I, T, S> {
    cog: Cog<I>,
    sensor: T,
    scheduler: S,
    config: Config,
    state: PowerState,
    profile: CompensationProfile,
    stage_time_ms: u32,
    frames: [FrameBuffer; 2],
    /// Index of the buffer being drawn; the other holds the shown image
    current: usize,
}

impl<I, T, S> Display<I, T, S>
where
    I: CogInterface,
    T: TemperatureSensor,
    S: Scheduler,
{
    /// Create a new Display with both frame buffers white
    pub fn new(interface: I, sensor: T, scheduler: S, config: Config) -> Self {
        Self {
            cog: Cog::new(interface, config.busy_timeout_ms),
            sensor,
            scheduler,
            stage_time_ms: config.base_stage_time_ms,
            config,
            state: PowerState::Off,
            profile: CompensationProfile::default(),
            frames: [FrameBuffer::new(), FrameBuffer::new()],
            current: 0,
        }
    }

    /// Give back the interface, sensor and scheduler
    pub fn release(self) -> (I, T, S) {
        (self.cog.release(), self.sensor, self.scheduler)
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current power state
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Full-refresh profile chosen at the last power-up
    pub fn profile(&self) -> CompensationProfile {
        self.profile
    }

    /// Fast-refresh stage time in use
    pub fn stage_time_ms(&self) -> u32 {
        self.stage_time_ms
    }

    /// Read the panel temperature in °C
    pub fn temperature(&mut self) -> i16 {
        self.sensor.read_celsius()
    }

    /// The image being drawn
    pub fn frame(&self) -> &FrameBuffer {
        &self.frames[self.current]
    }

    /// The image being drawn, for drawing
    pub fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frames[self.current]
    }

    /// The image last shown on the panel (fast mode)
    pub fn previous_frame(&self) -> &FrameBuffer {
        &self.frames[self.current ^ 1]
    }

    /// Power up, run `f`, and power down on every exit path
    ///
    /// Fast-mode operations may only be called inside this bracket. The
    /// closure's error wins over a power-down error.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedMode`] in full mode, where [`show`](Self::show) brackets itself
    /// - Any power-up fault; `f` is not run
    /// - Whatever `f` returns, or a power-down fault
    pub fn with_power<D, R, F>(&mut self, delay: &mut D, f: F) -> Result<R, Error<I>>
    where
        D: DelayNs,
        F: FnOnce(&mut Self, &mut D) -> Result<R, Error<I>>,
    {
        if self.config.mode != RefreshMode::Fast {
            return Err(Error::UnsupportedMode);
        }
        self.bracket(delay, f)
    }

    /// Show the current image
    ///
    /// In full mode this is a complete power-up, three-stage refresh and
    /// power-down. In fast mode the panel is first driven white, then the
    /// image is written; afterwards the image becomes the previous one and
    /// the drawing buffer is cleared.
    ///
    /// # Errors
    ///
    /// In fast mode, [`Error::InvalidState`] outside [`with_power`](Self::with_power).
    /// Any hardware fault, after the panel has been powered off.
    pub fn show<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        match self.config.mode {
            RefreshMode::Full => self.bracket(delay, |display, _| {
                display.refreshing(|display| display.full_update())
            }),
            RefreshMode::Fast => self.fast(delay, |display| {
                display.drive_white()?;
                display.timed_stage(FrameSource::Fixed(0xAA), Stage::Compensate)?;
                display.timed_stage(FrameSource::Fixed(0xAA), Stage::White)?;
                display.timed_stage(FrameSource::Image { history: false }, Stage::Inverse)?;
                display.timed_stage(FrameSource::Image { history: false }, Stage::Normal)?;
                display.swap();
                display.frame_mut().clear();
                Ok(())
            }),
        }
    }

    /// Clear the drawing buffer and optionally the panel
    ///
    /// With `both`, the previous image is cleared as well. With `show`, the
    /// panel is driven white: a full refresh in full mode, fixed frames in
    /// fast mode.
    ///
    /// The text cursor belongs to a [`TextWriter`](crate::TextWriter) and is
    /// left where it is; call its `locate(0, 0)` to start writing from the
    /// top again.
    ///
    /// # Errors
    ///
    /// As [`show`](Self::show) when `show` is set.
    pub fn clear_screen<D: DelayNs>(
        &mut self,
        delay: &mut D,
        show: bool,
        both: bool,
    ) -> DisplayResult<I> {
        if both {
            for frame in &mut self.frames {
                frame.clear();
            }
            self.current = 0;
        } else {
            self.frame_mut().clear();
        }
        if !show {
            return Ok(());
        }
        match self.config.mode {
            RefreshMode::Full => self.show(delay),
            RefreshMode::Fast => self.clear_panel(delay),
        }
    }

    /// Drive the whole panel white without touching the buffers (fast mode)
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMode`] in full mode, [`Error::InvalidState`]
    /// outside [`with_power`](Self::with_power), or a hardware fault.
    pub fn clear_panel<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.fast(delay, Self::drive_white)
    }

    /// Update the panel from the previous image to the current one (fast mode)
    ///
    /// With `fast`, only the settling stage is run against the previous
    /// image. Otherwise the previous image is compensated out first. In both
    /// cases the current image is then copied into the previous buffer and
    /// remains available for further drawing.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMode`] in full mode, [`Error::InvalidState`]
    /// outside [`with_power`](Self::with_power), or a hardware fault.
    pub fn refresh<D: DelayNs>(&mut self, delay: &mut D, fast: bool) -> DisplayResult<I> {
        self.fast(delay, |display| {
            let with_history = FrameSource::Image { history: true };
            if !fast {
                display.swap();
                display.timed_stage(with_history, Stage::Compensate)?;
                display.timed_stage(with_history, Stage::White)?;
                display.swap();
                display.timed_stage(with_history, Stage::Inverse)?;
                display.timed_stage(with_history, Stage::Normal)?;
            }
            display.timed_stage(with_history, Stage::Normal)?;
            let current = display.current;
            display.frames[current ^ 1] = display.frames[current].clone();
            Ok(())
        })
    }

    /// Replace the previous image with the current one (fast mode)
    ///
    /// Runs all four stages without history masks, then swaps the buffers.
    /// With `clear_data`, the new drawing buffer starts white; otherwise it
    /// holds the image that was just replaced.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedMode`] in full mode, [`Error::InvalidState`]
    /// outside [`with_power`](Self::with_power), or a hardware fault.
    pub fn exchange<D: DelayNs>(&mut self, delay: &mut D, clear_data: bool) -> DisplayResult<I> {
        self.fast(delay, |display| {
            let image = FrameSource::Image { history: false };
            display.swap();
            display.timed_stage(image, Stage::Compensate)?;
            display.timed_stage(image, Stage::White)?;
            display.swap();
            display.timed_stage(image, Stage::Inverse)?;
            display.timed_stage(image, Stage::Normal)?;
            display.swap();
            if clear_data {
                display.frame_mut().clear();
            }
            Ok(())
        })
    }

    fn swap(&mut self) {
        self.current ^= 1;
    }

    fn bracket<D, R, F>(&mut self, delay: &mut D, f: F) -> Result<R, Error<I>>
    where
        D: DelayNs,
        F: FnOnce(&mut Self, &mut D) -> Result<R, Error<I>>,
    {
        self.power_up(delay)?;
        let result = f(self, delay);
        if self.state != PowerState::Ready {
            // a failed fast operation has already powered down
            return result;
        }
        let down = self.power_down(delay);
        match (result, down) {
            (Err(error), Err(down)) => {
                warn!("power down after error failed: {}", down);
                Err(error)
            }
            (Err(error), Ok(())) => Err(error),
            (Ok(_), Err(down)) => Err(down),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    fn power_up<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        if !matches!(self.state, PowerState::Off | PowerState::Faulted(_)) {
            return Err(Error::InvalidState { state: self.state });
        }
        self.state = PowerState::PoweringUp;
        if let Err(error) = self.cog.power_up(delay) {
            self.state = PowerState::Faulted(Fault::of(&error));
            return Err(error);
        }

        let celsius = self.sensor.read_celsius();
        match self.config.mode {
            RefreshMode::Full => self.profile = CompensationProfile::for_temperature(celsius),
            RefreshMode::Fast => self.update_stage_time(celsius),
        }
        self.state = PowerState::Ready;
        debug!("COG ready");
        Ok(())
    }

    fn power_down<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        if self.state != PowerState::Ready {
            return Err(Error::InvalidState { state: self.state });
        }
        self.state = PowerState::PoweringDown;
        match self.cog.power_down(delay) {
            Ok(()) => {
                self.state = PowerState::Off;
                Ok(())
            }
            Err(error) => {
                self.state = PowerState::Faulted(Fault::of(&error));
                Err(error)
            }
        }
    }

    fn update_stage_time(&mut self, celsius: i16) {
        if self.config.compensate_temperature {
            self.stage_time_ms =
                compensation::stage_time_ms(self.config.base_stage_time_ms, celsius);
        }
        info!("fast stage time {} ms", self.stage_time_ms);
    }

    /// Mark the COG busy for the duration of `op`
    fn refreshing(&mut self, op: impl FnOnce(&mut Self) -> DisplayResult<I>) -> DisplayResult<I> {
        self.state = PowerState::Refreshing;
        let result = op(self);
        self.state = PowerState::Ready;
        result
    }

    /// Run a fast-mode operation; a failure powers the COG down
    fn fast<D: DelayNs>(
        &mut self,
        delay: &mut D,
        op: impl FnOnce(&mut Self) -> DisplayResult<I>,
    ) -> DisplayResult<I> {
        if self.config.mode != RefreshMode::Fast {
            return Err(Error::UnsupportedMode);
        }
        if self.state != PowerState::Ready {
            return Err(Error::InvalidState { state: self.state });
        }
        if self.config.compensate_temperature {
            let celsius = self.sensor.read_celsius();
            self.update_stage_time(celsius);
        }

        let result = self.refreshing(op);
        if let Err(error) = &result {
            warn!("refresh failed: {}", error);
            if let Err(down) = self.power_down(delay) {
                warn!("power down after refresh failure failed: {}", down);
            }
        }
        result
    }

    fn drive_white(&mut self) -> DisplayResult<I> {
        self.timed_stage(FrameSource::Fixed(0xFF), Stage::Compensate)?;
        self.timed_stage(FrameSource::Fixed(0xFF), Stage::White)?;
        self.timed_stage(FrameSource::Fixed(0xAA), Stage::Inverse)?;
        self.timed_stage(FrameSource::Fixed(0xAA), Stage::Normal)
    }

    /// Repeat whole frames until the stage time has passed, at least once
    fn timed_stage(&mut self, source: FrameSource, stage: Stage) -> DisplayResult<I> {
        let start = self.scheduler.now_ms();
        let mut frames = 0u32;
        loop {
            match source {
                FrameSource::Fixed(value) => self.cog.send_fixed_frame(value)?,
                FrameSource::Image { history } => {
                    let current = &self.frames[self.current];
                    let previous = &self.frames[self.current ^ 1];
                    self.cog
                        .send_image_frame(current, history.then_some(previous), stage)?;
                }
            }
            frames += 1;
            self.scheduler.yield_now();
            if self.scheduler.elapsed_ms(start) > self.stage_time_ms {
                break;
            }
        }
        trace!("{:?} stage: {} frames", stage, frames);
        Ok(())
    }

    /// Three-stage full refresh of the current image
    fn full_update(&mut self) -> DisplayResult<I> {
        let profile = self.profile;
        debug!("full refresh: stage 1");
        self.windowed_stage(Stage::Compensate, profile.stage1)?;

        debug!("full refresh: stage 2");
        for _ in 0..profile.stage2.repeat {
            self.timed_flash(0xFF, profile.stage2.t1_ms)?;
            self.timed_flash(0xAA, profile.stage2.t2_ms)?;
            self.scheduler.yield_now();
        }

        debug!("full refresh: stage 3");
        self.windowed_stage(Stage::Normal, profile.stage3)
    }

    /// Sliding-window pass: the leading `step` lines of a full window are
    /// sent as fixed lines, the rest carry image data
    fn windowed_stage(&mut self, stage: Stage, profile: StageProfile) -> DisplayResult<I> {
        for pass in 0..profile.repeat {
            for (lines, full) in windows(profile.step, profile.block) {
                let fixed_until = if full {
                    lines.start + profile.step
                } else {
                    lines.start
                };
                for line in lines {
                    if line < fixed_until {
                        self.cog.send_fixed_line(line, 0x00, false)?;
                    } else {
                        self.cog
                            .send_image_line(line, &self.frames[self.current], None, stage)?;
                    }
                }
            }
            trace!("{:?} pass {} done", stage, pass);
            self.scheduler.yield_now();
        }
        Ok(())
    }

    /// Fixed frames, bottom line first, until `time_ms` has passed
    fn timed_flash(&mut self, value: u8, time_ms: u32) -> DisplayResult<I> {
        let start = self.scheduler.now_ms();
        loop {
            for line in (0..LINES as u16).rev() {
                self.cog.send_fixed_line(line, value, false)?;
            }
            if self.scheduler.elapsed_ms(start) >= time_ms {
                return Ok(());
            }
        }
    }
}

/// Line windows of a full-refresh data stage
///
/// Yields each window's lines clipped to the panel, and whether the window
/// has reached its full `block` height.
fn windows(step: u16, block: u16) -> impl Iterator<Item = (core::ops::Range<u16>, bool)> {
    let lines = LINES as u16;
    let mut end = 0u16;
    core::iter::from_fn(move || {
        if step == 0 {
            return None;
        }
        end = end.saturating_add(step);
        let begin = end.saturating_sub(block);
        if begin >= lines {
            return None;
        }
        Some((begin..end.min(lines), end - begin == block))
    })
}
