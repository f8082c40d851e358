//! Panel geometry and driver configuration
//!
//! The 2.7 inch panel has a fixed geometry: 176 gate lines of 264 pixels.
//! Only the refresh discipline and its timing are configurable.

pub use crate::error::BuilderError;

/// Number of gate lines (rows)
pub const LINES: usize = 176;

/// Pixels per line (columns)
pub const BITS_PER_LINE: usize = 264;

/// Bytes of pixel data per line (one bit per pixel)
pub const BYTES_PER_LINE: usize = BITS_PER_LINE / 8;

/// Scan-select bytes per line payload (2 bits per gate line)
pub const BYTES_PER_SCAN: usize = LINES / 4;

/// Frame buffer size in bytes
pub const BUFFER_SIZE: usize = BYTES_PER_LINE * LINES;

/// Line payload size: odd pixels, scan bytes, even pixels
pub const LINE_BUFFER_SIZE: usize = BYTES_PER_LINE * 2 + BYTES_PER_SCAN;

/// Fast-mode stage time before temperature scaling, in milliseconds
pub const DEFAULT_STAGE_TIME_MS: u32 = 630;

/// Default bound on the power-up busy poll, in milliseconds
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 3_000;

/// Refresh discipline
///
/// The two disciplines trade refresh time against ghosting and differ in who
/// owns the power bracket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// Three-stage full-frame refresh (~3s, no ghosting)
    ///
    /// Every [`show`](crate::Display::show) powers the COG up and down itself.
    #[default]
    Full,
    /// Partial refresh from the previously shown image
    ///
    /// The caller holds the panel powered across several updates with
    /// [`with_power`](crate::Display::with_power).
    Fast,
}

/// Display configuration
///
/// Use [`Builder`] to create a Config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Refresh discipline
    pub mode: RefreshMode,
    /// Fast-mode stage time before temperature scaling
    pub base_stage_time_ms: u32,
    /// Scale the fast-mode stage time by the panel temperature
    pub compensate_temperature: bool,
    /// Maximum time to wait for the COG busy line after reset
    pub busy_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RefreshMode::Full,
            base_stage_time_ms: DEFAULT_STAGE_TIME_MS,
            compensate_temperature: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```
/// use pdi_epd2in7::{Builder, RefreshMode};
///
/// let config = match Builder::new().mode(RefreshMode::Fast).stage_time_ms(400).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert!(!config.compensate_temperature);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    mode: RefreshMode,
    /// Fixed stage time; `None` keeps the default and enables compensation
    stage_time_ms: Option<u32>,
    busy_timeout_ms: Option<u32>,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refresh discipline
    pub fn mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    /// Use a fixed fast-mode stage time
    ///
    /// Disables temperature compensation. Only valid in [`RefreshMode::Fast`].
    pub fn stage_time_ms(mut self, ms: u32) -> Self {
        self.stage_time_ms = Some(ms);
        self
    }

    /// Set the power-up busy-wait bound
    pub fn busy_timeout_ms(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// - `BuilderError::StageTimeInFullMode` if a stage time was set for full mode
    /// - `BuilderError::InvalidStageTime` if the stage time is zero
    /// - `BuilderError::InvalidBusyTimeout` if the busy timeout is zero
    pub fn build(self) -> Result<Config, BuilderError> {
        let mut config = Config {
            mode: self.mode,
            ..Config::default()
        };

        if let Some(ms) = self.stage_time_ms {
            if self.mode == RefreshMode::Full {
                return Err(BuilderError::StageTimeInFullMode);
            }
            if ms == 0 {
                return Err(BuilderError::InvalidStageTime);
            }
            config.base_stage_time_ms = ms;
            config.compensate_temperature = false;
        }

        if let Some(ms) = self.busy_timeout_ms {
            if ms == 0 {
                return Err(BuilderError::InvalidBusyTimeout);
            }
            config.busy_timeout_ms = ms;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        assert_eq!(BYTES_PER_LINE, 33);
        assert_eq!(BYTES_PER_SCAN, 44);
        assert_eq!(BUFFER_SIZE, 5808);
        assert_eq!(LINE_BUFFER_SIZE, 110);
    }

    #[test]
    fn test_default_config() {
        let config = Builder::new().build().unwrap();
        assert_eq!(config.mode, RefreshMode::Full);
        assert_eq!(config.base_stage_time_ms, DEFAULT_STAGE_TIME_MS);
        assert!(config.compensate_temperature);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_stage_time_disables_compensation() {
        let config = Builder::new()
            .mode(RefreshMode::Fast)
            .stage_time_ms(300)
            .build()
            .unwrap();
        assert_eq!(config.base_stage_time_ms, 300);
        assert!(!config.compensate_temperature);
    }

    #[test]
    fn test_stage_time_rejected_in_full_mode() {
        let result = Builder::new().stage_time_ms(300).build();
        assert!(matches!(result, Err(BuilderError::StageTimeInFullMode)));
    }

    #[test]
    fn test_zero_values_rejected() {
        let result = Builder::new()
            .mode(RefreshMode::Fast)
            .stage_time_ms(0)
            .build();
        assert!(matches!(result, Err(BuilderError::InvalidStageTime)));

        let result = Builder::new().busy_timeout_ms(0).build();
        assert!(matches!(result, Err(BuilderError::InvalidBusyTimeout)));
    }
}
