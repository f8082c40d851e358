//! Temperature compensation
//!
//! Electrophoretic particles move slower in the cold. Full refresh picks one
//! of three fixed timing profiles by temperature bucket; fast refresh scales
//! its stage time by a factor that shrinks as the panel warms up.

use log::info;

/// Source of the panel temperature
///
/// Sensor drivers deal with their own bus faults and report a best value.
pub trait TemperatureSensor {
    /// Current temperature in whole degrees Celsius
    fn read_celsius(&mut self) -> i16;
}

/// A fixed reading, for boards without a sensor
impl TemperatureSensor for i16 {
    fn read_celsius(&mut self) -> i16 {
        *self
    }
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    fn read_celsius(&mut self) -> i16 {
        (**self).read_celsius()
    }
}

/// Temperature range selecting a full-refresh profile
///
/// Bounds are half-open: `[-inf, 10)`, `[10, 40)`, `[40, inf)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemperatureBucket {
    /// Below 10 °C
    Cold,
    /// 10 °C up to 40 °C
    Normal,
    /// 40 °C and above
    Hot,
}

impl TemperatureBucket {
    /// Bucket for a temperature in °C
    pub fn from_celsius(celsius: i16) -> Self {
        if celsius < 10 {
            Self::Cold
        } else if celsius < 40 {
            Self::Normal
        } else {
            Self::Hot
        }
    }
}

/// Windowed data stage timing (full refresh stages 1 and 3)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageProfile {
    /// Passes over the panel
    pub repeat: u16,
    /// Lines the window advances per block
    pub step: u16,
    /// Window height in lines
    pub block: u16,
}

/// Timed flash stage timing (full refresh stage 2)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashProfile {
    /// Number of black/white flash pairs
    pub repeat: u16,
    /// Time to hold the black flash
    pub t1_ms: u32,
    /// Time to hold the white flash
    pub t2_ms: u32,
}

/// Full-refresh timing for one temperature bucket
///
/// These numbers are an empirical calibration; they are not derived from
/// anything and must not be tuned without a panel at hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompensationProfile {
    /// Stage 1: drive the old image out
    pub stage1: StageProfile,
    /// Stage 2: black/white flashes
    pub stage2: FlashProfile,
    /// Stage 3: drive the new image in
    pub stage3: StageProfile,
}

const fn stage(repeat: u16, step: u16, block: u16) -> StageProfile {
    StageProfile {
        repeat,
        step,
        block,
    }
}

const fn flash(repeat: u16, t1_ms: u32, t2_ms: u32) -> FlashProfile {
    FlashProfile {
        repeat,
        t1_ms,
        t2_ms,
    }
}

const COLD: CompensationProfile = CompensationProfile {
    stage1: stage(2, 8, 64),
    stage2: flash(4, 392, 392),
    stage3: stage(2, 8, 64),
};

const NORMAL: CompensationProfile = CompensationProfile {
    stage1: stage(2, 4, 32),
    stage2: flash(4, 196, 196),
    stage3: stage(2, 4, 32),
};

const HOT: CompensationProfile = CompensationProfile {
    stage1: stage(4, 8, 64),
    stage2: flash(4, 196, 196),
    stage3: stage(4, 8, 64),
};

impl CompensationProfile {
    /// Profile for a temperature bucket
    pub const fn for_bucket(bucket: TemperatureBucket) -> Self {
        match bucket {
            TemperatureBucket::Cold => COLD,
            TemperatureBucket::Normal => NORMAL,
            TemperatureBucket::Hot => HOT,
        }
    }

    /// Profile for a temperature in °C
    pub fn for_temperature(celsius: i16) -> Self {
        let bucket = TemperatureBucket::from_celsius(celsius);
        info!("compensation profile {:?} for {} C", bucket, celsius);
        Self::for_bucket(bucket)
    }
}

impl Default for CompensationProfile {
    fn default() -> Self {
        NORMAL
    }
}

/// Fast-refresh stage time multiplier, times ten
pub fn temperature_factor_10x(celsius: i16) -> u32 {
    match celsius {
        i16::MIN..=-10 => 170,
        -9..=-5 => 120,
        -4..=5 => 80,
        6..=10 => 40,
        11..=15 => 30,
        16..=20 => 20,
        21..=40 => 10,
        _ => 7,
    }
}

/// Fast-refresh stage time for a base time and temperature
pub fn stage_time_ms(base_ms: u32, celsius: i16) -> u32 {
    base_ms.saturating_mul(temperature_factor_10x(celsius)) / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(TemperatureBucket::from_celsius(5), TemperatureBucket::Cold);
        assert_eq!(TemperatureBucket::from_celsius(9), TemperatureBucket::Cold);
        assert_eq!(
            TemperatureBucket::from_celsius(10),
            TemperatureBucket::Normal
        );
        assert_eq!(
            TemperatureBucket::from_celsius(39),
            TemperatureBucket::Normal
        );
        assert_eq!(TemperatureBucket::from_celsius(40), TemperatureBucket::Hot);
        assert_eq!(TemperatureBucket::from_celsius(42), TemperatureBucket::Hot);
    }

    #[test]
    fn test_profiles() {
        let cold = CompensationProfile::for_temperature(5);
        assert_eq!(cold.stage1, stage(2, 8, 64));
        assert_eq!(cold.stage2.t1_ms, 392);

        let normal = CompensationProfile::for_temperature(10);
        assert_eq!(normal.stage3, stage(2, 4, 32));
        assert_eq!(normal.stage2, flash(4, 196, 196));

        let hot = CompensationProfile::for_temperature(42);
        assert_eq!(hot.stage1.repeat, 4);
    }

    #[test]
    fn test_factor_is_monotonic() {
        let mut last = u32::MAX;
        for t in -30..=60 {
            let factor = temperature_factor_10x(t);
            assert!(factor <= last, "factor rose at {t}");
            last = factor;
        }
    }

    #[test]
    fn test_factor_boundaries() {
        assert_eq!(temperature_factor_10x(-10), 170);
        assert_eq!(temperature_factor_10x(-5), 120);
        assert_eq!(temperature_factor_10x(5), 80);
        assert_eq!(temperature_factor_10x(10), 40);
        assert_eq!(temperature_factor_10x(20), 20);
        assert_eq!(temperature_factor_10x(40), 10);
        assert_eq!(temperature_factor_10x(41), 7);
    }

    #[test]
    fn test_stage_time() {
        assert_eq!(stage_time_ms(630, 25), 630);
        assert_eq!(stage_time_ms(630, 0), 5040);
        assert_eq!(stage_time_ms(630, 45), 441);
    }

    #[test]
    fn test_fixed_reading() {
        let mut sensor: i16 = -3;
        assert_eq!(sensor.read_celsius(), -3);
    }
}
