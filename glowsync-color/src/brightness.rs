//! Computes light brightness from an outside temperature.

use glowsync_api::{Error, Result};
use std::fmt;

/// Temperatures, in °C, at the ends of the brightness scale.
/// Anything outside is clamped.
pub const MIN_TEMP: f64 = -20.0;
pub const MAX_TEMP: f64 = 40.0;

/// Which end of the temperature range gets full brightness.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Direction {
    #[default]
    ColderBrighter,
    WarmerBrighter,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BrightnessPolicy {
    /// Scale brightness with the temperature.
    Temperature(Direction),
    /// Always use this brightness.
    Fixed(u8),
    /// Leave brightness out of the command so the light keeps its
    /// own setting.
    Full,
}

impl Default for BrightnessPolicy {
    fn default() -> Self {
        BrightnessPolicy::Temperature(Direction::default())
    }
}

impl BrightnessPolicy {
    /// Returns the brightness for a temperature reading. A missing
    /// reading gives full brightness, as does the `Full` policy.
    pub fn brightness_for_temperature(&self, temp: Option<f64>) -> u8 {
        match (self, temp) {
            (BrightnessPolicy::Fixed(v), _) => *v,
            (BrightnessPolicy::Full, _) | (_, None) => 255,
            (BrightnessPolicy::Temperature(dir), Some(t)) => {
                let scaled = (normalize(t) * 255.0) as u8;

                match dir {
                    Direction::ColderBrighter => 255 - scaled,
                    Direction::WarmerBrighter => scaled,
                }
            }
        }
    }

    /// Returns the brightness field of a "turn on" command.
    pub fn for_command(&self, temp: Option<f64>) -> Option<u8> {
        match self {
            BrightnessPolicy::Full => None,
            _ => Some(self.brightness_for_temperature(temp)),
        }
    }

    /// Parses the config form: "colder-brighter", "warmer-brighter",
    /// "full" or a number from 0 to 255.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "colder-brighter" => {
                Ok(BrightnessPolicy::Temperature(Direction::ColderBrighter))
            }
            "warmer-brighter" => {
                Ok(BrightnessPolicy::Temperature(Direction::WarmerBrighter))
            }
            "full" => Ok(BrightnessPolicy::Full),
            _ => s.parse::<u8>().map(BrightnessPolicy::Fixed).map_err(|_| {
                Error::ConfigError(format!("bad brightness setting '{}'", s))
            }),
        }
    }
}

impl fmt::Display for BrightnessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrightnessPolicy::Temperature(Direction::ColderBrighter) => {
                write!(f, "colder-brighter")
            }
            BrightnessPolicy::Temperature(Direction::WarmerBrighter) => {
                write!(f, "warmer-brighter")
            }
            BrightnessPolicy::Fixed(v) => write!(f, "{}", v),
            BrightnessPolicy::Full => write!(f, "full"),
        }
    }
}

// Maps a temperature onto [0, 1]. NaN, which `clamp` passes through,
// is treated as the cold end.

fn normalize(temp: f64) -> f64 {
    let v = ((temp - MIN_TEMP) / (MAX_TEMP - MIN_TEMP)).clamp(0.0, 1.0);

    if v.is_nan() {
        0.0
    } else {
        v
    }
}
