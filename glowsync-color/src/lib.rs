//! Turns images, weather conditions and song titles into light
//! colors.
//!
//! Everything in this crate is a pure function of its inputs except
//! the random fallback color of `ColorExtractor`. Nothing here talks
//! to the host platform; the switches in `glowsync-switch` fetch the
//! inputs and dispatch the results.

pub mod brightness;
pub mod extract;
pub mod title;
pub mod weather;

pub use brightness::{BrightnessPolicy, Direction};
pub use extract::{ColorExtractor, Fallback};
pub use title::TitleColorMap;
pub use weather::{ColorMapping, Preset, WeatherColorMap, WeatherCondition};
