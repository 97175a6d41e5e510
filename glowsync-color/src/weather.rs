//! Maps weather conditions to colors.

use glowsync_api::{color, Error, HueSat, Result, Rgb};
use serde_derive::Deserialize;
use std::{fmt, str::FromStr};

/// The weather conditions a weather entity reports as its state,
/// plus the `OFF` sentinel some hosts use for a disabled entity.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WeatherCondition {
    ClearNight,
    Cloudy,
    Exceptional,
    Fog,
    Hail,
    Lightning,
    LightningRainy,
    PartlyCloudy,
    Pouring,
    Rainy,
    Snowy,
    SnowyRainy,
    Sunny,
    Windy,
    WindyVariant,
    Off,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 16] = [
        WeatherCondition::ClearNight,
        WeatherCondition::Cloudy,
        WeatherCondition::Exceptional,
        WeatherCondition::Fog,
        WeatherCondition::Hail,
        WeatherCondition::Lightning,
        WeatherCondition::LightningRainy,
        WeatherCondition::PartlyCloudy,
        WeatherCondition::Pouring,
        WeatherCondition::Rainy,
        WeatherCondition::Snowy,
        WeatherCondition::SnowyRainy,
        WeatherCondition::Sunny,
        WeatherCondition::Windy,
        WeatherCondition::WindyVariant,
        WeatherCondition::Off,
    ];

    /// Returns the label the host uses for this condition.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::ClearNight => "clear-night",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Exceptional => "exceptional",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Hail => "hail",
            WeatherCondition::Lightning => "lightning",
            WeatherCondition::LightningRainy => "lightning-rainy",
            WeatherCondition::PartlyCloudy => "partlycloudy",
            WeatherCondition::Pouring => "pouring",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snowy => "snowy",
            WeatherCondition::SnowyRainy => "snowy-rainy",
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Windy => "windy",
            WeatherCondition::WindyVariant => "windy-variant",
            WeatherCondition::Off => "OFF",
        }
    }
}

impl FromStr for WeatherCondition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WeatherCondition::ALL
            .iter()
            .find(|c| c.label() == s)
            .copied()
            .ok_or_else(|| {
                Error::ParseError(format!("unknown weather condition '{}'", s))
            })
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Names the built-in color tables.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Teal clouds, orange-red wind, black for anything unrecognized.
    #[default]
    Default,
    /// Gray clouds, blue rain and a gray fallback.
    Classic,
}

/// An ordered table of condition/color pairs and the color used for
/// any condition not in the table. Once built it's never modified.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ColorMapping {
    entries: Vec<(WeatherCondition, Rgb)>,
    fallback: Rgb,
}

impl ColorMapping {
    pub fn new(entries: Vec<(WeatherCondition, Rgb)>, fallback: Rgb) -> Self {
        ColorMapping { entries, fallback }
    }

    pub fn preset(p: Preset) -> Self {
        use WeatherCondition as W;

        match p {
            Preset::Default => ColorMapping::new(
                vec![
                    (W::ClearNight, Rgb::new(25, 25, 112)),
                    (W::Cloudy, Rgb::new(0, 128, 128)),
                    (W::Exceptional, Rgb::new(255, 215, 0)),
                    (W::Fog, Rgb::new(105, 105, 105)),
                    (W::Hail, Rgb::new(135, 206, 250)),
                    (W::Lightning, Rgb::new(255, 255, 0)),
                    (W::LightningRainy, Rgb::new(0, 0, 139)),
                    (W::PartlyCloudy, Rgb::new(250, 250, 210)),
                    (W::Pouring, Rgb::new(70, 130, 180)),
                    (W::Rainy, Rgb::new(30, 144, 255)),
                    (W::Snowy, Rgb::new(255, 250, 250)),
                    (W::SnowyRainy, Rgb::new(176, 224, 230)),
                    (W::Sunny, Rgb::new(255, 255, 0)),
                    (W::Windy, Rgb::new(255, 69, 0)),
                    (W::WindyVariant, Rgb::new(255, 69, 0)),
                    (W::Off, Rgb::new(128, 128, 128)),
                ],
                Rgb::new(0, 0, 0),
            ),
            Preset::Classic => ColorMapping::new(
                vec![
                    (W::ClearNight, Rgb::new(0, 0, 128)),
                    (W::Cloudy, Rgb::new(169, 169, 169)),
                    (W::Exceptional, Rgb::new(255, 0, 0)),
                    (W::Fog, Rgb::new(192, 192, 192)),
                    (W::Hail, Rgb::new(0, 0, 255)),
                    (W::Lightning, Rgb::new(255, 255, 0)),
                    (W::LightningRainy, Rgb::new(0, 128, 128)),
                    (W::PartlyCloudy, Rgb::new(255, 255, 0)),
                    (W::Pouring, Rgb::new(0, 0, 255)),
                    (W::Rainy, Rgb::new(0, 0, 255)),
                    (W::Snowy, Rgb::new(255, 250, 250)),
                    (W::SnowyRainy, Rgb::new(0, 0, 255)),
                    (W::Sunny, Rgb::new(255, 255, 0)),
                    (W::Windy, Rgb::new(255, 69, 0)),
                    (W::WindyVariant, Rgb::new(255, 69, 0)),
                    (W::Off, Rgb::new(128, 128, 128)),
                ],
                Rgb::new(128, 128, 128),
            ),
        }
    }

    /// Returns a copy of the table with some colors replaced. Each
    /// override is a condition label and a color string (a name or
    /// "#RRGGBB".) Conditions missing from the table are appended.
    pub fn with_overrides<'a, I>(&self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut result = self.clone();

        for (label, value) in overrides {
            let cond = label.parse::<WeatherCondition>().map_err(|_| {
                Error::ConfigError(format!(
                    "'{}' isn't a weather condition",
                    label
                ))
            })?;
            let rgb = color::parse_color(value)
                .map_err(|e| Error::ConfigError(e.to_string()))?;

            match result.entries.iter_mut().find(|(c, _)| *c == cond) {
                Some(entry) => entry.1 = rgb,
                None => result.entries.push((cond, rgb)),
            }
        }
        Ok(result)
    }

    /// Returns a copy of the table using a different fallback color.
    pub fn with_fallback(&self, fallback: Rgb) -> Self {
        ColorMapping {
            entries: self.entries.clone(),
            fallback,
        }
    }

    pub fn fallback(&self) -> Rgb {
        self.fallback
    }

    pub fn get(&self, cond: WeatherCondition) -> Option<Rgb> {
        self.entries
            .iter()
            .find(|(c, _)| *c == cond)
            .map(|(_, rgb)| *rgb)
    }

    pub fn entries(&self) -> &[(WeatherCondition, Rgb)] {
        &self.entries
    }
}

impl Default for ColorMapping {
    fn default() -> Self {
        ColorMapping::preset(Preset::Default)
    }
}

/// Answers "what color is this weather?" for any label a weather
/// entity might report. The lookup is total: labels that aren't
/// conditions, and conditions missing from the mapping, get the
/// mapping's fallback color.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct WeatherColorMap {
    mapping: ColorMapping,
}

impl WeatherColorMap {
    pub fn new(mapping: ColorMapping) -> Self {
        WeatherColorMap { mapping }
    }

    pub fn mapping(&self) -> &ColorMapping {
        &self.mapping
    }

    pub fn color_for_condition(&self, condition: &str) -> Rgb {
        condition
            .parse::<WeatherCondition>()
            .ok()
            .and_then(|c| self.mapping.get(c))
            .unwrap_or(self.mapping.fallback)
    }

    pub fn hue_sat_for_condition(&self, condition: &str) -> HueSat {
        color::rgb_to_hs(self.color_for_condition(condition))
    }
}
