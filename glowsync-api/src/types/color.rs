//! Color types used when talking to lights.
//!
//! Colors travel through glowsync as `palette::Srgb<u8>`. Some lights
//! (or some host configurations) want hue/saturation instead, so
//! this module also provides `HueSat` and the conversion to it.

use crate::{types::Error, Result};
use serde_derive::Serialize;
use std::fmt;

/// An 8-bit-per-channel color in the sRGB color space.
pub type Rgb = palette::Srgb<u8>;

/// A hue, in whole degrees [0, 360), and saturation, in whole
/// percent [0, 100]. Serializes as a two element array, which is the
/// form lights expect in an `hs_color` field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub struct HueSat(pub u16, pub u8);

impl HueSat {
    pub fn hue(&self) -> u16 {
        self.0
    }

    pub fn saturation(&self) -> u8 {
        self.1
    }
}

impl fmt::Display for HueSat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}°, {}%)", self.0, self.1)
    }
}

/// Converts an RGB color to hue and saturation. The conversion is
/// the standard HSV transform on channels normalized to [0, 1]; the
/// value channel is dropped. Both results are truncated, not
/// rounded, so `(30, 144, 255)` becomes `(209, 88)`.
pub fn rgb_to_hs(rgb: Rgb) -> HueSat {
    let r = rgb.red as f64 / 255.0;
    let g = rgb.green as f64 / 255.0;
    let b = rgb.blue as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max == min {
        return HueSat(0, 0);
    }

    let range = max - min;
    let rc = (max - r) / range;
    let gc = (max - g) / range;
    let bc = (max - b) / range;

    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    let hue = (((h / 6.0).rem_euclid(1.0) * 360.0) as u16).min(359);
    let sat = ((range / max * 100.0) as u8).min(100);

    HueSat(hue, sat)
}

/// Formats a color the way it's written in config files.
pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

// Parses the six hex digits of an "#RRGGBB" string. The caller has
// already stripped the '#' and verified the length.

fn parse_hex(s: &[u8]) -> Option<Rgb> {
    let mut result = 0u32;

    for ii in s {
        if ii.is_ascii_digit() {
            result = (result << 4) + (ii - b'0') as u32;
        } else if (b'A'..=b'F').contains(ii) {
            result = (result << 4) + (ii - b'A' + 10) as u32;
        } else if (b'a'..=b'f').contains(ii) {
            result = (result << 4) + (ii - b'a' + 10) as u32;
        } else {
            return None;
        }
    }

    Some(Rgb::new((result >> 16) as u8, (result >> 8) as u8, result as u8))
}

/// Parses a color from a config string. Two forms are accepted:
/// "#RRGGBB", where each pair is two hex digits, and any of the SVG
/// color names ("teal", "navy", "darkgray", ...) that `palette`
/// knows about.
pub fn parse_color(s: &str) -> Result<Rgb> {
    let found = match s.as_bytes() {
        tmp @ &[b'#', _, _, _, _, _, _] => parse_hex(&tmp[1..]),
        _ => palette::named::from_str(&s.to_ascii_lowercase()),
    };

    found.ok_or_else(|| Error::ParseError(format!("unknown color '{}'", s)))
}
