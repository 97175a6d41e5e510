//! Finds the dominant color of a piece of media artwork.
//!
//! The dominant color is the pixel value that occurs most often.
//! Ties go to the value seen first while scanning the image in
//! row-major order, so identical bytes always give the identical
//! color. Large images are counted in coarse buckets first and the
//! winning bucket is then resolved to its most frequent exact value.

use glowsync_api::{color, Error, Result, Rgb};
use rand::Rng;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};

/// Images with more pixels than this are counted in quantized
/// buckets.
pub const EXACT_PIXEL_LIMIT: u64 = 256 * 256;

// Number of low bits dropped from each channel when bucketing.

const BUCKET_SHIFT: u32 = 3;

/// The color used when an image has no meaningful dominant color
/// (grayscale, images with alpha) or can't be decoded at all.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Fallback {
    /// Pick a uniformly random color each time.
    #[default]
    Random,
    /// Always use this color.
    Fixed(Rgb),
}

impl Fallback {
    pub fn color(&self) -> Rgb {
        match self {
            Fallback::Random => {
                let mut rng = rand::thread_rng();

                Rgb::new(rng.gen(), rng.gen(), rng.gen())
            }
            Fallback::Fixed(v) => *v,
        }
    }

    /// Parses the config form: "random", a color name, or "#RRGGBB".
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("random") {
            Ok(Fallback::Random)
        } else {
            color::parse_color(s).map(Fallback::Fixed)
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ColorExtractor {
    fallback: Fallback,
}

impl ColorExtractor {
    pub fn new(fallback: Fallback) -> Self {
        ColorExtractor { fallback }
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Decodes `bytes` and returns its dominant color.
    ///
    /// Returns `Error::DecodeError` if the bytes aren't a supported
    /// image format. Images that decode but don't have exactly three
    /// color channels return the fallback color; that's not an error.
    pub fn extract_dominant_color(&self, bytes: &[u8]) -> Result<Rgb> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| Error::DecodeError(e.to_string()))?;
        let channels = img.color().channel_count();

        if channels != 3 {
            debug!("image has {} channels -- using fallback color", channels);
            return Ok(self.fallback.color());
        }

        let rgb = img.to_rgb8();
        let total = u64::from(rgb.width()) * u64::from(rgb.height());
        let pixels = || rgb.pixels().map(|p| p.0);

        let found = if total > EXACT_PIXEL_LIMIT {
            most_frequent(pixels().map(bucket)).and_then(|winner| {
                most_frequent(pixels().filter(|p| bucket(*p) == winner))
            })
        } else {
            most_frequent(pixels())
        };

        found
            .map(|[r, g, b]| Rgb::new(r, g, b))
            .ok_or_else(|| Error::DecodeError("image has no pixels".into()))
    }

    /// Like `extract_dominant_color()` but a decode failure returns
    /// the fallback color.
    pub fn color_or_fallback(&self, bytes: &[u8]) -> Rgb {
        self.extract_dominant_color(bytes).unwrap_or_else(|e| {
            warn!("{} -- using fallback color", &e);
            self.fallback.color()
        })
    }
}

fn bucket([r, g, b]: [u8; 3]) -> [u8; 3] {
    [r >> BUCKET_SHIFT, g >> BUCKET_SHIFT, b >> BUCKET_SHIFT]
}

// Returns the item that occurs most often. Each entry remembers the
// index where it first appeared so ties resolve to the earliest one.

fn most_frequent<K, I>(items: I) -> Option<K>
where
    K: Hash + Eq + Copy,
    I: Iterator<Item = K>,
{
    let mut counts: HashMap<K, (usize, usize)> = HashMap::new();

    for (idx, key) in items.enumerate() {
        counts.entry(key).or_insert((0, idx)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (ca, ia)), (_, (cb, ib))| ca.cmp(cb).then(ib.cmp(ia)))
        .map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    const FIXED: Rgb = Rgb::new(1, 2, 3);

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());

        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn extractor() -> ColorExtractor {
        ColorExtractor::new(Fallback::Fixed(FIXED))
    }

    #[test]
    fn test_solid_image() {
        let img = RgbImage::from_pixel(10, 10, image::Rgb([255, 0, 0]));
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(255, 0, 0))
        );
    }

    #[test]
    fn test_majority_color() {
        // 60 of the 100 pixels share a color; every other pixel is
        // unique.

        let img = RgbImage::from_fn(10, 10, |x, y| {
            let idx = (y * 10 + x) as u8;

            if idx % 5 < 3 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([idx, 255 - idx, idx ^ 0x55])
            }
        });
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(10, 20, 30))
        );
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let a = image::Rgb([200, 0, 0]);
        let b = image::Rgb([0, 0, 200]);

        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { a } else { b });
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(200, 0, 0))
        );

        let img = RgbImage::from_fn(4, 1, |x, _| match x {
            0 | 3 => b,
            _ => a,
        });
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(0, 0, 200))
        );
    }

    #[test]
    fn test_deterministic() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) % 3) as u8])
        });
        let bytes = encode(DynamicImage::ImageRgb8(img));
        let first = extractor().extract_dominant_color(&bytes).unwrap();

        for _ in 0..5 {
            assert_eq!(extractor().extract_dominant_color(&bytes), Ok(first));
        }
    }

    #[test]
    fn test_large_image_buckets() {
        // 300x300 exceeds the exact-count limit. Blue is the single
        // most common value but the two nearly identical oranges
        // share a bucket and outnumber it together. The bucket is
        // then resolved to its most common exact value.

        let img = RgbImage::from_fn(300, 300, |x, _| {
            if x < 105 {
                image::Rgb([0, 0, 255])
            } else if x < 204 {
                image::Rgb([200, 100, 50])
            } else {
                image::Rgb([201, 101, 51])
            }
        });
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(200, 100, 50))
        );
    }

    #[test]
    fn test_large_image_majority() {
        let img = RgbImage::from_fn(300, 300, |x, y| {
            if (x + y) % 2 == 0 || x < 30 {
                image::Rgb([12, 34, 56])
            } else {
                image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
            }
        });
        let bytes = encode(DynamicImage::ImageRgb8(img));

        assert_eq!(
            extractor().extract_dominant_color(&bytes),
            Ok(Rgb::new(12, 34, 56))
        );
    }

    #[test]
    fn test_non_rgb_images() {
        let gray = encode(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            4,
            4,
            image::Luma([77]),
        )));
        let rgba = encode(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            image::Rgba([255, 0, 0, 255]),
        )));

        assert_eq!(extractor().extract_dominant_color(&gray), Ok(FIXED));
        assert_eq!(extractor().extract_dominant_color(&rgba), Ok(FIXED));

        // A random fallback still produces a color, not an error.

        assert!(ColorExtractor::default()
            .extract_dominant_color(&gray)
            .is_ok());
    }

    #[test]
    fn test_undecodable() {
        assert!(matches!(
            extractor().extract_dominant_color(b"this is not an image"),
            Err(Error::DecodeError(_))
        ));
        assert!(matches!(
            extractor().extract_dominant_color(&[]),
            Err(Error::DecodeError(_))
        ));
        assert_eq!(extractor().color_or_fallback(b"garbage"), FIXED);
    }

    #[test]
    fn test_fallback_parse() {
        assert_eq!(Fallback::parse("random"), Ok(Fallback::Random));
        assert_eq!(Fallback::parse("RANDOM"), Ok(Fallback::Random));
        assert_eq!(
            Fallback::parse("#010203"),
            Ok(Fallback::Fixed(Rgb::new(1, 2, 3)))
        );
        assert_eq!(
            Fallback::parse("white"),
            Ok(Fallback::Fixed(Rgb::new(255, 255, 255)))
        );
        assert!(Fallback::parse("sparkly").is_err());
    }

    #[test]
    fn test_most_frequent() {
        assert_eq!(most_frequent(std::iter::empty::<u8>()), None);
        assert_eq!(most_frequent([3u8, 1, 1, 3].into_iter()), Some(3));
        assert_eq!(most_frequent([3u8, 1, 1, 2].into_iter()), Some(1));
    }
}
