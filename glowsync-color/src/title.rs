//! Maps the title of the playing song to a color.

use glowsync_api::{color, Error, Result, Rgb};
use std::collections::BTreeMap;

/// A table of song titles and their colors. Titles are matched
/// exactly; a title that isn't in the table has no color.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct TitleColorMap {
    titles: BTreeMap<String, Rgb>,
}

impl TitleColorMap {
    pub fn new() -> Self {
        TitleColorMap::default()
    }

    /// Builds a table from title/color-string pairs, as found in a
    /// config file.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = TitleColorMap::new();

        for (title, value) in pairs {
            let rgb = color::parse_color(value).map_err(|_| {
                Error::ConfigError(format!(
                    "title '{}' has unknown color '{}'",
                    title, value
                ))
            })?;

            map.insert(title, rgb);
        }
        Ok(map)
    }

    pub fn insert(&mut self, title: &str, rgb: Rgb) {
        let _ = self.titles.insert(title.to_string(), rgb);
    }

    pub fn color_for_title(&self, title: &str) -> Option<Rgb> {
        self.titles.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.titles.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let map =
            TitleColorMap::from_pairs([("Mirchi", "red"), ("Blue Monday", "#0000ff")])
                .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.color_for_title("Mirchi"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(
            map.color_for_title("Blue Monday"),
            Some(Rgb::new(0, 0, 255))
        );

        // Matching is exact.

        assert_eq!(map.color_for_title("mirchi"), None);
        assert_eq!(map.color_for_title(""), None);
        assert!(TitleColorMap::new().color_for_title("Mirchi").is_none());
    }

    #[test]
    fn test_bad_color() {
        assert!(matches!(
            TitleColorMap::from_pairs([("Mirchi", "spicy")]),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_replace() {
        let mut map = TitleColorMap::new();

        map.insert("a", Rgb::new(1, 1, 1));
        map.insert("a", Rgb::new(2, 2, 2));

        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("a", Rgb::new(2, 2, 2))]);
    }
}
