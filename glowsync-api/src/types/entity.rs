use crate::{types::Error, Result};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Names an entity in the host platform, like `weather.home` or
/// `light.kitchen`. The name is made up of a domain and an object id
/// separated by a single period. Both parts must be non-empty and can
/// only contain lowercase ASCII letters, digits and underscores.
///
/// The text is held in an `Arc<str>` so switches can hand copies of
/// their light list to spawned tasks cheaply.

#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
#[derive(Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Arc<str>);

impl EntityId {
    // Returns `true` if the character can be used in either part of
    // the entity id.

    fn is_valid_char(ch: char) -> bool {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'
    }

    fn check_part(part: &str, what: &str, s: &str) -> Result<()> {
        if part.is_empty() {
            Err(Error::ParseError(format!("'{}' has an empty {}", s, what)))
        } else if !part.chars().all(EntityId::is_valid_char) {
            Err(Error::ParseError(format!(
                "'{}' has an invalid character in its {}",
                s, what
            )))
        } else {
            Ok(())
        }
    }

    /// Creates an `EntityId`, if the string contains a well-formed
    /// entity id.
    pub fn create(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((domain, object)) => {
                EntityId::check_part(domain, "domain", s)?;
                EntityId::check_part(object, "object id", s)?;
                Ok(EntityId(s.into()))
            }
            None => Err(Error::ParseError(format!(
                "'{}' needs a domain and object id separated by '.'",
                s
            ))),
        }
    }

    /// Returns the domain portion (the text before the period.)
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map(|(d, _)| d).unwrap_or(&self.0)
    }

    /// Returns the object id portion (the text after the period.)
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map(|(_, o)| o).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an error unless the entity lives in `domain`.
    pub fn require_domain(&self, domain: &str) -> Result<()> {
        if self.domain() == domain {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "'{}' isn't a {} entity",
                self, domain
            )))
        }
    }
}

// This trait allows one to use `.parse::<EntityId>()`.

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityId::create(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        EntityId::create(&s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_ids() {
        let id = "weather.smhi_home".parse::<EntityId>().unwrap();

        assert_eq!(id.domain(), "weather");
        assert_eq!(id.object_id(), "smhi_home");
        assert_eq!(id.as_str(), "weather.smhi_home");
        assert_eq!(format!("{}", id), "weather.smhi_home");

        let id = "media_player.spotify_2".parse::<EntityId>().unwrap();

        assert_eq!(id.domain(), "media_player");
        assert_eq!(id.object_id(), "spotify_2");
    }

    #[test]
    fn test_bad_ids() {
        assert!("".parse::<EntityId>().is_err());
        assert!("light".parse::<EntityId>().is_err());
        assert!(".kitchen".parse::<EntityId>().is_err());
        assert!("light.".parse::<EntityId>().is_err());
        assert!("Light.kitchen".parse::<EntityId>().is_err());
        assert!("light.kitchen.lamp".parse::<EntityId>().is_err());
        assert!("light.kitchen lamp".parse::<EntityId>().is_err());
        assert!("light:kitchen".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_domain_check() {
        let id = "light.kitchen".parse::<EntityId>().unwrap();

        assert!(id.require_domain("light").is_ok());
        assert!(matches!(
            id.require_domain("weather"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_toml() {
        #[derive(Deserialize)]
        struct Cfg {
            id: EntityId,
        }

        let cfg: Cfg = toml::from_str("id = \"light.hall\"").unwrap();

        assert_eq!(cfg.id, "light.hall".parse().unwrap());
        assert!(toml::from_str::<Cfg>("id = \"hall\"").is_err());
        assert!(toml::from_str::<Cfg>("id = 5").is_err());
    }
}
