use std::collections::BTreeMap;

/// The attributes that accompany an entity's state. Hosts report a
/// variety of value types; they're carried here in their textual
/// form and parsed by whoever needs them.
pub type Attributes = BTreeMap<String, String>;

/// Represents a new state reported by a source entity.
///
/// Hosts may deliver a state change with no new state at all (the
/// entity was removed) or with one of the placeholder states
/// ("unknown", "unavailable") they use when a device drops off the
/// network. All of those become `Unknown`, which switches skip.
#[derive(Debug, PartialEq, Clone, Default)]
pub enum UpstreamUpdate {
    #[default]
    Unknown,
    Known {
        state: String,
        attributes: Attributes,
    },
}

impl UpstreamUpdate {
    /// Builds an update from the raw state reported by a host.
    pub fn from_state(state: Option<&str>, attributes: Attributes) -> Self {
        match state {
            None | Some("") | Some("unknown") | Some("unavailable") => {
                UpstreamUpdate::Unknown
            }
            Some(state) => UpstreamUpdate::Known {
                state: state.to_string(),
                attributes,
            },
        }
    }

    /// Builds an update with a state and no attributes.
    pub fn state(state: &str) -> Self {
        UpstreamUpdate::from_state(Some(state), Attributes::new())
    }

    /// Adds an attribute to a known update. Attributes added to an
    /// `Unknown` update are dropped.
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        if let UpstreamUpdate::Known {
            ref mut attributes, ..
        } = self
        {
            let _ = attributes.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn is_known(&self) -> bool {
        matches!(self, UpstreamUpdate::Known { .. })
    }

    /// Returns the state string, if known.
    pub fn get_state(&self) -> Option<&str> {
        match self {
            UpstreamUpdate::Known { state, .. } => Some(state),
            UpstreamUpdate::Unknown => None,
        }
    }

    /// Returns the named attribute, if known and present.
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        match self {
            UpstreamUpdate::Known { attributes, .. } => {
                attributes.get(key).map(String::as_str)
            }
            UpstreamUpdate::Unknown => None,
        }
    }

    /// Returns the named attribute parsed as a float. Missing or
    /// unparsable values both yield `None`.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get_attribute(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}
