//! Options of a light-sync switch and the config entry that holds
//! them.
//!
//! The host stores a switch's options in its config entry. Options
//! are replaced as a whole when the user edits them; the switch is
//! told about each replacement through a `watch` channel.

use crate::{types::Error, EntityId, Result};
use serde_derive::Deserialize;
use tokio::sync::watch;
use toml::value::{Table, Value};

/// The options every switch needs: which entity drives it and which
/// lights it controls.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
pub struct SwitchOptions {
    #[serde(
        rename = "source_entity_id",
        alias = "weather_entity_id",
        alias = "media_player_entity_id"
    )]
    pub source: EntityId,
    #[serde(rename = "light_ids")]
    pub lights: Vec<EntityId>,
}

impl SwitchOptions {
    pub fn new(source: EntityId, lights: Vec<EntityId>) -> Self {
        SwitchOptions { source, lights }
    }

    /// Builds options from a TOML table. Missing keys, entity ids that
    /// don't parse, and lights outside the `light` domain are all
    /// reported as `Error::ConfigError`.
    pub fn from_table(cfg: &Table) -> Result<Self> {
        let opts: SwitchOptions = Value::Table(cfg.clone())
            .try_into()
            .map_err(|e: toml::de::Error| {
                Error::ConfigError(format!("bad switch options: {}", e))
            })?;

        opts.validate()?;
        Ok(opts)
    }

    /// Checks the parts of the options that don't depend on the kind
    /// of switch using them.
    pub fn validate(&self) -> Result<()> {
        for light in &self.lights {
            light.require_domain(crate::dispatch::LIGHT_DOMAIN)?
        }

        // Sending the same command twice to a light is harmless but
        // it's almost certainly a typo in the config.

        let mut seen = std::collections::HashSet::new();

        if let Some(dup) = self.lights.iter().find(|v| !seen.insert(*v)) {
            return Err(Error::ConfigError(format!(
                "light '{}' is listed more than once",
                dup
            )));
        }
        Ok(())
    }
}

/// Holds the current options of one switch. The host side calls
/// `update()` when the user edits the options; switches hold a
/// receiver from `subscribe()`.
pub struct OptionsEntry {
    tx: watch::Sender<SwitchOptions>,
}

impl OptionsEntry {
    /// Creates an entry from validated options.
    pub fn new(opts: SwitchOptions) -> Result<Self> {
        opts.validate()?;

        let (tx, _) = watch::channel(opts);

        Ok(OptionsEntry { tx })
    }

    /// Returns a copy of the current options.
    pub fn current(&self) -> SwitchOptions {
        self.tx.borrow().clone()
    }

    /// Replaces the options. Invalid options are rejected and the
    /// previous ones stay in effect. Listeners are only notified if
    /// the options actually changed.
    pub fn update(&self, opts: SwitchOptions) -> Result<()> {
        opts.validate()?;

        let _ = self.tx.send_if_modified(|cur| {
            if *cur != opts {
                *cur = opts;
                true
            } else {
                false
            }
        });
        Ok(())
    }

    /// Returns a receiver that sees every replacement.
    pub fn subscribe(&self) -> watch::Receiver<SwitchOptions> {
        self.tx.subscribe()
    }
}
