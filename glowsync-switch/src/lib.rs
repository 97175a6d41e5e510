//! Switches that keep lights colored to match a weather or media
//! entity.
//!
//! A `ToggleableSyncSwitch` is built from a `SyncMode`, which decides
//! how an upstream state becomes a color, plus the collaborators that
//! connect it to the host: an `EventSource` to watch the source entity
//! and a `LightDispatcher` to command the lights. Switches start off.
//!
//! Options edited by the user arrive through an `OptionsEntry`;
//! `spawn_options_listener()` forwards them to the switch.

mod mode;
mod subscription;
mod switch;

pub use mode::{
    ColorMode, Outcome, SyncMode, ATTR_MEDIA_TITLE, ATTR_TEMPERATURE,
    MEDIA_PLAYER_DOMAIN, WEATHER_DOMAIN,
};
pub use subscription::Subscription;
pub use switch::{spawn_options_listener, SyncReport, ToggleableSyncSwitch};
