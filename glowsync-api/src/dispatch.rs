//! Defines how switches send commands to lights.
//!
//! The host platform controls lights through service calls
//! (`light.turn_on`, `light.turn_off`) with a JSON-like payload. The
//! types here model those payloads; a host adapter implements
//! `LightDispatcher` to deliver them.

use crate::{color, EntityId, HueSat, Result, Rgb};
use async_trait::async_trait;
use serde_derive::Serialize;

pub const LIGHT_DOMAIN: &str = "light";
pub const SERVICE_TURN_ON: &str = "turn_on";
pub const SERVICE_TURN_OFF: &str = "turn_off";

/// The name of the diagnostic event fired after each color change.
pub const EVENT_COLOR_CHANGED: &str = "glowsync_color_changed";

/// Describes the color portion of a "turn on" command. Some lights
/// are driven with RGB triples and others with hue and saturation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LightColor {
    Rgb(Rgb),
    HueSat(HueSat),
}

/// The command computed by a sync cycle. It's sent, unchanged, to
/// every light the switch controls.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LightCommand {
    TurnOn {
        color: LightColor,
        brightness: Option<u8>,
    },
    TurnOff,
}

impl LightCommand {
    /// Builds the service call that applies this command to `light`.
    pub fn to_service_call(&self, light: &EntityId) -> ServiceCall {
        match self {
            LightCommand::TurnOn { color, brightness } => {
                let (rgb_color, hs_color) = match color {
                    LightColor::Rgb(v) => (Some([v.red, v.green, v.blue]), None),
                    LightColor::HueSat(v) => (None, Some(*v)),
                };

                ServiceCall {
                    domain: LIGHT_DOMAIN,
                    service: SERVICE_TURN_ON,
                    data: ServiceData {
                        entity_id: light.clone(),
                        rgb_color,
                        hs_color,
                        brightness: *brightness,
                    },
                }
            }
            LightCommand::TurnOff => ServiceCall {
                domain: LIGHT_DOMAIN,
                service: SERVICE_TURN_OFF,
                data: ServiceData {
                    entity_id: light.clone(),
                    rgb_color: None,
                    hs_color: None,
                    brightness: None,
                },
            },
        }
    }
}

/// The payload of a service call. Unused fields are left out when
/// serialized.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ServiceData {
    pub entity_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<[u8; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_color: Option<HueSat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

/// A request for the host to run `domain.service` with `data`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ServiceCall {
    pub domain: &'static str,
    pub service: &'static str,
    pub data: ServiceData,
}

/// A diagnostic event describing a color change. Nothing in glowsync
/// depends on it being delivered.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SyncEvent {
    pub event_type: &'static str,
    pub condition: String,
    pub rgb: String,
}

impl SyncEvent {
    pub fn color_changed(condition: &str, rgb: Rgb) -> Self {
        SyncEvent {
            event_type: EVENT_COLOR_CHANGED,
            condition: condition.to_string(),
            rgb: color::to_hex(rgb),
        }
    }
}

/// Defines the trait a host adapter implements to deliver light
/// commands.

#[async_trait]
pub trait LightDispatcher: Send + Sync {
    /// Asks the host to run a service. The reply only indicates the
    /// host accepted the request, not that the light changed.
    async fn call_service(&self, call: ServiceCall) -> Result<()>;

    /// Fires a diagnostic event on the host's event bus. Hosts
    /// without an event bus can keep this default, which drops it.
    async fn fire_event(&self, _event: SyncEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> EntityId {
        "light.desk".parse().unwrap()
    }

    #[test]
    fn test_turn_on_rgb() {
        let cmd = LightCommand::TurnOn {
            color: LightColor::Rgb(Rgb::new(255, 69, 0)),
            brightness: None,
        };
        let call = cmd.to_service_call(&light());

        assert_eq!(call.domain, "light");
        assert_eq!(call.service, "turn_on");
        assert_eq!(call.data.entity_id, light());
        assert_eq!(call.data.rgb_color, Some([255, 69, 0]));
        assert_eq!(call.data.hs_color, None);

        assert_eq!(
            serde_json::to_string(&call).unwrap(),
            r#"{"domain":"light","service":"turn_on","data":{"entity_id":"light.desk","rgb_color":[255,69,0]}}"#
        );
    }

    #[test]
    fn test_turn_on_hs() {
        let cmd = LightCommand::TurnOn {
            color: LightColor::HueSat(HueSat(209, 88)),
            brightness: Some(128),
        };
        let call = cmd.to_service_call(&light());

        assert_eq!(
            serde_json::to_string(&call.data).unwrap(),
            r#"{"entity_id":"light.desk","hs_color":[209,88],"brightness":128}"#
        );
    }

    #[test]
    fn test_turn_off() {
        let call = LightCommand::TurnOff.to_service_call(&light());

        assert_eq!(call.service, "turn_off");
        assert_eq!(
            serde_json::to_string(&call.data).unwrap(),
            r#"{"entity_id":"light.desk"}"#
        );
    }

    #[test]
    fn test_event() {
        let ev = SyncEvent::color_changed("cloudy", Rgb::new(0, 128, 128));

        assert_eq!(ev.event_type, EVENT_COLOR_CHANGED);
        assert_eq!(ev.condition, "cloudy");
        assert_eq!(ev.rgb, "#008080");
    }
}
