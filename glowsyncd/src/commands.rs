use crate::config::{Config, SwitchConfig};
use glowsync_api::{color, Error, Result, Rgb};
use glowsync_color::{BrightnessPolicy, ColorExtractor, WeatherColorMap};
use glowsync_switch::SyncMode;
use std::path::Path;
use tracing::warn;

/// Validates each `[[switch]]` section and prints a line for each.
/// Returns an error if any section is bad.
pub fn check(cfg: &Config) -> Result<()> {
    let mut bad = 0;

    if cfg.switch.is_empty() {
        warn!("no switches are configured");
    }

    for result in cfg.switches() {
        match result {
            Ok(sw) => println!(
                "ok     {}: {} {} -> {} light(s)",
                &sw.name,
                sw.mode.kind(),
                &sw.options.source,
                sw.options.lights.len()
            ),
            Err(e) => {
                bad += 1;
                println!("ERROR  {}", e)
            }
        }
    }

    if bad > 0 {
        Err(Error::ConfigError(format!("{} bad switch(es)", bad)))
    } else {
        Ok(())
    }
}

fn describe(rgb: Rgb) -> String {
    format!(
        "{} rgb({}, {}, {}) hs{}",
        color::to_hex(rgb),
        rgb.red,
        rgb.green,
        rgb.blue,
        color::rgb_to_hs(rgb)
    )
}

/// Prints the dominant color of an image file.
pub async fn extract(path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::OperationError(format!("{}: {}", path.display(), e))
    })?;
    let rgb = ColorExtractor::default().extract_dominant_color(&bytes)?;

    println!("{}: {}", path.display(), describe(rgb));
    Ok(())
}

// Finds the color table and brightness policy to use for `condition`.
// Without a switch name, the defaults are used.

fn weather_settings(
    switches: &[SwitchConfig], name: Option<&str>,
) -> Result<(WeatherColorMap, BrightnessPolicy)> {
    let Some(name) = name else {
        return Ok((WeatherColorMap::default(), BrightnessPolicy::default()));
    };

    match switches.iter().find(|v| v.name == name).map(|v| &v.mode) {
        Some(SyncMode::Weather {
            colors, brightness, ..
        }) => Ok((colors.clone(), *brightness)),
        Some(_) => Err(Error::InvArgument(format!(
            "switch '{}' isn't a weather switch",
            name
        ))),
        None => Err(Error::NotFound),
    }
}

/// Prints the color and brightness chosen for a weather condition.
pub fn condition(
    cfg: &Config, label: &str, temp: Option<f64>, switch: Option<&str>,
) -> Result<()> {
    let switches = cfg.valid_switches()?;
    let (colors, brightness) = weather_settings(&switches, switch)?;
    let rgb = colors.color_for_condition(label);

    println!(
        "{}: {} brightness {}",
        label,
        describe(rgb),
        brightness
            .for_command(temp)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unchanged".into())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowsync_color::{ColorMapping, Preset};

    fn config(text: &str) -> Config {
        toml::from_str(text).unwrap()
    }

    const CFG: &str = r#"
[[switch]]
name = "porch"
mode = "weather"
source_entity_id = "weather.home"
light_ids = ["light.porch"]
mapping = "classic"
brightness = 99

[[switch]]
name = "art"
mode = "artwork"
source_entity_id = "media_player.tv"
light_ids = ["light.tv"]
"#;

    #[test]
    fn test_check() {
        assert!(check(&config(CFG)).is_ok());
        assert!(check(&config("")).is_ok());
        assert!(matches!(
            check(&config(
                r#"
[[switch]]
name = "x"
mode = "weather"
source_entity_id = "media_player.tv"
light_ids = []
"#
            )),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_weather_settings() {
        let switches = config(CFG).valid_switches().unwrap();

        let (colors, brightness) = weather_settings(&switches, None).unwrap();

        assert_eq!(colors, WeatherColorMap::default());
        assert_eq!(brightness, BrightnessPolicy::default());

        let (colors, brightness) =
            weather_settings(&switches, Some("porch")).unwrap();

        assert_eq!(
            colors,
            WeatherColorMap::new(ColorMapping::preset(Preset::Classic))
        );
        assert_eq!(brightness, BrightnessPolicy::Fixed(99));

        assert!(matches!(
            weather_settings(&switches, Some("art")),
            Err(Error::InvArgument(_))
        ));
        assert_eq!(
            weather_settings(&switches, Some("nope")).map(|_| ()),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(Rgb::new(0, 128, 128)),
            "#008080 rgb(0, 128, 128) hs(180°, 100%)"
        );
    }
}
