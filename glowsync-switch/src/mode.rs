//! The strategies a switch uses to turn an upstream state into a
//! light command.

use glowsync_api::{
    color,
    dispatch::{LightColor, LightCommand},
    options::SwitchOptions,
    source::EventSource,
    EntityId, Error, Result, Rgb, UpstreamUpdate,
};
use glowsync_color::{
    BrightnessPolicy, ColorExtractor, TitleColorMap, WeatherColorMap,
};
use tracing::debug;

/// The attribute of a weather entity holding the outside temperature.
pub const ATTR_TEMPERATURE: &str = "temperature";

/// The attribute of a media player holding the song's title.
pub const ATTR_MEDIA_TITLE: &str = "media_title";

pub const WEATHER_DOMAIN: &str = "weather";
pub const MEDIA_PLAYER_DOMAIN: &str = "media_player";

/// How a weather switch describes colors to its lights.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ColorMode {
    #[default]
    Rgb,
    HueSat,
}

/// Selects where a switch gets its color from.
#[derive(Debug, Clone)]
pub enum SyncMode {
    /// The source's state is a weather condition. Its `temperature`
    /// attribute feeds the brightness policy.
    Weather {
        colors: WeatherColorMap,
        brightness: BrightnessPolicy,
        color_mode: ColorMode,
    },
    /// The dominant color of the media player's artwork.
    Artwork { extractor: ColorExtractor },
    /// A color looked up by the title of the playing song. Songs
    /// without a color turn the lights off.
    Title { titles: TitleColorMap },
}

/// The result of one sync cycle.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Outcome {
    /// What the color was chosen for: the weather condition, the
    /// player's state or the song title.
    pub condition: String,
    /// The color, if the lights are to be turned on.
    pub rgb: Option<Rgb>,
    pub command: LightCommand,
}

impl SyncMode {
    pub fn weather(colors: WeatherColorMap) -> Self {
        SyncMode::Weather {
            colors,
            brightness: BrightnessPolicy::default(),
            color_mode: ColorMode::default(),
        }
    }

    /// Returns the domain the source entity must belong to.
    pub fn source_domain(&self) -> &'static str {
        match self {
            SyncMode::Weather { .. } => WEATHER_DOMAIN,
            SyncMode::Artwork { .. } | SyncMode::Title { .. } => {
                MEDIA_PLAYER_DOMAIN
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncMode::Weather { .. } => "weather",
            SyncMode::Artwork { .. } => "artwork",
            SyncMode::Title { .. } => "title",
        }
    }

    /// Checks that `opts` can be used with this mode.
    pub fn validate(&self, opts: &SwitchOptions) -> Result<()> {
        opts.validate()?;
        opts.source.require_domain(self.source_domain())
    }

    /// Computes the command for `update`, a state reported by
    /// `entity`. Artwork is fetched from `source`.
    pub async fn compute(
        &self, source: &dyn EventSource, entity: &EntityId,
        update: &UpstreamUpdate,
    ) -> Result<Outcome> {
        let state = update.get_state().ok_or_else(|| {
            Error::UpstreamUnavailable(format!("{} has no state", entity))
        })?;

        match self {
            SyncMode::Weather {
                colors,
                brightness,
                color_mode,
            } => {
                let rgb = colors.color_for_condition(state);
                let color = match color_mode {
                    ColorMode::Rgb => LightColor::Rgb(rgb),
                    ColorMode::HueSat => LightColor::HueSat(color::rgb_to_hs(rgb)),
                };
                let temp = update.get_float(ATTR_TEMPERATURE);

                debug!("{} ({:?} °C) -> {}", state, temp, color::to_hex(rgb));

                Ok(Outcome {
                    condition: state.to_string(),
                    rgb: Some(rgb),
                    command: LightCommand::TurnOn {
                        color,
                        brightness: brightness.for_command(temp),
                    },
                })
            }

            SyncMode::Artwork { extractor } => {
                let bytes = source.media_image(entity).await?.ok_or_else(|| {
                    Error::UpstreamUnavailable(format!(
                        "{} has no artwork",
                        entity
                    ))
                })?;
                let rgb = extractor.color_or_fallback(&bytes);

                debug!("artwork of {} -> {}", entity, color::to_hex(rgb));

                Ok(Outcome {
                    condition: state.to_string(),
                    rgb: Some(rgb),
                    command: LightCommand::TurnOn {
                        color: LightColor::Rgb(rgb),
                        brightness: None,
                    },
                })
            }

            SyncMode::Title { titles } => {
                let title = update.get_attribute(ATTR_MEDIA_TITLE).unwrap_or("");

                match titles.color_for_title(title) {
                    Some(rgb) => Ok(Outcome {
                        condition: title.to_string(),
                        rgb: Some(rgb),
                        command: LightCommand::TurnOn {
                            color: LightColor::Rgb(rgb),
                            brightness: None,
                        },
                    }),
                    None => {
                        debug!("no color for title '{}'", title);
                        Ok(Outcome {
                            condition: title.to_string(),
                            rgb: None,
                            command: LightCommand::TurnOff,
                        })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowsync_api::HueSat;
    use glowsync_color::{ColorMapping, Direction, Fallback, Preset};
    use glowsync_host_simple::SimpleHost;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }

    fn png(rgb: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, image::Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());

        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_validate() {
        let weather = SyncMode::weather(WeatherColorMap::default());
        let art = SyncMode::Artwork {
            extractor: ColorExtractor::default(),
        };
        let w_opts = SwitchOptions::new(id("weather.home"), vec![id("light.a")]);
        let m_opts =
            SwitchOptions::new(id("media_player.mpd"), vec![id("light.a")]);

        assert!(weather.validate(&w_opts).is_ok());
        assert!(matches!(weather.validate(&m_opts), Err(Error::ConfigError(_))));
        assert!(art.validate(&m_opts).is_ok());
        assert!(matches!(art.validate(&w_opts), Err(Error::ConfigError(_))));

        let bad = SwitchOptions::new(id("weather.home"), vec![id("switch.a")]);

        assert!(matches!(weather.validate(&bad), Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_weather() {
        let host = SimpleHost::new();
        let src = id("weather.home");
        let mode = SyncMode::weather(WeatherColorMap::default());

        let out = mode
            .compute(&host, &src, &UpstreamUpdate::state("cloudy"))
            .await
            .unwrap();

        assert_eq!(out.condition, "cloudy");
        assert_eq!(out.rgb, Some(Rgb::new(0, 128, 128)));
        assert_eq!(
            out.command,
            LightCommand::TurnOn {
                color: LightColor::Rgb(Rgb::new(0, 128, 128)),
                brightness: Some(255)
            }
        );

        let out = mode
            .compute(
                &host,
                &src,
                &UpstreamUpdate::state("sunny").with_attribute("temperature", "40"),
            )
            .await
            .unwrap();

        assert_eq!(
            out.command,
            LightCommand::TurnOn {
                color: LightColor::Rgb(Rgb::new(255, 255, 0)),
                brightness: Some(0)
            }
        );

        // Unknown states are skipped.

        assert!(matches!(
            mode.compute(&host, &src, &UpstreamUpdate::Unknown).await,
            Err(Error::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_weather_options() {
        let host = SimpleHost::new();
        let src = id("weather.home");
        let mode = SyncMode::Weather {
            colors: WeatherColorMap::new(ColorMapping::preset(Preset::Classic)),
            brightness: BrightnessPolicy::Temperature(Direction::WarmerBrighter),
            color_mode: ColorMode::HueSat,
        };

        let out = mode
            .compute(
                &host,
                &src,
                &UpstreamUpdate::state("rainy").with_attribute("temperature", "40"),
            )
            .await
            .unwrap();

        assert_eq!(out.rgb, Some(Rgb::new(0, 0, 255)));
        assert_eq!(
            out.command,
            LightCommand::TurnOn {
                color: LightColor::HueSat(HueSat(240, 100)),
                brightness: Some(255)
            }
        );

        let mode = SyncMode::Weather {
            colors: WeatherColorMap::default(),
            brightness: BrightnessPolicy::Full,
            color_mode: ColorMode::Rgb,
        };
        let out = mode
            .compute(&host, &src, &UpstreamUpdate::state("tornado"))
            .await
            .unwrap();

        assert_eq!(
            out.command,
            LightCommand::TurnOn {
                color: LightColor::Rgb(Rgb::new(0, 0, 0)),
                brightness: None
            }
        );
    }

    #[tokio::test]
    async fn test_artwork() {
        let host = SimpleHost::new();
        let src = id("media_player.spotify");
        let mode = SyncMode::Artwork {
            extractor: ColorExtractor::new(Fallback::Fixed(Rgb::new(9, 9, 9))),
        };
        let playing = UpstreamUpdate::state("playing");

        // The player doesn't exist yet.

        assert_eq!(
            mode.compute(&host, &src, &playing).await,
            Err(Error::NotFound)
        );

        host.add_entity(&src).unwrap();
        assert!(matches!(
            mode.compute(&host, &src, &playing).await,
            Err(Error::UpstreamUnavailable(_))
        ));

        host.set_image(&src, Some(png([200, 10, 10]))).unwrap();

        let out = mode.compute(&host, &src, &playing).await.unwrap();

        assert_eq!(out.condition, "playing");
        assert_eq!(out.rgb, Some(Rgb::new(200, 10, 10)));

        // Artwork that can't be decoded uses the fallback.

        host.set_image(&src, Some(b"not a picture".to_vec())).unwrap();

        let out = mode.compute(&host, &src, &playing).await.unwrap();

        assert_eq!(out.rgb, Some(Rgb::new(9, 9, 9)));
    }

    #[tokio::test]
    async fn test_title() {
        let host = SimpleHost::new();
        let src = id("media_player.mpd");
        let mode = SyncMode::Title {
            titles: TitleColorMap::from_pairs([("Mirchi", "red")]).unwrap(),
        };

        let out = mode
            .compute(
                &host,
                &src,
                &UpstreamUpdate::state("playing")
                    .with_attribute("media_title", "Mirchi"),
            )
            .await
            .unwrap();

        assert_eq!(out.condition, "Mirchi");
        assert_eq!(
            out.command,
            LightCommand::TurnOn {
                color: LightColor::Rgb(Rgb::new(255, 0, 0)),
                brightness: None
            }
        );

        for update in [
            UpstreamUpdate::state("playing").with_attribute("media_title", "Other"),
            UpstreamUpdate::state("idle"),
        ] {
            let out = mode.compute(&host, &src, &update).await.unwrap();

            assert_eq!(out.rgb, None);
            assert_eq!(out.command, LightCommand::TurnOff);
        }
    }
}
