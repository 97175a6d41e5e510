use clap::{Arg, ArgAction, ArgMatches, Command};
use glowsync_api::{color, options::SwitchOptions, Error, Result};
use glowsync_color::{
    BrightnessPolicy, ColorExtractor, ColorMapping, Fallback, Preset,
    TitleColorMap, WeatherColorMap,
};
use glowsync_switch::{ColorMode, SyncMode};
use serde_derive::Deserialize;
use std::{collections::BTreeMap, env, path::PathBuf};
use toml::value::{self, Value};
use tracing::Level;

const CFG_FILE: &str = "glowsync.toml";

#[derive(Deserialize, Default)]
pub struct Config {
    log_level: Option<String>,
    #[serde(default)]
    pub switch: Vec<value::Table>,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        let v = self.log_level.as_deref().unwrap_or("warn");

        match v {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }

    /// Parses every `[[switch]]` section. Each section is reported
    /// separately so one bad switch doesn't hide the others.
    pub fn switches(&self) -> Vec<Result<SwitchConfig>> {
        self.switch
            .iter()
            .enumerate()
            .map(|(idx, tbl)| SwitchConfig::from_table(idx, tbl))
            .collect()
    }

    /// Parses every `[[switch]]` section, stopping at the first bad
    /// one.
    pub fn valid_switches(&self) -> Result<Vec<SwitchConfig>> {
        self.switches().into_iter().collect()
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ModeKind {
    Weather,
    Artwork,
    Title,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
enum ColorModeCfg {
    #[default]
    Rgb,
    Hs,
}

// The settings of a `[[switch]]` section other than its options. Keys
// that don't apply to the chosen mode are ignored.

#[derive(Deserialize)]
struct RawSwitch {
    name: String,
    mode: ModeKind,
    #[serde(default)]
    mapping: Preset,
    #[serde(default)]
    color_mode: ColorModeCfg,
    brightness: Option<Value>,
    fallback: Option<String>,
    artwork_fallback: Option<String>,
    #[serde(default)]
    colors: BTreeMap<String, String>,
    #[serde(default)]
    titles: BTreeMap<String, String>,
}

/// A fully validated `[[switch]]` section.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    pub name: String,
    pub options: SwitchOptions,
    pub mode: SyncMode,
}

// Strips the variant prefix from errors that are going to be wrapped
// in another `ConfigError`.

fn detail(e: Error) -> String {
    match e {
        Error::ConfigError(v) | Error::ParseError(v) => v,
        e => e.to_string(),
    }
}

fn parse_brightness(v: &Value) -> Result<BrightnessPolicy> {
    match v {
        Value::String(s) => BrightnessPolicy::parse(s),
        Value::Integer(n) => u8::try_from(*n)
            .map(BrightnessPolicy::Fixed)
            .map_err(|_| {
                Error::ConfigError(format!("brightness {} is out of range", n))
            }),
        _ => Err(Error::ConfigError(
            "brightness must be a string or an integer".into(),
        )),
    }
}

impl RawSwitch {
    fn build_mode(&self) -> Result<SyncMode> {
        match self.mode {
            ModeKind::Weather => {
                let mut mapping = ColorMapping::preset(self.mapping);

                if let Some(fb) = &self.fallback {
                    mapping = mapping.with_fallback(
                        color::parse_color(fb)
                            .map_err(|e| Error::ConfigError(detail(e)))?,
                    )
                }

                let mapping = mapping.with_overrides(
                    self.colors.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )?;

                Ok(SyncMode::Weather {
                    colors: WeatherColorMap::new(mapping),
                    brightness: self
                        .brightness
                        .as_ref()
                        .map(parse_brightness)
                        .transpose()?
                        .unwrap_or_default(),
                    color_mode: match self.color_mode {
                        ColorModeCfg::Rgb => ColorMode::Rgb,
                        ColorModeCfg::Hs => ColorMode::HueSat,
                    },
                })
            }

            ModeKind::Artwork => {
                let fallback = self
                    .artwork_fallback
                    .as_deref()
                    .map(Fallback::parse)
                    .transpose()
                    .map_err(|e| Error::ConfigError(detail(e)))?
                    .unwrap_or_default();

                Ok(SyncMode::Artwork {
                    extractor: ColorExtractor::new(fallback),
                })
            }

            ModeKind::Title => Ok(SyncMode::Title {
                titles: TitleColorMap::from_pairs(
                    self.titles.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )?,
            }),
        }
    }
}

impl SwitchConfig {
    /// Builds a switch configuration from the `idx`th `[[switch]]`
    /// section. Any problem is reported as a `ConfigError` that names
    /// the switch.
    pub fn from_table(idx: usize, tbl: &value::Table) -> Result<Self> {
        let label = tbl
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("#{}", idx + 1));
        let wrap = |e: Error| {
            Error::ConfigError(format!("switch '{}': {}", &label, detail(e)))
        };

        let raw: RawSwitch = Value::Table(tbl.clone())
            .try_into()
            .map_err(|e: toml::de::Error| wrap(e.into()))?;
        let options = SwitchOptions::from_table(tbl).map_err(wrap)?;
        let mode = raw.build_mode().map_err(wrap)?;

        mode.validate(&options).map_err(wrap)?;

        Ok(SwitchConfig {
            name: raw.name,
            options,
            mode,
        })
    }
}

/// What the user asked `glowsyncd` to do.
#[derive(Debug, PartialEq, Clone)]
pub enum Cmd {
    Check,
    Extract(PathBuf),
    Condition {
        label: String,
        temp: Option<f64>,
        switch: Option<String>,
    },
    Replay(PathBuf),
}

pub fn command() -> Command {
    Command::new("glowsyncd")
        .version(clap::crate_version!())
        .about("Keeps lights in sync with the weather and the music.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Specifies the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Sets verbosity of log; can be used more than once")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .help("Displays the configuration and exits")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("check")
                .about("Validates every [[switch]] in the configuration"),
        )
        .subcommand(
            Command::new("extract")
                .about("Prints the dominant color of an image file")
                .arg(Arg::new("file").value_name("FILE").required(true)),
        )
        .subcommand(
            Command::new("condition")
                .about("Prints the color and brightness for a weather condition")
                .arg(Arg::new("label").value_name("LABEL").required(true))
                .arg(
                    Arg::new("temp")
                        .long("temp")
                        .value_name("CELSIUS")
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(f64))
                        .help("Outside temperature used for brightness"),
                )
                .arg(
                    Arg::new("switch")
                        .long("switch")
                        .value_name("NAME")
                        .help("Uses the mapping of this weather switch"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Feeds recorded state changes to the configured switches")
                .arg(Arg::new("file").value_name("FILE").required(true)),
        )
}

fn get_path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<String>(id).map(PathBuf::from).unwrap_or_default()
}

fn get_cmd(matches: &ArgMatches) -> Cmd {
    match matches.subcommand() {
        Some(("extract", m)) => Cmd::Extract(get_path(m, "file")),
        Some(("replay", m)) => Cmd::Replay(get_path(m, "file")),
        Some(("condition", m)) => Cmd::Condition {
            label: m.get_one::<String>("label").cloned().unwrap_or_default(),
            temp: m.get_one::<f64>("temp").copied(),
            switch: m.get_one::<String>("switch").cloned(),
        },
        _ => Cmd::Check,
    }
}

// Applies the command line to the configuration. Returns a flag
// indicating the user wants the final configuration displayed, the
// updated config and the command to run.

fn from_cmdline(matches: &ArgMatches, mut cfg: Config) -> (bool, Config, Cmd) {
    // The number of '-v' options determines the log level.

    match matches.get_count("verbose") {
        0 => (),
        1 => cfg.log_level = Some(String::from("info")),
        2 => cfg.log_level = Some(String::from("debug")),
        _ => cfg.log_level = Some(String::from("trace")),
    };

    (matches.get_flag("print_cfg"), cfg, get_cmd(matches))
}

fn parse_config(path: &str, contents: &str) -> Option<Config> {
    match toml::from_str(contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprint!("ERROR: {},\n       ignoring {}\n", e, path);
            None
        }
    }
}

async fn from_file(path: &str) -> Option<Config> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        parse_config(path, &contents)
    } else {
        None
    }
}

async fn find_cfg() -> Config {
    // Directories that could contain a configuration file, in search
    // order. The home directory entry ends with a period so the file
    // is hidden there.

    let mut dirs = vec![String::from("./")];

    if let Ok(home) = env::var("HOME") {
        dirs.push(format!("{}/.", home))
    }

    dirs.push(String::from("/usr/local/etc/"));
    dirs.push(String::from("/etc/"));

    for dir in dirs {
        let file = format!("{}{}", &dir, CFG_FILE);

        if let Some(cfg) = from_file(&file).await {
            return cfg;
        }
    }
    Config::default()
}

fn describe_mode(mode: &SyncMode) -> String {
    match mode {
        SyncMode::Weather {
            colors,
            brightness,
            color_mode,
        } => format!(
            "weather ({} conditions, fallback {}, brightness {}, {:?})",
            colors.mapping().entries().len(),
            color::to_hex(colors.mapping().fallback()),
            brightness,
            color_mode
        ),
        SyncMode::Artwork { extractor } => match extractor.fallback() {
            Fallback::Random => "artwork (random fallback)".into(),
            Fallback::Fixed(v) => {
                format!("artwork (fallback {})", color::to_hex(v))
            }
        },
        SyncMode::Title { titles } => {
            format!("title ({} titles)", titles.len())
        }
    }
}

fn dump_config(cfg: &Config) {
    println!("Configuration:");
    println!("    log level: {}\n", cfg.get_log_level());

    println!("Switch configuration:");
    if !cfg.switch.is_empty() {
        for ii in cfg.switches() {
            match ii {
                Ok(sw) => println!(
                    "    name: {}\n    mode: {}\n    source: {}\n    lights: {:?}\n",
                    &sw.name,
                    describe_mode(&sw.mode),
                    &sw.options.source,
                    sw.options
                        .lights
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                ),
                Err(e) => println!("    {}\n", e),
            }
        }
    } else {
        println!("    No switches specified.");
    }
}

/// Loads the configuration and parses the command line. Returns
/// `None` if the program should exit.
#[tracing::instrument(name = "loading config")]
pub async fn get() -> Option<(Config, Cmd)> {
    let matches = command().get_matches();
    let cfg = match matches.get_one::<String>("config") {
        Some(path) => match from_file(path).await {
            Some(cfg) => cfg,
            None => {
                eprintln!("ERROR: couldn't load {}", path);
                return None;
            }
        },
        None => find_cfg().await,
    };
    let (print_cfg, cfg, cmd) = from_cmdline(&matches, cfg);

    if print_cfg {
        dump_config(&cfg);
        None
    } else {
        Some((cfg, cmd))
    }
}
