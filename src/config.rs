// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Configuration file handling.
//!
//! The top-level keys keep the names used by existing Fan SHIM installs
//! (`on-threshold`, `breath_brgt`, ...). JSON is the default format; a
//! path ending in `.toml` is read as TOML instead.
//! Default path: `/usr/local/etc/fanshim.json`

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/usr/local/etc/fanshim.json";

pub const DEFAULT_ON_THRESHOLD: i32 = 60;
pub const DEFAULT_OFF_THRESHOLD: i32 = 50;
pub const DEFAULT_BUDGET: usize = 3;
pub const DEFAULT_DELAY_SECS: u64 = 10;
pub const MAX_DELAY_SECS: u64 = 3600;
pub const DEFAULT_BREATH_BRIGHTNESS: u8 = 10;

/// Largest value of the APA102 5-bit global brightness field.
pub const MAX_BRIGHTNESS: u8 = 31;

pub const DEFAULT_FAN_PIN: u32 = 18;
pub const DEFAULT_CLOCK_PIN: u32 = 14;
pub const DEFAULT_DATA_PIN: u32 = 15;
pub const DEFAULT_CLOCK_STRETCH_US: u64 = 5;
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const DEFAULT_OVERRIDE_FLAG: &str = "/usr/local/etc/.force_fanshim";
pub const DEFAULT_EXPOSITION_PATH: &str = "/usr/local/etc/node_exp_txt/cpu_fan.prom";

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fan switches on once every sample in the window is above this.
    #[serde(rename = "on-threshold", default = "default_on_threshold")]
    pub on_threshold: i32,

    /// Fan switches off once every sample in the window is below this.
    #[serde(rename = "off-threshold", default = "default_off_threshold")]
    pub off_threshold: i32,

    /// Number of samples in the hysteresis window.
    #[serde(default = "default_budget")]
    pub budget: usize,

    /// Seconds between samples.
    #[serde(default = "default_delay")]
    pub delay: u64,

    /// LED brightness 0-31. 0 keeps the LED dark.
    #[serde(default)]
    pub brightness: i32,

    /// LED pattern while the fan is off: 0 = static, 1 = blink, 2 = breathe.
    #[serde(default)]
    pub blink: u8,

    /// Peak brightness of the breathing pattern, 1-31.
    #[serde(default = "default_breath_brightness")]
    pub breath_brgt: u8,

    #[serde(default)]
    pub gpio: GpioConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Which GPIO driver to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GpioBackend {
    /// `/sys/class/gpio` files.
    #[default]
    Sysfs,
    /// GPIO character device lines (`/dev/gpiochipN`).
    Cdev,
    /// BCM283x registers through `/dev/gpiomem`.
    Gpiomem,
    /// No hardware; pin levels are kept in memory.
    DryRun,
}

/// Pin assignments and driver selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioConfig {
    #[serde(default)]
    pub backend: GpioBackend,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,

    /// Character device used by the `cdev` backend.
    #[serde(default = "default_gpio_chip")]
    pub chip: PathBuf,

    #[serde(default = "default_fan_pin")]
    pub fan_pin: u32,

    #[serde(default = "default_clock_pin")]
    pub clock_pin: u32,

    #[serde(default = "default_data_pin")]
    pub data_pin: u32,

    /// How long each LED clock phase is held, in microseconds.
    #[serde(default = "default_clock_stretch")]
    pub clock_stretch_us: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: GpioBackend::default(),
            sysfs_root: default_sysfs_root(),
            chip: default_gpio_chip(),
            fan_pin: DEFAULT_FAN_PIN,
            clock_pin: DEFAULT_CLOCK_PIN,
            data_pin: DEFAULT_DATA_PIN,
            clock_stretch_us: DEFAULT_CLOCK_STRETCH_US,
        }
    }
}

/// Files the daemon reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Thermal zone reporting millidegrees Celsius.
    #[serde(default = "default_thermal_zone")]
    pub thermal_zone: PathBuf,

    /// While this file exists the fan is forced on.
    #[serde(default = "default_override_flag")]
    pub override_flag: PathBuf,

    /// Prometheus textfile output. `None` disables it.
    #[serde(default = "default_exposition")]
    pub exposition: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            thermal_zone: default_thermal_zone(),
            override_flag: default_override_flag(),
            exposition: default_exposition(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            on_threshold: DEFAULT_ON_THRESHOLD,
            off_threshold: DEFAULT_OFF_THRESHOLD,
            budget: DEFAULT_BUDGET,
            delay: DEFAULT_DELAY_SECS,
            brightness: 0,
            blink: 0,
            breath_brgt: DEFAULT_BREATH_BRIGHTNESS,
            gpio: GpioConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

/// On/off temperature pair, `on > off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub on: i32,
    pub off: i32,
}

/// What the LED does while the fan is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Static,
    Blink,
    Breathe,
}

impl LedMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LedMode::Static),
            1 => Some(LedMode::Blink),
            2 => Some(LedMode::Breathe),
            _ => None,
        }
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            on: self.on_threshold,
            off: self.off_threshold,
        }
    }

    /// LED brightness clamped to the 5-bit range.
    pub fn led_brightness(&self) -> u8 {
        self.brightness.clamp(0, i32::from(MAX_BRIGHTNESS)) as u8
    }

    /// Clamp an out-of-range `brightness` in place, warning about it.
    /// Returns whether the value changed.
    pub fn clamp_brightness(&mut self) -> bool {
        let clamped = i32::from(self.led_brightness());
        if clamped == self.brightness {
            return false;
        }
        log::warn!(
            "brightness {} outside 0..={MAX_BRIGHTNESS}, using {clamped}",
            self.brightness
        );
        self.brightness = clamped;
        true
    }

    /// Falls back to static for an unknown code; `validate` rejects those.
    pub fn led_mode(&self) -> LedMode {
        LedMode::from_code(self.blink).unwrap_or(LedMode::Static)
    }

    /// Check the sanity rules applied to every loaded config.
    pub fn validate(&self) -> Result<(), String> {
        if self.on_threshold <= self.off_threshold {
            return Err(format!(
                "on-threshold ({}) must be greater than off-threshold ({})",
                self.on_threshold, self.off_threshold
            ));
        }
        if self.budget == 0 {
            return Err("budget must be at least 1".to_string());
        }
        if self.delay == 0 || self.delay > MAX_DELAY_SECS {
            return Err(format!(
                "delay ({}) must be within 1..={MAX_DELAY_SECS} seconds",
                self.delay
            ));
        }
        if self.breath_brgt == 0 || self.breath_brgt > MAX_BRIGHTNESS {
            return Err(format!(
                "breath_brgt ({}) must be within 1..={MAX_BRIGHTNESS}",
                self.breath_brgt
            ));
        }
        if LedMode::from_code(self.blink).is_none() {
            return Err(format!("blink ({}) must be 0, 1 or 2", self.blink));
        }
        let pins = [self.gpio.fan_pin, self.gpio.clock_pin, self.gpio.data_pin];
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            return Err(format!("fan, clock and data pins must differ ({pins:?})"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load config from a JSON or TOML file, or return the default if the file
/// doesn't exist. Brightness is clamped; the rest is not validated.
pub fn load_config(path: &Path) -> io::Result<Config> {
    if !path.exists() {
        log::info!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(path)?;
    let mut config = parse_config(path, &contents).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse config: {e}"),
        )
    })?;
    config.clamp_brightness();

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<Config, String> {
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    if is_toml {
        toml::from_str(contents).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }
}

/// Resolve the config file path from CLI arg or default.
pub fn resolve_config_path(cli_path: Option<&str>) -> PathBuf {
    cli_path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn default_on_threshold() -> i32 {
    DEFAULT_ON_THRESHOLD
}

fn default_off_threshold() -> i32 {
    DEFAULT_OFF_THRESHOLD
}

fn default_budget() -> usize {
    DEFAULT_BUDGET
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_SECS
}

fn default_breath_brightness() -> u8 {
    DEFAULT_BREATH_BRIGHTNESS
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_ROOT)
}

fn default_gpio_chip() -> PathBuf {
    PathBuf::from(DEFAULT_GPIO_CHIP)
}

fn default_fan_pin() -> u32 {
    DEFAULT_FAN_PIN
}

fn default_clock_pin() -> u32 {
    DEFAULT_CLOCK_PIN
}

fn default_data_pin() -> u32 {
    DEFAULT_DATA_PIN
}

fn default_clock_stretch() -> u64 {
    DEFAULT_CLOCK_STRETCH_US
}

fn default_thermal_zone() -> PathBuf {
    PathBuf::from(DEFAULT_THERMAL_ZONE)
}

fn default_override_flag() -> PathBuf {
    PathBuf::from(DEFAULT_OVERRIDE_FLAG)
}

fn default_exposition() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_EXPOSITION_PATH))
}
