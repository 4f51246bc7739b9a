//! Configuration types.
//!
//! Loads settings from config.json at startup. Provides the gap-scan geometry,
//! the kinematic constants of the drag trajectory, input timing, and OCR options.
//! Every field has a default so a partial config.json is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::paths::get_default_config_path;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Geometry of the slide-CAPTCHA gap scan.
///
/// The defaults were measured on one captured challenge and will need
/// retuning for other renderings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// A pixel is foreground when any RGB channel differs by at least this much
    pub diff_threshold: u8,
    /// Rendered width of the marker block, skipped before the second scan
    pub block_width: u32,
    /// Number of columns scanned from the left edge
    pub scan_width: u32,
    /// Number of rows scanned from the top edge
    pub scan_height: u32,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            diff_threshold: 100,
            block_width: 50,
            scan_width: 260,
            scan_height: 116,
        }
    }
}

/// Kinematic constants of the drag trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Extra distance added to the target so the drag overshoots before correcting
    pub overshoot_margin: f64,
    /// Simulation time step
    pub time_step: f64,
    /// Acceleration while below the braking point
    pub acceleration: f64,
    /// Magnitude of the deceleration after the braking point
    pub braking: f64,
    /// Braking starts at `target * brake_numerator / brake_denominator`.
    /// Kept as two factors so the product rounds the same way as the
    /// reference trajectories.
    pub brake_numerator: f64,
    pub brake_denominator: f64,
    /// Fixed corrective steps appended after the forward motion
    pub back_tracks: Vec<i32>,
    /// Hard cap on the number of forward steps
    pub max_steps: usize,
}

fn default_back_tracks() -> Vec<i32> {
    vec![-3, -3, -2, -2, -2, -2, -2, -1, -1, -1]
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            overshoot_margin: 20.0,
            time_step: 0.2,
            acceleration: 2.0,
            braking: 3.0,
            brake_numerator: 3.0,
            brake_denominator: 5.0,
            back_tracks: default_back_tracks(),
            max_steps: 10_000,
        }
    }
}

/// Inclusive range of milliseconds for a randomized pause.
///
/// Either bound may be omitted in config.json; it then equals the other one,
/// giving a fixed pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PartialDelayRange")]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Deserialize)]
struct PartialDelayRange {
    min: Option<u64>,
    max: Option<u64>,
}

impl From<PartialDelayRange> for DelayRange {
    fn from(partial: PartialDelayRange) -> Self {
        let min = partial.min.or(partial.max).unwrap_or(0);
        Self::new(min, partial.max.unwrap_or(min))
    }
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Returns the range with `min <= max`, swapping bounds given in reverse.
    pub fn ordered(self) -> Self {
        if self.min <= self.max {
            self
        } else {
            Self::new(self.max, self.min)
        }
    }
}

/// Timing of synthesized input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Pause before a drag starts, giving the user time to focus the target
    pub start_delay_ms: u64,
    /// Pause after each drag step
    pub step_delay_ms: DelayRange,
    /// Pause after each typed key
    pub key_delay_ms: DelayRange,
    /// Pause before typing starts
    pub settle_delay_ms: DelayRange,
    /// Pause after a keyboard layout switch
    pub layout_switch_delay_ms: DelayRange,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 3000,
            step_delay_ms: DelayRange::new(10, 30),
            key_delay_ms: DelayRange::new(200, 500),
            settle_delay_ms: DelayRange::new(500, 1000),
            layout_switch_delay_ms: DelayRange::new(1000, 2000),
        }
    }
}

/// Options for the external OCR engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the Tesseract executable, searched for when absent
    pub tesseract_path: Option<String>,
    /// Binarize the image before recognition
    pub binarize: bool,
    /// Luminance below this value is treated as text
    pub threshold: u8,
    /// Tesseract page segmentation mode (7 = single text line)
    pub page_segmentation_mode: u8,
    /// Characters the recognizer may emit
    pub whitelist: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            binarize: true,
            threshold: 140,
            page_segmentation_mode: 7,
            whitelist: "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz"
                .to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gap: GapConfig,
    pub trajectory: TrajectoryConfig,
    pub input: InputConfig,
    pub ocr: OcrConfig,
}

/// Reads and parses a config file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Loads configuration from config.json next to the executable, or returns defaults.
fn load_config() -> Config {
    let config_path = get_default_config_path();

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if !config_path.exists() {
        crate::log("config.json not found. Using default config.");
        return Config::default();
    }

    match load_config_from(&config_path) {
        Ok(config) => {
            crate::log("Config loaded from config.json");
            config
        }
        Err(e) => {
            crate::log(&format!("{:#}. Using defaults.", e));
            Config::default()
        }
    }
}

/// Initializes the global configuration. Call once at startup.
///
/// With an explicit path the file must exist and parse; without one the
/// default location is tried and defaults are used if it is missing.
pub fn init_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(path) => {
            let config = load_config_from(path)?;
            crate::log(&format!("Config loaded from {}", path.display()));
            config
        }
        None => load_config(),
    };
    let _ = CONFIG.set(config);
    Ok(())
}

/// Returns a reference to the global configuration.
/// Falls back to defaults if called before init_config().
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
