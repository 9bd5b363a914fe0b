//! Configuration data structures and TOML parsing.
//!
//! The config file uses TOML format. Example:
//!
//! ```toml
//! [global]
//! log_level = "info"
//!
//! [global.thresholds]
//! tap_timeout_ms = 100
//! double_tap_timeout_ms = 300
//! long_press_timeout_ms = 500
//! tap_slop = 16.0
//! double_tap_slop = 100.0
//! min_fling_velocity = 50.0
//! max_fling_velocity = 8000.0
//!
//! [profile.touchscreen]
//! ignore_multitouch = true
//!
//! [profile.touchscreen.thresholds]
//! tap_slop = 24.0
//! ```
//!
//! Profiles inherit `[global.thresholds]` and may override any subset.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Ratio of the bigger tap region (double-tap eligibility) to the tap slop.
/// Fixed, not configurable.
pub const BIGGER_TAP_SLOP_RATIO: f64 = 2.0;

/// Top-level error type used throughout the crate.
#[derive(Debug, Error)]
pub enum TapkitError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error("Config validation error for profile '{profile}': missing threshold(s): {missing}")]
    MissingThresholds { profile: String, missing: String },

    #[error("Unknown profile '{profile}' (available: {available})")]
    UnknownProfile { profile: String, available: String },

    #[error("Failed to read trace file {path}: {source}")]
    TraceReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Trace parse error on line {line}: {message}")]
    TraceParseError { line: usize, message: String },
}

/// Root of the TOML config file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    global: RawGlobal,
    #[serde(default)]
    profile: HashMap<String, RawProfile>,
}

/// The `[global]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawGlobal {
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default)]
    thresholds: RawThresholds,
}

/// Threshold values - all optional so profile sections can partially override.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
struct RawThresholds {
    tap_timeout_ms: Option<u64>,
    double_tap_timeout_ms: Option<u64>,
    long_press_timeout_ms: Option<u64>,
    tap_slop: Option<f64>,
    double_tap_slop: Option<f64>,
    min_fling_velocity: Option<f64>,
    max_fling_velocity: Option<f64>,
}

/// A `[profile.<name>]` section.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawProfile {
    ignore_multitouch: Option<bool>,
    #[serde(default)]
    thresholds: RawThresholds,
}

/// Fully validated thresholds - all values guaranteed to be present.
///
/// Created via threshold merging during config parsing, or from
/// [`ValidatedThresholds::standard`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedThresholds {
    pub tap_timeout_ms: u64,
    pub double_tap_timeout_ms: u64,
    pub long_press_timeout_ms: u64,
    pub tap_slop: f64,
    pub double_tap_slop: f64,
    pub min_fling_velocity: f64,
    pub max_fling_velocity: f64,
}

impl ValidatedThresholds {
    /// Platform-typical defaults, used when no config file is supplied.
    pub fn standard() -> Self {
        Self {
            tap_timeout_ms: 100,
            double_tap_timeout_ms: 300,
            long_press_timeout_ms: 500,
            tap_slop: 16.0,
            double_tap_slop: 100.0,
            min_fling_velocity: 50.0,
            max_fling_velocity: 8000.0,
        }
    }
}

/// Configuration for a single classifier profile.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub thresholds: ValidatedThresholds,
    pub ignore_multitouch: bool,
}

impl ProfileConfig {
    pub fn standard() -> Self {
        Self {
            thresholds: ValidatedThresholds::standard(),
            ignore_multitouch: false,
        }
    }
}

/// Top-level parsed configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub log_file: Option<String>,
    pub profiles: HashMap<String, ProfileConfig>,
}

impl AppConfig {
    /// Look up a profile by name, listing the available names on failure.
    pub fn profile(&self, name: &str) -> Result<&ProfileConfig, TapkitError> {
        self.profiles
            .get(name)
            .ok_or_else(|| TapkitError::UnknownProfile {
                profile: name.to_string(),
                available: {
                    let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
                    names.sort_unstable();
                    names.join(", ")
                },
            })
    }
}

/// Classifier-facing configuration with distance thresholds pre-squared.
///
/// The move handler runs on every sample, so the squared forms avoid a
/// square root per comparison.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub tap_slop_sq: f64,
    pub bigger_tap_slop_sq: f64,
    pub double_tap_slop_sq: f64,
    pub tap_timeout: Duration,
    pub double_tap_timeout: Duration,
    pub long_press_timeout: Duration,
    pub min_fling_velocity: f64,
    pub max_fling_velocity: f64,
    pub ignore_multitouch: bool,
}

impl From<&ProfileConfig> for ClassifierConfig {
    fn from(profile: &ProfileConfig) -> Self {
        let th = &profile.thresholds;
        let bigger_tap_slop = th.tap_slop * BIGGER_TAP_SLOP_RATIO;
        Self {
            tap_slop_sq: th.tap_slop * th.tap_slop,
            bigger_tap_slop_sq: bigger_tap_slop * bigger_tap_slop,
            double_tap_slop_sq: th.double_tap_slop * th.double_tap_slop,
            tap_timeout: Duration::from_millis(th.tap_timeout_ms),
            double_tap_timeout: Duration::from_millis(th.double_tap_timeout_ms),
            long_press_timeout: Duration::from_millis(th.long_press_timeout_ms),
            min_fling_velocity: th.min_fling_velocity,
            max_fling_velocity: th.max_fling_velocity,
            ignore_multitouch: profile.ignore_multitouch,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from(&ProfileConfig::standard())
    }
}

/// Generate merge and into_validated for threshold fields.
macro_rules! threshold_fields {
    ($($field:ident),+ $(,)?) => {
        impl RawThresholds {
            fn merge_with_fallback(&self, fallback: &RawThresholds) -> RawThresholds {
                RawThresholds {
                    $($field: self.$field.or(fallback.$field),)+
                }
            }

            fn into_validated(self) -> Result<ValidatedThresholds, Vec<&'static str>> {
                let missing: Vec<&str> = [$(
                    if self.$field.is_none() { Some(stringify!($field)) } else { None },
                )+].into_iter().flatten().collect();

                if !missing.is_empty() {
                    return Err(missing);
                }

                Ok(ValidatedThresholds {
                    $($field: self.$field.unwrap(),)+
                })
            }
        }
    };
}

threshold_fields!(
    tap_timeout_ms,
    double_tap_timeout_ms,
    long_press_timeout_ms,
    tap_slop,
    double_tap_slop,
    min_fling_velocity,
    max_fling_velocity,
);

/// Parse a TOML config file and return the fully resolved `AppConfig`.
pub fn parse_config_file(path: &Path) -> Result<AppConfig, TapkitError> {
    let raw: RawConfig =
        toml::from_str(
            &fs::read_to_string(path).map_err(|e| TapkitError::ConfigReadError {
                path: path.to_path_buf(),
                source: e,
            })?,
        )
        .map_err(|e| TapkitError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut profiles = HashMap::new();

    for (name, raw_profile) in &raw.profile {
        let thresholds = raw_profile
            .thresholds
            .merge_with_fallback(&raw.global.thresholds)
            .into_validated()
            .map_err(|missing| TapkitError::MissingThresholds {
                profile: name.to_string(),
                missing: missing.join(", "),
            })?;

        profiles.insert(
            name.clone(),
            ProfileConfig {
                thresholds,
                ignore_multitouch: raw_profile.ignore_multitouch.unwrap_or(false),
            },
        );
    }

    // A "default" profile comes from the globals alone, unless the config
    // defines one explicitly or the globals are incomplete.
    if !profiles.contains_key("default") {
        match raw.global.thresholds.clone().into_validated() {
            Ok(thresholds) => {
                profiles.insert(
                    "default".to_string(),
                    ProfileConfig {
                        thresholds,
                        ignore_multitouch: false,
                    },
                );
            }
            Err(missing) => {
                debug!(
                    "No 'default' profile: [global.thresholds] is missing {}",
                    missing.join(", ")
                );
            }
        }
    }

    Ok(AppConfig {
        log_level: raw.global.log_level.unwrap_or_else(|| "info".to_string()),
        log_file: raw.global.log_file,
        profiles,
    })
}
