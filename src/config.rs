//! Settings module.
//!
//! Handles loading, sanitizing and persisting `strip-meta.toml`. The file is
//! a flat record of four `enabled`/`disabled` toggles plus two supporting
//! options. It is read once at the start of every command and the resulting
//! [`Settings`] value is passed down explicitly; nothing reads it ambiently.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! strip_active = "enabled"           # Strip metadata from uploads
//! preserve_icc = "enabled"           # Keep the ICC color profile
//! preserve_orientation = "enabled"   # Keep the EXIF orientation tag
//! logging = "enabled"                # Log per-step failures
//!
//! image_file_types = ["image/jpg", "image/jpeg"]  # Uploads eligible for stripping
//! codec = "auto"                     # auto | segment | raster
//! ```
//!
//! ## Toggle Sanitization
//!
//! Toggles are lenient on input: the exact string `"disabled"` (or the
//! boolean `false`) turns a setting off and any other value turns it on.
//! A typo therefore fails towards stripping, never towards leaking
//! metadata. Unknown keys are still rejected to catch misspelled option
//! names.
//!
//! ## First Read
//!
//! When the settings file does not exist (or is empty), [`load_or_init`]
//! writes the stock defaults to disk and returns them, so the file is always
//! present after the first command runs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Unknown setting: {0}")]
    UnknownKey(String),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// An `enabled` / `disabled` switch as stored in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    #[default]
    Enabled,
    Disabled,
}

impl Toggle {
    /// Anything other than the exact string `"disabled"` is enabled.
    pub fn sanitize(input: &str) -> Self {
        if input == "disabled" {
            Toggle::Disabled
        } else {
            Toggle::Enabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Toggle::Enabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Toggle::Enabled => "enabled",
            Toggle::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Toggle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Toggle value as written by hand: a string, a TOML boolean, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawToggle {
    Flag(bool),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for Toggle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawToggle::deserialize(deserializer)? {
            RawToggle::Flag(false) => Toggle::Disabled,
            RawToggle::Flag(true) | RawToggle::Other(_) => Toggle::Enabled,
            RawToggle::Text(raw) => Toggle::sanitize(&raw),
        })
    }
}

/// Which image codec to use when more than one is compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecPreference {
    /// Segment codec if available, raster codec otherwise.
    #[default]
    Auto,
    /// Lossless container rewrite (`img-parts`).
    Segment,
    /// Decode and re-encode (`image`).
    Raster,
}

impl CodecPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            CodecPreference::Auto => "auto",
            CodecPreference::Segment => "segment",
            CodecPreference::Raster => "raster",
        }
    }
}

impl fmt::Display for CodecPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecPreference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(CodecPreference::Auto),
            "segment" => Ok(CodecPreference::Segment),
            "raster" => Ok(CodecPreference::Raster),
            other => Err(ConfigError::Validation(format!(
                "codec must be one of auto, segment, raster (got {other:?})"
            ))),
        }
    }
}

/// Settings loaded from `strip-meta.toml`.
///
/// Every field has a default. Toggles default to enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Master switch for stripping on upload.
    pub strip_active: Toggle,
    /// Carry the ICC color profile across the strip.
    pub preserve_icc: Toggle,
    /// Carry the EXIF orientation tag across the strip.
    pub preserve_orientation: Toggle,
    /// Emit a log line for each failed pipeline step.
    pub logging: Toggle,
    /// MIME types eligible for stripping on upload.
    pub image_file_types: Vec<String>,
    /// Codec selection.
    pub codec: CodecPreference,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strip_active: Toggle::Enabled,
            preserve_icc: Toggle::Enabled,
            preserve_orientation: Toggle::Enabled,
            logging: Toggle::Enabled,
            image_file_types: default_image_file_types(),
            codec: CodecPreference::Auto,
        }
    }
}

fn default_image_file_types() -> Vec<String> {
    vec!["image/jpg".to_string(), "image/jpeg".to_string()]
}

/// The four toggles exposed on the settings screen, in display order.
pub const TOGGLE_KEYS: &[&str] = &[
    "strip_active",
    "preserve_icc",
    "preserve_orientation",
    "logging",
];

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_file_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "image_file_types must not contain empty entries".into(),
            ));
        }
        Ok(())
    }

    /// Whether uploads of this MIME type are eligible for stripping.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        self.image_file_types.iter().any(|t| t == mime)
    }

    /// Look up a toggle by its settings-file key.
    pub fn toggle(&self, key: &str) -> Option<Toggle> {
        match key {
            "strip_active" => Some(self.strip_active),
            "preserve_icc" => Some(self.preserve_icc),
            "preserve_orientation" => Some(self.preserve_orientation),
            "logging" => Some(self.logging),
            _ => None,
        }
    }

    /// Set a single option from its string form, sanitizing the value.
    ///
    /// Toggles follow [`Toggle::sanitize`]; `codec` must be a known name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "strip_active" => self.strip_active = Toggle::sanitize(value),
            "preserve_icc" => self.preserve_icc = Toggle::sanitize(value),
            "preserve_orientation" => self.preserve_orientation = Toggle::sanitize(value),
            "logging" => self.logging = Toggle::sanitize(value),
            "codec" => self.codec = value.parse()?,
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

/// Parse settings from TOML text. Empty text yields the defaults.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path`, writing the defaults first if the file is
/// missing or empty.
pub fn load_or_init(path: &Path) -> Result<Settings, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        let settings = Settings::default();
        save(path, &settings)?;
        return Ok(settings);
    }

    parse_settings(&content)
}

/// Persist settings to `path`, creating parent directories as needed.
pub fn save(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(settings)?;
    fs::write(path, content)?;
    Ok(())
}

/// Remove the settings file. A missing file is not an error.
pub fn remove(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Returns a fully-commented stock `strip-meta.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Strip Meta Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Toggles accept "enabled" or "disabled" (true / false also work).
# Anything other than "disabled" or false is treated as "enabled".
# Unknown keys will cause an error.

# Strip metadata from uploaded images.
strip_active = "enabled"

# Keep the embedded ICC color profile. Without it, wide-gamut photos
# (Display P3, Adobe RGB) render with shifted colors.
preserve_icc = "enabled"

# Keep the EXIF orientation tag so rotated camera photos still display
# upright.
preserve_orientation = "enabled"

# Log a line for every pipeline step that fails.
logging = "enabled"

# MIME types eligible for stripping on upload.
image_file_types = ["image/jpg", "image/jpeg"]

# Codec to use: "auto", "segment" (lossless container rewrite) or
# "raster" (decode + re-encode; cannot keep orientation).
codec = "auto"
"##
}
