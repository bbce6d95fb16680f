//! Color preference management
//!
//! One key-value entry per HTTP method (plus the synthetic `WS` key),
//! mapping to a background/foreground pair. Loaded at startup, saved on
//! explicit user confirmation.

use anyhow::{Context, Result};
use reqmap_common::RequestRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Background applied to any request with status code >= 500, regardless
/// of its method colors
pub const ERROR_BACKGROUND: &str = "#e74c3c";
pub const ERROR_FOREGROUND: &str = "#ffffff";

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reqmap")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".reqmap")
    }
}

/// Get the color preferences file path
pub fn colors_file() -> PathBuf {
    config_dir().join("colors.yml")
}

/// Ensure the config directory exists
pub fn ensure_dirs() -> Result<()> {
    fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    Ok(())
}

/// An RGB color parsed from a `#rrggbb` preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self(r, g, b))
    }
}

/// Background/foreground pair for one method key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub background: String,
    pub color: String,
}

impl ColorPair {
    fn new(background: &str, color: &str) -> Self {
        Self {
            background: background.to_string(),
            color: color.to_string(),
        }
    }

    /// Parse both values, falling back to the defaults for unparsable
    /// entries rather than failing the render.
    pub fn resolve(&self) -> (Rgb, Rgb) {
        let background = Rgb::from_hex(&self.background).unwrap_or_else(|| {
            warn!(value = %self.background, "Unparsable background color, using default");
            Rgb(0xec, 0xf0, 0xf1)
        });
        let color = Rgb::from_hex(&self.color).unwrap_or_else(|| {
            warn!(value = %self.color, "Unparsable text color, using default");
            Rgb(0x2c, 0x3e, 0x50)
        });
        (background, color)
    }
}

/// Per-method color preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodColors {
    entries: BTreeMap<String, ColorPair>,
}

impl Default for MethodColors {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("GET".to_string(), ColorPair::new("#ecf0f1", "#2c3e50"));
        entries.insert("POST".to_string(), ColorPair::new("#3498db", "#ffffff"));
        entries.insert("PUT".to_string(), ColorPair::new("#f39c12", "#ffffff"));
        entries.insert("DELETE".to_string(), ColorPair::new("#e74c3c", "#ffffff"));
        entries.insert("PATCH".to_string(), ColorPair::new("#9b59b6", "#ffffff"));
        entries.insert("WS".to_string(), ColorPair::new("#2ecc71", "#ffffff"));
        Self { entries }
    }
}

impl MethodColors {
    /// Load preferences from disk, falling back to defaults when no file
    /// has been saved yet.
    pub fn load() -> Result<Self> {
        let path = colors_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read color preferences")?;
        serde_yaml::from_str(&content).context("Failed to parse color preferences")
    }

    /// Save preferences to disk
    pub fn save(&self) -> Result<()> {
        ensure_dirs()?;
        let content = serde_yaml::to_string(self).context("Failed to serialize color preferences")?;
        fs::write(colors_file(), content).context("Failed to write color preferences")?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ColorPair> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, pair: ColorPair) {
        self.entries.insert(key.into(), pair);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Resolve the color pair for a record: looked up by display method
    /// (`WS` for WebSocket records), with the error pair overriding
    /// whenever the status code is 500 or above.
    pub fn for_record(&self, record: &RequestRecord) -> Option<(Rgb, Rgb)> {
        if record.status_code.is_some_and(|code| code >= 500) {
            let background = Rgb::from_hex(ERROR_BACKGROUND).unwrap_or(Rgb(0xe7, 0x4c, 0x3c));
            let color = Rgb::from_hex(ERROR_FOREGROUND).unwrap_or(Rgb(0xff, 0xff, 0xff));
            return Some((background, color));
        }
        self.get(record.display_method()).map(ColorPair::resolve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(method: &str, status: Option<u16>, websocket: bool) -> RequestRecord {
        RequestRecord {
            id: "1".to_string(),
            url: "https://a.com/x".to_string(),
            method: method.to_string(),
            initiator: "N/A".to_string(),
            time_stamp: Utc::now(),
            status_code: status,
            body: None,
            is_web_socket: websocket,
        }
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#3498db"), Some(Rgb(0x34, 0x98, 0xdb)));
        assert_eq!(Rgb::from_hex("#FFFFFF"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::from_hex("3498db"), None);
        assert_eq!(Rgb::from_hex("#34"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_defaults_cover_all_method_keys() {
        let colors = MethodColors::default();
        for key in ["GET", "POST", "PUT", "DELETE", "PATCH", "WS"] {
            assert!(colors.get(key).is_some(), "missing default for {key}");
        }
    }

    #[test]
    fn test_method_lookup() {
        let colors = MethodColors::default();
        let (background, _) = colors.for_record(&record("POST", Some(201), false)).unwrap();
        assert_eq!(background, Rgb(0x34, 0x98, 0xdb));
    }

    #[test]
    fn test_websocket_uses_ws_key() {
        let colors = MethodColors::default();
        let (background, _) = colors.for_record(&record("GET", Some(101), true)).unwrap();
        assert_eq!(background, Rgb(0x2e, 0xcc, 0x71));
    }

    #[test]
    fn test_server_error_overrides_method_colors() {
        let colors = MethodColors::default();
        for method in ["GET", "POST", "DELETE"] {
            let (background, color) = colors.for_record(&record(method, Some(503), false)).unwrap();
            assert_eq!(background, Rgb(0xe7, 0x4c, 0x3c));
            assert_eq!(color, Rgb(0xff, 0xff, 0xff));
        }
        // 499 and below keep the method pair
        let (background, _) = colors.for_record(&record("GET", Some(499), false)).unwrap();
        assert_eq!(background, Rgb(0xec, 0xf0, 0xf1));
    }

    #[test]
    fn test_unknown_method_has_no_pair() {
        let colors = MethodColors::default();
        assert!(colors.for_record(&record("TRACE", Some(200), false)).is_none());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut colors = MethodColors::default();
        colors.set("GET", ColorPair::new("#123456", "#654321"));

        let yaml = serde_yaml::to_string(&colors).unwrap();
        let decoded: MethodColors = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(decoded, colors);
    }
}
