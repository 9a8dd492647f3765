//! Configuration for a scan session.
//!
//! Loads settings from config.json at startup. Provides the form target,
//! field element ids, capture format, and pipeline timing parameters.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<ScanConfig> = OnceLock::new();

/// Complete scan session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Intake form to fill: an http(s) URL or a path to a local HTML file.
    pub form_target: String,
    /// Element id of the name input on the form.
    #[serde(default = "default_name_field_id")]
    pub name_field_id: String,
    /// Element id of the phone input on the form.
    #[serde(default = "default_phone_field_id")]
    pub phone_field_id: String,
    /// Run the form browser without a visible window.
    #[serde(default)]
    pub headless: bool,
    /// Process one frame out of every `frame_interval` delivered frames.
    #[serde(default = "default_frame_interval")]
    pub frame_interval: u64,
    /// Minimum seconds between two accepted detections.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Requested capture width.
    #[serde(default = "default_camera_width")]
    pub camera_width: u32,
    /// Requested capture height.
    #[serde(default = "default_camera_height")]
    pub camera_height: u32,
    /// Requested capture frame rate.
    #[serde(default = "default_camera_fps")]
    pub camera_fps: u32,
    /// Tesseract language pack used for recognition.
    #[serde(default = "default_ocr_lang")]
    pub ocr_lang: String,
    /// Explicit path to the Tesseract executable. Empty = search PATH and
    /// common install locations.
    #[serde(default)]
    pub tesseract_path: String,
}

fn default_name_field_id() -> String {
    "nome_completo".to_string()
}

fn default_phone_field_id() -> String {
    "telefone_field".to_string()
}

fn default_frame_interval() -> u64 {
    15
}

fn default_cooldown_secs() -> u64 {
    3
}

fn default_camera_width() -> u32 {
    640
}

fn default_camera_height() -> u32 {
    480
}

fn default_camera_fps() -> u32 {
    30
}

fn default_ocr_lang() -> String {
    "por".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            form_target: "formulario_simples.html".to_string(),
            name_field_id: default_name_field_id(),
            phone_field_id: default_phone_field_id(),
            headless: false,
            frame_interval: default_frame_interval(),
            cooldown_secs: default_cooldown_secs(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
            camera_fps: default_camera_fps(),
            ocr_lang: default_ocr_lang(),
            tesseract_path: String::new(),
        }
    }
}

/// Loads configuration from config.json or returns defaults.
/// Looks for config.json in the same directory as the executable.
fn load_config() -> ScanConfig {
    let config_path = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf());

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    ScanConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config());
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static ScanConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "form_target": "https://example.com/intake" }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.form_target, "https://example.com/intake");
        assert_eq!(config.frame_interval, 15);
        assert_eq!(config.cooldown_secs, 3);
        assert_eq!(config.ocr_lang, "por");
        assert!(!config.headless);
    }

    #[test]
    fn test_defaults_match_serde_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.name_field_id, "nome_completo");
        assert_eq!(config.phone_field_id, "telefone_field");
        assert_eq!(config.camera_width, 640);
        assert_eq!(config.camera_height, 480);
    }
}
