//! Game configuration resource.
//!
//! Window and render settings loaded from an INI file. Every value has a safe
//! default, so a missing file or key is never fatal.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 640
//! height = 360
//! target_fps = 60
//!
//! [render]
//! logical_width = 192
//! logical_height = 108
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_WINDOW_WIDTH: u32 = 640;
const DEFAULT_WINDOW_HEIGHT: u32 = 360;
const DEFAULT_LOGICAL_WIDTH: u32 = 192;
const DEFAULT_LOGICAL_HEIGHT: u32 = 108;
const DEFAULT_TARGET_FPS: u32 = 60;
pub const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Width of the world area shown on screen, in world units.
    pub logical_width: u32,
    /// Height of the world area shown on screen, in world units.
    pub logical_height: u32,
    pub target_fps: u32,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            logical_width: DEFAULT_LOGICAL_WIDTH,
            logical_height: DEFAULT_LOGICAL_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration that loads from and saves to `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Returns an error if the
    /// file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        info!(
            "Loaded config from {:?}: {}x{} window, {}x{} logical, fps={}",
            self.config_path,
            self.window_width,
            self.window_height,
            self.logical_width,
            self.logical_height,
            self.target_fps
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Save configuration to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("render", "logical_width", Some(self.logical_width.to_string()));
        config.set("render", "logical_height", Some(self.logical_height.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }

    /// Zoom factor that fits the logical area inside the window, keeping the
    /// aspect ratio.
    pub fn zoom(&self) -> f32 {
        if self.logical_width == 0 || self.logical_height == 0 {
            return 1.0;
        }
        let zx = self.window_width as f32 / self.logical_width as f32;
        let zy = self.window_height as f32 / self.logical_height as f32;
        zx.min(zy)
    }

    fn apply(&mut self, config: &Ini) {
        let get = |section: &str, key: &str| config.getuint(section, key).ok().flatten();

        if let Some(width) = get("window", "width") {
            self.window_width = width as u32;
        }
        if let Some(height) = get("window", "height") {
            self.window_height = height as u32;
        }
        if let Some(fps) = get("window", "target_fps") {
            self.target_fps = fps as u32;
        }
        if let Some(width) = get("render", "logical_width") {
            self.logical_width = width as u32;
        }
        if let Some(height) = get("render", "logical_height") {
            self.logical_height = height as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GameConfig::new();
        assert_eq!((config.window_width, config.window_height), (640, 360));
        assert_eq!((config.logical_width, config.logical_height), (192, 108));
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn partial_ini_keeps_defaults() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[window]\nwidth = 1280\n\n[render]\nlogical_height = 216\n")
            .unwrap();
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 360);
        assert_eq!(config.logical_width, 192);
        assert_eq!(config.logical_height, 216);
    }

    #[test]
    fn missing_file_is_an_error_and_keeps_defaults() {
        let mut config = GameConfig::with_path("./does/not/exist.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.window_width, 640);
    }

    #[test]
    fn zoom_fits_logical_area() {
        let mut config = GameConfig::new();
        assert!((config.zoom() - 640.0 / 192.0).abs() < 1e-6);
        config.window_height = 216;
        assert!((config.zoom() - 2.0).abs() < 1e-6);
    }
}
