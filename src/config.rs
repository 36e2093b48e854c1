use serde::Deserialize;
use std::path::{Path, PathBuf};

use sonoscope::render::spectrogram::{DEFAULT_DB_RANGE, DEFAULT_HEIGHT};
use sonoscope::{AnalysisConfig, RenderOptions, WidthMode};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// `width = 1200` or `width = "fit"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WidthSetting {
    Pixels(u32),
    Keyword(WidthKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthKeyword {
    Fit,
}

impl From<WidthSetting> for WidthMode {
    fn from(setting: WidthSetting) -> Self {
        match setting {
            WidthSetting::Pixels(px) => WidthMode::Fixed(px),
            WidthSetting::Keyword(WidthKeyword::Fit) => WidthMode::FitToContainer,
        }
    }
}

impl From<WidthMode> for WidthSetting {
    fn from(mode: WidthMode) -> Self {
        match mode {
            WidthMode::Fixed(px) => WidthSetting::Pixels(px),
            WidthMode::FitToContainer => WidthSetting::Keyword(WidthKeyword::Fit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: WidthSetting,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_db_min")]
    pub db_min: f32,
    #[serde(default = "default_db_max")]
    pub db_max: f32,
    #[serde(default = "default_dpr")]
    pub dpr: f32,
}

#[derive(Debug, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            db_min: default_db_min(),
            db_max: default_db_max(),
            dpr: default_dpr(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            count: default_count(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width.into(),
            height: self.height,
            db_range: (self.db_min, self.db_max),
            device_pixel_ratio: self.dpr,
        }
    }
}

fn default_width() -> WidthSetting { WidthSetting::Keyword(WidthKeyword::Fit) }
fn default_height() -> u32 { DEFAULT_HEIGHT }
fn default_db_min() -> f32 { DEFAULT_DB_RANGE.0 }
fn default_db_max() -> f32 { DEFAULT_DB_RANGE.1 }
fn default_dpr() -> f32 { 1.0 }
fn default_count() -> u32 { 1 }
fn default_timeout_secs() -> u64 { 240 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}

/// `./sonoscope.toml`, then `~/.config/sonoscope/config.toml`, then the platform config dir.
pub fn discover() -> Option<PathBuf> {
    let local = PathBuf::from("sonoscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonoscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonoscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
