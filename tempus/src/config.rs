use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use tempus_api::{ApiClient, ApiClientConfig, DEFAULT_BASE_URL};

use crate::stopwatch::DEFAULT_DESCRIPTION;
use crate::timebox::LayoutConfig;

pub const CONFIG_FILE: &str = "tempus.toml";
pub const ENV_API_URL: &str = "TEMPUS_API_URL";
pub const ENV_TOKEN: &str = "TEMPUS_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub timebox: LayoutConfig,
    pub stopwatch: StopwatchConfig,
    pub theme: Theme,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StopwatchConfig {
    pub default_description: String,
    pub tick_millis: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub selection: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub running: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub tracked: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub planned: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub error: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub muted: Color,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            default_description: DEFAULT_DESCRIPTION.to_string(),
            tick_millis: 1000,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            selection: Color::Rgb(230, 195, 132),
            running: Color::Rgb(138, 154, 123),
            tracked: Color::Rgb(122, 168, 159),
            planned: Color::Rgb(127, 180, 202),
            error: Color::Rgb(228, 104, 118),
            muted: Color::Rgb(164, 167, 164),
        }
    }
}

impl StopwatchConfig {
    pub fn tick_every(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Config {
    /// Environment variables win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.timebox.validate().context("Invalid [timebox] section")?;
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("Invalid [api] section: base_url is empty");
        }
        // Stops with no description fall back to this, and entries need one.
        if self.stopwatch.default_description.trim().is_empty() {
            anyhow::bail!("Invalid [stopwatch] section: default_description is empty");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.api.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.api.timeout_secs.max(1)),
        }
    }

    /// A client carrying the configured token, if there is one.
    pub fn build_client(&self) -> Result<ApiClient> {
        let mut client = ApiClient::new(self.client_config())
            .context("Failed to build HTTP client")?;
        if let Some(token) = &self.api.token {
            client.set_token(token.clone());
        }
        Ok(client)
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    parse_hex_color(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid hex color {s:?}")))
}

/// `#rrggbb` to a terminal color.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    if !crate::validation::is_hex_color(s) {
        return None;
    }
    let r = u8::from_str_radix(&s[1..3], 16).ok()?;
    let g = u8::from_str_radix(&s[3..5], 16).ok()?;
    let b = u8::from_str_radix(&s[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "tempus", "Tempus")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file at {:?}", path))
}

/// File, then environment, then validation.
pub fn load_config() -> Result<Config> {
    let mut config = match config_path() {
        Some(path) => load_config_from(&path)?,
        None => Config::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
