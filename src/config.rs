use std::{
    env, fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::core::{ChatContext, InsightTexts};

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

/// Endpoints and credentials for the remote services.
///
/// Credentials come from the config file or the environment, never from code.
#[derive(Clone, Debug, Deserialize, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL of the dashboard REST API (dataset search)
    #[serde(default)]
    pub dashboard_api_url: String,
    #[serde(default)]
    pub chart_service_url: String,
    #[serde(default)]
    pub insight_service_url: String,
    /// Sent to the chart service as `bliv_dashboard_base_url`
    #[serde(default)]
    pub dashboard_base_url: String,
    #[serde(default)]
    pub dashboard_id: Option<i64>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub insight_error_text: Option<String>,
    #[serde(default)]
    pub insight_empty_text: Option<String>,
    /// Optional JSON keybindings file replacing the defaults
    #[serde(default)]
    pub keybindings: Option<PathBuf>,
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_page_size() -> u32 {
    20
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            page_size: default_page_size(),
            insight_error_text: None,
            insight_empty_text: None,
            keybindings: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub services: ServiceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref API_KEY: Option<String> =
        env::var(format!("{}_API_KEY", PROJECT_NAME.clone()))
            .ok()
            .filter(|v| !v.trim().is_empty());
    pub static ref SESSION_TOKEN: Option<String> =
        env::var(format!("{}_SESSION_TOKEN", PROJECT_NAME.clone()))
            .ok()
            .filter(|v| !v.trim().is_empty());
}

impl Config {
    /// Load the embedded defaults, layer the user file on top and apply
    /// credential overrides from the environment.
    ///
    /// Without an explicit path the user file is `~/.dashassist-config.json5`,
    /// created from the defaults on first run. An explicit path must exist.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let mut cfg = match config_path {
            Some(p) => Self::load(Some(expand_tilde(p)))?,
            None => Self::load_home(default_home_config_path())?,
        };
        cfg.apply_credential_overrides(API_KEY.clone(), SESSION_TOKEN.clone());
        Ok(cfg)
    }

    /// Build from the embedded defaults plus an optional user file, without
    /// touching the environment
    pub fn load(user_file: Option<PathBuf>) -> Result<Self, config::ConfigError> {
        Self::build(user_file, true)
    }

    /// Seed `home_cfg` with the defaults if it is missing. The file is
    /// optional, an unwritable home still starts with the embedded defaults.
    fn load_home(home_cfg: PathBuf) -> Result<Self, config::ConfigError> {
        if !home_cfg.exists() {
            if let Err(e) = write_default_config(&home_cfg) {
                tracing::warn!(
                    "Could not write default config to {}: {e}",
                    home_cfg.display()
                );
            }
        }
        Self::build(Some(home_cfg), false)
    }

    fn build(user_file: Option<PathBuf>, required: bool) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        if let Some(path) = user_file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json5)
                    .required(required),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Environment credentials win over the file when present
    pub fn apply_credential_overrides(&mut self, api_key: Option<String>, session_token: Option<String>) {
        if let Some(key) = api_key {
            self.services.api_key = Some(key);
        }
        if let Some(token) = session_token {
            self.services.session_token = Some(token);
        }
    }

    pub fn chat_context(&self) -> ChatContext {
        ChatContext {
            dashboard_id: self.services.dashboard_id,
            dashboard_base_url: self.services.dashboard_base_url.clone(),
        }
    }

    pub fn insight_texts(&self) -> InsightTexts {
        let defaults = InsightTexts::default();
        InsightTexts {
            error: self.ui.insight_error_text.clone().unwrap_or(defaults.error),
            empty: self.ui.insight_empty_text.clone().unwrap_or(defaults.empty),
        }
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with("~") {
            if let Some(base) = BaseDirs::new() { return PathBuf::from(s.replacen("~", base.home_dir().to_str().unwrap_or(""), 1)); }
        }
    }
    path.clone()
}

fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG)
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".dashassist-config.json5");
    }
    PathBuf::from(".dashassist-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".config")
    }
}
