use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shop_core::{
    ForumEndpoints, SessionSettings, DEFAULT_MIN_BUMP_INTERVAL, DEFAULT_TEMPLATE,
    DEFAULT_TICK_INTERVAL,
};
use shop_engine::ClientSettings;
use shop_logging::{shop_debug, shop_info};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed settings file: {0}")]
    Parse(String),
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

/// User configuration. Holds nothing about what was last submitted, so a
/// fresh run always re-submits the shop once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub thread: Option<String>,
    pub template: String,
    pub auto_update: bool,
    pub auto_bump: bool,
    pub min_bump_interval_secs: u64,
    pub tick_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub forum: ForumSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumSettings {
    pub base_url: String,
    pub edit_path: String,
    pub bump_path: String,
    pub token_field: String,
    pub bump_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thread: None,
            template: DEFAULT_TEMPLATE.to_string(),
            auto_update: false,
            auto_bump: false,
            min_bump_interval_secs: DEFAULT_MIN_BUMP_INTERVAL.as_secs(),
            tick_interval_secs: DEFAULT_TICK_INTERVAL.as_secs(),
            request_timeout_secs: ClientSettings::default().request_timeout.as_secs(),
            forum: ForumSettings::default(),
        }
    }
}

impl Default for ForumSettings {
    fn default() -> Self {
        ForumEndpoints::default().into()
    }
}

impl From<ForumEndpoints> for ForumSettings {
    fn from(endpoints: ForumEndpoints) -> Self {
        Self {
            base_url: endpoints.base_url,
            edit_path: endpoints.edit_path,
            bump_path: endpoints.bump_path,
            token_field: endpoints.token_field,
            bump_message: endpoints.bump_message,
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> ForumEndpoints {
        ForumEndpoints {
            base_url: self.forum.base_url.clone(),
            edit_path: self.forum.edit_path.clone(),
            bump_path: self.forum.bump_path.clone(),
            token_field: self.forum.token_field.clone(),
            bump_message: self.forum.bump_message.clone(),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            endpoints: self.endpoints(),
            min_bump_interval: Duration::from_secs(self.min_bump_interval_secs),
            tick_interval: Duration::from_secs(self.tick_interval_secs.max(1)),
        }
    }

    pub fn client_settings(&self, session_cookie: Option<String>) -> ClientSettings {
        ClientSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            session_cookie,
            ..ClientSettings::default()
        }
    }
}

/// Missing file means first run: defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            shop_info!("No settings at {:?}; using defaults", path);
            return Ok(Settings::default());
        }
        Err(err) => return Err(err.into()),
    };

    let settings: Settings =
        ron::from_str(&content).map_err(|err| SettingsError::Parse(err.to_string()))?;
    shop_debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Writes through a temp file in the same directory and renames it over `path`.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(settings, pretty)
        .map_err(|err| SettingsError::Serialize(err.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| SettingsError::Io(err.error))?;

    shop_info!("Saved settings to {:?}", path);
    Ok(())
}
