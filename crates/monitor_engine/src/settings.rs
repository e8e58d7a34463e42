use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use monitor_logging::{monitor_info, monitor_warn};
use serde::{Deserialize, Serialize};

use crate::persist::{AtomicFileWriter, PersistError};

pub const SETTINGS_FILENAME: &str = "settings.ron";
pub const API_KEY_FILENAME: &str = "api_key";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_PREFIX: &str = "sk-";

/// User settings shared with the worker. The monitor itself only reads `first_launch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai_model: String,
    pub openai_base_url: String,
    pub ocr_enabled: bool,
    pub first_launch: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            ocr_enabled: false,
            first_launch: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("API key is required")]
    MissingApiKey,
    #[error("API key should start with sk-")]
    InvalidApiKey,
    #[error("API base URL is required")]
    MissingBaseUrl,
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Settings collaborator boundary.
pub trait SettingsStore: Send + Sync {
    fn load_settings(&self) -> Result<Settings, SettingsError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError>;
    fn load_api_key(&self) -> Result<Option<String>, SettingsError>;
    fn save_api_key(&self, api_key: &str) -> Result<(), SettingsError>;
}

/// Check what the setup form requires before anything is saved.
pub fn validate_settings(settings: &Settings, api_key: &str) -> Result<(), SettingsError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(SettingsError::MissingApiKey);
    }
    if !api_key.starts_with(API_KEY_PREFIX) {
        return Err(SettingsError::InvalidApiKey);
    }

    let base_url = settings.openai_base_url.trim();
    if base_url.is_empty() {
        return Err(SettingsError::MissingBaseUrl);
    }
    url::Url::parse(base_url).map_err(|source| SettingsError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    Ok(())
}

/// Validate, then persist settings and key. The saved settings always leave first launch behind.
pub fn complete_setup(
    store: &dyn SettingsStore,
    settings: Settings,
    api_key: &str,
) -> Result<Settings, SettingsError> {
    validate_settings(&settings, api_key)?;
    let saved = Settings {
        first_launch: false,
        ..settings
    };
    store.save_settings(&saved)?;
    store.save_api_key(api_key.trim())?;
    Ok(saved)
}

/// Stores settings as RON and the API key as plain text, both in one directory.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(&self, filename: &str) -> Result<Option<String>, SettingsError> {
        let path = self.dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SettingsError::Read { path, source }),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load_settings(&self) -> Result<Settings, SettingsError> {
        let Some(content) = self.read_optional(SETTINGS_FILENAME)? else {
            return Ok(Settings::default());
        };
        let settings = ron::from_str(&content).map_err(|err| {
            let path = self.dir.join(SETTINGS_FILENAME);
            monitor_warn!("Failed to parse settings from {:?}: {}", path, err);
            SettingsError::Parse {
                path,
                message: err.to_string(),
            }
        })?;
        monitor_info!("Loaded settings from {:?}", self.dir);
        Ok(settings)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), SettingsError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(settings, pretty)
            .map_err(|err| SettingsError::Serialize(err.to_string()))?;
        AtomicFileWriter::new(self.dir.clone()).write(SETTINGS_FILENAME, content.as_bytes())?;
        Ok(())
    }

    fn load_api_key(&self) -> Result<Option<String>, SettingsError> {
        Ok(self
            .read_optional(API_KEY_FILENAME)?
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }

    fn save_api_key(&self, api_key: &str) -> Result<(), SettingsError> {
        AtomicFileWriter::new(self.dir.clone()).write(API_KEY_FILENAME, api_key.as_bytes())?;
        Ok(())
    }
}
