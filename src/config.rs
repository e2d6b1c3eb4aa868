use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::hint::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::profile::{CreatorOverrides, Difficulty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintBackend {
    #[default]
    Offline,
    Gemini,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreatorSettings {
    #[serde(flatten)]
    pub overrides: CreatorOverrides,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub player_name: String,
    pub difficulty: Difficulty,
    pub hint_backend: HintBackend,
    pub hint_model: String,
    pub hint_timeout_secs: u64,
    pub dictionary: Option<PathBuf>,
    pub creator: CreatorSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: "player".to_string(),
            difficulty: Difficulty::Easy,
            hint_backend: HintBackend::Offline,
            hint_model: DEFAULT_MODEL.to_string(),
            hint_timeout_secs: DEFAULT_TIMEOUT_SECS,
            dictionary: None,
            creator: CreatorSettings::default(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("hangtime_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(io::Error::other)?;
        fs::write(&self.path, data)
    }
}
