use serde::{Deserialize, Serialize};
use tokio::fs::{read, write, try_exists, create_dir_all};
use thiserror::Error;
use std::{cell::{Ref, RefMut, RefCell}, path::PathBuf};
use directories::ProjectDirs;
use log::debug;

const PREF_FILE_NAME: &str = "config.json";

pub const DEFAULT_API_URL: &str = "http://localhost:4002";
pub const DEFAULT_MACHINE: &str = "localhost";

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Preferences parse error")]
    SerdeError(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
    #[error("Preferences locked")]
    PrefsLocked
}

type Result<T> = std::result::Result<T, PreferencesError>;

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// base URL of the Hazy web service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// netrc machine name the access token is stored under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>
}

impl Preferences {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn machine(&self) -> &str {
        self.machine.as_deref().unwrap_or(DEFAULT_MACHINE)
    }
}

#[derive(Debug)]
pub struct DataStore {
    preferences: RefCell<Preferences>,
    config_dir: PathBuf
}

impl DataStore {
    /// Load preferences from the user config dir, creating an empty file if none exists
    pub async fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "hazy", "hazy").ok_or(PreferencesError::NoConfigDir)?;
        Self::open(dirs.config_dir().to_path_buf()).await
    }

    pub async fn open(config_dir: PathBuf) -> Result<Self> {
        let config_path = config_dir.join(PREF_FILE_NAME);
        if try_exists(&config_path).await? {
            debug!("Loading preferences from {}", config_path.display());
            Ok(Self {
                preferences: RefCell::new(serde_json::from_slice(&read(config_path).await?)?),
                config_dir
            })
        } else {
            debug!("Creating preferences at {}", config_path.display());

            create_dir_all(&config_dir).await?;
            write(&config_path, "{}").await?;
            Ok(Self {
                preferences: RefCell::new(Preferences::default()),
                config_dir
            })
        }
    }

    pub async fn save(&self) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&*self.read()?)?;
        create_dir_all(&self.config_dir).await?;
        write(self.config_dir.join(PREF_FILE_NAME), serialized).await?;
        Ok(())
    }

    pub fn read(&self) -> Result<Ref<'_, Preferences>> {
        self.preferences.try_borrow().map_err(|_| PreferencesError::PrefsLocked)
    }

    pub fn write(&self) -> Result<RefMut<'_, Preferences>> {
        self.preferences.try_borrow_mut().map_err(|_| PreferencesError::PrefsLocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("hazy");

        let store = DataStore::open(config_dir.clone()).await.unwrap();
        assert!(config_dir.join(PREF_FILE_NAME).exists());

        let prefs = store.read().unwrap();
        assert_eq!(prefs.api_url(), DEFAULT_API_URL);
        assert_eq!(prefs.machine(), DEFAULT_MACHINE);
    }

    #[tokio::test]
    async fn saved_values_are_reloaded() {
        let dir = TempDir::new().unwrap();

        let store = DataStore::open(dir.path().to_path_buf()).await.unwrap();
        store.write().unwrap().api_url = Some("https://hazy.example.com".into());
        store.save().await.unwrap();

        let reloaded = DataStore::open(dir.path().to_path_buf()).await.unwrap();
        let prefs = reloaded.read().unwrap();
        assert_eq!(prefs.api_url(), "https://hazy.example.com");
        assert_eq!(prefs.machine(), DEFAULT_MACHINE);
    }

    #[test]
    fn borrow_conflict_is_reported() {
        let store = DataStore {
            preferences: RefCell::new(Preferences::default()),
            config_dir: PathBuf::new()
        };
        let _guard = store.write().unwrap();
        assert!(matches!(store.read(), Err(PreferencesError::PrefsLocked)));
    }
}
