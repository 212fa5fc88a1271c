use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::session::Catalog;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub props: Vec<String>,
    pub moods: Vec<String>,
    pub tick_interval_ms: u64,
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let catalog = Catalog::default();
        Self {
            props: catalog.props.labels().to_vec(),
            moods: catalog.moods.labels().to_vec(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            data_file: None,
        }
    }
}

impl Config {
    pub fn catalog(&self) -> Catalog {
        Catalog::or_defaults(self.props.clone(), self.moods.clone())
    }

    /// Session log location: explicit override, then config, then the
    /// platform default.
    pub fn sessions_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.data_file.clone())
            .unwrap_or_else(AppDirs::sessions_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(path = %self.path.display(), "ignoring unreadable config: {e}"),
            }
        }
        Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(path: &Path, cfg: &Config) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec_pretty(cfg).unwrap()).unwrap();
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = Config::default();
        write_config(&path, &cfg);
        assert_eq!(FileConfigStore::with_path(&path).load(), cfg);
    }

    #[test]
    fn load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = Config {
            props: vec!["Glove".into()],
            moods: vec!["Bored".into(), "Wired".into()],
            tick_interval_ms: 1000,
            data_file: Some(PathBuf::from("/tmp/deer.json")),
        };
        write_config(&path, &cfg);
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg, loaded);
        assert_eq!(loaded.catalog().moods.default_label(), "Bored");
    }

    #[test]
    fn missing_or_broken_config_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"tick_interval_ms": 100, "props": []}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.tick_interval_ms, 100);
        assert_eq!(cfg.moods, Config::default().moods);
        // an empty list can't supply a fallback label
        assert_eq!(cfg.catalog().props, Catalog::default().props);
    }

    #[test]
    fn cli_override_wins_over_config_file_setting() {
        let cfg = Config {
            data_file: Some(PathBuf::from("/from/config.json")),
            ..Config::default()
        };
        assert_eq!(
            cfg.sessions_path(Some(Path::new("/from/cli.json"))),
            PathBuf::from("/from/cli.json")
        );
        assert_eq!(cfg.sessions_path(None), PathBuf::from("/from/config.json"));
    }
}
