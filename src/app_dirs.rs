use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "deer-timer";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn sessions_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
                .join("sessions.json")
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_local_dir().join("sessions.json")
        } else {
            PathBuf::from("deer_sessions.json")
        }
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("deer_config.json"))
    }
}
