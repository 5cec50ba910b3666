use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "study-aid";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// Persisted preferences and history
    pub fn state_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("state.json"))
            .unwrap_or_else(|| PathBuf::from("study_aid_state.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|d| d.join("study-aid.log"))
            .unwrap_or_else(|| PathBuf::from("study-aid.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("study_aid_config.json"))
    }
}
