use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("bughunt"),
            )
        } else {
            ProjectDirs::from("", "", "bughunt").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("scores.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("bughunt.log"))
    }

    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("", "", "bughunt") {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("bughunt_config.json"),
        }
    }
}
