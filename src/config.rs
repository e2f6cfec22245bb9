use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::session::{SessionConfig, MAX_TARGETS, POINTS_PER_TARGET, SESSION_DURATION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub player_name: Option<String>,
    pub session_secs: u32,
    pub max_targets: usize,
    pub points_per_target: u32,
    pub spawn_interval_ms: u64,
    pub spawn_probability: f64,
    pub replacement_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: None,
            session_secs: SESSION_DURATION,
            max_targets: MAX_TARGETS,
            points_per_target: POINTS_PER_TARGET,
            spawn_interval_ms: 2000,
            spawn_probability: 0.4,
            replacement_delay_ms: 300,
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            duration_secs: cfg.session_secs.max(1),
            max_targets: cfg.max_targets,
            points_per_target: cfg.points_per_target,
            spawn_interval: Duration::from_millis(cfg.spawn_interval_ms.max(1)),
            spawn_probability: cfg.spawn_probability.clamp(0.0, 1.0),
            replacement_delay: Duration::from_millis(cfg.replacement_delay_ms),
            ..SessionConfig::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
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
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
