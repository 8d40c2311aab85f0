//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Name of the state directory kept next to the project
pub const STATE_DIR_NAME: &str = ".devprov";

/// Storage layout for the provisioner
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Layout rooted in the state directory of a project
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        Self::new(project_dir.into().join(STATE_DIR_NAME))
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Get the directory of one environment
    pub fn environment_dir(&self, env_name: &str) -> Dir {
        Dir::new(self.base_dir.join(env_name))
    }

    /// Get the config file of one environment
    pub fn environment_config_file(&self, env_name: &str) -> File {
        self.environment_dir(env_name).file("config.json")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("logs"))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::for_project(".")
    }
}
