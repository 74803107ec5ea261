use super::{get_global_config_dir, Config, ConfigError};
use std::path::{Path, PathBuf};

/// Layers configuration: defaults, the global file, an explicit file, then
/// the environment.
pub struct ConfigLoader {
    global_dir: Option<PathBuf>,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_dir: get_global_config_dir(),
            use_env: true,
        }
    }

    /// Look for the global `config.toml` in `dir` instead of the user directory.
    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn load(&self, path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = Config::new();

        if let Some(global) = self.global_dir.as_ref().map(|d| d.join("config.toml")) {
            if global.exists() {
                tracing::debug!("Loading global config from {}", global.display());
                config = Self::read(&global)?;
            }
        }

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            tracing::debug!("Loading config from {}", path.display());
            config = Self::read(path)?;
        }

        if self.use_env {
            config.merge_env_vars();
        }

        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
