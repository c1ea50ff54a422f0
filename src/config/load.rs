//! Configuration loading from files.
//!
//! The YAML file is optional. Values from `FOLIO__`-prefixed environment
//! variables are layered on top, e.g. `FOLIO__SITE__URL=https://me.dev`.

use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};

use super::{Config, ConfigError};

/// Environment variable prefix for config overrides.
const ENV_PREFIX: &str = "FOLIO";

impl Config {
    /// Load the config from the command line argument, defaulting to `folio.yaml`.
    ///
    /// Returns the config and the absolute path of the config file.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_file = config_file.unwrap_or(Path::new("folio.yaml"));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let config = Self::load_from_file(&config_file)?;
        Ok((config, config_file))
    }

    /// Load the config from a file path. A missing file yields the defaults.
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
