// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration file discovery and loading.

use std::path::{Path, PathBuf};

use crate::error::{IdentityError, Result};

use super::realm::RealmSettings;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "X509_REGISTRATION_CONFIG";

/// Configuration file loader with discovery and precedence rules.
///
/// # Search Order
///
/// Configuration files are searched in the following order (first found wins):
///
/// 1. Explicit path (if set via `with_path()`)
/// 2. Environment variable `X509_REGISTRATION_CONFIG`
/// 3. Unix: `/etc/x509-registration/config.toml`
/// 4. User config dir: `x509-registration/config.toml`
/// 5. Current directory: `./x509-registration.toml`
///
/// An explicit path or environment override that does not exist is an
/// error. When discovery finds nothing the built-in defaults are used.
///
/// # Example
///
/// ```no_run
/// use usg_x509_registration::config::ConfigLoader;
///
/// let settings = ConfigLoader::new()
///     .with_path("/etc/x509-registration/realm.toml")
///     .load()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    validate: bool,
    env_var_name: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            validate: true,
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Set an explicit configuration file path.
    ///
    /// When set, only this path will be checked (no discovery).
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable validation after loading.
    ///
    /// Default: `true`
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Set the environment variable name for path override.
    ///
    /// Default: `X509_REGISTRATION_CONFIG`
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Load the realm configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit or environment-provided path does not exist
    /// - The file cannot be read
    /// - The TOML is invalid
    /// - Validation fails (if enabled)
    pub fn load(&self) -> Result<RealmSettings> {
        let Some(config_path) = self.find_config_file()? else {
            tracing::debug!("No configuration file found, using defaults");
            return self.finish(RealmSettings::default());
        };

        let toml_content = std::fs::read_to_string(&config_path).map_err(|e| {
            IdentityError::config(format!("Failed to read {}: {e}", config_path.display()))
        })?;

        tracing::info!(path = %config_path.display(), "Loaded realm configuration");
        self.finish(RealmSettings::from_toml(&toml_content)?)
    }

    /// Load configuration from a TOML string.
    pub fn load_from_str(&self, toml_content: &str) -> Result<RealmSettings> {
        self.finish(RealmSettings::from_toml(toml_content)?)
    }

    fn finish(&self, settings: RealmSettings) -> Result<RealmSettings> {
        if self.validate {
            settings.validate()?;
        }
        Ok(settings)
    }

    /// Find the configuration file path.
    ///
    /// Returns `Ok(None)` when discovery finds nothing.
    pub fn find_config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(ref path) = self.explicit_path {
            if path.exists() {
                return Ok(Some(path.clone()));
            }
            return Err(IdentityError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        if let Ok(env_path) = std::env::var(&self.env_var_name) {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(IdentityError::config(format!(
                "Configuration file from {} not found: {}",
                self.env_var_name, env_path
            )));
        }

        Ok(self.get_search_paths().into_iter().find(|path| path.exists()))
    }

    /// Get the list of paths to search for configuration files.
    pub fn get_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/x509-registration/config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            let mut path = config_dir;
            path.push("x509-registration");
            path.push("config.toml");
            paths.push(path);
        }

        paths.push(PathBuf::from("x509-registration.toml"));

        paths
    }
}
