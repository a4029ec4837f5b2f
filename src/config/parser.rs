//! Settings loader.
//!
//! Loads tool settings from a YAML file, applies `.env` and environment
//! variable overrides (tokens never belong in the settings file), and
//! validates the result.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{DriftgateError, Result, SettingsError};

use super::settings::Settings;

/// Loader for tool settings.
#[derive(Debug, Default)]
pub struct SettingsLoader {
    /// Base path for resolving the `.env` file.
    base_path: Option<std::path::PathBuf>,
}

impl SettingsLoader {
    /// Creates a new settings loader.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting settings are invalid.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(DriftgateError::Settings(SettingsError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DriftgateError::Settings(SettingsError::ParseError {
                message: format!("Failed to read file: {e}"),
            })
        })?;

        let mut settings = Self::parse_yaml(&content)?;
        Self::apply_env_overrides(&mut settings);
        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Parses settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(content: &str) -> Result<Settings> {
        debug!("Parsing YAML settings");

        let settings: Settings = serde_yaml::from_str(content).map_err(|e| {
            DriftgateError::Settings(SettingsError::ParseError {
                message: format!("YAML parse error: {e}"),
            })
        })?;

        Ok(settings)
    }

    /// Applies environment variable overrides.
    ///
    /// Tokens take precedence from the environment so they can stay out of
    /// version control: `DRIFTGATE_RENDER_TOKEN`, `DRIFTGATE_VAULT_TOKEN`,
    /// and `DRIFTGATE_RENDER_ENDPOINT` for ephemeral CI services.
    fn apply_env_overrides(settings: &mut Settings) {
        if let Ok(endpoint) = std::env::var("DRIFTGATE_RENDER_ENDPOINT") {
            debug!("Overriding render.endpoint from environment");
            settings.render.endpoint = endpoint;
        }

        if let Ok(token) = std::env::var("DRIFTGATE_RENDER_TOKEN") {
            debug!("Overriding render.auth_token from environment");
            settings.render.auth_token = Some(token);
        }

        if let Ok(token) = std::env::var("DRIFTGATE_VAULT_TOKEN") {
            if let Some(vault) = settings.vault.as_mut() {
                debug!("Overriding vault.token from environment");
                vault.token = Some(token);
            }
        }
    }

    /// Validates the loaded settings.
    fn validate(settings: &Settings) -> Result<()> {
        if settings.render.endpoint.trim().is_empty() {
            return Err(DriftgateError::Settings(SettingsError::validation(
                "render endpoint must not be empty",
                "render.endpoint",
            )));
        }

        if settings.fetch.concurrency == 0 {
            return Err(DriftgateError::Settings(SettingsError::validation(
                "fetch concurrency must be at least 1",
                "fetch.concurrency",
            )));
        }

        if let Some(vault) = &settings.vault {
            if vault.address.trim().is_empty() {
                return Err(DriftgateError::Settings(SettingsError::validation(
                    "vault address must not be empty",
                    "vault.address",
                )));
            }
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DriftgateError::Settings(SettingsError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default settings file names to search for.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["driftgate.yaml", "driftgate.yml"];

/// Finds the settings file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no settings file is found.
pub fn find_settings_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_SETTINGS_FILES {
            let settings_path = current.join(filename);
            if settings_path.exists() {
                info!("Found settings file: {}", settings_path.display());
                return Ok(settings_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(DriftgateError::Settings(SettingsError::FileNotFound {
        path: start.join(DEFAULT_SETTINGS_FILES[0]),
    }))
}
