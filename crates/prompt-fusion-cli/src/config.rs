//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory),
//! and applying command-line overrides on top.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use prompt_fusion::{FusionError, config::AppConfig};

use crate::Args;

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for FusionError {
    fn from(err: ConfigError) -> Self {
        FusionError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (prompt-fusion/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, FusionError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("prompt-fusion/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "prompt-fusion", "prompt-fusion") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Apply command-line overrides and check the result.
///
/// # Errors
///
/// Returns an error if the resulting step count is zero.
pub fn apply_overrides(mut config: AppConfig, args: &Args) -> Result<AppConfig, FusionError> {
    let schedule = config.schedule_mut();
    if let Some(steps) = args.steps {
        schedule.set_steps(steps);
    }
    if args.hires {
        schedule.set_hires(true);
    }
    if args.old_scheduling {
        schedule.set_use_old_scheduling(true);
    }

    if config.schedule().steps() == 0 {
        return Err(ConfigError::Validation("steps must be greater than zero".to_string()).into());
    }

    debug!(
        steps = config.schedule().steps(),
        hires = config.schedule().hires(),
        old_scheduling = config.schedule().use_old_scheduling();
        "Configuration resolved",
    );
    Ok(config)
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, FusionError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_load_explicit_config() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[schedule]\nsteps = 42\n").expect("Failed to write config");

        let config = load_config(Some(&path)).expect("Failed to load config");

        assert_eq!(config.schedule().steps(), 42);
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();

        assert!(matches!(err, FusionError::Config(_)));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[schedule]\nsteps = \"many\"\n").expect("Failed to write config");

        let err = load_config(Some(&path)).unwrap_err();

        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }

    #[test]
    fn test_overrides() {
        let mut args = Args::new("prompt.txt");
        args.steps = Some(8);
        args.hires = true;

        let config = apply_overrides(AppConfig::default(), &args).expect("Valid overrides");

        assert_eq!(config.schedule().steps(), 8);
        assert!(config.schedule().hires());
        assert!(!config.schedule().use_old_scheduling());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let mut args = Args::new("prompt.txt");
        args.steps = Some(0);

        let err = apply_overrides(AppConfig::default(), &args).unwrap_err();

        assert!(matches!(err, FusionError::Config(_)));
    }
}
