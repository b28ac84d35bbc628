/// Controller configuration
use crate::logging::LoggingConfig;
use lullaby_core::{AudioMode, MixerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lullaby.toml";

/// Environment variable prefix, e.g. `LULLABY_LOGGING__VERBOSE=true`
pub const ENV_PREFIX: &str = "LULLABY";

/// Options injected into a controller at construction
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub audio_mode: AudioMode,
}

impl ControllerConfig {
    /// Load configuration from `lullaby.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from `path` (if present) and environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut settings = ::config::Config::builder();

        let path = path.as_ref();
        if path.exists() {
            settings = settings.add_source(::config::File::from(path));
        }

        // Environment overrides the file
        settings = settings.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| MixerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| MixerError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lullaby_core::InterruptionMode;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert!(config.logging.enabled);
        assert!(!config.logging.verbose);
        assert_eq!(config.audio_mode, AudioMode::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ControllerConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.audio_mode, AudioMode::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lullaby.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[logging]\nenabled = false\n\n[audio_mode]\ninterruption = \"mix_with_others\"\nstays_active_in_background = false"
        )
        .unwrap();

        let config = ControllerConfig::load_from(&path).unwrap();
        assert!(!config.logging.enabled);
        assert!(!config.logging.verbose);
        assert_eq!(config.audio_mode.interruption, InterruptionMode::MixWithOthers);
        assert!(!config.audio_mode.stays_active_in_background);
        assert!(config.audio_mode.plays_in_silent_mode);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lullaby.toml");
        std::fs::write(&path, "[logging]\nenabled = \"sometimes\"").unwrap();

        let result = ControllerConfig::load_from(&path);
        assert!(matches!(result, Err(MixerError::Config(_))));
    }
}
