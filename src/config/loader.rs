use super::types::*;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid server name: {0}")]
    InvalidServerName(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate settings from a TOML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = fs::read_to_string(path)?;
    parse_settings(&contents)
}

/// Parse and validate settings from TOML text
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let mut settings: Settings = toml::from_str(contents)?;
    validate_settings(&settings)?;

    settings.logging.directory = super::expand_tilde(&settings.logging.directory);
    if let Some(path) = settings.archiver.path.take() {
        settings.archiver.path = Some(super::expand_tilde(&path));
    }

    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    validate_compression_level(settings.archiver.compression_level)?;

    if settings.archiver.timeout_seconds == Some(0) {
        return Err(ConfigError::ValidationError(
            "archiver.timeout_seconds must be greater than zero".to_string(),
        ));
    }

    if settings.logging.max_files == 0 {
        return Err(ConfigError::ValidationError(
            "logging.max_files must be greater than zero".to_string(),
        ));
    }

    match settings.logging.level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "warning" | "error" => {}
        other => {
            return Err(ConfigError::ValidationError(format!(
                "logging.level: unknown level '{}'",
                other
            )))
        }
    }

    Ok(())
}
