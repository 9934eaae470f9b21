//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BindingConfig, ConfluxConfig, LogOutput, LoggingConfig};
use super::section::component_sections;

/// Validates the entire configuration.
pub fn validate_config(config: &ConfluxConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_binding_config(&config.binding)?;
    component_sections(config)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is 'file'",
        ));
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: '{target}'"
            )));
        }
    }

    Ok(())
}

fn validate_binding_config(binding: &BindingConfig) -> ConfigResult<()> {
    if binding.activation_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "binding.activation_timeout_ms must be greater than 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_validate_empty_config() {
        assert!(validate_config(&ConfluxConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = ConfluxConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/conflux.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ConfluxConfig::default();
        config.binding.activation_timeout_ms = Some(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let mut config = ConfluxConfig::default();
        config.components.insert("aws2-kinesis".into(), json!(42));
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidSection { .. })
        ));
    }
}
