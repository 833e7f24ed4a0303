//! CLI boundary errors

use thiserror::Error;
use worklock_types::ValidationError;

#[derive(Debug, Error)]
pub enum CliError {
    /// A required option is missing or inconsistent after merging flags,
    /// config file and environment
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl CliError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CliError::Configuration {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        CliError::configuration(e.to_string())
    }
}
