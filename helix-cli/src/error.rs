//! Error handling for Helix CLI

use helix_core::{FetchError, ServiceError, SessionError, VariantError};
use thiserror::Error;

/// Main error type for Helix CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Unexpected response from {service}: {message}")]
    Response { service: String, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Sequence error: {message}")]
    Sequence { message: String },

    #[error("Variant error: {message}")]
    Variant { message: String },

    #[error("Predictor not configured")]
    PredictorMissing,
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn response<S: Into<String>>(service: S, message: S) -> Self {
        Self::Response {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(message) => Self::network(message),
            ServiceError::Malformed(message) => Self::response("genome service".to_string(), message),
            ServiceError::NotFound(message) => Self::not_found(message),
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidRange(e) => Self::validation(e.to_string()),
            other => Self::Sequence { message: other.to_string() },
        }
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(e) => Self::validation(e.to_string()),
            SessionError::Fetch(e) => e.into(),
            SessionError::Variant(e) => Self::Variant { message: e.to_string() },
            other => Self::not_found(other.to_string()),
        }
    }
}

impl From<VariantError> for CliError {
    fn from(err: VariantError) -> Self {
        Self::Variant { message: err.to_string() }
    }
}

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::Network { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your network connection\n\
                 • Increase api.timeout_secs in helix.toml\n\
                 • Verify the base URLs in the [api] section"
            );
        }

        CliError::Response { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • The remote service may have changed its format or be degraded\n\
                 • Retry later, or run with -vv to log the raw request"
            );
        }

        CliError::NotFound { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Use 'helix search <QUERY>' to find the exact gene symbol\n\
                 • Check that --genome names an assembly listed by 'helix genomes'"
            );
        }

        CliError::Validation { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • --start and --end must lie inside the gene bounds\n\
                 • The range may not exceed view.max_view_range bases"
            );
        }

        CliError::PredictorMissing => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Set api.predictor_url in helix.toml\n\
                 • Use 'helix config --example' to generate a sample configuration"
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your helix.toml configuration file\n\
                 • Use 'helix config --example' to generate a sample configuration\n\
                 • Verify that all configuration values are valid"
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}
