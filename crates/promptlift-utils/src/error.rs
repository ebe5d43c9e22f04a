use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `PromptliftError` is returned by the fallible construction paths of the
/// library (building a client from configuration, loading configuration,
/// validating a request). Once an enhancement call is underway, failures are
/// captured in the returned result instead of surfacing here.
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or override errors |
/// | `Llm` | Enhancement client construction errors |
/// | `InputValidation` | Rejected prompt or timeout |
/// | `Io` | Filesystem errors outside of project analysis |
///
/// # Example
///
/// ```rust
/// use promptlift_utils::error::{InputValidationError, PromptliftError};
///
/// let err = PromptliftError::from(InputValidationError::EmptyPrompt);
/// assert!(err.display_for_user().contains("prompt"));
/// ```
#[derive(Error, Debug)]
pub enum PromptliftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid input: {0}")]
    InputValidation(#[from] InputValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromptliftError {
    /// Render the error with its context and suggestions for a terminal user.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut out = format!("Error: {}", self.user_message());
        if let Some(context) = self.context() {
            out.push_str("\n\n");
            out.push_str(&context);
        }
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                out.push_str("\n  - ");
                out.push_str(&suggestion);
            }
        }
        out
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    LlmIntegration,
    ProjectAnalysis,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::LlmIntegration => write!(f, "LLM Integration"),
            Self::ProjectAnalysis => write!(f, "Project Analysis"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Rejected enhancement input.
///
/// Raised synchronously, before any filesystem or network work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputValidationError {
    #[error("prompt must not be empty or whitespace")]
    EmptyPrompt,

    #[error("timeout must be a positive, finite number of seconds (got {0})")]
    InvalidTimeout(f64),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Failure of a single project analyzer.
///
/// Never fails a context lookup: the aggregator substitutes an empty section.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("I/O error while analyzing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Failed to parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

/// Errors reported by an enhancement client.
///
/// Categorized by origin so callers can tell "provider rejected the call"
/// apart from "we never reached the provider".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, request construction)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// The client library's own timeout fired
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Response arrived but could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM request timed out after {:?}", duration)
            }
            Self::MalformedResponse(msg) => format!("LLM returned an unusable response: {msg}"),
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some(
                "Transport errors occur when the LLM provider cannot be reached.".to_string(),
            ),
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "The HTTP client gave up before the provider answered.".to_string(),
            ),
            Self::MalformedResponse(_) => None,
            Self::Misconfiguration(_) => Some(
                "Configuration errors indicate missing or invalid [llm] settings.".to_string(),
            ),
            Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Check your network connection".to_string(),
                "Verify [llm.<provider>] base_url if you set one".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Export the API key named by api_key_env (ANTHROPIC_API_KEY by default)"
                    .to_string(),
            ],
            Self::ProviderQuota(_) => vec!["Wait a moment and retry the request".to_string()],
            Self::ProviderOutage(_) => vec!["Retry later".to_string()],
            Self::Timeout { .. } => vec!["Retry with a larger timeout".to_string()],
            Self::MalformedResponse(_) => {
                vec!["Retry; if it persists, try a different model".to_string()]
            }
            Self::Misconfiguration(_) => {
                vec!["Review .promptlift/config.toml [llm] section".to_string()]
            }
            Self::Unsupported(_) => vec!["Use provider 'anthropic' or 'openrouter'".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) | Self::Unsupported(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::LlmIntegration,
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Configuration file is invalid: {msg}"),
            Self::MissingRequired(what) => format!("Missing required configuration: {what}"),
            Self::InvalidValue { key, value } => format!("Invalid value for '{key}': {value}"),
        }
    }

    fn context(&self) -> Option<String> {
        Some(
            "Configuration is read from .promptlift/config.toml, PROMPTLIFT_* environment \
             variables and caller overrides."
                .to_string(),
        )
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec!["Check the TOML syntax of the config file".to_string()],
            Self::MissingRequired(what) => vec![format!("Set '{what}' in the config file")],
            Self::InvalidValue { key, .. } => vec![format!("Correct the value of '{key}'")],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for PromptliftError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::InputValidation(e) => format!("Invalid input: {e}"),
            Self::Io(e) => format!("I/O error: {e}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Llm(e) => e.context(),
            Self::InputValidation(_) | Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::InputValidation(InputValidationError::EmptyPrompt) => {
                vec!["Provide a non-empty prompt".to_string()]
            }
            Self::InputValidation(InputValidationError::InvalidTimeout(_)) => {
                vec!["Use a timeout greater than zero seconds".to_string()]
            }
            Self::Io(_) => vec![],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Llm(e) => e.category(),
            Self::InputValidation(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display_is_verbatim_friendly() {
        let err = LlmError::ProviderAuth("anthropic authentication failed: 401".to_string());
        assert_eq!(
            err.to_string(),
            "Provider authentication error: anthropic authentication failed: 401"
        );
        assert_eq!(err.category(), ErrorCategory::LlmIntegration);
    }

    #[test]
    fn test_misconfiguration_is_configuration_category() {
        let err = LlmError::Misconfiguration("no model".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_display_for_user_includes_suggestions() {
        let err = PromptliftError::from(InputValidationError::EmptyPrompt);
        let rendered = err.display_for_user();
        assert!(rendered.starts_with("Error: Invalid input"));
        assert!(rendered.contains("Provide a non-empty prompt"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_invalid_timeout_message() {
        let err = InputValidationError::InvalidTimeout(-1.0);
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_config_error_wraps_into_library_error() {
        let err: PromptliftError = ConfigError::InvalidValue {
            key: "timeout_secs".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert!(err.to_string().contains("timeout_secs"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
