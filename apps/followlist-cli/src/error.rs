//! CLI error types and exit codes

use followlist_core::{FetchError, IdentifierError, LimitsError, ReferenceError, WorkflowError};
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication required
/// - 3: Network error
/// - 4: Validation error
/// - 5: Server error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not logged in. Run 'followlist login <handle>' first.")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Session expired. Please run 'followlist login' again.")]
    TokenExpired,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection failed: {0}\n\nTroubleshooting:\n  - Check your internet connection\n  - Verify the configured service URLs\n  - Try again in a few moments")]
    ConnectionFailed(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid list reference: {0}")]
    InvalidReference(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential storage error: {0}")]
    CredentialStorage(String),

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Timed out waiting for the browser to complete sign-in.")]
    LoginTimeout,

    #[error("Could not resolve identity: {0}")]
    Resolution(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Collection too large: {0}")]
    CollectionTooLarge(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotAuthenticated | CliError::TokenExpired => 2,
            CliError::AuthenticationFailed(_)
            | CliError::AuthorizationDenied(_)
            | CliError::LoginTimeout => 2,
            CliError::Network(_) | CliError::ConnectionFailed(_) => 3,
            CliError::Validation(_) | CliError::NotFound(_) | CliError::Resolution(_) => 4,
            CliError::InvalidReference(_) => 4,
            CliError::CollectionTooLarge(_) => 4,
            CliError::Server(_) => 5,
            CliError::Api { status, .. } => {
                if *status >= 500 {
                    5
                } else if *status == 401 || *status == 403 {
                    2
                } else {
                    4
                }
            }
            CliError::Io(_) => 1,
            CliError::Config(_) => 1,
            CliError::CredentialStorage(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NotAuthenticated => Some("Run 'followlist login <handle>' to authenticate."),
            CliError::TokenExpired => Some("Run 'followlist login <handle>' to re-authenticate."),
            CliError::LoginTimeout => {
                Some("Run 'followlist login <handle>' and finish signing in within the time limit.")
            }
            CliError::ConnectionFailed(_) => Some("Check your network connection and try again."),
            CliError::AuthorizationDenied(_) => {
                Some("Approve the request in the browser to let followlist read your follows.")
            }
            CliError::Validation(_) => Some("Run 'followlist --help' to see the expected arguments."),
            CliError::InvalidReference(_) => Some(
                "Pass a list URL like https://bsky.app/profile/<handle>/lists/<id> or an at:// identifier.",
            ),
            CliError::CollectionTooLarge(_) => {
                Some("Raise max_pages or max_items in config.json if this is expected.")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            CliError::ConnectionFailed(e.to_string())
        } else if e.is_timeout() {
            CliError::Network("Request timed out".to_string())
        } else if e.is_decode() {
            CliError::Server(format!("Unexpected response body: {e}"))
        } else {
            CliError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {}", e))
    }
}

impl From<keyring::Error> for CliError {
    fn from(e: keyring::Error) -> Self {
        CliError::CredentialStorage(e.to_string())
    }
}

impl From<IdentifierError> for CliError {
    fn from(e: IdentifierError) -> Self {
        CliError::Validation(e.to_string())
    }
}

impl From<ReferenceError> for CliError {
    fn from(e: ReferenceError) -> Self {
        CliError::InvalidReference(e.to_string())
    }
}

impl From<LimitsError> for CliError {
    fn from(e: LimitsError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<WorkflowError> for CliError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::NotAuthenticated { .. } => CliError::NotAuthenticated,
            other => CliError::Validation(other.to_string()),
        }
    }
}

impl From<FetchError<CliError>> for CliError {
    fn from(e: FetchError<CliError>) -> Self {
        match e {
            FetchError::Source(inner) => inner,
            bound => CliError::CollectionTooLarge(bound.to_string()),
        }
    }
}
