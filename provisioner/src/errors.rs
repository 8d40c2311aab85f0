//! Error types for the provisioner

use thiserror::Error;

/// Main error type for the provisioner
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Request failed with status {status}: {body}")]
    StatusError { status: http::StatusCode, body: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid devcenter configuration, {0}")]
    InvalidConfig(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Prompt error: {0}")]
    PromptError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("destroy operation cancelled")]
    DestroyCancelled,

    #[error("destroy operation interrupted: {0}")]
    DestroyInterrupted(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProvisionError>,
    },
}

impl ProvisionError {
    /// Wrap an error with a description of the failed step
    pub fn context(self, context: impl Into<String>) -> Self {
        ProvisionError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers
    pub fn root(&self) -> &ProvisionError {
        match self {
            ProvisionError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the remote side answered 404
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            ProvisionError::StatusError { status, .. } => *status == http::StatusCode::NOT_FOUND,
            ProvisionError::NotFound(_) => true,
            _ => false,
        }
    }
}

/// Attach context to a fallible result
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, ProvisionError>;
}

impl<T, E: Into<ProvisionError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, ProvisionError> {
        self.map_err(|e| e.into().context(context))
    }
}
