// ABOUTME: Cluster API error types with SNAFU pattern.
// ABOUTME: Tells missing tooling apart from rejected calls and malformed responses.

use snafu::Snafu;

/// Failure of a single cluster API call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApiError {
    #[snafu(display("aws command-line tool not available: {message}"))]
    ToolingMissing { message: String },

    #[snafu(display("failed to run aws {operation}: {source}"))]
    Spawn {
        operation: String,
        source: std::io::Error,
    },

    #[snafu(display("aws {operation} failed: {message}"))]
    Rejected { operation: String, message: String },

    #[snafu(display("{resource} not found: {reason}"))]
    NotFound { resource: String, reason: String },

    #[snafu(display("unexpected response from aws {operation}: {source}"))]
    InvalidResponse {
        operation: String,
        source: serde_json::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The `aws` executable could not be found or run.
    ToolingMissing,
    /// The API refused the request.
    Rejected,
    /// The addressed resource does not exist.
    NotFound,
    /// The response could not be understood.
    InvalidResponse,
}

impl ApiError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::ToolingMissing { .. } => ApiErrorKind::ToolingMissing,
            ApiError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ApiErrorKind::ToolingMissing
            }
            ApiError::Spawn { .. } | ApiError::Rejected { .. } => ApiErrorKind::Rejected,
            ApiError::NotFound { .. } => ApiErrorKind::NotFound,
            ApiError::InvalidResponse { .. } => ApiErrorKind::InvalidResponse,
        }
    }

    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}
