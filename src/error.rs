//! Gateway error taxonomy.
//!
//! Every failure a tool call can surface is one of these variants; the
//! dispatcher converts them into structured `ToolResult` errors and never
//! lets one escape as a panic or process exit. None of the messages ever
//! carry the credential secret; the account identity may appear in
//! diagnostic detail.

use thiserror::Error;

use crate::backend::{BackendKind, TwoFactorChallenge};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no credential stored; run the provisioning flow first")]
    NoCredential,

    #[error("secret store unavailable: {0}")]
    SecretStoreUnavailable(String),

    #[error("{backend} requires a second factor: {}", .challenge.prompt)]
    SecondFactorRequired {
        backend: BackendKind,
        challenge: TwoFactorChallenge,
    },

    #[error("{backend} permission denied: {detail}")]
    PermissionDenied { backend: BackendKind, detail: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {}", .problems.join("; "))]
    InvalidArguments { tool: String, problems: Vec<String> },

    #[error("{backend} authentication failed: {detail}")]
    BackendAuthError { backend: BackendKind, detail: String },

    #[error("{backend} call timed out after {timeout_secs}s")]
    BackendTimeout {
        backend: BackendKind,
        timeout_secs: u64,
    },

    #[error("{backend} error: {message}")]
    BackendError { backend: BackendKind, message: String },

    #[error("not found: {0}")]
    NotFound(String),
}

impl GatewayError {
    /// Stable wire code for the error descriptor in a `ToolResult`.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NoCredential => "no_credential",
            GatewayError::SecretStoreUnavailable(_) => "secret_store_unavailable",
            GatewayError::SecondFactorRequired { .. } => "second_factor_required",
            GatewayError::PermissionDenied { .. } => "permission_denied",
            GatewayError::UnknownTool(_) => "unknown_tool",
            GatewayError::InvalidArguments { .. } => "invalid_arguments",
            GatewayError::BackendAuthError { .. } => "backend_auth_error",
            GatewayError::BackendTimeout { .. } => "backend_timeout",
            GatewayError::BackendError { .. } => "backend_error",
            GatewayError::NotFound(_) => "not_found",
        }
    }

    /// The originating backend, where one is involved.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            GatewayError::SecondFactorRequired { backend, .. }
            | GatewayError::PermissionDenied { backend, .. }
            | GatewayError::BackendAuthError { backend, .. }
            | GatewayError::BackendTimeout { backend, .. }
            | GatewayError::BackendError { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}
