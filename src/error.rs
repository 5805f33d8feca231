//! Error types for the Inertia adapter.
//!
//! This module defines the error taxonomy for page assembly and rendering,
//! implementing Axum's `IntoResponse` trait so handlers can bubble failures
//! with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias for Inertia operations.
pub type Result<T> = std::result::Result<T, InertiaError>;

/// Failure modes of the Inertia adapter.
///
/// Construction-time misuse (`InvalidPropConfiguration`) is caller-visible
/// and must not be downgraded. Rendering failures map to server-error
/// responses. SSR delegate failures are deliberately absent here: they are
/// non-fatal and handled by falling back to client-side rendering inside the
/// renderer.
#[derive(Debug, Error)]
pub enum InertiaError {
    /// A deferred prop was constructed with both `merge` and `deep_merge`.
    #[error("invalid prop configuration: {0}")]
    InvalidPropConfiguration(String),

    /// The prop mapping could not be turned into the wire format.
    #[error("failed to serialize page: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured root template could not be resolved.
    #[error("root template {0:?} not found")]
    TemplateNotFound(String),

    /// The root template resolved but failed while producing HTML.
    #[error("template rendering failed: {0}")]
    TemplateRender(#[source] anyhow::Error),
}

impl IntoResponse for InertiaError {
    fn into_response(self) -> Response {
        // Every failure mode here is a server-side defect; none is
        // recoverable by the client retrying with different input.
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        tracing::error!(status = %status, error = %self, "Inertia response failed");
        (status, self.to_string()).into_response()
    }
}
