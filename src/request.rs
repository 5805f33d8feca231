//! Per-request view of the Inertia protocol headers.
//!
//! [`InertiaContext`] is derived once from the incoming request and stays
//! immutable for the request's lifetime. It doubles as an Axum extractor so
//! handlers receive it transparently:
//!
//! ```ignore
//! async fn index(
//!     State(inertia): State<Inertia>,
//!     ctx: InertiaContext,
//! ) -> Result<Response, InertiaError> {
//!     inertia.render("Users/Index").prop("users", users).build(&ctx).await
//! }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Uri},
};
use std::sync::Arc;

use crate::headers;
use crate::session::{InertiaSession, SessionStore};

/// Read-only view of the incoming request's protocol headers.
#[derive(Debug, Clone, Default)]
pub struct InertiaContext {
    /// Whether the request carries `X-Inertia: true`.
    pub is_inertia: bool,
    /// The asset version the client remembers, if any.
    pub client_version: Option<String>,
    /// Component a partial reload targets; presence marks the request as a
    /// partial reload.
    pub partial_component: Option<String>,
    /// Key-prefix allow-list for partial reloads.
    pub partial_only: Vec<String>,
    /// Key-prefix deny-list for partial reloads.
    pub partial_except: Vec<String>,
    /// Keys whose cached client values are being discarded.
    pub reset_keys: Vec<String>,
    /// Path and query of the incoming request, used for the page `url`.
    pub request_uri: String,
    /// Session access, when a backend is installed on the request.
    pub session: Option<InertiaSession>,
}

impl InertiaContext {
    /// Derive the context from request metadata.
    #[must_use]
    pub fn from_request_meta(
        request_headers: &HeaderMap,
        uri: &Uri,
        session: Option<Arc<dyn SessionStore>>,
    ) -> Self {
        Self {
            is_inertia: header_str(request_headers, headers::X_INERTIA) == Some("true"),
            client_version: header_str(request_headers, headers::X_INERTIA_VERSION)
                .map(ToOwned::to_owned),
            partial_component: header_str(request_headers, headers::X_INERTIA_PARTIAL_COMPONENT)
                .map(ToOwned::to_owned),
            partial_only: header_list(request_headers, headers::X_INERTIA_PARTIAL_DATA),
            partial_except: header_list(request_headers, headers::X_INERTIA_PARTIAL_EXCEPT),
            reset_keys: header_list(request_headers, headers::X_INERTIA_RESET),
            request_uri: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string),
            session: session.map(InertiaSession::new),
        }
    }

    /// Whether the request asks for a subset of an on-screen component's
    /// props rather than a fresh page.
    #[must_use]
    pub const fn is_partial_reload(&self) -> bool {
        self.partial_component.is_some()
    }
}

fn header_str<'h>(request_headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    request_headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_list(request_headers: &HeaderMap, name: &str) -> Vec<String> {
    header_str(request_headers, name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl<S> FromRequestParts<S> for InertiaContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Arc<dyn SessionStore>>().cloned();
        Ok(Self::from_request_meta(&parts.headers, &parts.uri, session))
    }
}
