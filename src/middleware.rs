//! Protocol middleware: version negotiation and response post-processing.
//!
//! The layer wraps every route and implements the request/response halves of
//! the protocol that live outside the handler:
//!
//! 1. **Pre-request**: an Inertia GET whose remembered asset version is
//!    stale is answered immediately with `409 Conflict` and an
//!    `X-Inertia-Location` header naming the full URL to hard-visit; the
//!    handler never runs. On every Inertia request the `X-XSRF-Token`
//!    header is copied to `X-CSRF-Token` for backend-framework
//!    compatibility.
//! 2. **Post-request**: `301`/`302` redirects answering `PUT`/`PATCH`/
//!    `DELETE` Inertia requests are rewritten to `303` so the client's
//!    follow-up uses GET; `Vary: X-Inertia` is guaranteed; session-scoped
//!    Inertia state is purged unless the response is a redirect (where it
//!    must survive into the next request).
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//!
//! let inertia = Inertia::new(config);
//! let app = Router::new()
//!     .route("/", get(home))
//!     .layer(inertia.layer());
//! ```

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

use crate::headers;
use crate::service::Inertia;
use crate::session::{InertiaSession, SessionStore};

/// Whether the client's remembered version no longer matches the server's.
///
/// When the server version parses as a number the client value is coerced
/// to numeric for the comparison too, falling back to raw string equality
/// when it does not parse. A missing client version is always stale.
fn version_is_stale(client: Option<&str>, server: &str) -> bool {
    let Some(client) = client else {
        return true;
    };
    if let Ok(server_num) = server.parse::<f64>() {
        if let Ok(client_num) = client.parse::<f64>() {
            return client_num.partial_cmp(&server_num) != Some(std::cmp::Ordering::Equal);
        }
    }
    client != server
}

/// Layer installing [`InertiaMiddleware`].
#[derive(Clone)]
pub struct InertiaLayer {
    inertia: Inertia,
}

impl InertiaLayer {
    /// Create the layer for an adapter handle.
    #[must_use]
    pub const fn new(inertia: Inertia) -> Self {
        Self { inertia }
    }
}

impl<S> Layer<S> for InertiaLayer {
    type Service = InertiaMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InertiaMiddleware {
            inner,
            inertia: self.inertia.clone(),
        }
    }
}

/// Middleware service implementing the protocol rules around the handler.
#[derive(Clone)]
pub struct InertiaMiddleware<S> {
    inner: S,
    inertia: Inertia,
}

impl<S> Service<Request> for InertiaMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let is_inertia = req
            .headers()
            .get(headers::X_INERTIA)
            .and_then(|v| v.to_str().ok())
            == Some("true");
        let method = req.method().clone();

        if is_inertia && method == Method::GET {
            let client_version = req
                .headers()
                .get(headers::X_INERTIA_VERSION)
                .and_then(|v| v.to_str().ok());
            let config = self.inertia.config();
            if version_is_stale(client_version, config.effective_version()) {
                let location = format!(
                    "{}{}",
                    config.url.trim_end_matches('/'),
                    req.uri()
                        .path_and_query()
                        .map_or_else(|| req.uri().path(), |pq| pq.as_str())
                );
                tracing::debug!(%location, "stale asset version, forcing full reload");
                let response = version_conflict_response(&location);
                return Box::pin(async move { Ok(response) });
            }
        }

        if is_inertia {
            if let Some(token) = req.headers().get(headers::X_XSRF_TOKEN).cloned() {
                req.headers_mut().insert(headers::X_CSRF_TOKEN, token);
            }
        }

        let session = req.extensions().get::<Arc<dyn SessionStore>>().cloned();
        let span = tracing::info_span!(
            "inertia_request",
            method = %method,
            uri = %req.uri(),
            inertia = is_inertia,
        );
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;

            if is_inertia
                && matches!(
                    response.status(),
                    StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND
                )
                && (method == Method::PUT || method == Method::PATCH || method == Method::DELETE)
            {
                *response.status_mut() = StatusCode::SEE_OTHER;
            }

            if !response.headers().contains_key(header::VARY) {
                response
                    .headers_mut()
                    .insert(header::VARY, HeaderValue::from_static(headers::X_INERTIA));
            }

            // Flash state must survive a redirect into the follow-up request.
            if let Some(store) = session {
                if !response.status().is_redirection() {
                    InertiaSession::new(store).cleanup();
                }
            }

            Ok(response)
        })
    }
}

fn version_conflict_response(location: &str) -> Response {
    let mut response = StatusCode::CONFLICT.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response
            .headers_mut()
            .insert(headers::X_INERTIA_LOCATION, value);
    }
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static(headers::X_INERTIA));
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::InertiaConfig;
    use crate::session::MemorySessionStore;
    use axum::{
        body::Body,
        http::Request,
        routing::{delete, get},
        Extension, Router,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn adapter(version: &str) -> Inertia {
        Inertia::new(
            InertiaConfig::new("https://app.example.com").with_version(version),
        )
    }

    fn inertia_get(uri: &str, version: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header(headers::X_INERTIA, "true");
        if let Some(version) = version {
            builder = builder.header(headers::X_INERTIA_VERSION, version);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_version_staleness_comparison() {
        // Numeric server versions coerce the client value.
        assert!(!version_is_stale(Some("3"), "3"));
        assert!(!version_is_stale(Some("3.0"), "3"));
        assert!(version_is_stale(Some("2"), "3"));
        // Non-numeric client falls back to raw string comparison.
        assert!(version_is_stale(Some("abc"), "3"));
        // Non-numeric server compares as raw strings.
        assert!(!version_is_stale(Some("abc"), "abc"));
        assert!(version_is_stale(Some("abd"), "abc"));
        // Missing client version is always stale.
        assert!(version_is_stale(None, "1"));
    }

    #[tokio::test]
    async fn test_non_inertia_requests_pass_through() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(adapter("3").layer());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stale_get_short_circuits_with_conflict() {
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let app = Router::new()
            .route(
                "/users",
                get(move || {
                    flag.store(true, Ordering::SeqCst);
                    async { "ok" }
                }),
            )
            .layer(adapter("3").layer());

        let response = app
            .oneshot(inertia_get("/users?page=2", Some("2")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response
                .headers()
                .get(headers::X_INERTIA_LOCATION)
                .expect("conflict must carry the reload location"),
            "https://app.example.com/users?page=2"
        );
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_current_version_reaches_handler() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(adapter("3").layer());

        let response = app.oneshot(inertia_get("/", Some("3"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::VARY).unwrap(), "X-Inertia");
    }

    #[tokio::test]
    async fn test_numeric_coercion_accepts_equivalent_forms() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(adapter("3").layer());

        let response = app.oneshot(inertia_get("/", Some("3.0"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stale_version_on_post_is_ignored() {
        let app = Router::new()
            .route("/submit", axum::routing::post(|| async { "ok" }))
            .layer(adapter("3").layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/submit")
                    .header(headers::X_INERTIA, "true")
                    .header(headers::X_INERTIA_VERSION, "2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_redirect_rewritten_to_see_other() {
        let app = Router::new()
            .route(
                "/users/1",
                delete(|| async {
                    (StatusCode::FOUND, [(header::LOCATION, "/users")]).into_response()
                }),
            )
            .layer(adapter("1").layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/users/1")
                    .header(headers::X_INERTIA, "true")
                    .header(headers::X_INERTIA_VERSION, "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_get_redirect_is_left_alone() {
        let app = Router::new()
            .route(
                "/old",
                get(|| async {
                    (StatusCode::FOUND, [(header::LOCATION, "/new")]).into_response()
                }),
            )
            .layer(adapter("1").layer());

        let response = app.oneshot(inertia_get("/old", Some("1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_xsrf_token_copied_for_inertia_requests() {
        let app = Router::new()
            .route(
                "/",
                get(|req: Request<Body>| async move {
                    req.headers()
                        .get(headers::X_CSRF_TOKEN)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("missing")
                        .to_string()
                }),
            )
            .layer(adapter("1").layer());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(headers::X_INERTIA, "true")
                    .header(headers::X_INERTIA_VERSION, "1")
                    .header(headers::X_XSRF_TOKEN, "tok-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"tok-123");
    }

    #[tokio::test]
    async fn test_session_state_purged_after_plain_response() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        InertiaSession::new(Arc::clone(&store)).set_errors(&serde_json::json!({"f": "bad"}));

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(adapter("1").layer())
            .layer(Extension(Arc::clone(&store)));

        let _ = app.oneshot(inertia_get("/", Some("1"))).await.unwrap();
        assert!(InertiaSession::new(store).errors().is_none());
    }

    #[tokio::test]
    async fn test_session_state_survives_redirects() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        InertiaSession::new(Arc::clone(&store)).set_errors(&serde_json::json!({"f": "bad"}));

        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    (StatusCode::FOUND, [(header::LOCATION, "/next")]).into_response()
                }),
            )
            .layer(adapter("1").layer())
            .layer(Extension(Arc::clone(&store)));

        let _ = app.oneshot(inertia_get("/", Some("1"))).await.unwrap();
        assert!(InertiaSession::new(store).errors().is_some());
    }
}
