//! End-to-end protocol tests over a real router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Router,
};
use inertia_axum::{
    headers, Inertia, InertiaConfig, InertiaContext, InertiaError, Prop,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn dashboard(
    State(inertia): State<Inertia>,
    ctx: InertiaContext,
) -> Result<Response, InertiaError> {
    inertia
        .render("Dashboard")
        .prop("a", "x")
        .with("b", Prop::optional(|| "y"))
        .with("c", Prop::always(|| "z"))
        .with("activity", Prop::defer(|| json!([1, 2])))
        .build(&ctx)
        .await
}

async fn destroy_user() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/users")]).into_response()
}

fn app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let inertia = Inertia::new(
        InertiaConfig::new("https://app.example.com").with_version("3"),
    );
    inertia.share("appName", json!("Demo"));

    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users/:id", delete(destroy_user))
        .layer(inertia.layer())
        .with_state(inertia)
}

fn inertia_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(headers::X_INERTIA, "true")
        .header(headers::X_INERTIA_VERSION, "3")
        .body(Body::empty())
        .expect("request")
}

async fn page_of(response: Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(headers::X_INERTIA).expect("marker"),
        "true"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("page json")
}

#[tokio::test]
async fn test_full_load_returns_eager_and_always_props_only() {
    let response = app()
        .oneshot(inertia_request("/dashboard"))
        .await
        .expect("response");
    let page = page_of(response).await;

    assert_eq!(page["component"], json!("Dashboard"));
    assert_eq!(page["url"], json!("/dashboard"));
    assert_eq!(page["version"], json!("3"));
    assert_eq!(page["props"]["a"], json!("x"));
    assert_eq!(page["props"]["c"], json!("z"));
    assert_eq!(page["props"]["appName"], json!("Demo"));
    // Optional and deferred values are withheld from the first load.
    assert!(page["props"].get("b").is_none());
    assert!(page["props"].get("activity").is_none());
    // Deferred keys are advertised for the follow-up fetch.
    assert_eq!(page["deferredProps"], json!({"default": ["activity"]}));
    // Inapplicable optional fields are omitted, never null.
    let object = page.as_object().expect("object");
    assert!(!object.contains_key("encryptHistory"));
    assert!(!object.contains_key("clearHistory"));
    assert!(!object.contains_key("mergeProps"));
    assert!(!object.contains_key("deepMergeProps"));
}

#[tokio::test]
async fn test_partial_allow_list_narrows_to_requested_keys() {
    let mut request = inertia_request("/dashboard");
    request.headers_mut().insert(
        headers::X_INERTIA_PARTIAL_COMPONENT,
        "Dashboard".parse().expect("header"),
    );
    request.headers_mut().insert(
        headers::X_INERTIA_PARTIAL_DATA,
        "b".parse().expect("header"),
    );

    let page = page_of(app().oneshot(request).await.expect("response")).await;

    // The allow-list narrows out every other key, always-props included.
    assert_eq!(page["props"], json!({"b": "y"}));
    assert!(page.get("deferredProps").is_none());
}

#[tokio::test]
async fn test_partial_without_lists_returns_partial_capable_props() {
    let mut request = inertia_request("/dashboard");
    request.headers_mut().insert(
        headers::X_INERTIA_PARTIAL_COMPONENT,
        "Dashboard".parse().expect("header"),
    );

    let page = page_of(app().oneshot(request).await.expect("response")).await;

    assert_eq!(page["props"]["a"], json!("x"));
    assert_eq!(page["props"]["b"], json!("y"));
    assert_eq!(page["props"]["c"], json!("z"));
    // Deferred props are fetched by group, never delivered inline.
    assert!(page["props"].get("activity").is_none());
    assert!(page.get("deferredProps").is_none());
}

#[tokio::test]
async fn test_stale_version_conflicts_before_the_handler() {
    let mut request = inertia_request("/dashboard");
    request.headers_mut().insert(
        headers::X_INERTIA_VERSION,
        "2".parse().expect("header"),
    );

    let response = app().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response
            .headers()
            .get(headers::X_INERTIA_LOCATION)
            .expect("location"),
        "https://app.example.com/dashboard"
    );
}

#[tokio::test]
async fn test_delete_redirects_are_replayed_as_get() {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/users/7")
        .header(headers::X_INERTIA, "true")
        .header(headers::X_INERTIA_VERSION, "3")
        .body(Body::empty())
        .expect("request");

    let response = app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_plain_navigation_receives_the_html_shell() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("content type"),
        "text/html; charset=utf-8"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(html.contains(r#"<div id="app" data-page=""#));
    assert!(html.contains("&quot;component&quot;:&quot;Dashboard&quot;"));
}
