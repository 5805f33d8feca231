//! HTML shell rendering and response emission.
//!
//! A full page load embeds the page object in an HTML document produced by
//! the [`RootTemplate`] collaborator; a client-side navigation receives the
//! page object alone as JSON with the `X-Inertia: true` marker. The default
//! template emits the conventional `<div id="app" data-page="…">` shell and
//! splices in SSR output when the delegate produced any.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::headers;
use crate::page::Page;
use crate::ssr::SsrPage;

/// Template-only data passed to the root template, never serialized into
/// page props.
pub type ViewData = IndexMap<String, Value>;

/// Everything the root template needs to produce the HTML document.
#[derive(Debug)]
pub struct TemplateContext<'a> {
    /// The assembled page object.
    pub page: &'a Page,
    /// The page object, already serialized to JSON.
    pub page_json: &'a str,
    /// SSR output, when the delegate rendered successfully.
    pub ssr: Option<&'a SsrPage>,
    /// Shared template-only data.
    pub view_data: &'a ViewData,
    /// Whether the process runs in development mode.
    pub is_development: bool,
}

/// Collaborator producing the HTML document around the page object.
pub trait RootTemplate: Send + Sync {
    /// Render the document for the named root template.
    ///
    /// # Errors
    ///
    /// Returns [`crate::InertiaError::TemplateNotFound`] when the named
    /// template cannot be resolved, or
    /// [`crate::InertiaError::TemplateRender`] when it fails mid-render.
    fn render(&self, template_name: &str, ctx: &TemplateContext<'_>) -> Result<String>;
}

/// Escape a string for use inside a double-quoted HTML attribute.
fn escape_attribute(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Default root template: a minimal document with the `app` container div.
///
/// Applications with a real asset pipeline implement [`RootTemplate`]
/// themselves; this implementation is enough for development and tests.
#[derive(Debug, Clone, Default)]
pub struct AppShellTemplate;

impl RootTemplate for AppShellTemplate {
    fn render(&self, _template_name: &str, ctx: &TemplateContext<'_>) -> Result<String> {
        let head = ctx.ssr.map(|ssr| ssr.head.as_str()).unwrap_or_default();
        let container = ctx.ssr.map_or_else(
            || {
                format!(
                    r#"<div id="app" data-page="{}"></div>"#,
                    escape_attribute(ctx.page_json)
                )
            },
            |ssr| ssr.body.clone(),
        );
        let dev_marker = if ctx.is_development {
            "\n<!-- inertia: development -->"
        } else {
            ""
        };

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
             {head}\n</head>\n<body>\n{container}{dev_marker}\n</body>\n</html>\n"
        ))
    }
}

pub(crate) fn json_response(page_json: String) -> Response {
    let mut response = (StatusCode::OK, page_json).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response_headers.insert(headers::X_INERTIA, HeaderValue::from_static("true"));
    response_headers.insert(header::VARY, HeaderValue::from_static(headers::X_INERTIA));
    response
}

pub(crate) fn html_response(html: String) -> Response {
    let mut response = (StatusCode::OK, html).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response_headers.insert(header::VARY, HeaderValue::from_static(headers::X_INERTIA));
    response
}
