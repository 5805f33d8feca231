//! Axum adapter for the Inertia page protocol.
//!
//! This crate lets a conventional request/response backend serve an
//! Inertia single-page-application front end: each response either returns
//! a full HTML document embedding a JSON page object, or (for client-side
//! navigations) the page object alone as JSON.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Protocol middleware (tower)      │  ← version staleness, 409
//! │  - XSRF → CSRF header copy              │  ← redirect coercion to 303
//! │  - Vary / session cleanup               │
//! ├─────────────────────────────────────────┤
//! │        Page negotiation engine          │
//! │  - Prop model (always/optional/defer/   │  ← pure, testable at
//! │    merge) and partial-reload filter     │    memory speed
//! │  - Shared-data resolution               │
//! │  - Page assembly (deferred/merge index) │
//! ├─────────────────────────────────────────┤
//! │        Collaborators                    │
//! │  - Root template (HTML shell)           │  ← trait seams
//! │  - Session store (flash errors)         │
//! │  - SSR delegate (degrades to CSR)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Request arrives**; the middleware inspects the protocol headers and
//!    may short-circuit with a `409` version conflict
//! 2. **Handler** supplies a component name and props (plain values or
//!    [`Prop`] instances)
//! 3. **Shared data** is merged in, filtered by action and condition
//! 4. **Partial-reload filter** decides the final prop set and evaluates it
//! 5. **Page** is emitted as JSON (`X-Inertia` requests) or embedded in the
//!    HTML shell, with optional SSR delegation
//! 6. **Middleware post-processing** coerces redirect statuses and cleans
//!    up session state
//!
//! # Example
//!
//! ```ignore
//! use axum::{extract::State, response::Response, routing::get, Router};
//! use inertia_axum::{Inertia, InertiaConfig, InertiaContext, InertiaError, Prop};
//! use serde_json::json;
//!
//! async fn dashboard(
//!     State(inertia): State<Inertia>,
//!     ctx: InertiaContext,
//! ) -> Result<Response, InertiaError> {
//!     inertia
//!         .render("Dashboard")
//!         .prop("user", json!({"name": "Ada"}))
//!         .with("stats", Prop::optional(|| expensive_stats()))
//!         .with("activity", Prop::defer(|| recent_activity()))
//!         .build(&ctx)
//!         .await
//! }
//!
//! let inertia = Inertia::new(
//!     InertiaConfig::new("https://app.example.com").with_version("abc123"),
//! );
//! inertia.share("appName", json!("Demo"));
//!
//! let app: Router = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .layer(inertia.layer())
//!     .with_state(inertia);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod page;
pub mod props;
pub mod render;
pub mod request;
pub mod service;
pub mod session;
pub mod shared;
pub mod ssr;

// Re-export key types for convenience
pub use config::InertiaConfig;
pub use error::{InertiaError, Result};
pub use middleware::{InertiaLayer, InertiaMiddleware};
pub use page::{Page, PageProps};
pub use props::{Prop, Props};
pub use render::{AppShellTemplate, RootTemplate, TemplateContext, ViewData};
pub use request::InertiaContext;
pub use service::{Inertia, ResponseBuilder};
pub use session::{InertiaSession, MemorySessionStore, SessionStore};
pub use shared::{ActionFilter, SharedData, SharedDataRegistry};
pub use ssr::{SsrClient, SsrPage};
