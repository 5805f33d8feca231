//! The process-wide Inertia handle.
//!
//! [`Inertia`] bundles the configuration, the shared-data registry, the
//! template collaborator, and the SSR client, and hands out fluent response
//! builders. It is cheap to clone (the interior is reference-counted) and is
//! normally stored in Axum state:
//!
//! ```ignore
//! let inertia = Inertia::new(InertiaConfig::new("https://app.example.com"));
//! inertia.share("appName", json!("Demo"));
//!
//! let app = Router::new()
//!     .route("/", get(home))
//!     .layer(inertia.layer())
//!     .with_state(inertia);
//!
//! async fn home(State(inertia): State<Inertia>, ctx: InertiaContext) -> Result<Response, InertiaError> {
//!     inertia.render("Home").prop("greeting", "hello").build(&ctx).await
//! }
//! ```

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

use axum::response::Response;
use serde::Serialize;
use serde_json::Value;

use crate::config::InertiaConfig;
use crate::error::{InertiaError, Result};
use crate::middleware::InertiaLayer;
use crate::page::{self, Page};
use crate::props::{Prop, Props};
use crate::render::{
    html_response, json_response, AppShellTemplate, RootTemplate, TemplateContext, ViewData,
};
use crate::request::InertiaContext;
use crate::shared::{SharedData, SharedDataRegistry};
use crate::ssr::SsrClient;

struct Inner {
    config: InertiaConfig,
    registry: SharedDataRegistry,
    view_data: RwLock<ViewData>,
    template: Arc<dyn RootTemplate>,
    ssr: SsrClient,
}

/// Shared handle to the Inertia adapter.
#[derive(Clone)]
pub struct Inertia {
    inner: Arc<Inner>,
}

impl Inertia {
    /// Create the adapter with the default app-shell template.
    #[must_use]
    pub fn new(config: InertiaConfig) -> Self {
        Self::with_template(config, Arc::new(AppShellTemplate))
    }

    /// Create the adapter with a custom root template collaborator.
    #[must_use]
    pub fn with_template(config: InertiaConfig, template: Arc<dyn RootTemplate>) -> Self {
        let ssr = SsrClient::from_config(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: SharedDataRegistry::new(),
                view_data: RwLock::new(ViewData::new()),
                template,
                ssr,
            }),
        }
    }

    /// The adapter configuration.
    #[must_use]
    pub fn config(&self) -> &InertiaConfig {
        &self.inner.config
    }

    /// The shared-data registry.
    #[must_use]
    pub fn shared(&self) -> &SharedDataRegistry {
        &self.inner.registry
    }

    /// The SSR client.
    #[must_use]
    pub fn ssr(&self) -> &SsrClient {
        &self.inner.ssr
    }

    /// The protocol middleware layer for this adapter.
    #[must_use]
    pub fn layer(&self) -> InertiaLayer {
        InertiaLayer::new(self.clone())
    }

    /// Share a single prop across all responses.
    pub fn share(&self, key: impl Into<String>, prop: impl Into<Prop>) {
        self.inner.registry.share(key, prop);
    }

    /// Register a filtered shared-data entry.
    pub fn share_data(&self, data: SharedData) {
        self.inner.registry.add(data);
    }

    /// Share template-only view data, never serialized into props.
    pub fn share_view_data(&self, key: impl Into<String>, value: Value) {
        self.inner
            .view_data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Drop all shared props and entries.
    pub fn clear_shared(&self) {
        self.inner.registry.clear();
    }

    /// Start building a response for the given component.
    #[must_use]
    pub fn render(&self, component: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder {
            inertia: self.clone(),
            component: component.into(),
            props: Props::new(),
            action: None,
            eval_ctx: None,
            first_error: None,
        }
    }
}

impl std::fmt::Debug for Inertia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inertia")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for one Inertia response.
#[must_use = "call build(ctx) to produce the response"]
pub struct ResponseBuilder {
    inertia: Inertia,
    component: String,
    props: Props,
    action: Option<String>,
    eval_ctx: Option<Arc<dyn Any + Send + Sync>>,
    first_error: Option<InertiaError>,
}

impl ResponseBuilder {
    /// Add a plain prop. The value is serialized eagerly; the first
    /// serialization failure is reported by [`Self::build`].
    pub fn prop(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        match Prop::value(value) {
            Ok(prop) => {
                self.props.insert(key.into(), prop);
            }
            Err(error) => {
                self.first_error.get_or_insert(error);
            }
        }
        self
    }

    /// Add a behavioral prop (always, optional, deferred, merge).
    pub fn with(mut self, key: impl Into<String>, prop: Prop) -> Self {
        self.props.insert(key.into(), prop);
        self
    }

    /// Add a batch of props.
    pub fn props(mut self, props: Props) -> Self {
        self.props.extend(props);
        self
    }

    /// Declare the handler action name used by shared-data action filters.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Supply the evaluation context handed to prop evaluators and
    /// context-taking shared-data functions.
    pub fn context(mut self, ctx: Arc<dyn Any + Send + Sync>) -> Self {
        self.eval_ctx = Some(ctx);
        self
    }

    /// Assemble the page and emit the response.
    ///
    /// Inertia requests receive the page object as JSON; everything else
    /// receives the HTML document, with SSR output spliced in when the
    /// delegate is enabled and reachable.
    ///
    /// # Errors
    ///
    /// Returns serialization and template failures; SSR failures are not
    /// errors and fall back to client-side rendering.
    pub async fn build(self, ctx: &InertiaContext) -> Result<Response> {
        if let Some(error) = self.first_error {
            return Err(error);
        }

        let inner = &self.inertia.inner;
        let eval_ctx = self.eval_ctx.as_ref().map(|any| any.as_ref() as &dyn Any);

        let mut shared = inner.registry.resolve(eval_ctx, self.action.as_deref());
        if let Some(errors) = ctx.session.as_ref().and_then(|session| session.errors()) {
            shared.insert("errors".to_string(), Prop::from(errors));
        }

        let page: Page = page::assemble(
            &self.component,
            self.props,
            shared,
            eval_ctx,
            ctx,
            &inner.config,
        )?;
        let page_json = serde_json::to_string(&page)?;

        tracing::debug!(
            component = %page.component,
            partial = ctx.is_partial_reload(),
            inertia = ctx.is_inertia,
            "rendering page"
        );

        if ctx.is_inertia {
            return Ok(json_response(page_json));
        }

        let ssr = inner.ssr.render(&page_json).await;
        let view_data = inner
            .view_data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let html = inner.template.render(
            &inner.config.root_template,
            &TemplateContext {
                page: &page,
                page_json: &page_json,
                ssr: ssr.as_ref(),
                view_data: &view_data,
                is_development: inner.config.is_development,
            },
        )?;
        Ok(html_response(html))
    }
}
