//! Inertia adapter configuration.
//!
//! Configuration values should be provided by the application at startup,
//! not hardcoded. The asset `version` drives the staleness check in the
//! middleware: changing it forces connected clients through a full reload.

/// Configuration for the Inertia adapter.
#[derive(Debug, Clone)]
pub struct InertiaConfig {
    /// Asset version for cache busting.
    ///
    /// Defaults to `"1"` when unset. When the value a client remembers no
    /// longer matches, the middleware answers GET navigations with a 409
    /// conflict carrying the reload location.
    pub version: Option<String>,

    /// Base URL of the application (e.g. `"https://app.example.com"`).
    ///
    /// Used to build the absolute `X-Inertia-Location` value on version
    /// conflicts.
    pub url: String,

    /// Name of the root template handed to the template collaborator.
    ///
    /// Default: `"app.html"`
    pub root_template: String,

    /// Enable delegation to an external server-side rendering process.
    pub ssr_enabled: bool,

    /// Base URL of the SSR render server.
    ///
    /// Default: `"http://127.0.0.1:13714"`
    pub ssr_url: String,

    /// Timeout for a single SSR render call, in milliseconds.
    ///
    /// Default: 30 000
    pub ssr_timeout_ms: u64,

    /// Ask the client to encrypt its history entries for every page.
    pub encrypt_history: bool,

    /// Ask the client to clear its history state on every page.
    pub clear_history: bool,

    /// Merge shared props into explicit props recursively over object-valued
    /// entries instead of shallow key overwrite.
    pub deep_merge_shared_data: bool,

    /// Development mode flag passed through to the template collaborator.
    pub is_development: bool,
}

impl InertiaConfig {
    /// Create a configuration for the given application base URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the asset version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the root template name.
    #[must_use]
    pub fn with_root_template(mut self, template: impl Into<String>) -> Self {
        self.root_template = template.into();
        self
    }

    /// Enable SSR delegation against the given render server.
    #[must_use]
    pub fn with_ssr(mut self, ssr_url: impl Into<String>) -> Self {
        self.ssr_enabled = true;
        self.ssr_url = ssr_url.into();
        self
    }

    /// Set the SSR call timeout in milliseconds.
    #[must_use]
    pub const fn with_ssr_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.ssr_timeout_ms = timeout_ms;
        self
    }

    /// Ask clients to encrypt history entries.
    #[must_use]
    pub const fn with_encrypt_history(mut self, encrypt: bool) -> Self {
        self.encrypt_history = encrypt;
        self
    }

    /// Ask clients to clear history state.
    #[must_use]
    pub const fn with_clear_history(mut self, clear: bool) -> Self {
        self.clear_history = clear;
        self
    }

    /// Merge shared data recursively instead of shallow overwrite.
    #[must_use]
    pub const fn with_deep_merge_shared_data(mut self, deep: bool) -> Self {
        self.deep_merge_shared_data = deep;
        self
    }

    /// Mark the process as running in development mode.
    #[must_use]
    pub const fn with_development(mut self, development: bool) -> Self {
        self.is_development = development;
        self
    }

    /// The effective asset version, defaulting to `"1"`.
    #[must_use]
    pub fn effective_version(&self) -> &str {
        self.version.as_deref().unwrap_or("1")
    }
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            version: None,
            url: "http://localhost:3000".to_string(),
            root_template: "app.html".to_string(),
            ssr_enabled: false,
            ssr_url: "http://127.0.0.1:13714".to_string(),
            ssr_timeout_ms: 30_000,
            encrypt_history: false,
            clear_history: false,
            deep_merge_shared_data: false,
            is_development: false,
        }
    }
}
