//! Inertia protocol header names.
//!
//! These names are part of the wire contract between the server adapter and
//! the Inertia client runtime and must match exactly.

/// Marks a request or JSON response as belonging to the Inertia protocol.
pub const X_INERTIA: &str = "X-Inertia";

/// Carries the absolute URL the client must hard-visit on a version conflict.
pub const X_INERTIA_LOCATION: &str = "X-Inertia-Location";

/// The asset version the client remembers from its last full load.
pub const X_INERTIA_VERSION: &str = "X-Inertia-Version";

/// Names the component a partial reload targets.
pub const X_INERTIA_PARTIAL_COMPONENT: &str = "X-Inertia-Partial-Component";

/// Comma-separated key-prefix allow-list for partial reloads.
pub const X_INERTIA_PARTIAL_DATA: &str = "X-Inertia-Partial-Data";

/// Comma-separated key-prefix deny-list for partial reloads.
pub const X_INERTIA_PARTIAL_EXCEPT: &str = "X-Inertia-Partial-Except";

/// Comma-separated keys whose client-side cached values are being discarded.
pub const X_INERTIA_RESET: &str = "X-Inertia-Reset";

/// CSRF token header expected by backend frameworks.
pub const X_CSRF_TOKEN: &str = "X-CSRF-Token";

/// XSRF token header sent by XHR clients; copied to [`X_CSRF_TOKEN`] on
/// Inertia requests.
pub const X_XSRF_TOKEN: &str = "X-XSRF-Token";
