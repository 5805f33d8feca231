//! The polymorphic prop model.
//!
//! Every piece of response data is either a plain JSON value or a [`Prop`]
//! carrying evaluation and inclusion metadata. The variant set is closed so
//! the partial-reload filter in [`crate::page`] can match exhaustively:
//!
//! - `Value`: evaluated eagerly, included on first load and partial reloads.
//! - `Always`: included on every response, regardless of load phase.
//! - `Optional`: excluded from the first load, included on partial reloads.
//! - `Defer`: excluded from the first load and advertised in the page's
//!   deferred-group index so the client fetches it in a follow-up request;
//!   may additionally be marked merge or deep-merge (never both).
//! - `Merge`: included under normal rules, tagged so the client merges the
//!   new value into its cached state instead of replacing it.
//!
//! Classification is fixed at construction; capability queries derive from
//! the variant and never change.
//!
//! # Examples
//!
//! ```ignore
//! use inertia_axum::Prop;
//! use serde_json::json;
//!
//! let props = [
//!     ("user".to_string(), Prop::from(json!({"id": 1}))),
//!     ("stats".to_string(), Prop::optional(|| expensive_stats())),
//!     ("notifications".to_string(), Prop::defer_in(|| fetch_notifications(), "sidebar")),
//! ];
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{InertiaError, Result};

/// Group name used for deferred props that do not name one.
pub const DEFAULT_DEFER_GROUP: &str = "default";

/// An ordered prop mapping, keyed by wire name.
pub type Props = IndexMap<String, Prop>;

/// Lazy evaluation function shared by all prop kinds.
///
/// The argument is the handler-supplied evaluation context (or `None` when
/// the caller has none); the result is the wire value for the prop.
pub type Evaluator = Arc<dyn Fn(Option<&dyn Any>) -> Result<Value> + Send + Sync>;

fn to_wire<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(InertiaError::Serialization)
}

fn supplier_evaluator<F, T>(supplier: F) -> Evaluator
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Serialize,
{
    Arc::new(move |_ctx| to_wire(supplier()))
}

fn context_evaluator<F, T>(f: F) -> Evaluator
where
    F: Fn(Option<&dyn Any>) -> T + Send + Sync + 'static,
    T: Serialize,
{
    Arc::new(move |ctx| to_wire(f(ctx)))
}

/// A unit of response data with evaluation and inclusion metadata.
#[derive(Clone)]
pub enum Prop {
    /// A plain value: eager, present on first load and partial reloads.
    Value(Value),
    /// Included on every response unconditionally.
    Always(Evaluator),
    /// Included only during partial reloads.
    Optional(Evaluator),
    /// Withheld from the first load and fetched later by group.
    Defer {
        /// Lazy evaluator invoked when the prop is finally delivered.
        evaluator: Evaluator,
        /// Batch-load group advertised in the page's deferred index.
        group: String,
        /// Client merges (rather than replaces) the delivered value.
        merge: bool,
        /// Client merges recursively. Exclusive with plain `merge`.
        deep_merge: bool,
    },
    /// Included under normal rules, merged client-side on arrival.
    Merge {
        /// Lazy evaluator for the prop value.
        evaluator: Evaluator,
        /// Recursive merge instead of shallow.
        deep: bool,
    },
}

impl Prop {
    /// Wrap an eagerly serialized value.
    ///
    /// # Errors
    ///
    /// Returns [`InertiaError::Serialization`] when the value cannot be
    /// represented as JSON.
    pub fn value<T: Serialize>(value: T) -> Result<Self> {
        Ok(Self::Value(to_wire(value)?))
    }

    /// A prop included on every response.
    pub fn always<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Always(supplier_evaluator(supplier))
    }

    /// An always prop whose evaluator receives the handler context.
    pub fn always_with<F, T>(f: F) -> Self
    where
        F: Fn(Option<&dyn Any>) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Always(context_evaluator(f))
    }

    /// A prop excluded from the first load, included on partial reloads.
    pub fn optional<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Optional(supplier_evaluator(supplier))
    }

    /// An optional prop whose evaluator receives the handler context.
    pub fn optional_with<F, T>(f: F) -> Self
    where
        F: Fn(Option<&dyn Any>) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Optional(context_evaluator(f))
    }

    /// A deferred prop in the default group.
    pub fn defer<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::defer_in(supplier, DEFAULT_DEFER_GROUP)
    }

    /// A deferred prop in the named group.
    pub fn defer_in<F, T>(supplier: F, group: impl Into<String>) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Defer {
            evaluator: supplier_evaluator(supplier),
            group: group.into(),
            merge: false,
            deep_merge: false,
        }
    }

    /// A deferred prop with explicit group and merge flags.
    ///
    /// # Errors
    ///
    /// Returns [`InertiaError::InvalidPropConfiguration`] when both `merge`
    /// and `deep_merge` are requested; the two merge strategies are
    /// mutually exclusive.
    pub fn defer_with<F, T>(
        supplier: F,
        group: impl Into<String>,
        merge: bool,
        deep_merge: bool,
    ) -> Result<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        if merge && deep_merge {
            return Err(InertiaError::InvalidPropConfiguration(
                "a deferred prop cannot set both merge and deep_merge".to_string(),
            ));
        }
        Ok(Self::Defer {
            evaluator: supplier_evaluator(supplier),
            group: group.into(),
            merge: merge || deep_merge,
            deep_merge,
        })
    }

    /// A prop the client merges shallowly into its cached value.
    pub fn merge<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Merge {
            evaluator: supplier_evaluator(supplier),
            deep: false,
        }
    }

    /// A prop the client merges recursively into its cached value.
    pub fn deep_merge<F, T>(supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Merge {
            evaluator: supplier_evaluator(supplier),
            deep: true,
        }
    }

    /// A merge prop whose evaluator receives the handler context.
    pub fn merge_with<F, T>(f: F) -> Self
    where
        F: Fn(Option<&dyn Any>) -> T + Send + Sync + 'static,
        T: Serialize,
    {
        Self::Merge {
            evaluator: context_evaluator(f),
            deep: false,
        }
    }

    /// Evaluate the prop against the handler context.
    ///
    /// Evaluation never mutates the prop; calling twice with the same
    /// context is idempotent apart from effects of the evaluator itself.
    ///
    /// # Errors
    ///
    /// Returns [`InertiaError::Serialization`] when the evaluator's result
    /// cannot be represented as JSON.
    pub fn evaluate(&self, ctx: Option<&dyn Any>) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Always(evaluator) | Self::Optional(evaluator) => evaluator(ctx),
            Self::Defer { evaluator, .. } | Self::Merge { evaluator, .. } => evaluator(ctx),
        }
    }

    /// Whether the prop is included regardless of the load-phase checks.
    #[must_use]
    pub const fn is_always(&self) -> bool {
        matches!(self, Self::Always(_))
    }

    /// Whether the prop belongs in a first (non-partial) load.
    #[must_use]
    pub const fn include_on_first_load(&self) -> bool {
        !matches!(self, Self::Optional(_) | Self::Defer { .. })
    }

    /// Whether the prop belongs in a partial reload.
    #[must_use]
    pub const fn include_on_partial_reload(&self) -> bool {
        true
    }

    /// Whether the client merges the delivered value shallowly or deeply.
    #[must_use]
    pub const fn is_mergeable(&self) -> bool {
        matches!(self, Self::Merge { .. } | Self::Defer { merge: true, .. })
    }

    /// Whether the client merges the delivered value recursively.
    #[must_use]
    pub const fn is_deep_mergeable(&self) -> bool {
        matches!(
            self,
            Self::Merge { deep: true, .. } | Self::Defer { deep_merge: true, .. }
        )
    }

    /// Whether the prop is delivered by a grouped follow-up request.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Defer { .. })
    }

    /// The batch-load group of a deferred prop.
    #[must_use]
    pub fn defer_group(&self) -> Option<&str> {
        match self {
            Self::Defer { group, .. } => Some(group),
            _ => None,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Always(_) => f.write_str("Always(..)"),
            Self::Optional(_) => f.write_str("Optional(..)"),
            Self::Defer {
                group,
                merge,
                deep_merge,
                ..
            } => f
                .debug_struct("Defer")
                .field("group", group)
                .field("merge", merge)
                .field("deep_merge", deep_merge)
                .finish(),
            Self::Merge { deep, .. } => f.debug_struct("Merge").field("deep", deep).finish(),
        }
    }
}
