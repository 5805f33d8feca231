//! Shared data: props made available to every response without being passed
//! explicitly by each handler.
//!
//! A [`SharedData`] entry wraps exactly one data source (a static map, a
//! zero-argument supplier re-evaluated per request, or a context-taking
//! function) plus an optional [`ActionFilter`] and/or boolean condition. The
//! [`SharedDataRegistry`] owns the process-wide static prop map and the
//! ordered entry list; it is populated during application setup and read by
//! every request, so both structures sit behind reader-writer locks and
//! `resolve` takes a consistent snapshot.

use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::props::{Prop, Props};

/// Restricts a shared-data entry to a set of handler actions.
#[derive(Debug, Clone)]
pub enum ActionFilter {
    /// Include only when the current action is in the set.
    Only(HashSet<String>),
    /// Include only when the current action is *not* in the set.
    Except(HashSet<String>),
}

impl ActionFilter {
    /// Build an `Only` filter from action names.
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(actions.into_iter().map(Into::into).collect())
    }

    /// Build an `Except` filter from action names.
    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(actions.into_iter().map(Into::into).collect())
    }

    /// Whether the filter admits the current action.
    ///
    /// An absent action never matches either variant: when a filter is
    /// present the entry only applies to requests that declared an action.
    #[must_use]
    pub fn matches(&self, current_action: Option<&str>) -> bool {
        let Some(action) = current_action else {
            return false;
        };
        match self {
            Self::Only(actions) => actions.contains(action),
            Self::Except(actions) => !actions.contains(action),
        }
    }
}

type SupplierFn = Arc<dyn Fn() -> Props + Send + Sync>;
type ContextFn = Arc<dyn Fn(Option<&dyn Any>) -> Props + Send + Sync>;
type ConditionFn = Arc<dyn Fn() -> bool + Send + Sync>;

enum SharedSource {
    Static(Props),
    Supplier(SupplierFn),
    Context(ContextFn),
}

/// One source of shared props plus its inclusion predicate.
pub struct SharedData {
    source: SharedSource,
    action_filter: Option<ActionFilter>,
    condition: Option<ConditionFn>,
}

impl SharedData {
    /// Shared data from a fixed prop map.
    #[must_use]
    pub fn from_static(props: Props) -> Self {
        Self {
            source: SharedSource::Static(props),
            action_filter: None,
            condition: None,
        }
    }

    /// Shared data re-computed by a supplier on every matching request.
    pub fn from_supplier<F>(supplier: F) -> Self
    where
        F: Fn() -> Props + Send + Sync + 'static,
    {
        Self {
            source: SharedSource::Supplier(Arc::new(supplier)),
            action_filter: None,
            condition: None,
        }
    }

    /// Shared data computed from the handler context on every matching
    /// request. The function receives `None` when the caller has no context.
    pub fn from_context_fn<F>(f: F) -> Self
    where
        F: Fn(Option<&dyn Any>) -> Props + Send + Sync + 'static,
    {
        Self {
            source: SharedSource::Context(Arc::new(f)),
            action_filter: None,
            condition: None,
        }
    }

    /// Start building an entry with filters.
    #[must_use]
    pub fn builder() -> SharedDataBuilder {
        SharedDataBuilder::default()
    }

    /// Whether this entry applies to the current request.
    ///
    /// Both checks must pass when both are present: the action filter must
    /// admit the action and the condition supplier must evaluate true. An
    /// entry with neither always applies.
    #[must_use]
    pub fn should_include(&self, current_action: Option<&str>) -> bool {
        if let Some(filter) = &self.action_filter {
            if !filter.matches(current_action) {
                return false;
            }
        }
        if let Some(condition) = &self.condition {
            if !condition() {
                return false;
            }
        }
        true
    }

    /// Evaluate the data source.
    #[must_use]
    pub fn evaluate(&self, ctx: Option<&dyn Any>) -> Props {
        match &self.source {
            SharedSource::Static(props) => props.clone(),
            SharedSource::Supplier(supplier) => supplier(),
            SharedSource::Context(f) => f(ctx),
        }
    }
}

impl std::fmt::Debug for SharedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            SharedSource::Static(props) => format!("Static({} keys)", props.len()),
            SharedSource::Supplier(_) => "Supplier(..)".to_string(),
            SharedSource::Context(_) => "Context(..)".to_string(),
        };
        f.debug_struct("SharedData")
            .field("source", &source)
            .field("action_filter", &self.action_filter)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

/// Builder for [`SharedData`] entries with filters.
#[derive(Default)]
pub struct SharedDataBuilder {
    source: Option<SharedSource>,
    action_filter: Option<ActionFilter>,
    condition: Option<ConditionFn>,
}

impl SharedDataBuilder {
    /// Use a fixed prop map as the data source.
    #[must_use]
    pub fn static_data(mut self, props: Props) -> Self {
        self.source = Some(SharedSource::Static(props));
        self
    }

    /// Use a per-request supplier as the data source.
    #[must_use]
    pub fn supplier<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Props + Send + Sync + 'static,
    {
        self.source = Some(SharedSource::Supplier(Arc::new(supplier)));
        self
    }

    /// Use a context-taking function as the data source.
    #[must_use]
    pub fn context_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&dyn Any>) -> Props + Send + Sync + 'static,
    {
        self.source = Some(SharedSource::Context(Arc::new(f)));
        self
    }

    /// Restrict to the named actions.
    #[must_use]
    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_filter = Some(ActionFilter::only(actions));
        self
    }

    /// Exclude the named actions.
    #[must_use]
    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_filter = Some(ActionFilter::except(actions));
        self
    }

    /// Gate the entry on a boolean condition evaluated per request.
    #[must_use]
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Finish the entry. An entry built without a source contributes an
    /// empty map.
    #[must_use]
    pub fn build(self) -> SharedData {
        SharedData {
            source: self.source.unwrap_or_else(|| SharedSource::Static(Props::new())),
            action_filter: self.action_filter,
            condition: self.condition,
        }
    }
}

/// Process-wide registry of shared props and filtered entries.
///
/// Created at startup and passed by reference to the resolver. Mutation
/// after requests begin is safe: readers take a consistent snapshot under
/// the lock.
#[derive(Debug, Default)]
pub struct SharedDataRegistry {
    static_props: RwLock<Props>,
    entries: RwLock<Vec<SharedData>>,
}

impl SharedDataRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a single prop globally. Duplicate keys overwrite.
    pub fn share(&self, key: impl Into<String>, prop: impl Into<Prop>) {
        self.static_props
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), prop.into());
    }

    /// Register a filtered shared-data entry. Entries are evaluated in
    /// registration order; later entries overwrite earlier keys.
    pub fn add(&self, data: SharedData) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(data);
    }

    /// Drop every shared prop and entry.
    pub fn clear(&self) {
        self.static_props
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Merge the static map with every applicable entry for this request.
    ///
    /// The static map comes first, then entries in registration order, so a
    /// later source wins on key collision. Explicit per-response props are
    /// merged on top of this result by the page assembler: shared data is a
    /// default, never an override.
    #[must_use]
    pub fn resolve(&self, ctx: Option<&dyn Any>, current_action: Option<&str>) -> Props {
        let mut merged = self
            .static_props
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.iter() {
            if entry.should_include(current_action) {
                for (key, prop) in entry.evaluate(ctx) {
                    merged.insert(key, prop);
                }
            }
        }
        merged
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props_of(pairs: &[(&str, &str)]) -> Props {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Prop::from(json!(v))))
            .collect()
    }

    fn resolved_value(props: &Props, key: &str) -> serde_json::Value {
        props.get(key).unwrap().evaluate(None).unwrap()
    }

    #[test]
    fn test_only_filter_matches_listed_actions() {
        let filter = ActionFilter::only(["index", "show"]);
        assert!(filter.matches(Some("index")));
        assert!(!filter.matches(Some("create")));
        assert!(!filter.matches(None));
    }

    #[test]
    fn test_except_filter_excludes_listed_actions() {
        let filter = ActionFilter::except(["create"]);
        assert!(filter.matches(Some("index")));
        assert!(!filter.matches(Some("create")));
        assert!(!filter.matches(None));
    }

    #[test]
    fn test_entry_without_filters_always_applies() {
        let entry = SharedData::from_static(props_of(&[("a", "1")]));
        assert!(entry.should_include(None));
        assert!(entry.should_include(Some("anything")));
    }

    #[test]
    fn test_condition_gates_entry() {
        let entry = SharedData::builder()
            .static_data(props_of(&[("flag", "on")]))
            .condition(|| false)
            .build();
        assert!(!entry.should_include(Some("index")));
    }

    #[test]
    fn test_registry_resolution_order() {
        let registry = SharedDataRegistry::new();
        registry.share("app", json!("base"));
        registry.share("theme", json!("light"));
        registry.add(SharedData::from_static(props_of(&[("theme", "dark")])));

        let resolved = registry.resolve(None, None);
        assert_eq!(resolved_value(&resolved, "app"), json!("base"));
        // Later entries overwrite earlier keys.
        assert_eq!(resolved_value(&resolved, "theme"), json!("dark"));
    }

    #[test]
    fn test_registry_respects_action_filters() {
        let registry = SharedDataRegistry::new();
        registry.add(
            SharedData::builder()
                .static_data(props_of(&[("admin_nav", "yes")]))
                .only(["admin"])
                .build(),
        );

        assert!(registry.resolve(None, Some("admin")).contains_key("admin_nav"));
        assert!(!registry.resolve(None, Some("index")).contains_key("admin_nav"));
        // No declared action never matches a filtered entry.
        assert!(!registry.resolve(None, None).contains_key("admin_nav"));
    }

    #[test]
    fn test_supplier_is_reevaluated_per_resolve() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = Arc::new(AtomicU32::new(0));
        let registry = SharedDataRegistry::new();
        let counter = Arc::clone(&calls);
        registry.add(SharedData::from_supplier(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Props::new()
        }));

        let _ = registry.resolve(None, None);
        let _ = registry.resolve(None, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_context_fn_receives_absent_context_explicitly() {
        let registry = SharedDataRegistry::new();
        registry.add(SharedData::from_context_fn(|ctx| {
            let mut props = Props::new();
            props.insert(
                "has_ctx".to_string(),
                Prop::from(json!(ctx.is_some())),
            );
            props
        }));

        let resolved = registry.resolve(None, None);
        assert_eq!(resolved_value(&resolved, "has_ctx"), json!(false));

        let handler = 7_u32;
        let resolved = registry.resolve(Some(&handler), None);
        assert_eq!(resolved_value(&resolved, "has_ctx"), json!(true));
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = SharedDataRegistry::new();
        registry.share("a", json!(1));
        registry.add(SharedData::from_static(props_of(&[("b", "2")])));
        registry.clear();
        assert!(registry.resolve(None, None).is_empty());
    }
}
