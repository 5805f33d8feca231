//! The page object and the partial-reload decision logic.
//!
//! [`Page`] is the wire entity serialized into JSON responses or embedded in
//! the HTML shell. [`assemble`] produces it: merge shared and explicit
//! props, run every key through the inclusion filter, evaluate what
//! survived, and attach the deferred/merge indexes the client uses to
//! schedule follow-up fetches and cache merging.
//!
//! Field names are part of the protocol contract; optional fields are
//! omitted entirely (never emitted as `null`) when inapplicable.

use std::any::Any;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::config::InertiaConfig;
use crate::error::Result;
use crate::props::{Prop, Props};
use crate::request::InertiaContext;

/// Final, evaluated prop mapping in first-seen order.
pub type PageProps = IndexMap<String, Value>;

/// The Inertia page object.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Component the client should mount.
    pub component: String,
    /// Evaluated props that passed the inclusion filter.
    pub props: PageProps,
    /// Path and query of the request that produced this page.
    pub url: String,
    /// Server asset version.
    pub version: String,
    /// Ask the client to encrypt this history entry.
    #[serde(rename = "encryptHistory", skip_serializing_if = "Option::is_none")]
    pub encrypt_history: Option<bool>,
    /// Ask the client to clear its history state.
    #[serde(rename = "clearHistory", skip_serializing_if = "Option::is_none")]
    pub clear_history: Option<bool>,
    /// Deferred prop keys grouped for batch follow-up fetches. Only ever
    /// present on non-partial responses.
    #[serde(rename = "deferredProps", skip_serializing_if = "Option::is_none")]
    pub deferred_props: Option<IndexMap<String, Vec<String>>>,
    /// Keys the client merges shallowly into its cached page state.
    #[serde(rename = "mergeProps", skip_serializing_if = "Option::is_none")]
    pub merge_props: Option<Vec<String>>,
    /// Keys the client merges recursively into its cached page state.
    #[serde(rename = "deepMergeProps", skip_serializing_if = "Option::is_none")]
    pub deep_merge_props: Option<Vec<String>>,
}

/// The ordered dot-separated prefixes of a key: `"a.b.c"` yields
/// `["a", "a.b", "a.b.c"]`.
fn key_prefixes(key: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for part in key.split('.') {
        if !current.is_empty() {
            current.push('.');
        }
        current.push_str(part);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Decide whether a prop belongs in the response.
///
/// `Always` props skip the load-phase checks (first-load exclusion, the
/// partial-reload capability, deferred withholding) but remain subject to
/// the explicit key filters: the `only` allow-list, the `except` deny-list,
/// and reset keys. A partial reload targeting a different component
/// excludes every prop; the client is asking about a page that is no longer
/// being rendered.
#[must_use]
pub fn should_include_prop(
    key: &str,
    prop: &Prop,
    component: &str,
    ctx: &InertiaContext,
) -> bool {
    let Some(partial_component) = ctx.partial_component.as_deref() else {
        return prop.is_always() || prop.include_on_first_load();
    };

    if partial_component != component {
        return false;
    }
    if !prop.is_always() {
        if prop.is_deferred() {
            return false;
        }
        if !prop.include_on_partial_reload() {
            return false;
        }
    }
    if ctx.reset_keys.iter().any(|reset| reset == key) {
        return false;
    }

    let prefixes = key_prefixes(key);
    if !ctx.partial_only.is_empty()
        && !prefixes.iter().any(|p| ctx.partial_only.contains(p))
    {
        return false;
    }
    if !ctx.partial_except.is_empty()
        && prefixes.iter().any(|p| ctx.partial_except.contains(p))
    {
        return false;
    }
    true
}

fn deep_merge_values(base: &Value, update: &Value) -> Value {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in update_map {
                let entry = merged
                    .get(key)
                    .map_or_else(|| value.clone(), |existing| deep_merge_values(existing, value));
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        _ => update.clone(),
    }
}

fn merge_prop_sets(shared: Props, explicit: Props, deep: bool) -> Props {
    let mut merged = shared;
    for (key, prop) in explicit {
        let combined = if deep {
            match (merged.get(&key), &prop) {
                (Some(Prop::Value(existing)), Prop::Value(update)) => {
                    Some(Prop::Value(deep_merge_values(existing, update)))
                }
                _ => None,
            }
        } else {
            None
        };
        merged.insert(key, combined.unwrap_or(prop));
    }
    merged
}

/// Build the final [`Page`] for a response.
///
/// Shared props merge first, explicit props overwrite them (recursively
/// over object values when deep-merge-shared-data is configured). Deferred
/// and merge indexes are computed from the pre-filter prop set so that
/// first loads advertise deferred groups even though their values are
/// withheld.
///
/// # Errors
///
/// Propagates evaluator serialization failures; a prop that cannot be
/// turned into the wire format fails the whole response rather than being
/// silently omitted.
pub fn assemble(
    component: &str,
    explicit_props: Props,
    shared_props: Props,
    eval_ctx: Option<&dyn Any>,
    ctx: &InertiaContext,
    config: &InertiaConfig,
) -> Result<Page> {
    let merged = merge_prop_sets(shared_props, explicit_props, config.deep_merge_shared_data);

    let mut props = PageProps::new();
    for (key, prop) in &merged {
        if should_include_prop(key, prop, component, ctx) {
            props.insert(key.clone(), prop.evaluate(eval_ctx)?);
        }
    }

    let deferred_props = if ctx.is_partial_reload() {
        None
    } else {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, prop) in &merged {
            if let Some(group) = prop.defer_group() {
                groups.entry(group.to_string()).or_default().push(key.clone());
            }
        }
        (!groups.is_empty()).then_some(groups)
    };

    let collect_merge_keys = |deep: bool| -> Vec<String> {
        merged
            .iter()
            .filter(|(key, prop)| {
                prop.is_mergeable()
                    && prop.is_deep_mergeable() == deep
                    && !ctx.reset_keys.iter().any(|reset| reset == *key)
            })
            .map(|(key, _)| key.clone())
            .collect()
    };
    let merge_props = collect_merge_keys(false);
    let deep_merge_props = collect_merge_keys(true);

    let clear_history = config.clear_history
        || ctx
            .session
            .as_ref()
            .is_some_and(|session| session.take_clear_history());

    Ok(Page {
        component: component.to_string(),
        props,
        url: ctx.request_uri.clone(),
        version: config.effective_version().to_string(),
        encrypt_history: config.encrypt_history.then_some(true),
        clear_history: clear_history.then_some(true),
        deferred_props,
        merge_props: (!merge_props.is_empty()).then_some(merge_props),
        deep_merge_props: (!deep_merge_props.is_empty()).then_some(deep_merge_props),
    })
}
