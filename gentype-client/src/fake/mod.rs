//! Fake clients recording every call instead of sending it
//!
//! A [`Fake`] records [`Action`]s and lets chains of reactors answer them. [`FakeClient`] is the
//! fake counterpart of a [`gentype::Client`](crate::gentype::Client): the same verbs, the same
//! typestate, with objects passed through the fake as JSON.
//!
//! Calls no reactor handles succeed with an empty object. Register a [`Tracker`] to serve
//! actions from an in-memory store instead.
//!
//! ```rust
//! use gentype_client::{
//!     core::{params::ListOptions, GroupVersionKind, GroupVersionResource, ObjectList},
//!     fake::{Fake, FakeClient, Tracker},
//! };
//! use k8s_openapi::api::core::v1::ConfigMap;
//!
//! # async fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = Tracker::new();
//! let resource = GroupVersionResource::gvr("", "v1", "configmaps");
//! tracker.add(&resource, serde_json::json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": { "name": "settings", "namespace": "default", "labels": { "app": "web" } }
//! }))?;
//!
//! let fake = Fake::with_tracker(tracker);
//! let configmaps: FakeClient<ConfigMap, ObjectList<ConfigMap>> = FakeClient::new(
//!     fake.clone(),
//!     "default",
//!     resource,
//!     GroupVersionKind::gvk("", "v1", "ConfigMap"),
//! );
//! let found = configmaps.list(&ListOptions::default().labels("app=web")).await?;
//! assert_eq!(found.items.len(), 1);
//! assert_eq!(fake.actions()[0].verb(), "list");
//! # Ok(())
//! # }
//! ```
use std::{fmt, marker::PhantomData, sync::Arc};

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    core::{
        params::{
            ApplyOptions, CreateOptions, DeleteOptions, GetOptions, ListOptions, PatchOptions, PatchType,
            UpdateOptions,
        },
        ApplyConfiguration, GroupVersionKind, GroupVersionResource, ListObject, Object, Selector,
    },
    error::ApplyError,
    gentype::{NoApply, NoList, WatchStream},
    Error, Result,
};

mod action;
pub use action::Action;
mod tracker;
pub use tracker::Tracker;

/// The answer of a reactor
///
/// `None` passes the action on to the next reactor. `Some(Ok(None))` handles it without an object,
/// the caller then gets an empty result.
pub type ReactionResult = Option<Result<Option<Value>>>;

/// The answer of a watch reactor, a stream of JSON watch events when handled
pub type WatchReactionResult = Option<Result<BoxStream<'static, Value>>>;

type Reaction = Arc<dyn Fn(&Action) -> ReactionResult + Send + Sync>;
type WatchReaction = Arc<dyn Fn(&Action) -> WatchReactionResult + Send + Sync>;

struct Reactor {
    verb: String,
    resource: String,
    react: Reaction,
}

struct WatchReactor {
    resource: String,
    react: WatchReaction,
}

#[derive(Default)]
struct State {
    actions: Vec<Action>,
    reactors: Vec<Reactor>,
    watch_reactors: Vec<WatchReactor>,
}

/// An action recorder with reactor chains
///
/// Clones share their recorded actions and reactors.
#[derive(Clone, Default)]
pub struct Fake {
    state: Arc<Mutex<State>>,
}

impl Fake {
    /// A fake without reactors
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake serving every action from `tracker`
    pub fn with_tracker(tracker: Tracker) -> Self {
        let fake = Self::new();
        fake.add_reactor("*", "*", tracker.reactor());
        fake.add_watch_reactor("*", tracker.watch_reactor());
        fake
    }

    /// Append a reactor for `verb` on `resource`, `"*"` matching any
    pub fn add_reactor<F>(&self, verb: &str, resource: &str, react: F)
    where
        F: Fn(&Action) -> ReactionResult + Send + Sync + 'static,
    {
        self.state.lock().reactors.push(Reactor {
            verb: verb.into(),
            resource: resource.into(),
            react: Arc::new(react),
        });
    }

    /// Put a reactor for `verb` on `resource` in front of the chain
    pub fn prepend_reactor<F>(&self, verb: &str, resource: &str, react: F)
    where
        F: Fn(&Action) -> ReactionResult + Send + Sync + 'static,
    {
        self.state.lock().reactors.insert(0, Reactor {
            verb: verb.into(),
            resource: resource.into(),
            react: Arc::new(react),
        });
    }

    /// Append a watch reactor for `resource`, `"*"` matching any
    pub fn add_watch_reactor<F>(&self, resource: &str, react: F)
    where
        F: Fn(&Action) -> WatchReactionResult + Send + Sync + 'static,
    {
        self.state.lock().watch_reactors.push(WatchReactor {
            resource: resource.into(),
            react: Arc::new(react),
        });
    }

    /// Put a watch reactor for `resource` in front of the chain
    pub fn prepend_watch_reactor<F>(&self, resource: &str, react: F)
    where
        F: Fn(&Action) -> WatchReactionResult + Send + Sync + 'static,
    {
        self.state.lock().watch_reactors.insert(0, WatchReactor {
            resource: resource.into(),
            react: Arc::new(react),
        });
    }

    /// The actions recorded so far, oldest first
    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    /// Forget the recorded actions
    pub fn clear_actions(&self) {
        self.state.lock().actions.clear();
    }

    /// Record `action` and run it through the reactor chain
    ///
    /// Returns `Ok(None)` when no reactor handles the action.
    pub fn invokes(&self, action: Action) -> Result<Option<Value>> {
        let reactions: Vec<Reaction> = {
            let mut state = self.state.lock();
            state.actions.push(action.clone());
            state
                .reactors
                .iter()
                .filter(|r| action.matches(&r.verb, &r.resource))
                .map(|r| r.react.clone())
                .collect()
        };
        for react in reactions {
            if let Some(result) = react(&action) {
                return result;
            }
        }
        Ok(None)
    }

    /// Record a watch `action` and run it through the watch reactor chain
    ///
    /// Unlike other actions, an unhandled watch is an error.
    pub fn invokes_watch(&self, action: Action) -> Result<BoxStream<'static, Value>> {
        let reactions: Vec<WatchReaction> = {
            let mut state = self.state.lock();
            state.actions.push(action.clone());
            state
                .watch_reactors
                .iter()
                .filter(|r| action.matches("watch", &r.resource))
                .map(|r| r.react.clone())
                .collect()
        };
        for react in reactions {
            if let Some(result) = react(&action) {
                return result;
            }
        }
        Err(Error::Fake(format!("unhandled watch: {action:?}")))
    }
}

impl fmt::Debug for Fake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Fake")
            .field("actions", &state.actions.len())
            .field("reactors", &state.reactors.len())
            .field("watch_reactors", &state.watch_reactors.len())
            .finish()
    }
}

fn decode<T: DeserializeOwned + Default>(value: Option<Value>) -> Result<T> {
    match value {
        Some(value) => serde_json::from_value(value).map_err(Error::SerdeError),
        None => Ok(T::default()),
    }
}

fn encode<T: Serialize + ?Sized>(obj: &T) -> Result<Value> {
    serde_json::to_value(obj).map_err(Error::SerdeError)
}

/// A fake client for objects of type `K`
///
/// Mirrors [`gentype::Client`](crate::gentype::Client), including which verbs `L` and `C` unlock.
pub struct FakeClient<K, L = NoList, C = NoApply> {
    fake: Fake,
    namespace: String,
    resource: GroupVersionResource,
    kind: GroupVersionKind,
    _types: PhantomData<fn() -> (K, L, C)>,
}

/// A fake client supporting lists
pub type FakeClientWithList<K, L> = FakeClient<K, L, NoApply>;
/// A fake client supporting server-side apply
pub type FakeClientWithApply<K, C> = FakeClient<K, NoList, C>;
/// A fake client supporting lists and server-side apply
pub type FakeClientWithListAndApply<K, L, C> = FakeClient<K, L, C>;

impl<K, L, C> Clone for FakeClient<K, L, C> {
    fn clone(&self) -> Self {
        Self {
            fake: self.fake.clone(),
            namespace: self.namespace.clone(),
            resource: self.resource.clone(),
            kind: self.kind.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, L, C> fmt::Debug for FakeClient<K, L, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeClient")
            .field("namespace", &self.namespace)
            .field("resource", &self.resource)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<K, L, C> FakeClient<K, L, C> {
    /// A fake client for `resource` of `kind`, cluster scoped when `namespace` is empty
    pub fn new(
        fake: Fake,
        namespace: impl Into<String>,
        resource: GroupVersionResource,
        kind: GroupVersionKind,
    ) -> Self {
        Self {
            fake,
            namespace: namespace.into(),
            resource,
            kind,
            _types: PhantomData,
        }
    }

    /// The fake recording this client's calls
    pub fn fake(&self) -> &Fake {
        &self.fake
    }

    /// The namespace, empty for cluster scoped clients
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The resource recorded on actions
    pub fn resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    /// The kind recorded on list actions
    pub fn kind(&self) -> &GroupVersionKind {
        &self.kind
    }

    fn update_with(&self, obj: Value, subresource: Option<&str>, opts: &UpdateOptions) -> Result<Option<Value>> {
        self.fake.invokes(Action::Update {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            subresource: subresource.map(str::to_string),
            object: obj,
            options: opts.clone(),
        })
    }
}

impl<K, L, C> FakeClient<K, L, C>
where
    K: Object + Serialize + DeserializeOwned + Default,
{
    /// Get a named object
    pub async fn get(&self, name: &str, opts: &GetOptions) -> Result<K> {
        decode(self.fake.invokes(Action::Get {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            name: name.into(),
            options: opts.clone(),
        })?)
    }

    /// Watch objects through the watch reactors
    pub async fn watch(&self, opts: &ListOptions) -> Result<WatchStream<K>>
    where
        K: Send + 'static,
    {
        let options = ListOptions {
            watch: true,
            ..opts.clone()
        };
        let events = self.fake.invokes_watch(Action::Watch {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            options,
        })?;
        Ok(events
            .map(|event| serde_json::from_value(event).map_err(Error::SerdeError))
            .boxed())
    }

    /// Create an object
    pub async fn create(&self, obj: &K, opts: &CreateOptions) -> Result<K> {
        decode(self.fake.invokes(Action::Create {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            object: encode(obj)?,
            options: opts.clone(),
        })?)
    }

    /// Replace an object
    pub async fn update(&self, obj: &K, opts: &UpdateOptions) -> Result<K> {
        decode(self.update_with(encode(obj)?, None, opts)?)
    }

    /// Replace the status of an object
    pub async fn update_status(&self, obj: &K, opts: &UpdateOptions) -> Result<K> {
        decode(self.update_with(encode(obj)?, Some("status"), opts)?)
    }

    /// Delete a named object
    pub async fn delete(&self, name: &str, opts: &DeleteOptions) -> Result<()> {
        self.fake.invokes(Action::Delete {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            name: name.into(),
            options: opts.clone(),
        })?;
        Ok(())
    }

    /// Patch a named object, or one of its subresources
    pub async fn patch(
        &self,
        name: &str,
        pt: PatchType,
        data: Vec<u8>,
        opts: &PatchOptions,
        subresources: &[&str],
    ) -> Result<K> {
        decode(self.fake.invokes(Action::Patch {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            name: name.into(),
            patch_type: pt,
            data,
            options: opts.clone(),
            subresources: subresources.iter().map(|s| s.to_string()).collect(),
        })?)
    }
}

impl<K, L, C> FakeClient<K, L, C>
where
    L: ListObject + DeserializeOwned + Default,
    L::Item: Object,
{
    /// List objects, keeping those matched by the label selector
    ///
    /// The list metadata of the reactor's answer is kept as is.
    pub async fn list(&self, opts: &ListOptions) -> Result<L> {
        let list: L = decode(self.fake.invokes(Action::List {
            resource: self.resource.clone(),
            kind: self.kind.clone(),
            namespace: self.namespace.clone(),
            options: opts.clone(),
        })?)?;
        let selector: Selector = opts
            .label_selector
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e| Error::Fake(format!("invalid selector: {e}")))?;
        if selector.selects_all() {
            return Ok(list);
        }
        let metadata = list.list_meta().clone();
        let items = list
            .into_items()
            .into_iter()
            .filter(|item| selector.matches(item.meta().labels.as_ref().unwrap_or(&Default::default())))
            .collect();
        Ok(L::from_parts(metadata, items))
    }

    /// Delete every object matched by `list_opts`
    pub async fn delete_collection(&self, opts: &DeleteOptions, list_opts: &ListOptions) -> Result<()> {
        self.fake.invokes(Action::DeleteCollection {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            options: opts.clone(),
            list_options: list_opts.clone(),
        })?;
        Ok(())
    }
}

impl<K, L, C> FakeClient<K, L, C>
where
    K: DeserializeOwned + Default,
    C: ApplyConfiguration,
{
    /// Server-side apply a configuration
    pub async fn apply(&self, cfg: &C, opts: &ApplyOptions) -> Result<K> {
        self.apply_with(cfg, opts, &[])
    }

    /// Server-side apply a configuration to the status of an object
    pub async fn apply_status(&self, cfg: &C, opts: &ApplyOptions) -> Result<K> {
        self.apply_with(cfg, opts, &["status"])
    }

    fn apply_with(&self, cfg: &C, opts: &ApplyOptions, subresources: &[&str]) -> Result<K> {
        if cfg.is_empty() {
            return Err(Error::Apply(ApplyError::ConfigurationEmpty));
        }
        let data = serde_json::to_vec(cfg).map_err(Error::SerdeError)?;
        let name = cfg.name().ok_or(Error::Apply(ApplyError::ConfigurationNameMissing))?;
        decode(self.fake.invokes(Action::Patch {
            resource: self.resource.clone(),
            namespace: self.namespace.clone(),
            name: name.into(),
            patch_type: PatchType::Apply,
            data,
            options: opts.to_patch_options(),
            subresources: subresources.iter().map(|s| s.to_string()).collect(),
        })?)
    }
}

#[cfg(test)]
mod tests;
