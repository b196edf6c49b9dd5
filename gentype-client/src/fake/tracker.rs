use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{Action, ReactionResult, WatchReactionResult};
use crate::{
    core::{params::PatchType, ErrorResponse, GroupVersionResource, Selector},
    Error, Result,
};

/// An in-memory object store reacting to fake actions like an apiserver would
///
/// Objects are kept as JSON per resource, namespace and name. Every write bumps a
/// store wide resource version and is broadcast to watches of the resource.
///
/// Register it on a [`Fake`](super::Fake) with [`Fake::with_tracker`](super::Fake::with_tracker).
#[derive(Clone, Default)]
pub struct Tracker {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    objects: HashMap<GroupVersionResource, BTreeMap<(String, String), Value>>,
    watchers: Vec<Watcher>,
    resource_version: u64,
}

struct Watcher {
    resource: GroupVersionResource,
    namespace: String,
    tx: mpsc::UnboundedSender<Value>,
}

impl State {
    fn bump(&mut self, obj: &mut Value) {
        self.resource_version += 1;
        if let Some(meta) = obj.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.insert("resourceVersion".into(), self.resource_version.to_string().into());
        }
    }

    fn notify(&mut self, resource: &GroupVersionResource, namespace: &str, kind: &str, obj: &Value) {
        let event = json!({ "type": kind, "object": obj });
        self.watchers.retain(|w| {
            if &w.resource != resource || !(w.namespace.is_empty() || w.namespace == namespace) {
                return !w.tx.is_closed();
            }
            w.tx.send(event.clone()).is_ok()
        });
    }

    fn store(&mut self, resource: &GroupVersionResource) -> &mut BTreeMap<(String, String), Value> {
        self.objects.entry(resource.clone()).or_default()
    }
}

fn name_of(obj: &Value) -> Option<&str> {
    obj.pointer("/metadata/name").and_then(Value::as_str).filter(|n| !n.is_empty())
}

fn labels_of(obj: &Value) -> BTreeMap<String, String> {
    obj.pointer("/metadata/labels")
        .and_then(|l| serde_json::from_value(l.clone()).ok())
        .unwrap_or_default()
}

fn invalid(message: String) -> Error {
    Error::Api(ErrorResponse {
        status: "Failure".into(),
        message,
        reason: "Invalid".into(),
        code: 422,
        details: None,
    })
}

fn bad_request(message: String) -> Error {
    Error::Api(ErrorResponse {
        status: "Failure".into(),
        message,
        reason: "BadRequest".into(),
        code: 400,
        details: None,
    })
}

/// Fill in the namespace of the request, refusing a conflicting one
///
/// Returns the namespace the object is stored under. Without a request namespace that is the
/// object's own.
fn scope(obj: &mut Value, namespace: &str) -> Result<String> {
    if namespace.is_empty() {
        let own = obj.pointer("/metadata/namespace").and_then(Value::as_str).unwrap_or_default();
        return Ok(own.to_string());
    }
    let Some(meta) = obj.get_mut("metadata").and_then(Value::as_object_mut) else {
        return Err(invalid("metadata: Required value".into()));
    };
    let conflicting = meta
        .get("namespace")
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty() && *ns != namespace)
        .map(str::to_string);
    if let Some(ns) = conflicting {
        return Err(bad_request(format!(
            "the namespace of the provided object ({ns}) does not match the namespace sent on the request ({namespace})"
        )));
    }
    meta.insert("namespace".into(), namespace.into());
    Ok(namespace.to_string())
}

impl Tracker {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, replacing any object of the same name
    pub fn add(&self, resource: &GroupVersionResource, mut obj: Value) -> Result<()> {
        let name = name_of(&obj)
            .ok_or_else(|| invalid("metadata.name: Required value".into()))?
            .to_string();
        let namespace = obj
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut state = self.state.lock();
        state.bump(&mut obj);
        state.store(resource).insert((namespace, name), obj);
        Ok(())
    }

    /// Get a named object
    pub fn get(&self, resource: &GroupVersionResource, namespace: &str, name: &str) -> Result<Value> {
        self.state
            .lock()
            .store(resource)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::Api(ErrorResponse::not_found(&resource.resource, name)))
    }

    /// List the objects of a resource, in every namespace when `namespace` is empty
    pub fn list(&self, resource: &GroupVersionResource, namespace: &str) -> Value {
        let mut state = self.state.lock();
        let resource_version = state.resource_version.to_string();
        let items: Vec<Value> = state
            .store(resource)
            .iter()
            .filter(|((ns, _), _)| namespace.is_empty() || ns == namespace)
            .map(|(_, obj)| obj.clone())
            .collect();
        json!({ "metadata": { "resourceVersion": resource_version }, "items": items })
    }

    /// Create an object, refusing to replace an existing one
    pub fn create(&self, resource: &GroupVersionResource, namespace: &str, mut obj: Value) -> Result<Value> {
        let namespace = scope(&mut obj, namespace)?;
        let name = name_of(&obj)
            .ok_or_else(|| invalid("metadata.name: Required value".into()))?
            .to_string();
        let mut state = self.state.lock();
        let key = (namespace.clone(), name);
        if state.store(resource).contains_key(&key) {
            return Err(Error::Api(ErrorResponse::already_exists(&resource.resource, &key.1)));
        }
        state.bump(&mut obj);
        state.store(resource).insert(key, obj.clone());
        state.notify(resource, &namespace, "ADDED", &obj);
        Ok(obj)
    }

    /// Replace an existing object
    pub fn update(&self, resource: &GroupVersionResource, namespace: &str, mut obj: Value) -> Result<Value> {
        let namespace = scope(&mut obj, namespace)?;
        let name = name_of(&obj)
            .ok_or_else(|| invalid("metadata.name: Required value".into()))?
            .to_string();
        let mut state = self.state.lock();
        let key = (namespace.clone(), name);
        if !state.store(resource).contains_key(&key) {
            return Err(Error::Api(ErrorResponse::not_found(&resource.resource, &key.1)));
        }
        state.bump(&mut obj);
        state.store(resource).insert(key, obj.clone());
        state.notify(resource, &namespace, "MODIFIED", &obj);
        Ok(obj)
    }

    /// Patch a named object, an apply patch creates a missing one
    pub fn patch(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
        patch_type: PatchType,
        data: &[u8],
    ) -> Result<Value> {
        let mut state = self.state.lock();
        let key = (namespace.to_string(), name.to_string());
        let existing = state.store(resource).get(&key).cloned();

        let (mut obj, event) = match (existing, patch_type) {
            (Some(mut obj), PatchType::Json) => {
                let patch: json_patch::Patch = serde_json::from_slice(data).map_err(Error::SerdeError)?;
                json_patch::patch(&mut obj, &patch.0).map_err(|e| invalid(e.to_string()))?;
                (obj, "MODIFIED")
            }
            (Some(mut obj), PatchType::Merge | PatchType::StrategicMerge | PatchType::Apply) => {
                let patch: Value = serde_json::from_slice(data).map_err(Error::SerdeError)?;
                json_patch::merge(&mut obj, &patch);
                (obj, "MODIFIED")
            }
            (None, PatchType::Apply) => {
                let mut obj: Value = serde_json::from_slice(data).map_err(Error::SerdeError)?;
                scope(&mut obj, namespace)?;
                (obj, "ADDED")
            }
            (None, _) => return Err(Error::Api(ErrorResponse::not_found(&resource.resource, name))),
        };
        if name_of(&obj) != Some(name) {
            return Err(invalid(format!("metadata.name: Invalid value: the name must stay {name:?}")));
        }
        state.bump(&mut obj);
        state.store(resource).insert(key, obj.clone());
        state.notify(resource, namespace, event, &obj);
        Ok(obj)
    }

    /// Delete a named object
    pub fn delete(&self, resource: &GroupVersionResource, namespace: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let key = (namespace.to_string(), name.to_string());
        let Some(obj) = state.store(resource).remove(&key) else {
            return Err(Error::Api(ErrorResponse::not_found(&resource.resource, name)));
        };
        state.resource_version += 1;
        state.notify(resource, namespace, "DELETED", &obj);
        Ok(())
    }

    /// Delete the objects in a namespace matched by a label selector
    pub fn delete_collection(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        selector: &Selector,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let doomed: Vec<(String, String)> = state
            .store(resource)
            .iter()
            .filter(|((ns, _), obj)| {
                (namespace.is_empty() || ns == namespace) && selector.matches(&labels_of(obj))
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            if let Some(obj) = state.store(resource).remove(&key) {
                state.resource_version += 1;
                state.notify(resource, &key.0, "DELETED", &obj);
            }
        }
        Ok(())
    }

    /// Watch later changes to a resource, in every namespace when `namespace` is empty
    pub fn watch(&self, resource: &GroupVersionResource, namespace: &str) -> BoxStream<'static, Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().watchers.push(Watcher {
            resource: resource.clone(),
            namespace: namespace.to_string(),
            tx,
        });
        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) }).boxed()
    }

    /// A reactor serving every action but watches from this store
    pub fn reactor(&self) -> impl Fn(&Action) -> ReactionResult + Send + Sync + 'static {
        let tracker = self.clone();
        move |action| tracker.react(action)
    }

    /// A watch reactor serving watches from this store
    pub fn watch_reactor(&self) -> impl Fn(&Action) -> WatchReactionResult + Send + Sync + 'static {
        let tracker = self.clone();
        move |action| tracker.react_watch(action)
    }

    /// Serve an action from the store
    pub fn react(&self, action: &Action) -> ReactionResult {
        let resource = action.resource();
        let ns = action.namespace();
        let result = match action {
            Action::Get { name, .. } => self.get(resource, ns, name).map(Some),
            Action::List { .. } => Ok(Some(self.list(resource, ns))),
            Action::Create { object, .. } => self.create(resource, ns, object.clone()).map(Some),
            Action::Update { object, .. } => self.update(resource, ns, object.clone()).map(Some),
            Action::Delete { name, .. } => self.delete(resource, ns, name).map(|()| None),
            Action::DeleteCollection { list_options, .. } => {
                let selector = list_options
                    .label_selector
                    .as_deref()
                    .unwrap_or_default()
                    .parse::<Selector>()
                    .map_err(|e| bad_request(e.to_string()));
                selector.and_then(|s| self.delete_collection(resource, ns, &s).map(|()| None))
            }
            Action::Patch {
                name, patch_type, data, ..
            } => self.patch(resource, ns, name, *patch_type, data).map(Some),
            Action::Watch { .. } => return None,
        };
        Some(result)
    }

    /// Serve a watch action from the store
    pub fn react_watch(&self, action: &Action) -> WatchReactionResult {
        match action {
            Action::Watch { resource, namespace, .. } => Some(Ok(self.watch(resource, namespace))),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Tracker")
            .field("resources", &state.objects.len())
            .field("resource_version", &state.resource_version)
            .finish()
    }
}
