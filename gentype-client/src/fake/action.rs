use serde_json::Value;

use crate::core::{
    params::{CreateOptions, DeleteOptions, GetOptions, ListOptions, PatchOptions, PatchType, UpdateOptions},
    GroupVersionKind, GroupVersionResource,
};

/// A call recorded by a [`Fake`](super::Fake)
///
/// Objects are recorded as their JSON representation so actions of every kind share one type.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Action {
    Get {
        resource: GroupVersionResource,
        namespace: String,
        name: String,
        options: GetOptions,
    },
    List {
        resource: GroupVersionResource,
        kind: GroupVersionKind,
        namespace: String,
        options: ListOptions,
    },
    Watch {
        resource: GroupVersionResource,
        namespace: String,
        options: ListOptions,
    },
    Create {
        resource: GroupVersionResource,
        namespace: String,
        object: Value,
        options: CreateOptions,
    },
    Update {
        resource: GroupVersionResource,
        namespace: String,
        subresource: Option<String>,
        object: Value,
        options: UpdateOptions,
    },
    Delete {
        resource: GroupVersionResource,
        namespace: String,
        name: String,
        options: DeleteOptions,
    },
    DeleteCollection {
        resource: GroupVersionResource,
        namespace: String,
        options: DeleteOptions,
        list_options: ListOptions,
    },
    Patch {
        resource: GroupVersionResource,
        namespace: String,
        name: String,
        patch_type: PatchType,
        data: Vec<u8>,
        options: PatchOptions,
        subresources: Vec<String>,
    },
}

impl Action {
    /// The verb, as reactors match it
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Get { .. } => "get",
            Action::List { .. } => "list",
            Action::Watch { .. } => "watch",
            Action::Create { .. } => "create",
            Action::Update { .. } => "update",
            Action::Delete { .. } => "delete",
            Action::DeleteCollection { .. } => "delete-collection",
            Action::Patch { .. } => "patch",
        }
    }

    /// The resource acted on
    pub fn resource(&self) -> &GroupVersionResource {
        match self {
            Action::Get { resource, .. }
            | Action::List { resource, .. }
            | Action::Watch { resource, .. }
            | Action::Create { resource, .. }
            | Action::Update { resource, .. }
            | Action::Delete { resource, .. }
            | Action::DeleteCollection { resource, .. }
            | Action::Patch { resource, .. } => resource,
        }
    }

    /// The namespace acted in, empty for cluster scoped calls
    pub fn namespace(&self) -> &str {
        match self {
            Action::Get { namespace, .. }
            | Action::List { namespace, .. }
            | Action::Watch { namespace, .. }
            | Action::Create { namespace, .. }
            | Action::Update { namespace, .. }
            | Action::Delete { namespace, .. }
            | Action::DeleteCollection { namespace, .. }
            | Action::Patch { namespace, .. } => namespace,
        }
    }

    /// The subresource path, if any
    pub fn subresource(&self) -> Option<String> {
        match self {
            Action::Update { subresource, .. } => subresource.clone(),
            Action::Patch { subresources, .. } if !subresources.is_empty() => Some(subresources.join("/")),
            _ => None,
        }
    }

    /// Whether this action has `verb` on `resource`, `"*"` matching any
    pub fn matches(&self, verb: &str, resource: &str) -> bool {
        (verb == "*" || verb == self.verb()) && (resource == "*" || resource == self.resource().resource)
    }
}
