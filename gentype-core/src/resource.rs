use crate::{
    metadata::{ListMeta, ObjectMeta},
    object::ObjectList,
};
use serde::Serialize;

/// An API object addressable by name within an optional namespace
///
/// This trait is implemented for every k8s-openapi type carrying [`ObjectMeta`],
/// and is what `#[derive(TypedClient)]` expects of the annotated type otherwise.
pub trait Object {
    /// Metadata that all persisted resources must have
    fn meta(&self) -> &ObjectMeta;

    /// Metadata that all persisted resources must have
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// The name of the object, if set
    fn name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    /// The namespace of the object, if set
    fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref()
    }

    /// The resource version of the object, if set
    fn resource_version(&self) -> Option<&str> {
        self.meta().resource_version.as_deref()
    }

    /// The unique id of the object, if set
    fn uid(&self) -> Option<&str> {
        self.meta().uid.as_deref()
    }
}

impl<K> Object for K
where
    K: k8s_openapi::Metadata<Ty = ObjectMeta>,
{
    fn meta(&self) -> &ObjectMeta {
        self.metadata()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self.metadata_mut()
    }
}

/// A list of objects together with the list metadata
///
/// The generic client builds lists it assembles itself (watch-list, fake filtering) through this trait,
/// so any list shape works as long as it can be split into and rebuilt from its parts.
pub trait ListObject {
    /// The type of the listed objects
    type Item;

    /// List metadata, the resource version and continue token
    fn list_meta(&self) -> &ListMeta;

    /// List metadata, the resource version and continue token
    fn list_meta_mut(&mut self) -> &mut ListMeta;

    /// The listed objects
    fn items(&self) -> &[Self::Item];

    /// Consume the list into its objects
    fn into_items(self) -> Vec<Self::Item>;

    /// Build a list from metadata and objects
    fn from_parts(metadata: ListMeta, items: Vec<Self::Item>) -> Self;
}

impl<T> ListObject for ObjectList<T> {
    type Item = T;

    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn list_meta_mut(&mut self) -> &mut ListMeta {
        &mut self.metadata
    }

    fn items(&self) -> &[T] {
        &self.items
    }

    fn into_items(self) -> Vec<T> {
        self.items
    }

    fn from_parts(metadata: ListMeta, items: Vec<T>) -> Self {
        Self { metadata, items }
    }
}

impl<T> ListObject for k8s_openapi::List<T>
where
    T: k8s_openapi::ListableResource,
{
    type Item = T;

    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn list_meta_mut(&mut self) -> &mut ListMeta {
        &mut self.metadata
    }

    fn items(&self) -> &[T] {
        &self.items
    }

    fn into_items(self) -> Vec<T> {
        self.items
    }

    fn from_parts(metadata: ListMeta, items: Vec<T>) -> Self {
        Self { metadata, items }
    }
}

/// A partial, declarative configuration submitted through server-side apply
///
/// Apply requests are rejected before they are sent when the configuration is empty
/// or carries no name, so implementors expose both facts explicitly.
pub trait ApplyConfiguration: Serialize {
    /// The name of the object this configuration applies to
    fn name(&self) -> Option<&str>;

    /// Whether there is no configuration at all
    fn is_empty(&self) -> bool {
        false
    }
}

impl ApplyConfiguration for serde_json::Value {
    fn name(&self) -> Option<&str> {
        self.pointer("/metadata/name").and_then(serde_json::Value::as_str)
    }

    fn is_empty(&self) -> bool {
        match self {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl<C: ApplyConfiguration> ApplyConfiguration for Option<C> {
    fn name(&self) -> Option<&str> {
        self.as_ref().and_then(ApplyConfiguration::name)
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(ApplyConfiguration::is_empty)
    }
}
