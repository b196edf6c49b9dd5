//! Watch events as the apiserver streams them, one JSON object per line

use crate::{error::ErrorResponse, metadata::TypeMeta};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Debug};

/// Annotation the apiserver puts on the bookmark that ends the initial events of a watch-list
pub const INITIAL_EVENTS_END_ANNOTATION: &str = "k8s.io/initial-events-end";

/// One line of a watch stream
#[derive(Deserialize, Serialize, Clone)]
#[serde(tag = "type", content = "object", rename_all = "UPPERCASE")]
pub enum WatchEvent<K> {
    /// An object appeared, or is part of the initial state
    Added(K),
    /// An object changed
    Modified(K),
    /// An object was removed, carrying its last state
    Deleted(K),
    /// Progress marker with only a resource version and annotations
    Bookmark(Bookmark),
    /// The watch failed, a `410` means the start version is gone
    Error(ErrorResponse),
}

impl<K> WatchEvent<K> {
    /// The wire name of the event type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Added(_) => "ADDED",
            Self::Modified(_) => "MODIFIED",
            Self::Deleted(_) => "DELETED",
            Self::Bookmark(_) => "BOOKMARK",
            Self::Error(_) => "ERROR",
        }
    }
}

// Objects can be large, only the type is shown
impl<K> Debug for WatchEvent<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            other => f.write_str(other.type_name()),
        }
    }
}

/// Body of a [`WatchEvent::Bookmark`]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Bookmark {
    /// Type of the watched resource
    #[serde(flatten)]
    pub types: TypeMeta,

    /// Resource version and annotations only
    pub metadata: BookmarkMeta,
}

impl Bookmark {
    /// Whether this bookmark marks the end of the initial events of a watch-list
    pub fn is_initial_events_end(&self) -> bool {
        self.metadata
            .annotations
            .get(INITIAL_EVENTS_END_ANNOTATION)
            .is_some_and(|v| v == "true")
    }
}

/// Metadata of a [`Bookmark`]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkMeta {
    /// Resource version the watch has progressed to
    pub resource_version: String,

    /// Annotations, set by the server on the initial-events-end bookmark
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}
