//! Crate with types and traits shared by generated typed clients
//!
//! This crate holds everything that does not need a live connection: option types and their
//! query encoding, the fluent request builder, the object traits the generic client is
//! parameterized over, and watch-list option preparation.
//! The same information is re-exported from `gentype` under `gentype::core`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub use codec::{ParameterCodec, QueryParameterCodec, VersionedParams};

pub mod duration;
pub use duration::Duration;

pub mod gvk;
pub use gvk::{GroupVersion, GroupVersionKind, GroupVersionResource};

pub mod labels;
pub use labels::Selector;

pub mod metadata;

pub mod object;
pub use object::ObjectList;

pub mod params;

pub mod request;
pub use request::RequestBuilder;

mod resource;
pub use resource::{ApplyConfiguration, ListObject, Object};

pub mod watch;
pub use watch::WatchEvent;

pub mod watchlist;

mod error;
pub use error::{Error, ErrorResponse, StatusCause, StatusDetails};

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
