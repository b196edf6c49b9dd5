//! Gentype is an umbrella-crate for typed clients of [Kubernetes](http://kubernetes.io) style REST APIs.
//!
//! # Overview
//!
//! Every resource of an API group gets the same client surface: get, list, watch, create,
//! update, update status, delete, delete collection, patch and server-side apply.
//! Rather than hand writing that surface per resource, gentype implements it once and
//! generates thin typed clients that forward to it.
//!
//! The main modules are:
//!
//! - [`client`](crate::client) with the transport [`Client`](crate::Client) and its layers
//! - [`config`](crate::config) for the transport [`Config`](crate::Config) and [`ClientFeatures`](crate::config::ClientFeatures)
//! - [`rest`](crate::rest) with the per group version [`RestClient`](crate::RestClient)
//! - [`gentype`](crate::gentype) with the generic typed [`Client`](crate::gentype::Client) generated clients forward to
//! - [`fake`](crate::fake) with an in-memory test double of the same surface
//! - [`derive`](gentype_derive) with the [`TypedClient`](crate::TypedClient) generator
//! - [`core`](crate::core) with request building, options and object traits
//!
//! # Using a generated client
//!
//! ```no_run
//! use gentype::{
//!     core::{params::ListOptions, GroupVersion},
//!     Client, RestClient, TypedClient,
//! };
//! use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(TypedClient, Clone, Debug, Default, Deserialize, Serialize)]
//! #[genclient(resource = "widgets")]
//! pub struct Widget {
//!     metadata: ObjectMeta,
//!     spec: WidgetSpec,
//! }
//!
//! #[derive(Clone, Debug, Default, Deserialize, Serialize)]
//! pub struct WidgetSpec {
//!     size: u32,
//! }
//!
//! impl gentype::core::Object for Widget {
//!     fn meta(&self) -> &ObjectMeta {
//!         &self.metadata
//!     }
//!     fn meta_mut(&mut self) -> &mut ObjectMeta {
//!         &mut self.metadata
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::try_default()?;
//!     let rest = RestClient::new(client, GroupVersion::gv("example.dev", "v1"));
//!
//!     let widgets = rest.widgets("default");
//!     for w in widgets.list(&ListOptions::default().labels("tier=front")).await? {
//!         println!("found widget {:?} of size {}", w.metadata.name, w.spec.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For details, see:
//!
//! - [`TypedClient`](crate::TypedClient) for the generator attributes
//! - [`gentype::Client`](crate::gentype::Client) for the verbs and the watch-list behaviour of `list`
//! - [`fake::Fake`](crate::fake::Fake) for testing code written against generated clients
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub use gentype_client::{client, config, error, fake, gentype, rest};

#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use rest::RestClient;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from [`gentype-derive`](gentype_derive)
#[cfg(feature = "derive")]
#[cfg_attr(docsrs, doc(cfg(feature = "derive")))]
pub use gentype_derive::TypedClient;

/// Re-exports from [`gentype_core`](gentype_core)
#[doc(inline)]
pub use gentype_core as core;

#[cfg(all(test, feature = "derive"))] mod mock_tests;
