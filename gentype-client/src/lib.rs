//! Crate for talking to a Kubernetes style REST API through generated typed clients
//!
//! The crate has three layers:
//!
//! - [`Client`]: the transport, a [tower](tower::Service) stack built from a [`Config`],
//!   which executes built requests and decodes their responses or watch streams.
//! - [`RestClient`]: a transport bound to one API group version, handing out
//!   [`RequestBuilder`](gentype_core::RequestBuilder)s per verb.
//! - [`gentype`]: the generic typed client every generated `*Client` forwards to,
//!   with list through watch-list and the optional consistency check.
//!
//! [`fake`] provides the same verb surface against an in-memory action recorder.
//!
//! # Example
//!
//! ```rust,no_run
//! use gentype_client::{
//!     core::{params::ListOptions, GroupVersion, ObjectList, QueryParameterCodec},
//!     gentype::{ClientOptions, ClientWithList},
//!     Client, RestClient,
//! };
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::try_default()?;
//!     let rest = RestClient::new(client, GroupVersion::gv("", "v1"));
//!     let configmaps = ClientWithList::<ConfigMap, ObjectList<ConfigMap>>::new(
//!         "configmaps",
//!         rest,
//!         Arc::new(QueryParameterCodec),
//!         "default",
//!         ClientOptions::default(),
//!     );
//!     for cm in configmaps.list(&ListOptions::default().labels("app=web")).await? {
//!         println!("found {:?}", cm.metadata.name);
//!     }
//!     Ok(())
//! }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
#[doc(inline)]
pub use client::Client;

pub mod config;
#[doc(inline)]
pub use config::Config;

pub mod error;
#[doc(inline)]
pub use error::Error;

pub mod rest;
#[doc(inline)]
pub use rest::RestClient;

pub mod fake;
pub mod gentype;

/// Re-exports from gentype_core
pub use gentype_core as core;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
