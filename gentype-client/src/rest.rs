//! A transport bound to one API group version
use http::Method;

use crate::{
    core::{params::PatchType, GroupVersion, RequestBuilder},
    Client,
};

/// The REST interface typed clients are generated against
///
/// Holds a [`Client`] and the group version every request is prefixed with,
/// and starts a [`RequestBuilder`] per verb. Cloning is cheap.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    group_version: GroupVersion,
    supports_protobuf: bool,
}

impl RestClient {
    /// Bind a client to a group version
    pub fn new(client: Client, group_version: GroupVersion) -> Self {
        Self {
            client,
            group_version,
            supports_protobuf: false,
        }
    }

    /// Let requests of resources preferring protobuf ask for it
    ///
    /// Only enable this in front of a transport that decodes protobuf responses.
    #[must_use]
    pub fn with_protobuf(mut self, supported: bool) -> Self {
        self.supports_protobuf = supported;
        self
    }

    /// The transport executing built requests
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The group version requests are prefixed with
    pub fn group_version(&self) -> &GroupVersion {
        &self.group_version
    }

    /// Start a request with an arbitrary method
    pub fn verb(&self, method: Method) -> RequestBuilder {
        RequestBuilder::new(method, self.group_version.clone()).supports_protobuf(self.supports_protobuf)
    }

    /// Start a `GET` request
    pub fn get(&self) -> RequestBuilder {
        self.verb(Method::GET)
    }

    /// Start a `POST` request
    pub fn post(&self) -> RequestBuilder {
        self.verb(Method::POST)
    }

    /// Start a `PUT` request
    pub fn put(&self) -> RequestBuilder {
        self.verb(Method::PUT)
    }

    /// Start a `DELETE` request
    pub fn delete(&self) -> RequestBuilder {
        self.verb(Method::DELETE)
    }

    /// Start a `PATCH` request with the content type of `pt`
    pub fn patch(&self, pt: PatchType) -> RequestBuilder {
        self.verb(Method::PATCH).patch_type(pt)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("group_version", &self.group_version)
            .field("supports_protobuf", &self.supports_protobuf)
            .finish()
    }
}
